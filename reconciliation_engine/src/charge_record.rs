//! Reconstruction of charges from the flattened persisted record.
//!
//! The storage layer keeps one row per charge for cheap listing, folding the charge's N
//! transactions into the same row as parallel lists: every transaction column holds a
//! comma-joined list of values, positionally aligned across columns (index `i` in each column
//! belongs to transaction `i`). Two columns, the card blob and the raw payload blob, carry
//! free-text JSON that may itself contain commas, so those use `---` as separator instead.
//!
//! Decoding zips the columns back together by index. The number of transactions is governed by
//! the `tran_id` list; a row whose other required columns are shorter (a malformed write) is not
//! an error; reconstruction truncates at the first index a required value is missing. Optional
//! columns that run short simply yield nothing for that transaction.

use chrono::NaiveDateTime;
use gpc_common::Cents;
use log::warn;
use serde_json::Value;
use sqlx::FromRow;

use crate::db_types::{CardSummary, Charge, ChargeId, Customer, CustomerId, OrderId, Transaction, TransactionId};
use crate::gateway_types::PayloadError;

/// Separator for scalar transaction columns.
pub const LIST_SEPARATOR: char = ',';
/// Separator for the two free-text blob columns, whose values may contain commas.
pub const BLOB_SEPARATOR: &str = "---";

const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

//--------------------------------------     ChargeRecord      -------------------------------------------------------
#[derive(Debug, Clone, Default, FromRow)]
pub struct ChargeRecord {
    pub id: i64,
    pub gateway_id: String,
    pub order_id: String,
    pub code: Option<String>,
    pub amount: i64,
    pub paid_amount: i64,
    pub canceled_amount: i64,
    pub refunded_amount: i64,
    pub status: String,
    pub metadata: Option<String>,
    pub customer_id: Option<String>,
    pub tran_id: Option<String>,
    pub tran_gateway_id: Option<String>,
    pub tran_charge_id: Option<String>,
    pub tran_amount: Option<String>,
    pub tran_paid_amount: Option<String>,
    pub tran_type: Option<String>,
    pub tran_status: Option<String>,
    pub tran_created_at: Option<String>,
    pub tran_acquirer_nsu: Option<String>,
    pub tran_acquirer_tid: Option<String>,
    pub tran_acquirer_auth_code: Option<String>,
    pub tran_acquirer_name: Option<String>,
    pub tran_acquirer_message: Option<String>,
    pub tran_boleto_url: Option<String>,
    pub tran_card_data: Option<String>,
    pub tran_data: Option<String>,
}

impl TryFrom<ChargeRecord> for Charge {
    type Error = PayloadError;

    fn try_from(record: ChargeRecord) -> Result<Self, Self::Error> {
        let status = record.status.parse()?;
        let mut charge = Charge::new(ChargeId::from(record.gateway_id.clone()), status, Cents::from(record.amount));
        charge.id = Some(record.id);
        charge.order_id = Some(OrderId::from(record.order_id.clone()));
        charge.code = record.code.clone();
        charge.paid_amount = Cents::from(record.paid_amount);
        charge.canceled_amount = Cents::from(record.canceled_amount);
        charge.refunded_amount = Cents::from(record.refunded_amount);

        charge.metadata = record.metadata.as_deref().and_then(|blob| match serde_json::from_str(blob) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable metadata blob on charge {}: {e}", record.gateway_id);
                None
            },
        });

        if let Some(customer_id) = record.customer_id.as_deref().filter(|id| !id.is_empty()) {
            let mut customer = Customer::default();
            customer.gateway_id = Some(CustomerId::from(customer_id));
            charge.customer = Some(customer);
        }

        for transaction in decode_transactions(&record)? {
            charge.add_transaction(transaction);
        }

        Ok(charge)
    }
}

//--------------------------------------    column decoding    -------------------------------------------------------

fn split_list(column: &Option<String>, separator: &str) -> Vec<String> {
    match column.as_deref() {
        Some(raw) if !raw.is_empty() => raw.split(separator).map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn decode_transactions(record: &ChargeRecord) -> Result<Vec<Transaction>, PayloadError> {
    let sep = LIST_SEPARATOR.to_string();
    let ids = split_list(&record.tran_id, &sep);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let gateway_ids = split_list(&record.tran_gateway_id, &sep);
    let charge_ids = split_list(&record.tran_charge_id, &sep);
    let amounts = split_list(&record.tran_amount, &sep);
    let paid_amounts = split_list(&record.tran_paid_amount, &sep);
    let types = split_list(&record.tran_type, &sep);
    let statuses = split_list(&record.tran_status, &sep);
    let created_ats = split_list(&record.tran_created_at, &sep);
    let acquirer_nsus = split_list(&record.tran_acquirer_nsu, &sep);
    let acquirer_tids = split_list(&record.tran_acquirer_tid, &sep);
    let acquirer_auth_codes = split_list(&record.tran_acquirer_auth_code, &sep);
    let acquirer_names = split_list(&record.tran_acquirer_name, &sep);
    let acquirer_messages = split_list(&record.tran_acquirer_message, &sep);
    let boleto_urls = split_list(&record.tran_boleto_url, &sep);
    let card_blobs = split_list(&record.tran_card_data, BLOB_SEPARATOR);
    let data_blobs = split_list(&record.tran_data, BLOB_SEPARATOR);

    let mut transactions = Vec::with_capacity(ids.len());
    for (index, id) in ids.iter().enumerate() {
        // Required columns. A shorter list means the row was malformed on write; reconstruct what
        // is aligned and stop there.
        let (Some(gateway_id), Some(raw_type), Some(raw_status), Some(raw_amount), Some(raw_paid), Some(raw_created)) = (
            gateway_ids.get(index),
            types.get(index),
            statuses.get(index),
            amounts.get(index),
            paid_amounts.get(index),
            created_ats.get(index),
        ) else {
            warn!(
                "Charge {} row holds {} transaction ids but a required column ran out at index {index}; truncating",
                record.gateway_id,
                ids.len()
            );
            break;
        };

        let created_at = NaiveDateTime::parse_from_str(raw_created, RECORD_TIMESTAMP_FORMAT)
            .map_err(|_| PayloadError::InvalidTimestamp { field: "tran_created_at", raw: raw_created.clone() })?
            .and_utc();

        let mut transaction =
            Transaction::new(TransactionId::from(gateway_id.as_str()), raw_type.parse()?, raw_status.parse()?, created_at);
        transaction.id = id.parse::<i64>().ok();
        transaction.charge_id = charge_ids.get(index).map(|v| ChargeId::from(v.as_str()));
        transaction.amount = parse_amount("tran_amount", raw_amount)?;
        transaction.paid_amount = parse_amount("tran_paid_amount", raw_paid)?;

        // Optional columns: a short list yields nothing for this transaction.
        transaction.acquirer_nsu = acquirer_nsus.get(index).cloned().unwrap_or_default();
        transaction.acquirer_tid = acquirer_tids.get(index).cloned().unwrap_or_default();
        transaction.acquirer_auth_code = acquirer_auth_codes.get(index).cloned().unwrap_or_default();
        transaction.acquirer_name = acquirer_names.get(index).cloned().unwrap_or_default();
        transaction.acquirer_message = acquirer_messages.get(index).cloned().unwrap_or_default();
        transaction.boleto_url = boleto_urls.get(index).filter(|url| !url.is_empty()).cloned();
        transaction.card = card_blobs.get(index).and_then(|blob| decode_card_blob(&record.gateway_id, blob));
        if let Some(raw) = data_blobs.get(index).and_then(|blob| decode_data_blob(blob)) {
            transaction.record_snapshot(raw);
        }

        transactions.push(transaction);
    }

    Ok(transactions)
}

fn parse_amount(field: &'static str, raw: &str) -> Result<Cents, PayloadError> {
    raw.trim()
        .parse::<i64>()
        .map(Cents::from)
        .map_err(|_| PayloadError::InvalidAmount { field, raw: raw.to_string() })
}

/// The card column stores the literal string "null" for card-less transactions (boleto, pix).
fn decode_card_blob(charge_id: &str, blob: &str) -> Option<CardSummary> {
    if blob.is_empty() || blob == "null" {
        return None;
    }
    match serde_json::from_str(blob) {
        Ok(card) => Some(card),
        Err(e) => {
            warn!("Discarding unreadable card blob on charge {charge_id}: {e}");
            None
        },
    }
}

fn decode_data_blob(blob: &str) -> Option<Value> {
    if blob.is_empty() || blob == "null" {
        return None;
    }
    serde_json::from_str(blob).ok()
}
