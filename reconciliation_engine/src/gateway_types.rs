//! Inbound gateway webhook payload shapes and their conversion into aggregates.
//!
//! The gateway notifies the integration about charge lifecycle events with a JSON body. The shape
//! is an external contract we do not control: field casing is inconsistent (`authorizationCode`
//! next to `acquirer_name`), monetary fields come and go, and the payment instrument is sometimes
//! only discoverable from nested flags. The structs here mirror that contract verbatim; the
//! `TryFrom` conversions are where the mess is normalized into typed aggregates.
//!
//! Conversion never defaults an unknown status: an unrecognized status or type string aborts
//! parsing with the raw value attached. Missing optional fields degrade per the rules documented
//! on each conversion.

use chrono::{DateTime, NaiveDateTime, Utc};
use gpc_common::Cents;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{
    CardSummary,
    Charge,
    ChargeId,
    Customer,
    CustomerId,
    OrderId,
    StatusConversionError,
    Transaction,
    TransactionId,
    TransactionType,
};

const WEBHOOK_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

//--------------------------------------     PayloadError      -------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum PayloadError {
    #[error("Required field '{0}' is missing from the payload")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidStatus(#[from] StatusConversionError),
    #[error("Field '{field}' does not hold a monetary amount: {raw}")]
    InvalidAmount { field: &'static str, raw: String },
    #[error("Field '{field}' does not hold a timestamp: {raw}")]
    InvalidTimestamp { field: &'static str, raw: String },
}

//--------------------------------------    Payload structs    -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChargeWebhook {
    pub id: Option<String>,
    pub status: Option<String>,
    pub amount: Option<i64>,
    #[serde(rename = "paidAmount")]
    pub paid_amount: Option<i64>,
    #[serde(rename = "authorizationCode")]
    pub authorization_code: Option<String>,
    pub order: Option<OrderRef>,
    pub metadata: Option<serde_json::Value>,
    pub customer: Option<CustomerWebhook>,
    #[serde(rename = "transactionRequests", default)]
    pub transaction_requests: Vec<TransactionWebhook>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerWebhook {
    pub id: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardWebhook {
    pub brand: Option<String>,
    #[serde(rename = "firstSixDigits")]
    pub first_six_digits: Option<String>,
    #[serde(rename = "lastFourDigits")]
    pub last_four_digits: Option<String>,
    #[serde(rename = "holderName")]
    pub holder_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionWebhook {
    pub id: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "paymentType")]
    pub payment_type: Option<String>,
    pub amount: Option<i64>,
    pub paid_amount: Option<i64>,
    pub acquirer_name: Option<String>,
    pub acquirer_message: Option<String>,
    pub acquirer_nsu: Option<String>,
    pub acquirer_tid: Option<String>,
    pub acquirer_auth_code: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    pub card: Option<CardWebhook>,
    /// Link to the printable boleto document.
    pub pdf: Option<String>,
    /// Instrument blobs. Their content is acquirer-specific; only presence matters here.
    pub boleto: Option<serde_json::Value>,
    pub pix: Option<serde_json::Value>,
}

//--------------------------------------     Conversions       -------------------------------------------------------

impl TryFrom<ChargeWebhook> for Charge {
    type Error = PayloadError;

    /// Builds a charge aggregate from a webhook notification.
    ///
    /// `id`, `status` and `amount` are required. When the gateway omits the paid amount the charge
    /// is treated as fully paid (absence of the field is the gateway's "paid in full" signal, not
    /// zero). Order reference, metadata, customer and transaction requests are optional relations;
    /// the last transaction request becomes the charge's request transaction.
    fn try_from(payload: ChargeWebhook) -> Result<Self, Self::Error> {
        let id = payload.id.ok_or(PayloadError::MissingField("id"))?;
        let raw_status = payload.status.ok_or(PayloadError::MissingField("status"))?;
        let status = raw_status.parse()?;
        let amount = Cents::from(payload.amount.ok_or(PayloadError::MissingField("amount"))?);

        let mut charge = Charge::new(ChargeId::from(id), status, amount);
        charge.code = payload.authorization_code;
        charge.paid_amount = payload.paid_amount.map(Cents::from).unwrap_or(amount);

        if let Some(order) = payload.order {
            if !order.id.is_empty() {
                charge.order_id = Some(OrderId::from(order.id));
            }
        }

        if let Some(request) = payload.transaction_requests.into_iter().last() {
            let mut transaction = request.into_request_transaction()?;
            transaction.charge_id = Some(charge.gateway_id.clone());
            charge.add_transaction(transaction);
        }

        charge.metadata = payload.metadata;

        if let Some(customer) = payload.customer {
            charge.customer = Some(customer.into());
        }

        Ok(charge)
    }
}

impl From<CustomerWebhook> for Customer {
    fn from(payload: CustomerWebhook) -> Self {
        let mut customer = Customer::new(
            payload.name.as_deref().unwrap_or_default(),
            payload.email.as_deref().unwrap_or_default(),
        );
        customer.gateway_id = payload.id.map(CustomerId::from);
        customer.code = payload.code;
        customer
    }
}

impl TryFrom<TransactionWebhook> for Transaction {
    type Error = PayloadError;

    /// Top-level transaction conversion: the payment type must be explicit or defaults to credit.
    /// The boleto/pix flag inference does NOT apply here; that only holds for transaction request
    /// sub-objects (see [`TransactionWebhook::into_request_transaction`]).
    fn try_from(payload: TransactionWebhook) -> Result<Self, Self::Error> {
        let tran_type = match payload.payment_type.as_deref() {
            Some(explicit) if !explicit.is_empty() => explicit.parse()?,
            _ => TransactionType::Credit,
        };
        payload.into_transaction_of_type(tran_type)
    }
}

impl TransactionWebhook {
    /// Conversion for the `transactionRequests` sub-object. When the gateway omits the payment
    /// type here, the instrument is inferred from the presence of the `boleto`/`pix` blobs, and
    /// falls back to credit.
    pub fn into_request_transaction(self) -> Result<Transaction, PayloadError> {
        let tran_type = match self.payment_type.as_deref() {
            Some(explicit) if !explicit.is_empty() => explicit.parse()?,
            _ => {
                if flag_is_set(&self.boleto) {
                    TransactionType::Boleto
                } else if flag_is_set(&self.pix) {
                    TransactionType::Pix
                } else {
                    TransactionType::Credit
                }
            },
        };
        self.into_transaction_of_type(tran_type)
    }

    fn into_transaction_of_type(
        self,
        tran_type: TransactionType,
    ) -> Result<Transaction, PayloadError> {
        let raw = serde_json::to_value(&self).unwrap_or(serde_json::Value::Null);

        let id = self.id.ok_or(PayloadError::MissingField("id"))?;
        let raw_status = self.status.ok_or(PayloadError::MissingField("status"))?;
        let status = raw_status.parse()?;
        let created_at = parse_webhook_timestamp(self.created_at.as_deref())?;

        let mut transaction = Transaction::new(TransactionId::from(id), tran_type, status, created_at);
        transaction.amount = self.amount.map(Cents::from).unwrap_or_default();
        // same gateway quirk as the charge: no explicit paid amount means "paid what was asked"
        transaction.paid_amount = self.paid_amount.or(self.amount).map(Cents::from).unwrap_or_default();
        transaction.acquirer_name = self.acquirer_name.unwrap_or_default();
        transaction.acquirer_message = self.acquirer_message.unwrap_or_default();
        transaction.acquirer_nsu = self.acquirer_nsu.unwrap_or_default();
        transaction.acquirer_tid = self.acquirer_tid.unwrap_or_default();
        transaction.acquirer_auth_code = self.acquirer_auth_code.unwrap_or_default();
        transaction.boleto_url = self.pdf;

        if let Some(card) = self.card {
            transaction.card = Some(CardSummary {
                brand: card.brand.unwrap_or_default(),
                first_six_digits: card.first_six_digits.unwrap_or_default(),
                last_four_digits: card.last_four_digits.unwrap_or_default(),
                holder_name: card.holder_name,
            });
        }

        transaction.record_snapshot(raw);
        Ok(transaction)
    }
}

/// The boleto/pix sub-objects signal the instrument by being present and non-empty. `false` and
/// `null` do not count; anything else does.
fn flag_is_set(value: &Option<serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Object(o)) => !o.is_empty(),
        Some(serde_json::Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

/// Timestamps arrive as ISO-8601 with a varying suffix (timezone, sub-second digits). Only the
/// first 19 characters are significant.
fn parse_webhook_timestamp(raw: Option<&str>) -> Result<DateTime<Utc>, PayloadError> {
    let raw = raw.ok_or(PayloadError::MissingField("createdAt"))?;
    let trimmed: String = raw.chars().take(19).collect();
    let parsed = NaiveDateTime::parse_from_str(&trimmed, WEBHOOK_TIMESTAMP_FORMAT).map_err(|e| {
        warn!("Unparseable webhook timestamp '{raw}': {e}");
        PayloadError::InvalidTimestamp { field: "createdAt", raw: raw.to_string() }
    })?;
    Ok(parsed.and_utc())
}
