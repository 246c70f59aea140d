//! Core data types for the reconciliation engine.
//!
//! Everything the persistence port stores or the gateway reports is expressed in terms of the
//! types in this module: string newtype identifiers, the closed status sets, and the
//! `Order`/`Charge`/`Transaction` aggregate tree. Status enums have a canonical snake_case string
//! form; conversion from raw gateway strings is a direct lookup that fails loudly with the
//! offending value rather than defaulting.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gpc_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------  StatusConversionError  -----------------------------------------------------
/// Raised when a raw gateway string does not belong to one of the closed status/type sets.
/// Carries the offending value for diagnostics; callers surface it, never swallow it.
#[derive(Debug, Clone, Error)]
#[error("{raw} is not a valid {kind}")]
pub struct StatusConversionError {
    pub kind: &'static str,
    pub raw: String,
}

impl StatusConversionError {
    fn new(kind: &'static str, raw: &str) -> Self {
        Self { kind, raw: raw.to_string() }
    }
}

//--------------------------------------      Identifiers      -------------------------------------------------------
macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        pub struct $name(pub String);

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type!(
    /// The order identifier assigned by the gateway.
    OrderId
);
id_type!(
    /// The charge identifier assigned by the gateway.
    ChargeId
);
id_type!(
    /// The transaction identifier assigned by the gateway.
    TransactionId
);
id_type!(
    /// The customer identifier assigned by the gateway.
    CustomerId
);

macro_rules! status_enum {
    ($(#[$doc:meta])* $name:ident, $kind:literal, { $($variant:ident => $str:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = match self {
                    $($name::$variant => $str),+
                };
                write!(f, "{s}")
            }
        }

        impl FromStr for $name {
            type Err = StatusConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($str => Ok($name::$variant),)+
                    other => Err(StatusConversionError::new($kind, other)),
                }
            }
        }
    };
}

//--------------------------------------      OrderStatus      -------------------------------------------------------
status_enum!(
    /// Lifecycle status of an order as reported by the gateway.
    OrderStatus,
    "order status",
    {
        Pending => "pending",
        Paid => "paid",
        PreAuthorized => "pre_authorized",
        Authorized => "authorized",
        Processing => "processing",
        Canceled => "canceled",
        Closed => "closed",
        Failed => "failed",
        Voided => "voided",
        ChargedBack => "charged_back",
    }
);

//--------------------------------------      ChargeStatus      ------------------------------------------------------
status_enum!(
    /// Lifecycle status of a single charge.
    ///
    /// `Underpaid`/`Overpaid` are derived states: the gateway reports them when the confirmed paid
    /// amount disagrees with the nominal charge amount.
    ChargeStatus,
    "charge status",
    {
        Pending => "pending",
        Authorized => "authorized",
        PreAuthorized => "pre_authorized",
        Processing => "processing",
        Paid => "paid",
        Underpaid => "underpaid",
        Overpaid => "overpaid",
        Canceled => "canceled",
        Voided => "voided",
        Failed => "failed",
    }
);

//--------------------------------------   TransactionStatus    ------------------------------------------------------
status_enum!(
    /// Status of one money movement attempt. This is the union of every status any supported
    /// acquirer emits, which is why it is much wider than the charge set.
    TransactionStatus,
    "transaction status",
    {
        Pending => "pending",
        PreAuthorized => "pre_authorized",
        Authorized => "authorized",
        Capture => "capture",
        PartialCapture => "partial_capture",
        AuthorizedPendingCapture => "authorized_pending_capture",
        Voided => "voided",
        ChargedBack => "charged_back",
        Refunded => "refunded",
        PartialVoid => "partial_void",
        WithError => "with_error",
        NotAuthorized => "not_authorized",
        Failed => "failed",
        Success => "success",
        Generated => "generated",
        Underpaid => "underpaid",
        Paid => "paid",
        Overpaid => "overpaid",
        PartialRefunded => "partial_refunded",
        WaitingPayment => "waiting_payment",
        PendingRefund => "pending_refund",
        Expired => "expired",
        PendingReview => "pending_review",
        Analyzing => "analyzing",
        WaitingCapture => "waiting_capture",
        Canceled => "canceled",
    }
);

//--------------------------------------    TransactionType     ------------------------------------------------------
status_enum!(
    /// Payment instrument behind a transaction.
    TransactionType,
    "transaction type",
    {
        Credit => "credit",
        Boleto => "boleto",
        Pix => "pix",
    }
);

//--------------------------------------       Customer        -------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub gateway_id: Option<CustomerId>,
    /// Identifier of the customer on the host platform, when known.
    pub code: Option<String>,
    name: String,
    email: String,
}

impl Customer {
    pub fn new(name: &str, email: &str) -> Self {
        let mut customer = Self::default();
        customer.set_name(name);
        customer.set_email(email);
        customer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gateways cap the name field at 64 characters; anything longer is truncated on the way in.
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate(name, 64);
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = truncate(email, 64);
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

//--------------------------------------      CardSummary      -------------------------------------------------------
/// The card digits the gateway is allowed to echo back: brand plus first six and last four.
/// A full PAN never enters the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub brand: String,
    pub first_six_digits: String,
    pub last_four_digits: String,
    pub holder_name: Option<String>,
}

//--------------------------------------       SavedCard       -------------------------------------------------------
/// A card kept on file for a customer after a successful payment, for one-click repeat purchases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCard {
    pub customer_id: CustomerId,
    pub card: CardSummary,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Transaction      -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Internal id of the persisted row, when the transaction has been stored before.
    pub id: Option<i64>,
    pub gateway_id: TransactionId,
    pub charge_id: Option<ChargeId>,
    pub tran_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Cents,
    pub paid_amount: Cents,
    pub acquirer_name: String,
    pub acquirer_message: String,
    pub acquirer_nsu: String,
    pub acquirer_tid: String,
    pub acquirer_auth_code: String,
    pub created_at: DateTime<Utc>,
    pub card: Option<CardSummary>,
    pub boleto_url: Option<String>,
    raw: Option<serde_json::Value>,
}

impl Transaction {
    pub fn new(
        gateway_id: TransactionId,
        tran_type: TransactionType,
        status: TransactionStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            gateway_id,
            charge_id: None,
            tran_type,
            status,
            amount: Cents::default(),
            paid_amount: Cents::default(),
            acquirer_name: String::new(),
            acquirer_message: String::new(),
            acquirer_nsu: String::new(),
            acquirer_tid: String::new(),
            acquirer_auth_code: String::new(),
            created_at,
            card: None,
            boleto_url: None,
            raw: None,
        }
    }

    /// Stores the normalized payload this transaction was built from. The snapshot is written once
    /// at construction time and is immutable afterwards; later calls are ignored.
    pub fn record_snapshot(&mut self, raw: serde_json::Value) {
        if self.raw.is_none() {
            self.raw = Some(raw);
        }
    }

    pub fn snapshot(&self) -> Option<&serde_json::Value> {
        self.raw.as_ref()
    }
}

//--------------------------------------   ChargeStateError    -------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum ChargeStateError {
    #[error("Payment amount must be positive, got {0}")]
    NonPositiveAmount(Cents),
    #[error("Canceled ({canceled}) plus refunded ({refunded}) amounts cannot exceed the charge amount {amount}")]
    OverCancellation { amount: Cents, canceled: Cents, refunded: Cents },
}

//--------------------------------------        Charge         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Internal id of the persisted row, when the charge has been stored before.
    pub id: Option<i64>,
    pub gateway_id: ChargeId,
    /// Back-reference to the owning order. Not ownership: the order aggregate owns its charges.
    pub order_id: Option<OrderId>,
    /// Authorization code reported by the gateway.
    pub code: Option<String>,
    pub status: ChargeStatus,
    pub amount: Cents,
    pub paid_amount: Cents,
    pub canceled_amount: Cents,
    pub refunded_amount: Cents,
    pub customer: Option<Customer>,
    /// Opaque key/value blob the platform attached when the charge was created.
    pub metadata: Option<serde_json::Value>,
    transactions: Vec<Transaction>,
}

impl Charge {
    pub fn new(gateway_id: ChargeId, status: ChargeStatus, amount: Cents) -> Self {
        Self {
            id: None,
            gateway_id,
            order_id: None,
            code: None,
            status,
            amount,
            paid_amount: Cents::default(),
            canceled_amount: Cents::default(),
            refunded_amount: Cents::default(),
            customer: None,
            metadata: None,
            transactions: Vec::new(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Attaches a transaction. Re-attaching a transaction with a gateway id the charge already
    /// knows replaces the stored one, so repeated notifications do not pile up duplicates.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        match self.transactions.iter_mut().find(|t| t.gateway_id == transaction.gateway_id) {
            Some(existing) => *existing = transaction,
            None => self.transactions.push(transaction),
        }
    }

    /// The authorization/request transaction. At most one exists per charge and it is always the
    /// first one attached; any further transactions are acquirer confirmations.
    pub fn transaction_request(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    /// Applies a confirmed payment. The paid amount accumulates and the status is re-derived from
    /// the comparison against the nominal amount.
    pub fn pay(&mut self, amount: Cents) -> Result<(), ChargeStateError> {
        if amount.value() <= 0 {
            return Err(ChargeStateError::NonPositiveAmount(amount));
        }
        self.paid_amount += amount;
        self.status = match self.paid_amount.value().cmp(&self.amount.value()) {
            std::cmp::Ordering::Less => ChargeStatus::Underpaid,
            std::cmp::Ordering::Equal => ChargeStatus::Paid,
            std::cmp::Ordering::Greater => ChargeStatus::Overpaid,
        };
        Ok(())
    }

    /// Sets the paid amount directly without running the `pay` accounting. Used by the charge
    /// reconciler to tolerate gateways that skip the intermediate pay event; the gateway-reported
    /// status is left untouched.
    pub fn seed_paid_amount(&mut self, amount: Cents) {
        self.paid_amount = amount;
    }

    pub fn cancel(&mut self, amount: Cents) -> Result<(), ChargeStateError> {
        if amount.value() <= 0 {
            return Err(ChargeStateError::NonPositiveAmount(amount));
        }
        let canceled = self.canceled_amount + amount;
        if (canceled + self.refunded_amount).value() > self.amount.value() {
            return Err(ChargeStateError::OverCancellation {
                amount: self.amount,
                canceled,
                refunded: self.refunded_amount,
            });
        }
        self.canceled_amount = canceled;
        if self.canceled_amount == self.amount {
            self.status = ChargeStatus::Canceled;
        }
        Ok(())
    }

    pub fn refund(&mut self, amount: Cents) -> Result<(), ChargeStateError> {
        if amount.value() <= 0 {
            return Err(ChargeStateError::NonPositiveAmount(amount));
        }
        let refunded = self.refunded_amount + amount;
        if (self.canceled_amount + refunded).value() > self.amount.value() {
            return Err(ChargeStateError::OverCancellation {
                amount: self.amount,
                canceled: self.canceled_amount,
                refunded,
            });
        }
        self.refunded_amount = refunded;
        Ok(())
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Internal id of the persisted row, when the order has been stored before.
    pub id: Option<i64>,
    pub gateway_id: OrderId,
    /// The order identifier on the host platform (increment id).
    pub code: Option<String>,
    pub status: OrderStatus,
    pub customer: Option<Customer>,
    pub paid_amount: Cents,
    pub canceled_amount: Cents,
    pub refunded_amount: Cents,
    charges: Vec<Charge>,
}

impl Order {
    pub fn new(gateway_id: OrderId, status: OrderStatus) -> Self {
        Self {
            id: None,
            gateway_id,
            code: None,
            status,
            customer: None,
            paid_amount: Cents::default(),
            canceled_amount: Cents::default(),
            refunded_amount: Cents::default(),
            charges: Vec::new(),
        }
    }

    pub fn charges(&self) -> &[Charge] {
        &self.charges
    }

    pub fn add_charge(&mut self, charge: Charge) {
        match self.charges.iter_mut().find(|c| c.gateway_id == charge.gateway_id) {
            Some(existing) => *existing = charge,
            None => self.charges.push(charge),
        }
    }

    pub fn total_amount(&self) -> Cents {
        self.charges.iter().map(|c| c.amount).sum()
    }

    /// What is still owed on the order. Clamped at zero: overpayment never turns the balance
    /// negative, it is tracked on the overpaid charge instead.
    pub fn amount_due(&self) -> Cents {
        let due = self.total_amount().value() - self.paid_amount.value() - self.canceled_amount.value();
        Cents::from(due.max(0))
    }

    /// Re-derives the order totals from the charge list. Totals only move through this method or
    /// through explicit refund/cancel application, which keeps them monotonic otherwise.
    pub fn sync_totals_from_charges(&mut self) {
        self.paid_amount = self.charges.iter().map(|c| c.paid_amount).sum();
        self.canceled_amount = self.charges.iter().map(|c| c.canceled_amount).sum();
        self.refunded_amount = self.charges.iter().map(|c| c.refunded_amount).sum();
    }
}
