//! Hand-rolled test doubles for the reconciler's ports. Everything records into shared vectors so
//! scenario tests can assert the exact side-effect sequence a handler produced.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::Utc;
use gpc_common::Cents;
use reconciliation_engine::db_types::{
    Charge,
    ChargeId,
    ChargeStatus,
    CardSummary,
    Customer,
    CustomerId,
    Order,
    OrderId,
    OrderStatus,
    SavedCard,
    Transaction,
    TransactionId,
    TransactionStatus,
    TransactionType,
};
use reconciliation_engine::events::EventProducers;
use reconciliation_engine::traits::{
    AcquirerData,
    InvoiceHandling,
    InvoiceState,
    OrderState,
    PlatformInvoice,
    PlatformOrder,
    PortError,
    RecordId,
    Repository,
};
use reconciliation_engine::Reconciler;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

//--------------------------------------   platform order double   ---------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    HistoryComment { message: String, notify: bool },
    Email(String),
    AdditionalInformation { charge_count: usize },
    SetStatus(String),
    SetState(OrderState),
    Saved,
}

#[derive(Clone, Default)]
pub struct RecordingPlatformOrder {
    pub increment_id: String,
    pub status: String,
    /// What `send_email` reports back (platforms may suppress customer notification).
    pub notify_on_email: bool,
    pub effects: Arc<Mutex<Vec<Effect>>>,
}

impl RecordingPlatformOrder {
    pub fn with_status(status: &str) -> Self {
        Self { status: status.to_string(), ..Self::default() }
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn history_comments(&self) -> Vec<String> {
        self.effects()
            .into_iter()
            .filter_map(|e| match e {
                Effect::HistoryComment { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, effect: Effect) {
        self.effects.lock().unwrap().push(effect);
    }
}

impl PlatformOrder for RecordingPlatformOrder {
    fn increment_id(&self) -> String {
        self.increment_id.clone()
    }

    fn status(&self) -> String {
        self.status.clone()
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.push(Effect::SetStatus(status.to_string()));
    }

    fn set_state(&mut self, state: OrderState) {
        self.push(Effect::SetState(state));
    }

    async fn add_history_comment(&mut self, message: &str, notify_customer: bool) -> Result<(), PortError> {
        self.push(Effect::HistoryComment { message: message.to_string(), notify: notify_customer });
        Ok(())
    }

    async fn send_email(&mut self, message: &str) -> Result<bool, PortError> {
        self.push(Effect::Email(message.to_string()));
        Ok(self.notify_on_email)
    }

    async fn add_additional_information(&mut self, charges: &[Charge]) -> Result<(), PortError> {
        self.push(Effect::AdditionalInformation { charge_count: charges.len() });
        Ok(())
    }

    async fn save(&mut self) -> Result<(), PortError> {
        self.push(Effect::Saved);
        Ok(())
    }
}

//--------------------------------------   repository doubles   ------------------------------------------------------
#[derive(Clone)]
pub struct MemoryRepository<T: Clone> {
    pub saved: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self { saved: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl<T: Clone> MemoryRepository<T> {
    pub fn records(&self) -> Vec<T> {
        self.saved.lock().unwrap().clone()
    }
}

pub type MemoryOrders = MemoryRepository<Order>;
pub type MemoryCards = MemoryRepository<SavedCard>;

impl Repository for MemoryOrders {
    type Aggregate = Order;

    async fn save(&self, aggregate: &Order) -> Result<RecordId, PortError> {
        let mut saved = self.saved.lock().unwrap();
        saved.push(aggregate.clone());
        Ok(saved.len() as RecordId)
    }

    async fn find(&self, id: RecordId) -> Result<Option<Order>, PortError> {
        Ok(self.saved.lock().unwrap().get(id as usize - 1).cloned())
    }

    async fn find_by_gateway_id(&self, gateway_id: &str) -> Result<Option<Order>, PortError> {
        Ok(self.saved.lock().unwrap().iter().rev().find(|o| o.gateway_id.as_str() == gateway_id).cloned())
    }

    async fn list(&self, limit: usize, _include_disabled: bool) -> Result<Vec<Order>, PortError> {
        Ok(self.saved.lock().unwrap().iter().take(limit).cloned().collect())
    }
}

impl Repository for MemoryCards {
    type Aggregate = SavedCard;

    async fn save(&self, aggregate: &SavedCard) -> Result<RecordId, PortError> {
        let mut saved = self.saved.lock().unwrap();
        saved.push(aggregate.clone());
        Ok(saved.len() as RecordId)
    }

    async fn find(&self, id: RecordId) -> Result<Option<SavedCard>, PortError> {
        Ok(self.saved.lock().unwrap().get(id as usize - 1).cloned())
    }

    async fn find_by_gateway_id(&self, gateway_id: &str) -> Result<Option<SavedCard>, PortError> {
        Ok(self.saved.lock().unwrap().iter().find(|c| c.customer_id.as_str() == gateway_id).cloned())
    }

    async fn list(&self, limit: usize, _include_disabled: bool) -> Result<Vec<SavedCard>, PortError> {
        Ok(self.saved.lock().unwrap().iter().take(limit).cloned().collect())
    }
}

//--------------------------------------    acquirer double     ------------------------------------------------------
#[derive(Clone, Default)]
pub struct StubAcquirer {
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl StubAcquirer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl AcquirerData for StubAcquirer {
    async fn create_authorization_transaction(&self, order: &Order) -> Result<(), PortError> {
        self.requests.lock().unwrap().push(format!("authorization:{}", order.gateway_id));
        Ok(())
    }

    async fn create_capture_transaction(&self, order: &Order) -> Result<(), PortError> {
        self.requests.lock().unwrap().push(format!("capture:{}", order.gateway_id));
        Ok(())
    }
}

//--------------------------------------     invoice double     ------------------------------------------------------
pub struct StubInvoice {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl PlatformInvoice for StubInvoice {
    fn set_state(&mut self, state: InvoiceState) {
        self.log.lock().unwrap().push(format!("state:{state:?}"));
    }

    async fn save(&mut self) -> Result<(), PortError> {
        self.log.lock().unwrap().push("saved".to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct StubInvoices {
    /// When set, `create_invoice_for` refuses and this is the blocking reason.
    pub refuse_with: Option<String>,
    pub invoice_log: Arc<Mutex<Vec<String>>>,
}

impl StubInvoices {
    pub fn refusing(reason: &str) -> Self {
        Self { refuse_with: Some(reason.to_string()), ..Self::default() }
    }

    pub fn invoice_log(&self) -> Vec<String> {
        self.invoice_log.lock().unwrap().clone()
    }
}

impl InvoiceHandling for StubInvoices {
    type Invoice = StubInvoice;

    async fn invoice_cant_be_created_reason(&self, _order: &Order) -> Option<String> {
        self.refuse_with.clone()
    }

    async fn create_invoice_for(&self, _order: &Order) -> Result<Option<StubInvoice>, PortError> {
        if self.refuse_with.is_some() {
            return Ok(None);
        }
        Ok(Some(StubInvoice { log: self.invoice_log.clone() }))
    }
}

//--------------------------------------       assembly        -------------------------------------------------------
pub struct Harness {
    pub reconciler: Reconciler<MemoryOrders, MemoryCards, StubAcquirer, StubInvoices>,
    pub orders: MemoryOrders,
    pub cards: MemoryCards,
    pub acquirer: StubAcquirer,
    pub invoices: StubInvoices,
}

pub fn harness(invoices: StubInvoices) -> Harness {
    let orders = MemoryOrders::default();
    let cards = MemoryCards::default();
    let acquirer = StubAcquirer::default();
    let reconciler =
        Reconciler::new(orders.clone(), cards.clone(), acquirer.clone(), invoices.clone(), EventProducers::default());
    Harness { reconciler, orders, cards, acquirer, invoices }
}

//--------------------------------------       fixtures        -------------------------------------------------------
pub fn transaction(gateway_id: &str, paid_amount: i64, acquirer_message: &str) -> Transaction {
    let mut tran = Transaction::new(
        TransactionId::from(gateway_id),
        TransactionType::Credit,
        TransactionStatus::Generated,
        Utc::now(),
    );
    tran.paid_amount = Cents::from(paid_amount);
    tran.acquirer_message = acquirer_message.to_string();
    tran
}

pub fn charge_with_request(gateway_id: &str, amount: i64, acquirer_message: &str) -> Charge {
    let mut charge = Charge::new(ChargeId::from(gateway_id), ChargeStatus::Pending, Cents::from(amount));
    charge.add_transaction(transaction(&format!("tr_{gateway_id}"), 0, acquirer_message));
    charge
}

pub fn order_with_charges(gateway_id: &str, status: OrderStatus, charges: Vec<Charge>) -> Order {
    let mut order = Order::new(OrderId::from(gateway_id), status);
    for charge in charges {
        order.add_charge(charge);
    }
    order
}

pub fn card_paying_customer_charge(charge_id: &str, amount: i64) -> Charge {
    let mut charge = Charge::new(ChargeId::from(charge_id), ChargeStatus::Paid, Cents::from(amount));
    let mut customer = Customer::new("Ana Lima", "ana@example.com");
    customer.gateway_id = Some(CustomerId::from("cus_42"));
    charge.customer = Some(customer);
    let mut tran = transaction(&format!("tr_{charge_id}"), amount, "Aprovado");
    tran.status = TransactionStatus::Capture;
    tran.card = Some(CardSummary {
        brand: "mastercard".to_string(),
        first_six_digits: "550000".to_string(),
        last_four_digits: "0004".to_string(),
        holder_name: Some("ANA LIMA".to_string()),
    });
    charge.add_transaction(tran);
    charge
}
