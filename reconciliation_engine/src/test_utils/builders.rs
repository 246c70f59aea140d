use rand::{distributions::Alphanumeric, Rng, RngCore};

use crate::charge_record::ChargeRecord;
use crate::gateway_types::{ChargeWebhook, OrderRef, TransactionWebhook};

fn random_suffix() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect::<String>().to_lowercase()
}

//--------------------------------------  ChargeWebhookBuilder  ------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct ChargeWebhookBuilder {
    id: Option<String>,
    status: Option<String>,
    amount: Option<i64>,
    paid_amount: Option<i64>,
    order_id: Option<String>,
    requests: Vec<TransactionWebhook>,
}

impl ChargeWebhookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A minimal well-formed paid-charge payload with randomised ids and amount.
    pub fn random_paid_charge() -> ChargeWebhook {
        ChargeWebhookBuilder::new().build()
    }

    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    pub fn status(&mut self, status: impl Into<String>) -> &mut Self {
        self.status = Some(status.into());
        self
    }

    pub fn amount(&mut self, amount: i64) -> &mut Self {
        self.amount = Some(amount);
        self
    }

    pub fn paid_amount(&mut self, paid_amount: i64) -> &mut Self {
        self.paid_amount = Some(paid_amount);
        self
    }

    pub fn order_id(&mut self, order_id: impl Into<String>) -> &mut Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn request(&mut self, request: TransactionWebhook) -> &mut Self {
        self.requests.push(request);
        self
    }

    pub fn build(&self) -> ChargeWebhook {
        let mut rng = rand::thread_rng();
        ChargeWebhook {
            id: Some(self.id.clone().unwrap_or_else(|| format!("ch_{}", random_suffix()))),
            status: Some(self.status.clone().unwrap_or_else(|| "paid".to_string())),
            amount: Some(self.amount.unwrap_or_else(|| rng.gen_range(100..500_000))),
            paid_amount: self.paid_amount,
            authorization_code: Some(format!("{:06}", rng.next_u32() % 1_000_000)),
            order: self.order_id.clone().map(|id| OrderRef { id }),
            metadata: None,
            customer: None,
            transaction_requests: self.requests.clone(),
        }
    }
}

//------------------------------------ TransactionWebhookBuilder  ----------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct TransactionWebhookBuilder {
    id: Option<String>,
    status: Option<String>,
    payment_type: Option<String>,
    amount: Option<i64>,
    paid_amount: Option<i64>,
    acquirer_message: Option<String>,
}

impl TransactionWebhookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    pub fn status(&mut self, status: impl Into<String>) -> &mut Self {
        self.status = Some(status.into());
        self
    }

    pub fn payment_type(&mut self, payment_type: impl Into<String>) -> &mut Self {
        self.payment_type = Some(payment_type.into());
        self
    }

    pub fn amount(&mut self, amount: i64) -> &mut Self {
        self.amount = Some(amount);
        self
    }

    pub fn paid_amount(&mut self, paid_amount: i64) -> &mut Self {
        self.paid_amount = Some(paid_amount);
        self
    }

    pub fn acquirer_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.acquirer_message = Some(message.into());
        self
    }

    pub fn build(&self) -> TransactionWebhook {
        TransactionWebhook {
            id: Some(self.id.clone().unwrap_or_else(|| format!("tr_{}", random_suffix()))),
            status: Some(self.status.clone().unwrap_or_else(|| "generated".to_string())),
            payment_type: self.payment_type.clone(),
            amount: self.amount,
            paid_amount: self.paid_amount,
            acquirer_name: Some("test_acquirer".to_string()),
            acquirer_message: self.acquirer_message.clone(),
            acquirer_nsu: None,
            acquirer_tid: None,
            acquirer_auth_code: None,
            created_at: Some("2024-06-15T12:00:00".to_string()),
            card: None,
            pdf: None,
            boleto: None,
            pix: None,
        }
    }
}

/// A two-transaction flattened record matching what the storage layer writes for a captured
/// credit charge.
pub fn sample_charge_record() -> ChargeRecord {
    ChargeRecord {
        id: 1,
        gateway_id: format!("ch_{}", random_suffix()),
        order_id: format!("or_{}", random_suffix()),
        code: Some("123456".to_string()),
        amount: 10000,
        paid_amount: 10000,
        canceled_amount: 0,
        refunded_amount: 0,
        status: "paid".to_string(),
        metadata: None,
        customer_id: Some("cus_1".to_string()),
        tran_id: Some("1,2".to_string()),
        tran_gateway_id: Some("tr_1,tr_2".to_string()),
        tran_charge_id: Some("ch_1,ch_1".to_string()),
        tran_amount: Some("10000,10000".to_string()),
        tran_paid_amount: Some("0,10000".to_string()),
        tran_type: Some("credit,credit".to_string()),
        tran_status: Some("generated,capture".to_string()),
        tran_created_at: Some("2024-06-15 12:00:00,2024-06-15 12:00:40".to_string()),
        tran_acquirer_nsu: Some("1,2".to_string()),
        tran_acquirer_tid: Some("t1,t2".to_string()),
        tran_acquirer_auth_code: Some("a1,a2".to_string()),
        tran_acquirer_name: Some("acq,acq".to_string()),
        tran_acquirer_message: Some("Pendente,Aprovado".to_string()),
        tran_boleto_url: None,
        tran_card_data: None,
        tran_data: None,
    }
}
