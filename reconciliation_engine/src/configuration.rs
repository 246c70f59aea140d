//! Per-store configuration with parent/child inheritance.
//!
//! Multi-store platforms configure the gateway per store, but most child stores only override a
//! handful of settings and inherit the rest from a parent account. Inheritance is decided per
//! logical setting, not per whole configuration: the store keeps a set of settings marked
//! "inherited from parent" plus a blanket `inherit_all` switch, and every accessor resolves
//! through [`Configuration::resolve`].
//!
//! One rule takes precedence over everything: a store linked to a hub installation always
//! authenticates with its own credentials. The hub-sensitive settings (client id, secret key, the
//! hub-enabled check itself) never delegate while a hub install id is present, regardless of the
//! inheritance flags.
//!
//! Parent chains are assembled by the configuration repository, which owns the acyclicity
//! guarantee. The resolver still caps traversal depth so a corrupt self-referential chain
//! degrades instead of spinning.

use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use gpc_common::{parse_boolean_flag, Cents, Secret};
use serde::{Deserialize, Serialize};

use crate::db_types::StatusConversionError;

/// Upper bound on parent-chain traversal. Real hierarchies are two or three levels deep; anything
/// beyond this is corrupt data.
const MAX_INHERIT_DEPTH: usize = 16;

//--------------------------------------       Setting        --------------------------------------------------------
/// Every logical setting an accessor can resolve. The inherited-settings set stored per store is
/// expressed in these terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    Enabled,
    BoletoEnabled,
    CreditCardEnabled,
    TestMode,
    CardOperation,
    AntifraudEnabled,
    AntifraudMinAmount,
    InstallmentsEnabled,
    CardStatementDescriptor,
    BoletoInstructions,
    BoletoDueDays,
    BoletoBankCode,
    SaveCards,
    MultiBuyer,
    SendMailEnabled,
    CreateOrderEnabled,
    CardConfigs,
    Recurrence,
    Pix,
    ClientId,
    SecretKey,
    HubEnabled,
}

impl Setting {
    /// Hub-linked stores must always answer these from their own values: inherited credentials
    /// would authenticate as the parent account.
    pub fn is_hub_sensitive(&self) -> bool {
        matches!(self, Setting::ClientId | Setting::SecretKey | Setting::HubEnabled)
    }
}

//--------------------------------------    CardOperation     --------------------------------------------------------
/// How card transactions are executed: authorize now and capture later, or both in one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardOperation {
    AuthOnly,
    #[default]
    AuthAndCapture,
}

impl Display for CardOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardOperation::AuthOnly => write!(f, "auth_only"),
            CardOperation::AuthAndCapture => write!(f, "auth_and_capture"),
        }
    }
}

impl FromStr for CardOperation {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth_only" => Ok(CardOperation::AuthOnly),
            "auth_and_capture" => Ok(CardOperation::AuthAndCapture),
            other => Err(StatusConversionError { kind: "card operation", raw: other.to_string() }),
        }
    }
}

//--------------------------------------    value objects     --------------------------------------------------------
/// Installment terms for one card brand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    pub brand: String,
    pub max_installments: u32,
    pub max_installments_without_interest: u32,
    /// Monthly interest in basis points for installments beyond the interest-free window.
    pub interest_bps: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PixConfig {
    pub enabled: bool,
    pub qr_code_expiration_secs: u32,
    /// Free-form label/value pairs shown next to the QR code at checkout.
    pub additional_information: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    pub enabled: bool,
    pub show_recurrence_currency_widget: bool,
    pub purchase_recurrence_product_with_normal_product: bool,
}

//--------------------------------------    Configuration     --------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    pub id: Option<i64>,
    pub store_id: Option<String>,
    enabled: bool,
    boleto_enabled: bool,
    credit_card_enabled: bool,
    test_mode: bool,
    hub_install_id: Option<String>,
    card_operation: CardOperation,
    client_id: Option<String>,
    secret_key: Option<Secret<String>>,
    merchant_key: Option<Secret<String>>,
    antifraud_enabled: bool,
    antifraud_min_amount: Cents,
    installments_enabled: bool,
    card_statement_descriptor: Option<String>,
    boleto_instructions: Option<String>,
    boleto_due_days: u32,
    boleto_bank_code: Option<String>,
    save_cards: bool,
    multi_buyer: bool,
    send_mail_enabled: bool,
    create_order_enabled: bool,
    card_configs: Vec<CardConfig>,
    recurrence: RecurrenceConfig,
    pix: PixConfig,
    /// Weak back-reference: the parent is owned by the repository that assembled the chain.
    /// Nulled out on serialization, exactly like the stored form.
    #[serde(skip)]
    parent: Option<Arc<Configuration>>,
    inherited: HashSet<Setting>,
    inherit_all: bool,
}

impl Configuration {
    pub fn new(store_id: impl Into<String>) -> Self {
        Self { store_id: Some(store_id.into()), test_mode: true, ..Self::default() }
    }

    //---------------------------------- inheritance machinery ----------------------------------

    pub fn set_parent(&mut self, parent: Arc<Configuration>) {
        self.parent = Some(parent);
    }

    pub fn parent(&self) -> Option<&Configuration> {
        self.parent.as_deref()
    }

    pub fn set_inherited(&mut self, settings: impl IntoIterator<Item = Setting>) {
        self.inherited = settings.into_iter().collect();
    }

    /// Settings marked as inherited. Meaningless without a parent, so reported empty in that case.
    pub fn inherited(&self) -> HashSet<Setting> {
        if self.parent.is_none() {
            return HashSet::new();
        }
        self.inherited.clone()
    }

    pub fn set_inherit_all(&mut self, inherit_all: bool) {
        self.inherit_all = inherit_all;
    }

    pub fn is_inherit_all(&self) -> bool {
        self.parent.is_some() && self.inherit_all
    }

    /// Walks the parent chain and returns the configuration node that answers for `setting`.
    ///
    /// Each hop re-evaluates the delegation rule on the node reached, so a grandparent chain
    /// resolves through every level. Traversal is capped at [`MAX_INHERIT_DEPTH`] hops.
    fn resolve(&self, setting: Setting) -> &Configuration {
        let mut node = self;
        for _ in 0..MAX_INHERIT_DEPTH {
            if !node.delegates(setting) {
                break;
            }
            match node.parent.as_deref() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        node
    }

    fn delegates(&self, setting: Setting) -> bool {
        if setting.is_hub_sensitive() && self.hub_install_id.is_some() {
            return false;
        }
        self.parent.is_some() && (self.inherit_all || self.inherited.contains(&setting))
    }

    //----------------------------------      accessors       ----------------------------------

    pub fn is_enabled(&self) -> bool {
        self.resolve(Setting::Enabled).enabled
    }

    pub fn is_boleto_enabled(&self) -> bool {
        self.resolve(Setting::BoletoEnabled).boleto_enabled
    }

    pub fn is_credit_card_enabled(&self) -> bool {
        self.resolve(Setting::CreditCardEnabled).credit_card_enabled
    }

    pub fn is_test_mode(&self) -> bool {
        self.resolve(Setting::TestMode).test_mode
    }

    pub fn card_operation(&self) -> CardOperation {
        self.resolve(Setting::CardOperation).card_operation
    }

    pub fn is_antifraud_enabled(&self) -> bool {
        self.resolve(Setting::AntifraudEnabled).antifraud_enabled
    }

    /// Orders below this amount skip antifraud screening.
    pub fn antifraud_min_amount(&self) -> Cents {
        self.resolve(Setting::AntifraudMinAmount).antifraud_min_amount
    }

    pub fn is_installments_enabled(&self) -> bool {
        self.resolve(Setting::InstallmentsEnabled).installments_enabled
    }

    pub fn card_statement_descriptor(&self) -> Option<&str> {
        self.resolve(Setting::CardStatementDescriptor).card_statement_descriptor.as_deref()
    }

    pub fn boleto_instructions(&self) -> Option<&str> {
        self.resolve(Setting::BoletoInstructions).boleto_instructions.as_deref()
    }

    pub fn boleto_due_days(&self) -> u32 {
        self.resolve(Setting::BoletoDueDays).boleto_due_days
    }

    pub fn boleto_bank_code(&self) -> Option<&str> {
        self.resolve(Setting::BoletoBankCode).boleto_bank_code.as_deref()
    }

    pub fn is_save_cards(&self) -> bool {
        self.resolve(Setting::SaveCards).save_cards
    }

    pub fn is_multi_buyer(&self) -> bool {
        self.resolve(Setting::MultiBuyer).multi_buyer
    }

    pub fn is_send_mail_enabled(&self) -> bool {
        self.resolve(Setting::SendMailEnabled).send_mail_enabled
    }

    pub fn is_create_order_enabled(&self) -> bool {
        self.resolve(Setting::CreateOrderEnabled).create_order_enabled
    }

    pub fn card_configs(&self) -> &[CardConfig] {
        &self.resolve(Setting::CardConfigs).card_configs
    }

    pub fn recurrence_config(&self) -> &RecurrenceConfig {
        &self.resolve(Setting::Recurrence).recurrence
    }

    pub fn pix_config(&self) -> &PixConfig {
        &self.resolve(Setting::Pix).pix
    }

    pub fn client_id(&self) -> Option<&str> {
        self.resolve(Setting::ClientId).client_id.as_deref()
    }

    pub fn secret_key(&self) -> Option<&Secret<String>> {
        self.resolve(Setting::SecretKey).secret_key.as_ref()
    }

    pub fn merchant_key(&self) -> Option<&Secret<String>> {
        // same credential class as the secret key
        self.resolve(Setting::SecretKey).merchant_key.as_ref()
    }

    pub fn is_hub_enabled(&self) -> bool {
        self.resolve(Setting::HubEnabled).hub_install_id.is_some()
    }

    pub fn hub_install_id(&self) -> Option<&str> {
        self.hub_install_id.as_deref()
    }

    //----------------------------------       mutators       ----------------------------------

    /// Platform admin panels deliver this as a string flag.
    pub fn set_enabled_flag(&mut self, raw: Option<String>) {
        self.enabled = parse_boolean_flag(raw, false);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_boleto_enabled(&mut self, enabled: bool) {
        self.boleto_enabled = enabled;
    }

    pub fn set_credit_card_enabled(&mut self, enabled: bool) {
        self.credit_card_enabled = enabled;
    }

    pub fn set_test_mode_flag(&mut self, raw: Option<String>) {
        self.test_mode = parse_boolean_flag(raw, true);
    }

    pub fn set_hub_install_id(&mut self, install_id: Option<String>) {
        self.hub_install_id = install_id.filter(|id| !id.is_empty());
    }

    pub fn set_card_operation(&mut self, operation: CardOperation) {
        self.card_operation = operation;
    }

    pub fn set_client_id(&mut self, client_id: Option<String>) {
        self.client_id = client_id;
    }

    pub fn set_secret_key(&mut self, key: Option<Secret<String>>) {
        self.secret_key = key;
    }

    pub fn set_merchant_key(&mut self, key: Option<Secret<String>>) {
        self.merchant_key = key;
    }

    pub fn set_antifraud(&mut self, enabled: bool, min_amount: Cents) {
        self.antifraud_enabled = enabled;
        self.antifraud_min_amount = min_amount;
    }

    pub fn set_installments_enabled(&mut self, enabled: bool) {
        self.installments_enabled = enabled;
    }

    pub fn set_card_statement_descriptor(&mut self, descriptor: Option<String>) {
        self.card_statement_descriptor = descriptor;
    }

    pub fn set_boleto_terms(&mut self, instructions: Option<String>, due_days: u32, bank_code: Option<String>) {
        self.boleto_instructions = instructions;
        self.boleto_due_days = due_days;
        self.boleto_bank_code = bank_code;
    }

    pub fn set_save_cards(&mut self, save_cards: bool) {
        self.save_cards = save_cards;
    }

    pub fn set_multi_buyer(&mut self, multi_buyer: bool) {
        self.multi_buyer = multi_buyer;
    }

    pub fn set_send_mail_enabled(&mut self, enabled: bool) {
        self.send_mail_enabled = enabled;
    }

    pub fn set_create_order_enabled(&mut self, enabled: bool) {
        self.create_order_enabled = enabled;
    }

    pub fn set_card_configs(&mut self, configs: Vec<CardConfig>) {
        self.card_configs = configs;
    }

    pub fn set_recurrence_config(&mut self, config: RecurrenceConfig) {
        self.recurrence = config;
    }

    pub fn set_pix_config(&mut self, config: PixConfig) {
        self.pix = config;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parent() -> Arc<Configuration> {
        let mut parent = Configuration::new("store_parent");
        parent.set_enabled(true);
        parent.set_boleto_enabled(true);
        parent.set_client_id(Some("parent_client".to_string()));
        parent.set_secret_key(Some(Secret::new("parent_secret".to_string())));
        parent.set_boleto_terms(Some("Pay within 3 days".to_string()), 3, Some("033".to_string()));
        Arc::new(parent)
    }

    #[test]
    fn no_override_and_no_inherit_all_answers_from_own_values() {
        let mut child = Configuration::new("store_child");
        child.set_parent(parent());
        assert!(!child.is_enabled());
        assert!(child.client_id().is_none());
        assert_eq!(child.boleto_due_days(), 0);
    }

    #[test]
    fn settings_in_the_inherited_set_delegate_to_the_parent() {
        let mut child = Configuration::new("store_child");
        child.set_parent(parent());
        child.set_inherited([Setting::Enabled, Setting::BoletoDueDays]);
        assert!(child.is_enabled());
        assert_eq!(child.boleto_due_days(), 3);
        // not in the set: stays local
        assert!(!child.is_boleto_enabled());
    }

    #[test]
    fn inherit_all_delegates_every_setting_with_a_parent() {
        let mut child = Configuration::new("store_child");
        child.set_parent(parent());
        child.set_inherit_all(true);
        assert!(child.is_enabled());
        assert!(child.is_boleto_enabled());
        assert_eq!(child.client_id(), Some("parent_client"));
        assert_eq!(child.secret_key().unwrap().reveal(), "parent_secret");
    }

    #[test]
    fn inherit_flags_without_a_parent_are_inert() {
        let mut orphan = Configuration::new("store_orphan");
        orphan.set_inherit_all(true);
        orphan.set_inherited([Setting::Enabled]);
        assert!(!orphan.is_enabled());
        assert!(!orphan.is_inherit_all());
        assert!(orphan.inherited().is_empty());
    }

    #[test]
    fn hub_linked_stores_keep_their_own_credentials() {
        let mut child = Configuration::new("store_child");
        child.set_parent(parent());
        child.set_inherit_all(true);
        child.set_hub_install_id(Some("7f3c0d9e".to_string()));
        child.set_client_id(Some("own_client".to_string()));

        assert_eq!(child.client_id(), Some("own_client"));
        assert!(child.secret_key().is_none(), "own (absent) key, not the parent's");
        assert!(child.is_hub_enabled());
        // non-credential settings still inherit
        assert!(child.is_boleto_enabled());
    }

    #[test]
    fn grandparent_chains_resolve_through_every_level() {
        let mut middle = Configuration::new("store_middle");
        middle.set_parent(parent());
        middle.set_inherit_all(true);
        let mut child = Configuration::new("store_child");
        child.set_parent(Arc::new(middle));
        child.set_inherited([Setting::BoletoInstructions]);
        assert_eq!(child.boleto_instructions(), Some("Pay within 3 days"));
    }

    #[test]
    fn traversal_depth_is_capped_on_degenerate_chains() {
        // A chain deeper than any sane hierarchy: only the far root holds enabled=true. The walk
        // must terminate at the depth cap instead of following the chain indefinitely.
        let mut root = Configuration::new("store_root");
        root.set_enabled(true);
        let mut node = Arc::new(root);
        for depth in 0..24 {
            let mut child = Configuration::new(format!("store_{depth}"));
            child.set_parent(node);
            child.set_inherit_all(true);
            node = Arc::new(child);
        }
        assert!(!node.is_enabled(), "the cap must stop the walk before the far root");
    }

    #[test]
    fn serialized_form_drops_the_parent_link() {
        let mut child = Configuration::new("store_child");
        child.set_parent(parent());
        child.set_inherited([Setting::Enabled]);
        let json = serde_json::to_value(&child).unwrap();
        assert!(json.get("parent").is_none());
        assert_eq!(json["inherited"], serde_json::json!(["enabled"]));

        let restored: Configuration = serde_json::from_value(json).unwrap();
        assert!(restored.parent().is_none());
        // flags survive the round trip and re-arm once the repository re-links the parent
        let mut restored = restored;
        restored.set_parent(parent());
        assert!(restored.is_enabled());
    }
}
