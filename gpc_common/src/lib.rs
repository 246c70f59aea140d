mod helpers;
mod money;

pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{Cents, CentsConversionError, DEFAULT_CURRENCY, DEFAULT_CURRENCY_LOWER};
pub use secret::Secret;
