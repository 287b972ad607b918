//! Typed views of the JSON records exchanged with the POS API.
//!
//! The API owns these records. Each struct names only the fields this
//! application reads or writes; everything else is kept in a flattened
//! `extra` map so unknown fields survive a round trip and never cause a
//! parse failure.

pub mod analytics;
pub mod customer;
pub mod product;
pub mod sale;
pub mod swap;

pub use analytics::{Alert, AuditLogEntry, PeriodAggregate, ProfitLossReport, QuickStats};
pub use customer::{Customer, CustomerInput, CustomerValidationError};
pub use product::Product;
pub use sale::{PaymentMethod, SaleLine, SaleRequest};
pub use swap::{CustomerDevice, SwapRequest};

/// Unknown fields preserved from an API record.
pub type Extra = serde_json::Map<String, serde_json::Value>;
