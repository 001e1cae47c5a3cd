pub mod checkout;
pub mod conversion;
pub mod disposition;
pub mod error;
pub mod handlers;
pub mod import;
pub mod selection;
pub mod stats;
pub mod types;
