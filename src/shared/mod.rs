pub mod models;
pub mod state;
pub mod utils;

pub use models::schema;
