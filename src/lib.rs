pub mod api_router;
pub mod config;
pub mod leads;
pub mod sales;
pub mod shared;
