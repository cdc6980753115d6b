// src/sheets/mod.rs
pub mod auth;
pub mod client;
pub mod value;
pub mod writer;

pub use auth::ServiceAccountKey;
pub use client::{Endpoints, SheetsClient};
pub use value::CellValue;
pub use writer::{render_results, write_results};
