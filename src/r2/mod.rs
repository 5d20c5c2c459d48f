//! R2 module - S3-compatible storage operations
//!
//! This module is organized into submodules:
//! - `types`: Client creation and SDK error mapping
//! - `list`: Paginated list operations
//! - `objects`: Object operations (copy, delete)
//! - `upload`: Streamed PUT and multipart uploads

mod list;
mod objects;
mod types;
mod upload;

pub use types::{create_r2_client, MultipartSettings, R2Store};
