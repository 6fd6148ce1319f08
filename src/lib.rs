//! Shelf application library
//!
//! Feature modules for books and authors, the store error type and the
//! request coercion helpers they share.

pub mod error;
pub mod modules;
pub mod utils;

pub use error::{StoreError, StoreResult};
