//! Registry client for fetching raw package documents.

mod client;
mod error;

pub use client::{NpmRegistry, Registry};
pub use error::RegistryError;
