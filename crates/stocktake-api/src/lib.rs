pub mod client;
pub mod credentials;
pub mod error;
mod retry;
pub mod types;

pub use client::InventoryClient;
pub use credentials::{Credential, CredentialSource, CredentialStore, NoReplacement};
pub use error::ApiError;
