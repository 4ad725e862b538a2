//! Authentication module
//!
//! Supports a personal access token supplied in the config, or a
//! password-grant exchange against the Solarvista token endpoint.
//!
//! The `Authenticator` owns the run's token cache. A token rejected with 401
//! is discarded and re-acquired through the exchange.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{CachedToken, Credentials, PasswordGrant};

#[cfg(test)]
mod tests;
