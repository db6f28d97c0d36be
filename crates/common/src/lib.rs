//! Shared types for the component authorization workspace
//!
//! Holds the secret wrapper used for the platform app secret and the error
//! type returned by configuration loading.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
