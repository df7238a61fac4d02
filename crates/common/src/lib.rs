//! Types shared by the session library and the host agent

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
