pub mod error;
pub mod models;

pub use error::{ClarionError, ErrorCategory, Result};
pub use models::*;
