//! User-facing error taxonomy
//!
//! Only user input problems are modeled as typed errors. Lookup failures are
//! `None`/`false` sentinels and persistence/network failures are `anyhow` errors
//! that get logged.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Please enter a company name")]
    EmptyCompanyName,

    #[error("Please click on the canvas to set a position first")]
    NoPosition,

    #[error("Select at least {needed} cards first")]
    NotEnoughSelected { needed: usize },
}
