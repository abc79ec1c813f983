//! Failure taxonomy for portal interactions.
//!
//! `Auth` and `Directory` abort a run before the day/device loop starts;
//! `Fetch` and `Transport` inside the loop are logged and the device/day
//! pair is skipped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("authentication rejected with status {status}: {body}")]
    Auth {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("device directory unusable: {0}")]
    Directory(String),

    #[error("{context} returned status {status}")]
    Fetch {
        status: reqwest::StatusCode,
        context: String,
    },

    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request url: {0}")]
    BadUrl(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;
