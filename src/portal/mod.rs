//! Trait and types for the GreenFeed vendor portal.

mod client;

pub use client::PortalClient;

use crate::error::Result;
use chrono::NaiveDate;
use std::fmt;

/// Account credentials supplied by the caller (environment in the CLI).
/// Never persisted; the username is also stamped into every normalized row.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Which raw event stream to download from the `getraw` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Feed,
    Rfid,
}

impl RawKind {
    /// Wire value for the `d` query parameter, also the artifact file stem.
    pub fn as_str(self) -> &'static str {
        match self {
            RawKind::Feed => "feed",
            RawKind::Rfid => "rfid",
        }
    }
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction over the vendor portal, so runs can be driven against a stub.
///
/// A token is obtained once per run via [`login`](PortalApi::login) and
/// shared read-only by every subsequent call.
#[async_trait::async_trait]
pub trait PortalApi {
    /// Exchanges credentials for an opaque bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<String>;

    /// Returns the device identifiers owned by the account.
    async fn owned_systems(&self, token: &str) -> Result<Vec<String>>;

    /// Downloads the per-visit emission summary for one device over one day
    /// window, as raw delimited text.
    async fn emissions(
        &self,
        token: &str,
        device: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String>;

    /// Downloads one raw event stream for one device over one day window.
    async fn raw(
        &self,
        token: &str,
        kind: RawKind,
        device: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String>;
}
