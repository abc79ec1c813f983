use crate::error::{PortalError, Result};
use crate::fetch::{HttpClient, post_form};
use crate::portal::{Credentials, PortalApi, RawKind};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://portal.c-lockinc.com/api";

/// Preamble lines before the first device row in the `getownedsystems`
/// response. Observed as 2; the data endpoints only carry 1. The vendor's
/// preamble length is not a stable contract, so this stays a knob.
pub const DIRECTORY_HEADER_SKIP: usize = 2;

/// HTTP client for the C-Lock GreenFeed portal.
///
/// Every endpoint is a POST carrying the token as a form field, with the
/// remaining parameters in the query string.
pub struct PortalClient<C> {
    http: C,
    base_url: String,
    directory_header_skip: usize,
}

impl<C> PortalClient<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            directory_header_skip: DIRECTORY_HEADER_SKIP,
        }
    }

    /// Points the client at a different portal root (staging, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_directory_header_skip(mut self, lines: usize) -> Self {
        self.directory_header_skip = lines;
        self
    }

    /// Formats the vendor's expected day window: 00:00 on the start day to
    /// 12:00 on the day after, with a literal `%20` between date and time.
    /// The asymmetric end is observed portal behavior.
    fn window(start: NaiveDate, end: NaiveDate) -> (String, String) {
        (format!("{start}%2000:00:00"), format!("{end}%2012:00:00"))
    }
}

impl<C: HttpClient> PortalClient<C> {
    async fn download(&self, url: &str, token: &str, context: &str) -> Result<String> {
        let resp = post_form(&self.http, url, &[("token", token)]).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PortalError::Fetch {
                status,
                context: context.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl<C: HttpClient> PortalApi for PortalClient<C> {
    async fn login(&self, credentials: &Credentials) -> Result<String> {
        let url = format!("{}/login", self.base_url);
        let resp = post_form(
            &self.http,
            &url,
            &[
                ("user", credentials.user.as_str()),
                ("pass", credentials.password.as_str()),
            ],
        )
        .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PortalError::Auth { status, body });
        }

        Ok(resp.text().await?.trim().to_string())
    }

    async fn owned_systems(&self, token: &str) -> Result<Vec<String>> {
        let url = format!("{}/getownedsystems?d=greenfeed", self.base_url);
        let resp = post_form(&self.http, &url, &[("token", token)]).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PortalError::Directory(format!(
                "listing returned status {status}"
            )));
        }

        let body = resp.text().await?;
        let devices = parse_device_lines(&body, self.directory_header_skip);
        if devices.is_empty() {
            return Err(PortalError::Directory(
                "no device identifiers in listing".to_string(),
            ));
        }

        debug!(devices = devices.len(), "device directory fetched");
        Ok(devices)
    }

    async fn emissions(
        &self,
        token: &str,
        device: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String> {
        let (st, et) = Self::window(start, end);
        let url = format!(
            "{}/getemissions?d=visits&fids={device}&st={st}&et={et}&preliminary=0",
            self.base_url
        );
        self.download(&url, token, "getemissions").await
    }

    async fn raw(
        &self,
        token: &str,
        kind: RawKind,
        device: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String> {
        let (st, et) = Self::window(start, end);
        let url = format!(
            "{}/getraw?d={}&fids={device}&st={st}&et={et}",
            self.base_url,
            kind.as_str()
        );
        self.download(&url, token, "getraw").await
    }
}

/// Extracts the leading identifier field from each device row, after the
/// configured preamble.
fn parse_device_lines(body: &str, header_skip: usize) -> Vec<String> {
    body.trim()
        .lines()
        .skip(header_skip)
        .filter_map(|line| line.split(',').next())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_formats_asymmetric_day() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let (st, et) = PortalClient::<crate::fetch::BasicClient>::window(start, end);
        assert_eq!(st, "2024-01-01%2000:00:00");
        assert_eq!(et, "2024-01-02%2012:00:00");
    }

    #[test]
    fn test_parse_device_lines_skips_preamble() {
        let body = "Owned systems\nFeederID,Name\n512,Barn A\n513,Barn B\n";
        assert_eq!(parse_device_lines(body, 2), vec!["512", "513"]);
    }

    #[test]
    fn test_parse_device_lines_ignores_blank_ids() {
        let body = "header\nheader\n512,Barn A\n,missing id\n";
        assert_eq!(parse_device_lines(body, 2), vec!["512"]);
    }

    #[test]
    fn test_parse_device_lines_empty_after_skip() {
        let body = "header\nheader\n";
        assert!(parse_device_lines(body, 2).is_empty());
    }
}
