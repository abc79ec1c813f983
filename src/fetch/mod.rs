mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::{PortalError, Result};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response};

/// Sends one POST with an urlencoded form body and returns the raw response.
///
/// Status handling is left to the caller: the portal maps non-2xx statuses
/// differently per endpoint (auth vs. directory vs. data fetch).
pub async fn post_form<C: HttpClient>(
    client: &C,
    url: &str,
    fields: &[(&str, &str)],
) -> Result<Response> {
    let url = url
        .parse()
        .map_err(|err| PortalError::BadUrl(format!("{url}: {err}")))?;

    let mut req = Request::new(Method::POST, url);
    req.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    *req.body_mut() = Some(encode_form(fields).into());

    Ok(client.execute(req).await?)
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    let mut url = reqwest::Url::parse("http://form.invalid").expect("static url");
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in fields {
            pairs.append_pair(key, value);
        }
    }
    url.query().unwrap_or_default().to_string()
}
