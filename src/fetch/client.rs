use async_trait::async_trait;
use reqwest::{Request, Response};

/// Low-level HTTP seam. The portal client is generic over this so tests can
/// substitute a canned transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
