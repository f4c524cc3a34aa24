use crate::utils::error::UpstreamResult;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn upstream_url(&self) -> &str;
    fn upstream_timeout_ms(&self) -> u64;
}

/// Source of the price payload served on the relay route.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_quote(&self) -> UpstreamResult;

    fn endpoint(&self) -> &str;
}
