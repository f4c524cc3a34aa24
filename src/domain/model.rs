use serde::Serialize;

/// Upstream reply that passed the shape check, kept as the exact bytes received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub status: u16,
    pub body: Vec<u8>,
}

impl PriceQuote {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    #[cfg(test)]
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

/// JSON document written for every failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}
