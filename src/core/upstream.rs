use crate::domain::model::PriceQuote;
use crate::domain::ports::PriceSource;
use crate::utils::error::{RelayError, Result, UpstreamError, UpstreamResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_UPSTREAM_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd";

/// Largest upstream body the relay will buffer.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Asset ids and currencies the upstream reply must quote, read from the
/// `ids` and `vs_currencies` query parameters of the upstream URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedQuotes {
    pub assets: Vec<String>,
    pub currencies: Vec<String>,
}

impl ExpectedQuotes {
    pub fn from_url(url: &Url) -> Self {
        let mut expected = Self::default();

        for (key, value) in url.query_pairs() {
            let names = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_ascii_lowercase);

            match key.as_ref() {
                "ids" => expected.assets.extend(names),
                "vs_currencies" => expected.currencies.extend(names),
                _ => {}
            }
        }

        expected
    }
}

/// `PriceSource` backed by one fixed GET against the coin price API.
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: Client,
    url: Url,
    expected: ExpectedQuotes,
    timeout: Duration,
}

impl HttpPriceSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigError {
                message: format!("failed to build upstream HTTP client: {}", e),
            })?;

        let expected = ExpectedQuotes::from_url(&url);

        Ok(Self {
            client,
            url,
            expected,
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                after: self.timeout,
            }
        } else {
            UpstreamError::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}

fn too_large() -> UpstreamError {
    UpstreamError::Malformed {
        reason: format!("body exceeds {} bytes", MAX_BODY_BYTES),
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch_quote(&self) -> UpstreamResult {
        tracing::debug!("Requesting price from: {}", self.url);
        let mut response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        tracing::debug!("Upstream response status: {}", status);

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_BODY_BYTES as u64)
        {
            return Err(too_large());
        }

        // Chunked replies carry no length, so the cap is enforced while reading too.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        check_shape(&body, &self.expected)?;

        Ok(PriceQuote::new(status.as_u16(), body))
    }

    fn endpoint(&self) -> &str {
        self.url.as_str()
    }
}

/// Accepts `{"<asset>": {"<currency>": <number>, ...}, ...}` holding every
/// expected asset/currency pair. With nothing expected, at least one quote
/// must be present.
pub fn check_shape(body: &[u8], expected: &ExpectedQuotes) -> std::result::Result<(), UpstreamError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| UpstreamError::Malformed {
        reason: format!("invalid JSON: {}", e),
    })?;

    let Value::Object(assets) = value else {
        return Err(UpstreamError::Malformed {
            reason: "expected a JSON object".to_string(),
        });
    };

    let mut quoted = 0;
    for (asset, quotes) in &assets {
        let Some(quotes) = quotes.as_object() else {
            return Err(UpstreamError::Malformed {
                reason: format!("'{}' is not an object", asset),
            });
        };

        if let Some((currency, _)) = quotes.iter().find(|(_, v)| !v.is_number()) {
            return Err(UpstreamError::Malformed {
                reason: format!("'{}.{}' is not a number", asset, currency),
            });
        }
        quoted += quotes.len();
    }

    if quoted == 0 {
        return Err(UpstreamError::Malformed {
            reason: "no price entries".to_string(),
        });
    }

    for asset in &expected.assets {
        let Some(quotes) = assets.get(asset).and_then(Value::as_object) else {
            return Err(UpstreamError::Malformed {
                reason: format!("missing '{}'", asset),
            });
        };

        for currency in &expected.currencies {
            if !quotes.contains_key(currency) {
                return Err(UpstreamError::Malformed {
                    reason: format!("missing '{}.{}'", asset, currency),
                });
            }
        }
    }

    Ok(())
}
