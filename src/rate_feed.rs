use std::str::FromStr;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ServiceError, ServiceResult};

const RATE_SCALE: u32 = 6;
/// Exclusive bound of a `NUMERIC(20, 6)` column (14 integer digits).
const RATE_UPPER_BOUND: i64 = 100_000_000_000_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedDocument {
    #[serde(default)]
    chart_name: Option<String>,
    bpi: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    description: String,
    rate: Value,
    rate_float: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub code: String,
    pub symbol: String,
    pub description: String,
    pub rate: Decimal,
    pub rate_float: Decimal,
}

/// Point-in-time rates, in the order the feed listed them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RateSnapshot {
    pub entries: Vec<SnapshotEntry>,
}

#[async_trait]
pub trait RateFeed: Send + Sync {
    async fn fetch_snapshot(&self) -> ServiceResult<RateSnapshot>;
}

/// Fetches snapshots over HTTP with a client owned by the hosting process.
pub struct HttpRateFeed {
    client: Client,
    url: String,
}

impl HttpRateFeed {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn load_json(&self) -> ServiceResult<String> {
        let resp = self.client.get(&self.url).send().await.map_err(|err| {
            warn!("Rate feed request to {} failed: {}", self.url, err);
            ServiceError::FeedUnavailable {
                status: None,
                message: err.to_string(),
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Rate feed {} answered {}", self.url, status);
            return Err(ServiceError::FeedUnavailable {
                status: Some(status.as_u16()),
                message: format!("upstream answered {}", status),
            });
        }

        resp.text()
            .await
            .map_err(|err| ServiceError::FeedUnavailable {
                status: None,
                message: err.to_string(),
            })
    }
}

#[async_trait]
impl RateFeed for HttpRateFeed {
    async fn fetch_snapshot(&self) -> ServiceResult<RateSnapshot> {
        let text = self.load_json().await?;
        parse_snapshot(&text)
    }
}

pub fn parse_snapshot(text: &str) -> ServiceResult<RateSnapshot> {
    let document: FeedDocument =
        serde_json::from_str(text).map_err(|err| ServiceError::FeedFormat(err.to_string()))?;
    debug!(
        "Parsing {} entries of chart {:?}",
        document.bpi.len(),
        document.chart_name
    );

    let mut entries = Vec::with_capacity(document.bpi.len());
    for (key, value) in document.bpi {
        let code = normalize_code(&key)?;
        let entry: FeedEntry = serde_json::from_value(value)
            .map_err(|err| ServiceError::FeedFormat(format!("entry {}: {}", key, err)))?;
        entries.push(SnapshotEntry {
            rate: parse_amount(&code, &entry.rate)?,
            rate_float: parse_amount(&code, &entry.rate_float)?,
            code,
            symbol: entry.symbol,
            description: entry.description,
        });
    }

    Ok(RateSnapshot { entries })
}

fn normalize_code(key: &str) -> ServiceResult<String> {
    let code = key.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ServiceError::FeedFormat(format!(
            "'{}' is not a three-letter currency code",
            key
        )));
    }
    Ok(code)
}

/// The feed formats rates like "57,227.332"; group separators are dropped.
fn normalize_decimal_string(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Numbers keep their literal digits; strings may carry group separators.
fn parse_amount(code: &str, amount: &Value) -> ServiceResult<Decimal> {
    let text = match amount {
        Value::Number(number) => number.to_string(),
        Value::String(text) => normalize_decimal_string(text),
        other => {
            return Err(ServiceError::FeedFormat(format!(
                "{}: rate must be a number or a string, got {}",
                code, other
            )));
        }
    };
    let value = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|err| {
            ServiceError::FeedFormat(format!("{}: cannot parse rate '{}': {}", code, text, err))
        })?
        .round_dp(RATE_SCALE);

    if value.abs() >= Decimal::from(RATE_UPPER_BOUND) {
        return Err(ServiceError::FeedFormat(format!(
            "{}: rate {} exceeds the stored precision",
            code, value
        )));
    }
    Ok(value)
}
