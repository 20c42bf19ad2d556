//! Fixtures shared by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Currency, Language, NewCurrency, NewLanguage};
use crate::rate_feed::{RateFeed, RateSnapshot, SnapshotEntry};
use crate::store::memory::MemoryStore;
use crate::store::{CurrencyStore, LanguageStore};

type Responder = Box<dyn Fn() -> ServiceResult<RateSnapshot> + Send + Sync>;

pub struct StubFeed {
    respond: Responder,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubFeed {
    pub fn returning(snapshot: RateSnapshot) -> Self {
        Self {
            respond: Box::new(move || Ok(snapshot.clone())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(status: Option<u16>) -> Self {
        Self {
            respond: Box::new(move || {
                Err(ServiceError::FeedUnavailable {
                    status,
                    message: "stubbed outage".into(),
                })
            }),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn malformed() -> Self {
        Self {
            respond: Box::new(|| Err(ServiceError::FeedFormat("stubbed garbage".into()))),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateFeed for StubFeed {
    async fn fetch_snapshot(&self) -> ServiceResult<RateSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)()
    }
}

pub fn snapshot(rates: &[(&str, Decimal)]) -> RateSnapshot {
    RateSnapshot {
        entries: rates
            .iter()
            .map(|(code, rate)| SnapshotEntry {
                code: code.to_string(),
                symbol: format!("{code}$"),
                description: format!("{code} description"),
                rate: *rate,
                rate_float: *rate,
            })
            .collect(),
    }
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub async fn seed_currency(store: &MemoryStore, code: &str, rate: Decimal) -> Currency {
    store
        .insert_currency(&NewCurrency {
            code: code.to_string(),
            symbol: "$".to_string(),
            description: format!("{code} description"),
            rate,
            rate_float: rate,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
}

pub async fn seed_language(store: &MemoryStore, lang_code: &str, lang_name: &str) -> Language {
    store
        .insert_language(
            &NewLanguage {
                lang_code: lang_code.to_string(),
                lang_name: lang_name.to_string(),
            },
            Utc::now(),
        )
        .await
        .unwrap()
}
