use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{CurrencyFields, CurrencyWrite, NewCurrency};
use crate::rate_feed::{RateFeed, RateSnapshot};
use crate::store::{CurrencyStore, Store};

/// Merges rate snapshots from the feed into the `currencies` table.
pub struct RateReconciler {
    store: Arc<dyn Store>,
    feed: Arc<dyn RateFeed>,
}

impl RateReconciler {
    pub fn new(store: Arc<dyn Store>, feed: Arc<dyn RateFeed>) -> Self {
        Self { store, feed }
    }

    /// Fetches a snapshot within `deadline` and writes it in one batch.
    /// Returns the number of currencies created or updated.
    pub async fn synchronize(&self, deadline: Duration) -> ServiceResult<usize> {
        let snapshot = match tokio::time::timeout(deadline, self.feed.fetch_snapshot()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Rate feed did not answer within {:?}", deadline);
                return Err(ServiceError::FeedUnavailable {
                    status: None,
                    message: format!("no answer within {} ms", deadline.as_millis()),
                });
            }
        };

        let writes = self.plan(&snapshot, Utc::now()).await?;
        self.store.apply_currency_writes(&writes).await?;

        let created = writes
            .iter()
            .filter(|write| matches!(write, CurrencyWrite::Insert(_)))
            .count();
        info!(
            "Rate sync committed: {} created, {} updated",
            created,
            writes.len() - created
        );
        Ok(writes.len())
    }

    /// One write per distinct code; a code repeated in the snapshot keeps its last values.
    async fn plan(
        &self,
        snapshot: &RateSnapshot,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<CurrencyWrite>> {
        let mut writes: Vec<CurrencyWrite> = Vec::with_capacity(snapshot.entries.len());
        let mut planned: HashMap<&str, usize> = HashMap::new();

        for entry in &snapshot.entries {
            let fields = CurrencyFields {
                symbol: entry.symbol.clone(),
                description: entry.description.clone(),
                rate: entry.rate,
                rate_float: entry.rate_float,
            };

            if let Some(&index) = planned.get(entry.code.as_str()) {
                match &mut writes[index] {
                    CurrencyWrite::Insert(currency) => {
                        currency.symbol = fields.symbol;
                        currency.description = fields.description;
                        currency.rate = fields.rate;
                        currency.rate_float = fields.rate_float;
                    }
                    CurrencyWrite::Update { fields: pending, .. } => *pending = fields,
                }
                continue;
            }

            let write = match self.store.find_currency_by_code(&entry.code).await? {
                Some(existing) => CurrencyWrite::Update {
                    id: existing.id,
                    fields,
                    updated_at: now,
                },
                None => CurrencyWrite::Insert(NewCurrency {
                    code: entry.code.clone(),
                    symbol: fields.symbol,
                    description: fields.description,
                    rate: fields.rate,
                    rate_float: fields.rate_float,
                    created_at: now,
                }),
            };
            planned.insert(entry.code.as_str(), writes.len());
            writes.push(write);
        }

        Ok(writes)
    }
}
