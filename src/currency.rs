use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::models::{CreateCurrencyRequest, CurrencyFields, CurrencyInfo, NewCurrency};
use crate::projection::{project, project_all};
use crate::store::{AssociationStore, CurrencyStore, Store};

pub struct CurrencyService {
    store: Arc<dyn Store>,
}

impl CurrencyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, lang_tag: &str) -> ServiceResult<Vec<CurrencyInfo>> {
        let currencies = self.store.list_currencies().await?;
        let associations = self.store.list_associations().await?;
        Ok(project_all(currencies, &associations, lang_tag))
    }

    pub async fn get(&self, id: i32, lang_tag: &str) -> ServiceResult<CurrencyInfo> {
        let currency = self
            .store
            .find_currency(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Currency {} not found", id)))?;
        let associations = self.store.list_associations_for_currency(id).await?;
        Ok(project(currency, &associations, lang_tag))
    }

    pub async fn get_by_code(&self, code: &str, lang_tag: &str) -> ServiceResult<CurrencyInfo> {
        let code = code.trim().to_ascii_uppercase();
        let currency = self
            .store
            .find_currency_by_code(&code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Currency {} not found", code)))?;
        let associations = self
            .store
            .list_associations_for_currency(currency.id)
            .await?;
        Ok(project(currency, &associations, lang_tag))
    }

    pub async fn create(&self, request: CreateCurrencyRequest) -> ServiceResult<CurrencyInfo> {
        let code = request.code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ServiceError::Validation(
                "Currency code must be three letters.".into(),
            ));
        }
        if self.store.find_currency_by_code(&code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A currency with code {} already exists.",
                code
            )));
        }

        let currency = self
            .store
            .insert_currency(&NewCurrency {
                code,
                symbol: request.symbol,
                description: request.description,
                rate: request.rate,
                rate_float: request.rate_float,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(_) => {
                    ServiceError::Conflict("A currency with this code already exists.".into())
                }
                other => other.into(),
            })?;
        info!("Created currency {} ({})", currency.code, currency.id);
        Ok(project(currency, &[], ""))
    }

    pub async fn update(
        &self,
        id: i32,
        fields: CurrencyFields,
        lang_tag: &str,
    ) -> ServiceResult<CurrencyInfo> {
        let currency = self
            .store
            .update_currency(id, &fields, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Currency {} not found", id)))?;
        let associations = self.store.list_associations_for_currency(id).await?;
        Ok(project(currency, &associations, lang_tag))
    }
}
