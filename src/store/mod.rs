use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::{
    Currency, CurrencyFields, CurrencyWrite, CurrentLangCurrency, Language, NewAssociation,
    NewCurrency, NewLanguage,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait CurrencyStore: Send + Sync {
    async fn list_currencies(&self) -> StoreResult<Vec<Currency>>;
    async fn find_currency(&self, id: i32) -> StoreResult<Option<Currency>>;
    async fn find_currency_by_code(&self, code: &str) -> StoreResult<Option<Currency>>;
    async fn insert_currency(&self, currency: &NewCurrency) -> StoreResult<Currency>;
    async fn update_currency(
        &self,
        id: i32,
        fields: &CurrencyFields,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Currency>>;
    /// Applies every write or none of them.
    async fn apply_currency_writes(&self, writes: &[CurrencyWrite]) -> StoreResult<()>;
}

#[async_trait]
pub trait LanguageStore: Send + Sync {
    async fn list_languages(&self) -> StoreResult<Vec<Language>>;
    async fn find_language(&self, id: i32) -> StoreResult<Option<Language>>;
    async fn find_language_by_code(&self, lang_code: &str) -> StoreResult<Option<Language>>;
    async fn insert_language(
        &self,
        language: &NewLanguage,
        now: DateTime<Utc>,
    ) -> StoreResult<Language>;
    async fn rename_language(
        &self,
        id: i32,
        lang_name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Language>>;
    /// Returns false when no row had that id.
    async fn delete_language(&self, id: i32) -> StoreResult<bool>;
}

/// Association rows are always returned in ascending id order.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    async fn list_associations(&self) -> StoreResult<Vec<CurrentLangCurrency>>;
    async fn find_associations_by_id(&self, id: i32) -> StoreResult<Vec<CurrentLangCurrency>>;
    async fn find_association_by_pair(
        &self,
        currency_id: i32,
        lang_id: i32,
    ) -> StoreResult<Option<CurrentLangCurrency>>;
    async fn list_associations_for_currency(
        &self,
        currency_id: i32,
    ) -> StoreResult<Vec<CurrentLangCurrency>>;
    async fn list_associations_for_language(
        &self,
        lang_id: i32,
    ) -> StoreResult<Vec<CurrentLangCurrency>>;
    async fn insert_association(
        &self,
        association: &NewAssociation,
        now: DateTime<Utc>,
    ) -> StoreResult<CurrentLangCurrency>;
    /// Rewrites identity, title and slot of an existing row.
    async fn update_association(
        &self,
        id: i32,
        association: &NewAssociation,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<CurrentLangCurrency>>;
    async fn delete_association(&self, id: i32) -> StoreResult<bool>;
}

/// The whole persistence gateway as seen by the services.
pub trait Store: CurrencyStore + LanguageStore + AssociationStore {}

impl<T> Store for T where T: CurrencyStore + LanguageStore + AssociationStore {}
