//! In-memory gateway with the same constraint behaviour as the Postgres schema.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AssociationStore, CurrencyStore, LanguageStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Currency, CurrencyFields, CurrencyWrite, CurrentLangCurrency, Language, NewAssociation,
    NewCurrency, NewLanguage,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    currencies: Vec<Currency>,
    languages: Vec<Language>,
    associations: Vec<CurrentLangCurrency>,
    next_currency_id: i32,
    next_language_id: i32,
    next_association_id: i32,
}

impl Tables {
    fn insert_currency(&mut self, currency: &NewCurrency) -> StoreResult<Currency> {
        if self.currencies.iter().any(|c| c.code == currency.code) {
            return Err(StoreError::UniqueViolation(format!(
                "currencies_code_key: {}",
                currency.code
            )));
        }
        self.next_currency_id += 1;
        let row = Currency {
            id: self.next_currency_id,
            code: currency.code.clone(),
            symbol: currency.symbol.clone(),
            description: currency.description.clone(),
            rate: currency.rate,
            rate_float: currency.rate_float,
            created_at: currency.created_at,
            updated_at: None,
        };
        self.currencies.push(row.clone());
        Ok(row)
    }

    fn update_currency(
        &mut self,
        id: i32,
        fields: &CurrencyFields,
        updated_at: DateTime<Utc>,
    ) -> Option<Currency> {
        let row = self.currencies.iter_mut().find(|c| c.id == id)?;
        row.symbol = fields.symbol.clone();
        row.description = fields.description.clone();
        row.rate = fields.rate;
        row.rate_float = fields.rate_float;
        row.updated_at = Some(updated_at);
        Some(row.clone())
    }

    fn check_association(&self, id: Option<i32>, association: &NewAssociation) -> StoreResult<()> {
        if !(1..=2).contains(&association.slot) {
            return Err(StoreError::CheckViolation(format!(
                "slot {} out of range",
                association.slot
            )));
        }
        if !self.currencies.iter().any(|c| c.id == association.currency_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "currency {}",
                association.currency_id
            )));
        }
        if !self.languages.iter().any(|l| l.id == association.lang_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "language {}",
                association.lang_id
            )));
        }
        let others = self.associations.iter().filter(|a| Some(a.id) != id);
        for other in others {
            if other.lang_id == association.lang_id {
                return Err(StoreError::UniqueViolation(
                    "current_lang_currency_lang_key".into(),
                ));
            }
            if other.currency_id == association.currency_id && other.slot == association.slot {
                return Err(StoreError::UniqueViolation(
                    "current_lang_currency_slot_key".into(),
                ));
            }
        }
        Ok(())
    }

    fn push_association(&mut self, association: NewAssociation) -> CurrentLangCurrency {
        self.next_association_id += 1;
        let now = Utc::now();
        let row = CurrentLangCurrency {
            id: self.next_association_id,
            current_lang: association.current_lang,
            lang_id: association.lang_id,
            currency_id: association.currency_id,
            lang_title: association.lang_title,
            slot: association.slot,
            created_at: now,
            updated_at: now,
        };
        self.associations.push(row.clone());
        row
    }

    fn push_language(&mut self, language: &NewLanguage, now: DateTime<Utc>) -> Language {
        self.next_language_id += 1;
        let row = Language {
            id: self.next_language_id,
            lang_code: language.lang_code.clone(),
            lang_name: language.lang_name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.languages.push(row.clone());
        row
    }
}

/// A row committed by another client after a service read but before its write.
#[derive(Debug, Clone)]
pub enum ConcurrentWrite {
    Association(NewAssociation),
    Language(NewLanguage),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    concurrent: Mutex<Vec<ConcurrentWrite>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail as if the database went away.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Inserts an association row bypassing slot bookkeeping checks, for fixtures.
    pub fn seed_association(&self, association: NewAssociation) -> CurrentLangCurrency {
        self.tables.lock().unwrap().push_association(association)
    }

    /// Queues a row that lands unchecked right before the next association or language write.
    pub fn interleave(&self, write: ConcurrentWrite) {
        self.concurrent.lock().unwrap().push(write);
    }

    fn land_concurrent(&self, tables: &mut Tables) {
        for write in self.concurrent.lock().unwrap().drain(..) {
            match write {
                ConcurrentWrite::Association(association) => {
                    tables.push_association(association);
                }
                ConcurrentWrite::Language(language) => {
                    tables.push_language(&language, Utc::now());
                }
            }
        }
    }

    pub fn currency_count(&self) -> usize {
        self.tables.lock().unwrap().currencies.len()
    }

    pub fn association_count(&self) -> usize {
        self.tables.lock().unwrap().associations.len()
    }

    fn guard_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl CurrencyStore for MemoryStore {
    async fn list_currencies(&self) -> StoreResult<Vec<Currency>> {
        Ok(self.tables.lock().unwrap().currencies.clone())
    }

    async fn find_currency(&self, id: i32) -> StoreResult<Option<Currency>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.currencies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_currency_by_code(&self, code: &str) -> StoreResult<Option<Currency>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.currencies.iter().find(|c| c.code == code).cloned())
    }

    async fn insert_currency(&self, currency: &NewCurrency) -> StoreResult<Currency> {
        self.guard_write()?;
        self.tables.lock().unwrap().insert_currency(currency)
    }

    async fn update_currency(
        &self,
        id: i32,
        fields: &CurrencyFields,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Currency>> {
        self.guard_write()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .update_currency(id, fields, updated_at))
    }

    async fn apply_currency_writes(&self, writes: &[CurrencyWrite]) -> StoreResult<()> {
        self.guard_write()?;
        let mut tables = self.tables.lock().unwrap();
        let mut staged = tables.clone();
        for write in writes {
            match write {
                CurrencyWrite::Insert(currency) => {
                    staged.insert_currency(currency)?;
                }
                CurrencyWrite::Update {
                    id,
                    fields,
                    updated_at,
                } => {
                    staged
                        .update_currency(*id, fields, *updated_at)
                        .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
                }
            }
        }
        *tables = staged;
        Ok(())
    }
}

#[async_trait]
impl LanguageStore for MemoryStore {
    async fn list_languages(&self) -> StoreResult<Vec<Language>> {
        Ok(self.tables.lock().unwrap().languages.clone())
    }

    async fn find_language(&self, id: i32) -> StoreResult<Option<Language>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.languages.iter().find(|l| l.id == id).cloned())
    }

    async fn find_language_by_code(&self, lang_code: &str) -> StoreResult<Option<Language>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .languages
            .iter()
            .find(|l| l.lang_code == lang_code)
            .cloned())
    }

    async fn insert_language(
        &self,
        language: &NewLanguage,
        now: DateTime<Utc>,
    ) -> StoreResult<Language> {
        self.guard_write()?;
        let mut tables = self.tables.lock().unwrap();
        self.land_concurrent(&mut tables);
        if tables
            .languages
            .iter()
            .any(|l| l.lang_code == language.lang_code)
        {
            return Err(StoreError::UniqueViolation("languages_lang_code_key".into()));
        }
        Ok(tables.push_language(language, now))
    }

    async fn rename_language(
        &self,
        id: i32,
        lang_name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Language>> {
        self.guard_write()?;
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.languages.iter_mut().find(|l| l.id == id).map(|row| {
            row.lang_name = lang_name.to_string();
            row.updated_at = now;
            row.clone()
        }))
    }

    async fn delete_language(&self, id: i32) -> StoreResult<bool> {
        self.guard_write()?;
        let mut tables = self.tables.lock().unwrap();
        self.land_concurrent(&mut tables);
        if tables.associations.iter().any(|a| a.lang_id == id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "current_lang_currency references language {id}"
            )));
        }
        let before = tables.languages.len();
        tables.languages.retain(|l| l.id != id);
        Ok(tables.languages.len() < before)
    }
}

#[async_trait]
impl AssociationStore for MemoryStore {
    async fn list_associations(&self) -> StoreResult<Vec<CurrentLangCurrency>> {
        let mut rows = self.tables.lock().unwrap().associations.clone();
        rows.sort_by_key(|a| a.id);
        Ok(rows)
    }

    async fn find_associations_by_id(&self, id: i32) -> StoreResult<Vec<CurrentLangCurrency>> {
        let rows = self.list_associations().await?;
        Ok(rows.into_iter().filter(|a| a.id == id).collect())
    }

    async fn find_association_by_pair(
        &self,
        currency_id: i32,
        lang_id: i32,
    ) -> StoreResult<Option<CurrentLangCurrency>> {
        let rows = self.list_associations().await?;
        Ok(rows
            .into_iter()
            .find(|a| a.currency_id == currency_id && a.lang_id == lang_id))
    }

    async fn list_associations_for_currency(
        &self,
        currency_id: i32,
    ) -> StoreResult<Vec<CurrentLangCurrency>> {
        let rows = self.list_associations().await?;
        Ok(rows
            .into_iter()
            .filter(|a| a.currency_id == currency_id)
            .collect())
    }

    async fn list_associations_for_language(
        &self,
        lang_id: i32,
    ) -> StoreResult<Vec<CurrentLangCurrency>> {
        let rows = self.list_associations().await?;
        Ok(rows.into_iter().filter(|a| a.lang_id == lang_id).collect())
    }

    async fn insert_association(
        &self,
        association: &NewAssociation,
        now: DateTime<Utc>,
    ) -> StoreResult<CurrentLangCurrency> {
        self.guard_write()?;
        let mut tables = self.tables.lock().unwrap();
        self.land_concurrent(&mut tables);
        tables.check_association(None, association)?;
        tables.next_association_id += 1;
        let row = CurrentLangCurrency {
            id: tables.next_association_id,
            current_lang: association.current_lang.clone(),
            lang_id: association.lang_id,
            currency_id: association.currency_id,
            lang_title: association.lang_title.clone(),
            slot: association.slot,
            created_at: now,
            updated_at: now,
        };
        tables.associations.push(row.clone());
        Ok(row)
    }

    async fn update_association(
        &self,
        id: i32,
        association: &NewAssociation,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<CurrentLangCurrency>> {
        self.guard_write()?;
        let mut tables = self.tables.lock().unwrap();
        self.land_concurrent(&mut tables);
        if !tables.associations.iter().any(|a| a.id == id) {
            return Ok(None);
        }
        tables.check_association(Some(id), association)?;
        Ok(tables
            .associations
            .iter_mut()
            .find(|a| a.id == id)
            .map(|row| {
                row.current_lang = association.current_lang.clone();
                row.lang_id = association.lang_id;
                row.currency_id = association.currency_id;
                row.lang_title = association.lang_title.clone();
                row.slot = association.slot;
                row.updated_at = now;
                row.clone()
            }))
    }

    async fn delete_association(&self, id: i32) -> StoreResult<bool> {
        self.guard_write()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.associations.len();
        tables.associations.retain(|a| a.id != id);
        Ok(tables.associations.len() < before)
    }
}
