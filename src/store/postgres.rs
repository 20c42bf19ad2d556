use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{AssociationStore, CurrencyStore, LanguageStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Currency, CurrencyFields, CurrencyWrite, CurrentLangCurrency, Language, NewAssociation,
    NewCurrency, NewLanguage,
};

const CURRENCY_COLUMNS: &str =
    "id, code, symbol, description, rate, rate_float, created_at, updated_at";
const LANGUAGE_COLUMNS: &str = "id, lang_code, lang_name, created_at, updated_at";
const ASSOCIATION_COLUMNS: &str =
    "id, current_lang, lang_id, currency_id, lang_title, slot, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|err| StoreError::Database(err.into()))
    }
}

#[async_trait]
impl CurrencyStore for PgStore {
    async fn list_currencies(&self) -> StoreResult<Vec<Currency>> {
        let rows = sqlx::query_as::<_, Currency>(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_currency(&self, id: i32) -> StoreResult<Option<Currency>> {
        let row = sqlx::query_as::<_, Currency>(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_currency_by_code(&self, code: &str) -> StoreResult<Option<Currency>> {
        let row = sqlx::query_as::<_, Currency>(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_currency(&self, currency: &NewCurrency) -> StoreResult<Currency> {
        let row = sqlx::query_as::<_, Currency>(&format!(
            r#"
            INSERT INTO currencies (code, symbol, description, rate, rate_float, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CURRENCY_COLUMNS}
            "#
        ))
        .bind(&currency.code)
        .bind(&currency.symbol)
        .bind(&currency.description)
        .bind(currency.rate)
        .bind(currency.rate_float)
        .bind(currency.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_currency(
        &self,
        id: i32,
        fields: &CurrencyFields,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Currency>> {
        let row = sqlx::query_as::<_, Currency>(&format!(
            r#"
            UPDATE currencies
            SET symbol = $1, description = $2, rate = $3, rate_float = $4, updated_at = $5
            WHERE id = $6
            RETURNING {CURRENCY_COLUMNS}
            "#
        ))
        .bind(&fields.symbol)
        .bind(&fields.description)
        .bind(fields.rate)
        .bind(fields.rate_float)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn apply_currency_writes(&self, writes: &[CurrencyWrite]) -> StoreResult<()> {
        // Dropping the transaction on an early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        for write in writes {
            match write {
                CurrencyWrite::Insert(currency) => {
                    sqlx::query(
                        r#"
                        INSERT INTO currencies (code, symbol, description, rate, rate_float, created_at)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        "#,
                    )
                    .bind(&currency.code)
                    .bind(&currency.symbol)
                    .bind(&currency.description)
                    .bind(currency.rate)
                    .bind(currency.rate_float)
                    .bind(currency.created_at)
                    .execute(&mut *tx)
                    .await?;
                }
                CurrencyWrite::Update {
                    id,
                    fields,
                    updated_at,
                } => {
                    let result = sqlx::query(
                        r#"
                        UPDATE currencies
                        SET symbol = $1, description = $2, rate = $3, rate_float = $4, updated_at = $5
                        WHERE id = $6
                        "#,
                    )
                    .bind(&fields.symbol)
                    .bind(&fields.description)
                    .bind(fields.rate)
                    .bind(fields.rate_float)
                    .bind(updated_at)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(StoreError::Database(sqlx::Error::RowNotFound));
                    }
                }
            }
        }

        tx.commit().await?;
        debug!("Committed {} currency writes", writes.len());
        Ok(())
    }
}

#[async_trait]
impl LanguageStore for PgStore {
    async fn list_languages(&self) -> StoreResult<Vec<Language>> {
        let rows = sqlx::query_as::<_, Language>(&format!(
            "SELECT {LANGUAGE_COLUMNS} FROM languages ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_language(&self, id: i32) -> StoreResult<Option<Language>> {
        let row = sqlx::query_as::<_, Language>(&format!(
            "SELECT {LANGUAGE_COLUMNS} FROM languages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_language_by_code(&self, lang_code: &str) -> StoreResult<Option<Language>> {
        let row = sqlx::query_as::<_, Language>(&format!(
            "SELECT {LANGUAGE_COLUMNS} FROM languages WHERE lang_code = $1"
        ))
        .bind(lang_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_language(
        &self,
        language: &NewLanguage,
        now: DateTime<Utc>,
    ) -> StoreResult<Language> {
        let row = sqlx::query_as::<_, Language>(&format!(
            r#"
            INSERT INTO languages (lang_code, lang_name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING {LANGUAGE_COLUMNS}
            "#
        ))
        .bind(&language.lang_code)
        .bind(&language.lang_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn rename_language(
        &self,
        id: i32,
        lang_name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Language>> {
        let row = sqlx::query_as::<_, Language>(&format!(
            r#"
            UPDATE languages SET lang_name = $1, updated_at = $2
            WHERE id = $3
            RETURNING {LANGUAGE_COLUMNS}
            "#
        ))
        .bind(lang_name)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_language(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM languages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AssociationStore for PgStore {
    async fn list_associations(&self) -> StoreResult<Vec<CurrentLangCurrency>> {
        let rows = sqlx::query_as::<_, CurrentLangCurrency>(&format!(
            "SELECT {ASSOCIATION_COLUMNS} FROM current_lang_currency ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_associations_by_id(&self, id: i32) -> StoreResult<Vec<CurrentLangCurrency>> {
        let rows = sqlx::query_as::<_, CurrentLangCurrency>(&format!(
            "SELECT {ASSOCIATION_COLUMNS} FROM current_lang_currency WHERE id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_association_by_pair(
        &self,
        currency_id: i32,
        lang_id: i32,
    ) -> StoreResult<Option<CurrentLangCurrency>> {
        let row = sqlx::query_as::<_, CurrentLangCurrency>(&format!(
            r#"
            SELECT {ASSOCIATION_COLUMNS} FROM current_lang_currency
            WHERE currency_id = $1 AND lang_id = $2
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(currency_id)
        .bind(lang_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_associations_for_currency(
        &self,
        currency_id: i32,
    ) -> StoreResult<Vec<CurrentLangCurrency>> {
        let rows = sqlx::query_as::<_, CurrentLangCurrency>(&format!(
            "SELECT {ASSOCIATION_COLUMNS} FROM current_lang_currency WHERE currency_id = $1 ORDER BY id"
        ))
        .bind(currency_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_associations_for_language(
        &self,
        lang_id: i32,
    ) -> StoreResult<Vec<CurrentLangCurrency>> {
        let rows = sqlx::query_as::<_, CurrentLangCurrency>(&format!(
            "SELECT {ASSOCIATION_COLUMNS} FROM current_lang_currency WHERE lang_id = $1 ORDER BY id"
        ))
        .bind(lang_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_association(
        &self,
        association: &NewAssociation,
        now: DateTime<Utc>,
    ) -> StoreResult<CurrentLangCurrency> {
        let row = sqlx::query_as::<_, CurrentLangCurrency>(&format!(
            r#"
            INSERT INTO current_lang_currency
                (current_lang, lang_id, currency_id, lang_title, slot, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {ASSOCIATION_COLUMNS}
            "#
        ))
        .bind(&association.current_lang)
        .bind(association.lang_id)
        .bind(association.currency_id)
        .bind(&association.lang_title)
        .bind(association.slot)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_association(
        &self,
        id: i32,
        association: &NewAssociation,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<CurrentLangCurrency>> {
        let row = sqlx::query_as::<_, CurrentLangCurrency>(&format!(
            r#"
            UPDATE current_lang_currency
            SET current_lang = $1, lang_id = $2, currency_id = $3, lang_title = $4,
                slot = $5, updated_at = $6
            WHERE id = $7
            RETURNING {ASSOCIATION_COLUMNS}
            "#
        ))
        .bind(&association.current_lang)
        .bind(association.lang_id)
        .bind(association.currency_id)
        .bind(&association.lang_title)
        .bind(association.slot)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_association(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM current_lang_currency WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
