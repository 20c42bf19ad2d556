use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Currency {
    pub id: i32,
    pub code: String,
    pub symbol: String,
    pub description: String,
    pub rate: Decimal,
    pub rate_float: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCurrency {
    pub code: String,
    pub symbol: String,
    pub description: String,
    pub rate: Decimal,
    pub rate_float: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Mutable part of a currency row; `code` and `id` never change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyFields {
    pub symbol: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub rate_float: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCurrencyRequest {
    pub code: String,
    pub symbol: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub rate_float: Decimal,
}

/// One pending change of a reconciliation batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrencyWrite {
    Insert(NewCurrency),
    Update {
        id: i32,
        fields: CurrencyFields,
        updated_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Language {
    pub id: i32,
    pub lang_code: String,
    pub lang_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLanguage {
    pub lang_code: String,
    pub lang_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLanguageRequest {
    #[serde(default)]
    pub lang_code: String,
    #[serde(default)]
    pub lang_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameLanguageRequest {
    #[serde(default)]
    pub lang_name: String,
}

/// A `CurrentLangCurrency` row. `slot` is 1 or 2 and is unique per currency.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CurrentLangCurrency {
    pub id: i32,
    pub current_lang: String,
    pub lang_id: i32,
    pub currency_id: i32,
    pub lang_title: String,
    pub slot: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAssociation {
    pub current_lang: String,
    pub lang_id: i32,
    pub currency_id: i32,
    pub lang_title: String,
    pub slot: i16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssociationRequest {
    pub currency_id: i32,
    pub lang_id: i32,
    #[serde(default)]
    pub lang_title: String,
}

/// Read view of a currency joined with its title in the preferred language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
    pub id: i32,
    pub code: String,
    pub symbol: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub rate_float: Decimal,
    pub lang_title: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDto {
    pub id: i32,
    pub lang_code: String,
    pub lang_name: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Language> for LanguageDto {
    fn from(language: Language) -> Self {
        Self {
            id: language.id,
            lang_code: language.lang_code,
            lang_name: language.lang_name,
            updated_at: language.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationDto {
    pub id: i32,
    pub current_lang: String,
    pub lang_id: i32,
    pub currency_id: i32,
    pub lang_title: String,
    pub updated_at: DateTime<Utc>,
}

impl From<CurrentLangCurrency> for AssociationDto {
    fn from(row: CurrentLangCurrency) -> Self {
        Self {
            id: row.id,
            current_lang: row.current_lang,
            lang_id: row.lang_id,
            currency_id: row.currency_id,
            lang_title: row.lang_title,
            updated_at: row.updated_at,
        }
    }
}
