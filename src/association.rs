use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    AssociationDto, Currency, CurrentLangCurrency, Language, NewAssociation,
    UpdateAssociationRequest,
};
use crate::store::{AssociationStore, CurrencyStore, LanguageStore, Store};

/// A currency carries titles in at most this many languages.
pub const MAX_LANGUAGES_PER_CURRENCY: usize = 2;
const MAX_TITLE_LEN: usize = 100;

/// Lowest slot in `1..=MAX_LANGUAGES_PER_CURRENCY` not taken by `rows`.
fn free_slot(rows: &[CurrentLangCurrency]) -> Option<i16> {
    (1..=MAX_LANGUAGES_PER_CURRENCY as i16).find(|slot| rows.iter().all(|row| row.slot != *slot))
}

fn validate_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("Title must not be empty.".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::Validation(format!(
            "Title must be at most {} characters.",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

/// Business rules linking currencies to languages through titled associations.
pub struct AssociationService {
    store: Arc<dyn Store>,
}

impl AssociationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn resolve(&self, currency_id: i32, lang_id: i32) -> ServiceResult<(Currency, Language)> {
        let currency = self.store.find_currency(currency_id).await?.ok_or_else(|| {
            ServiceError::InvalidReference(format!("Currency with id {} does not exist.", currency_id))
        })?;
        let language = self.store.find_language(lang_id).await?.ok_or_else(|| {
            ServiceError::InvalidReference(format!("Language with id {} does not exist.", lang_id))
        })?;
        Ok((currency, language))
    }

    /// Creates the association for the pair, or retitles it when it already exists.
    pub async fn create_or_update(
        &self,
        currency_id: i32,
        lang_id: i32,
        title: &str,
    ) -> ServiceResult<AssociationDto> {
        let (currency, language) = self.resolve(currency_id, lang_id).await?;
        let title = validate_title(title)?;
        let now = Utc::now();

        if let Some(existing) = self
            .store
            .find_association_by_pair(currency.id, language.id)
            .await?
        {
            let change = NewAssociation {
                current_lang: language.lang_code,
                lang_id: language.id,
                currency_id: currency.id,
                lang_title: title,
                slot: existing.slot,
            };
            let updated = self
                .store
                .update_association(existing.id, &change, now)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Association {} was removed", existing.id))
                })?;
            debug!("Retitled association {}", updated.id);
            return Ok(updated.into());
        }

        let siblings = self
            .store
            .list_associations_for_currency(currency.id)
            .await?;
        let slot = match free_slot(&siblings) {
            Some(slot) if siblings.len() < MAX_LANGUAGES_PER_CURRENCY => slot,
            _ => {
                return Err(ServiceError::CapacityExceeded {
                    currency_id: currency.id,
                });
            }
        };

        let bound = self
            .store
            .list_associations_for_language(language.id)
            .await?;
        if bound.iter().any(|row| row.currency_id != currency.id) {
            return Err(ServiceError::LanguageAlreadyBound {
                language_id: language.id,
            });
        }

        let created = self
            .store
            .insert_association(
                &NewAssociation {
                    current_lang: language.lang_code,
                    lang_id: language.id,
                    currency_id: currency.id,
                    lang_title: title,
                    slot,
                },
                now,
            )
            .await?;
        info!(
            "Associated currency {} with language {} (row {})",
            currency.code, created.current_lang, created.id
        );
        Ok(created.into())
    }

    /// Rewrites an existing row, re-checking both caps against the other rows.
    pub async fn update(
        &self,
        id: i32,
        request: UpdateAssociationRequest,
    ) -> ServiceResult<AssociationDto> {
        let existing = self
            .store
            .find_associations_by_id(id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("Association {} not found", id)))?;
        let (currency, language) = self.resolve(request.currency_id, request.lang_id).await?;
        let title = validate_title(&request.lang_title)?;

        let mut slot = existing.slot;
        if currency.id != existing.currency_id {
            let others: Vec<CurrentLangCurrency> = self
                .store
                .list_associations_for_currency(currency.id)
                .await?
                .into_iter()
                .filter(|row| row.id != id)
                .collect();
            slot = match free_slot(&others) {
                Some(slot) if others.len() < MAX_LANGUAGES_PER_CURRENCY => slot,
                _ => {
                    return Err(ServiceError::CapacityExceeded {
                        currency_id: currency.id,
                    });
                }
            };
        }

        if language.id != existing.lang_id {
            let bound = self
                .store
                .list_associations_for_language(language.id)
                .await?;
            if bound.iter().any(|row| row.id != id) {
                return Err(ServiceError::LanguageAlreadyBound {
                    language_id: language.id,
                });
            }
        }

        let change = NewAssociation {
            current_lang: language.lang_code,
            lang_id: language.id,
            currency_id: currency.id,
            lang_title: title,
            slot,
        };
        let updated = self
            .store
            .update_association(id, &change, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Association {} not found", id)))?;
        Ok(updated.into())
    }

    pub async fn list(&self) -> ServiceResult<Vec<AssociationDto>> {
        let rows = self.store.list_associations().await?;
        Ok(rows.into_iter().map(AssociationDto::from).collect())
    }

    /// Id lookup is a filter: NotFound only when nothing matches.
    pub async fn find_by_id(&self, id: i32) -> ServiceResult<Vec<AssociationDto>> {
        let rows = self.store.find_associations_by_id(id).await?;
        if rows.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "Association {} not found",
                id
            )));
        }
        Ok(rows.into_iter().map(AssociationDto::from).collect())
    }

    pub async fn find_by_pair(&self, currency_id: i32, lang_id: i32) -> ServiceResult<AssociationDto> {
        self.store
            .find_association_by_pair(currency_id, lang_id)
            .await?
            .map(AssociationDto::from)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No association for currency {} and language {}",
                    currency_id, lang_id
                ))
            })
    }

    pub async fn list_for_currency(&self, currency_id: i32) -> ServiceResult<Vec<AssociationDto>> {
        let rows = self
            .store
            .list_associations_for_currency(currency_id)
            .await?;
        Ok(rows.into_iter().map(AssociationDto::from).collect())
    }

    pub async fn find_by_language(&self, lang_id: i32) -> ServiceResult<AssociationDto> {
        self.store
            .list_associations_for_language(lang_id)
            .await?
            .into_iter()
            .next()
            .map(AssociationDto::from)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No association for language {}", lang_id))
            })
    }

    pub async fn delete(&self, id: i32) -> ServiceResult<()> {
        if !self.store.delete_association(id).await? {
            return Err(ServiceError::NotFound(format!(
                "Association {} not found",
                id
            )));
        }
        info!("Deleted association {}", id);
        Ok(())
    }
}
