use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::models::{CreateLanguageRequest, LanguageDto, NewLanguage};
use crate::store::{AssociationStore, LanguageStore, Store};

const MAX_CODE_LEN: usize = 10;
const MAX_NAME_LEN: usize = 50;
const DUPLICATE_CODE: &str = "A language with this code already exists.";
const DELETE_FAILED: &str = "An error occurred while deleting the language.";

fn required(field: &str, value: &str, max_len: usize) -> ServiceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required.", field)));
    }
    if value.chars().count() > max_len {
        return Err(ServiceError::Validation(format!(
            "{} must be at most {} characters.",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

pub struct LanguageService {
    store: Arc<dyn Store>,
}

impl LanguageService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> ServiceResult<Vec<LanguageDto>> {
        let languages = self.store.list_languages().await?;
        Ok(languages.into_iter().map(LanguageDto::from).collect())
    }

    pub async fn get(&self, id: i32) -> ServiceResult<LanguageDto> {
        self.store
            .find_language(id)
            .await?
            .map(LanguageDto::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Language {} not found", id)))
    }

    pub async fn get_by_code(&self, lang_code: &str) -> ServiceResult<LanguageDto> {
        let lang_code = lang_code.trim().to_lowercase();
        self.store
            .find_language_by_code(&lang_code)
            .await?
            .map(LanguageDto::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Language {} not found", lang_code)))
    }

    pub async fn create(&self, request: CreateLanguageRequest) -> ServiceResult<LanguageDto> {
        let lang_code = required("langCode", &request.lang_code.to_lowercase(), MAX_CODE_LEN)?;
        let lang_name = required("langName", &request.lang_name, MAX_NAME_LEN)?;

        if self.store.find_language_by_code(&lang_code).await?.is_some() {
            return Err(ServiceError::Conflict(DUPLICATE_CODE.into()));
        }

        let language = self
            .store
            .insert_language(
                &NewLanguage {
                    lang_code,
                    lang_name,
                },
                Utc::now(),
            )
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(_) => ServiceError::Conflict(DUPLICATE_CODE.into()),
                other => other.into(),
            })?;
        info!("Registered language {} ({})", language.lang_code, language.id);
        Ok(language.into())
    }

    /// Only the display name is editable; the code is the natural key.
    pub async fn rename(&self, id: i32, lang_name: &str) -> ServiceResult<LanguageDto> {
        let lang_name = required("langName", lang_name, MAX_NAME_LEN)?;
        self.store
            .rename_language(id, &lang_name, Utc::now())
            .await?
            .map(LanguageDto::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Language {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> ServiceResult<()> {
        let references = self.store.list_associations_for_language(id).await?;
        if !references.is_empty() {
            return Err(ServiceError::InUse(format!(
                "Language {} is still used by {} currency association(s).",
                id,
                references.len()
            )));
        }

        match self.store.delete_language(id).await {
            Ok(true) => {
                info!("Deleted language {}", id);
                Ok(())
            }
            Ok(false) => Err(ServiceError::NotFound(format!("Language {} not found", id))),
            Err(StoreError::ForeignKeyViolation(_)) => Err(ServiceError::InUse(format!(
                "Language {} is still used by a currency association.",
                id
            ))),
            Err(err) => Err(ServiceError::persistence(err, DELETE_FAILED)),
        }
    }
}
