use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

use crate::association::AssociationService;
use crate::currency::CurrencyService;
use crate::error::ServiceError;
use crate::language::LanguageService;
use crate::locale::request_language;
use crate::models::{
    CreateCurrencyRequest, CreateLanguageRequest, CurrencyFields, RenameLanguageRequest,
    UpdateAssociationRequest,
};
use crate::rate_feed::RateFeed;
use crate::reconcile::RateReconciler;
use crate::store::Store;

type ApiResult = Result<HttpResponse, ServiceError>;

pub struct AppState {
    pub currencies: CurrencyService,
    pub languages: LanguageService,
    pub associations: AssociationService,
    pub reconciler: RateReconciler,
    pub feed_timeout: Duration,
    pub default_lang: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        feed: Arc<dyn RateFeed>,
        feed_timeout: Duration,
        default_lang: impl Into<String>,
    ) -> Self {
        Self {
            currencies: CurrencyService::new(store.clone()),
            languages: LanguageService::new(store.clone()),
            associations: AssociationService::new(store.clone()),
            reconciler: RateReconciler::new(store, feed),
            feed_timeout,
            default_lang: default_lang.into(),
        }
    }

    fn lang_for(&self, req: &HttpRequest) -> String {
        request_language(req, &self.default_lang)
    }
}

#[derive(Debug, Default, Deserialize)]
struct TitleQuery {
    #[serde(rename = "langName", default)]
    lang_name: String,
}

#[get("/currencies")]
async fn list_currencies(state: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    let infos = state.currencies.list(&state.lang_for(&req)).await?;
    Ok(HttpResponse::Ok().json(infos))
}

#[get("/currencies/update-from-feed")]
async fn update_from_feed(state: web::Data<AppState>) -> ApiResult {
    let count = state.reconciler.synchronize(state.feed_timeout).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("Successfully updated {} currencies.", count)))
}

#[get("/currencies/code/{code}")]
async fn get_currency_by_code(
    state: web::Data<AppState>,
    req: HttpRequest,
    code: web::Path<String>,
) -> ApiResult {
    let info = state
        .currencies
        .get_by_code(&code, &state.lang_for(&req))
        .await?;
    Ok(HttpResponse::Ok().json(info))
}

#[get("/currencies/{id}")]
async fn get_currency(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<i32>,
) -> ApiResult {
    let info = state
        .currencies
        .get(id.into_inner(), &state.lang_for(&req))
        .await?;
    Ok(HttpResponse::Ok().json(info))
}

#[post("/currencies")]
async fn create_currency(
    state: web::Data<AppState>,
    body: web::Json<CreateCurrencyRequest>,
) -> ApiResult {
    let info = state.currencies.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(info))
}

#[put("/currencies/{id}")]
async fn update_currency(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<i32>,
    body: web::Json<CurrencyFields>,
) -> ApiResult {
    let info = state
        .currencies
        .update(id.into_inner(), body.into_inner(), &state.lang_for(&req))
        .await?;
    Ok(HttpResponse::Ok().json(info))
}

#[get("/languages")]
async fn list_languages(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.languages.list().await?))
}

#[get("/languages/code/{lang_code}")]
async fn get_language_by_code(
    state: web::Data<AppState>,
    lang_code: web::Path<String>,
) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.languages.get_by_code(&lang_code).await?))
}

#[get("/languages/{id}")]
async fn get_language(state: web::Data<AppState>, id: web::Path<i32>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.languages.get(id.into_inner()).await?))
}

#[post("/languages")]
async fn create_language(
    state: web::Data<AppState>,
    body: web::Json<CreateLanguageRequest>,
) -> ApiResult {
    let language = state.languages.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(language))
}

#[put("/languages/{id}")]
async fn rename_language(
    state: web::Data<AppState>,
    id: web::Path<i32>,
    body: web::Json<RenameLanguageRequest>,
) -> ApiResult {
    state
        .languages
        .rename(id.into_inner(), &body.lang_name)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/languages/{id}")]
async fn delete_language(state: web::Data<AppState>, id: web::Path<i32>) -> ApiResult {
    state.languages.delete(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/current-lang-currency")]
async fn list_associations(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.associations.list().await?))
}

#[get("/current-lang-currency/currency/{currency_id}")]
async fn list_associations_for_currency(
    state: web::Data<AppState>,
    currency_id: web::Path<i32>,
) -> ApiResult {
    let rows = state
        .associations
        .list_for_currency(currency_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[get("/current-lang-currency/language/{lang_id}")]
async fn get_association_for_language(
    state: web::Data<AppState>,
    lang_id: web::Path<i32>,
) -> ApiResult {
    let row = state
        .associations
        .find_by_language(lang_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

#[get("/current-lang-currency/{id}")]
async fn get_association(state: web::Data<AppState>, id: web::Path<i32>) -> ApiResult {
    let rows = state.associations.find_by_id(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[get("/current-lang-currency/{currency_id}/{lang_id}")]
async fn get_association_by_pair(
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
) -> ApiResult {
    let (currency_id, lang_id) = path.into_inner();
    let row = state
        .associations
        .find_by_pair(currency_id, lang_id)
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

#[post("/current-lang-currency/{currency_id}/{lang_id}")]
async fn upsert_association(
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
    query: web::Query<TitleQuery>,
) -> ApiResult {
    let (currency_id, lang_id) = path.into_inner();
    let row = state
        .associations
        .create_or_update(currency_id, lang_id, &query.lang_name)
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

#[put("/current-lang-currency/{id}")]
async fn update_association(
    state: web::Data<AppState>,
    id: web::Path<i32>,
    body: web::Json<UpdateAssociationRequest>,
) -> ApiResult {
    let row = state
        .associations
        .update(id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

#[delete("/current-lang-currency/{id}")]
async fn delete_association(state: web::Data<AppState>, id: web::Path<i32>) -> ApiResult {
    state.associations.delete(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Route table. Literal segments are registered before the `{id}` patterns they overlap.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ServiceError::Validation(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ServiceError::NotFound(format!("No such resource: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ServiceError::Validation(format!("Invalid query string: {}", err)).into()
    }))
    .service(list_currencies)
    .service(update_from_feed)
    .service(get_currency_by_code)
    .service(get_currency)
    .service(create_currency)
    .service(update_currency)
    .service(list_languages)
    .service(get_language_by_code)
    .service(get_language)
    .service(create_language)
    .service(rename_language)
    .service(delete_language)
    .service(list_associations)
    .service(list_associations_for_currency)
    .service(get_association_for_language)
    .service(get_association)
    .service(get_association_by_pair)
    .service(upsert_association)
    .service(update_association)
    .service(delete_association);
}
