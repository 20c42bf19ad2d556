use actix_web::HttpRequest;
use actix_web::http::header::ACCEPT_LANGUAGE;

/// First usable tag of an `Accept-Language` value, lower-cased.
pub fn preferred_language(accept_language: Option<&str>, default_lang: &str) -> String {
    accept_language
        .and_then(|value| {
            value
                .split(',')
                .map(|part| part.split(';').next().unwrap_or("").trim())
                .find(|tag| !tag.is_empty() && *tag != "*")
        })
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| default_lang.to_ascii_lowercase())
}

pub fn request_language(req: &HttpRequest, default_lang: &str) -> String {
    let header = req
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    preferred_language(header, default_lang)
}
