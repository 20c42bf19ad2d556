use crate::models::{Currency, CurrencyInfo, CurrentLangCurrency};

/// Title of the lowest-id association of `currency_id` whose language matches `lang_tag`.
fn title_for(
    currency_id: i32,
    associations: &[CurrentLangCurrency],
    lang_tag: &str,
) -> Option<String> {
    associations
        .iter()
        .filter(|a| a.currency_id == currency_id && a.current_lang.eq_ignore_ascii_case(lang_tag))
        .min_by_key(|a| a.id)
        .map(|a| a.lang_title.clone())
}

pub fn project(
    currency: Currency,
    associations: &[CurrentLangCurrency],
    lang_tag: &str,
) -> CurrencyInfo {
    let lang_title = title_for(currency.id, associations, lang_tag);
    CurrencyInfo {
        id: currency.id,
        code: currency.code,
        symbol: currency.symbol,
        description: currency.description,
        rate: currency.rate,
        rate_float: currency.rate_float,
        lang_title,
        updated_at: currency.updated_at,
    }
}

/// Projects every currency, ordered by code (ordinal comparison).
pub fn project_all(
    mut currencies: Vec<Currency>,
    associations: &[CurrentLangCurrency],
    lang_tag: &str,
) -> Vec<CurrencyInfo> {
    currencies.sort_by(|a, b| a.code.cmp(&b.code));
    currencies
        .into_iter()
        .map(|currency| project(currency, associations, lang_tag))
        .collect()
}
