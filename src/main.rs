use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use anyhow::{Context, Result};
use log::info;
use reqwest::Client;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::rate_feed::HttpRateFeed;
use crate::store::PgStore;

mod api;
mod association;
mod config;
mod currency;
mod error;
mod language;
mod locale;
mod models;
mod projection;
mod rate_feed;
mod reconcile;
mod store;

#[cfg(test)]
mod testing;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;

    let store = PgStore::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Can't connect to the database")?;
    store
        .migrate()
        .await
        .context("Can't apply database migrations")?;

    let client = Client::builder()
        .timeout(config.rate_feed_timeout)
        .build()
        .context("Can't build the HTTP client")?;
    let feed = HttpRateFeed::new(client, config.rate_feed_url.clone());

    let state = web::Data::new(AppState::new(
        Arc::new(store),
        Arc::new(feed),
        config.rate_feed_timeout,
        config.default_lang.clone(),
    ));

    info!("Listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("Can't bind to {}", config.bind_addr))?
    .run()
    .await?;

    Ok(())
}
