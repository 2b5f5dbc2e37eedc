use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use warden_api::app::{AppServices, build_app};
use warden_api::config::AppConfig;
use warden_infra::{migrations, seed_default_policies};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warden_observability::init();

    let config = AppConfig::from_env();

    let services = match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;

            migrations::run(&pool)
                .await
                .context("schema migration failed")?;

            let services = AppServices::postgres(&config, pool);
            seed_default_policies(services.policies.as_ref())
                .await
                .context("default policy seeding failed")?;
            services
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            let services = AppServices::in_memory(&config);
            seed_default_policies(services.policies.as_ref())
                .await
                .context("default policy seeding failed")?;
            services
        }
    };

    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
