use std::sync::Arc;

use deduction_engine::api::{AppState, create_router};
use deduction_engine::config::{AppSettings, ConfigLoader, EndpointResolver, ProviderKind};
use deduction_engine::pipeline::DeductionPipeline;
use deduction_engine::provider::{RateProvider, RemoteRateProvider, TableRateProvider};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deduction_engine=info,deduction_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = AppSettings::from_env()?;

    let config = Arc::new(match &settings.config_dir {
        Some(dir) => ConfigLoader::load(dir)?,
        None => ConfigLoader::embedded()?,
    });
    tracing::info!(
        scheme = %config.metadata().code,
        effective_date = %config.metadata().effective_date,
        "Loaded rate scheme"
    );

    let client = reqwest::Client::builder()
        .timeout(settings.lookup_timeout)
        .build()?;
    let endpoints = Arc::new(EndpointResolver::new(
        client.clone(),
        settings.config_service_url.clone(),
        settings.endpoints.clone(),
    ));

    let provider: Arc<dyn RateProvider> = match settings.provider {
        ProviderKind::Table => Arc::new(TableRateProvider::new(Arc::clone(&config))),
        ProviderKind::Remote => Arc::new(RemoteRateProvider::new(
            client,
            Arc::clone(&endpoints),
            Arc::clone(&config),
            settings.employment_rate_source,
        )),
    };
    tracing::info!(
        provider = provider.name(),
        lookup_timeout_ms = settings.lookup_timeout.as_millis() as u64,
        "Rate provider ready"
    );

    let pipeline = DeductionPipeline::new(provider, settings.lookup_timeout);
    let router = create_router(AppState::with_pipeline(config, pipeline, endpoints));

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    tracing::info!("Server started at http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}
