use pares_marketplace_service::config::Config;
use pares_marketplace_service::serve;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&config.log_filter));
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if config.uses_default_jwt_secret() {
        tracing::warn!("PARES_JWT_SECRET is unset; using the development signing secret");
    }
    if !config.seed_demo_data {
        tracing::info!("demo data disabled; starting with an empty marketplace");
    }

    serve(config).await
}
