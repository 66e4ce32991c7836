use clap::Parser;
use qr_backend::config::ServerConfig;
use qr_backend::routes;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    let app = routes::app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
