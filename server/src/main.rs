use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,todo_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");
    tracing::info!("  GET    /todo/health");
    tracing::info!("  POST   /todo");
    tracing::info!("  GET    /todo/size?status=");
    tracing::info!("  GET    /todo/content?status=&sortBy=");
    tracing::info!("  PUT    /todo?id=&status=");
    tracing::info!("  DELETE /todo?id=");

    todo_server::run(listener).await?;
    tracing::info!("server stopped");
    Ok(())
}
