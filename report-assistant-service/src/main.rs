use report_assistant_service::create_app;
use report_insight::GenerationConfig;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Backend credentials are validated before any document is accepted.
    let config = match GenerationConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let app = create_app(&config);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("Health Report Assistant starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Create a session: POST http://{}/sessions", addr);
    info!(
        "Upload a report: POST http://{}/sessions/{{session_id}}/document",
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}
