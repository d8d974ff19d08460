use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tableau_assistant::adapters::extract::ArrowExtractConverter;
use tableau_assistant::adapters::files::DirectoryFileResolver;
use tableau_assistant::adapters::http::{api_router, AppState};
use tableau_assistant::adapters::ollama::OllamaChatModel;
use tableau_assistant::adapters::tableau::TableauRestClient;
use tableau_assistant::application::{ChatOrchestrator, ToolExecutor};
use tableau_assistant::config::AppConfig;
use tableau_assistant::domain::tools::ToolRegistry;
use tableau_assistant::ports::ChatModel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    config.validate()?;

    let registry = Arc::new(ToolRegistry::standard());
    let tools = registry.to_ollama_tools();

    let model: Arc<dyn ChatModel> = Arc::new(OllamaChatModel::new(&config.ollama)?);
    let datasets = Arc::new(TableauRestClient::new(&config.tableau)?);
    let converter = Arc::new(ArrowExtractConverter::new());
    let resolver = Arc::new(DirectoryFileResolver::new(&config.files.default_directory));

    let executor = Arc::new(ToolExecutor::new(
        registry.clone(),
        datasets,
        converter,
        resolver,
        config.tableau.project_name.clone(),
    )?);
    let orchestrator = Arc::new(ChatOrchestrator::new(
        model.clone(),
        executor,
        tools,
        config.ollama.model.clone(),
    ));

    let state = AppState {
        orchestrator,
        registry,
        model,
    };
    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config.server.socket_addr()?;
    info!(
        address = %addr,
        model = %config.ollama.model,
        tableau = %config.tableau.server_url,
        project = %config.tableau.project_name,
        data_dir = %config.files.default_directory.display(),
        "Starting Tableau assistant"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
