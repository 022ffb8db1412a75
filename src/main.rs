use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hoavan::api;
use hoavan::assets::{AssetCategory, AssetLoader};
use hoavan::models::AppConfig;
use hoavan::server;
use hoavan::services::{self, encoder, GeminiClient, PatternDigitizer, ResultView, ViewMode};
use hoavan::ui_text;

#[derive(Parser)]
#[command(name = "hoavan")]
#[command(about = "Hoa Van - turn fabric photos into seamless, print-ready pattern tiles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Digitize a photo and write the returned files to a directory
    Digitize {
        /// Photo of the fabric (PNG, JPEG or WEBP)
        image: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "hoavan-output")]
        output: PathBuf,

        /// Also write an N x N tiled preview of the PNG tile
        #[arg(long, value_name = "N")]
        tiled: Option<u32>,
    },
    /// Print the response schema sent to the model
    Schema,
    /// Extract embedded assets to filesystem for customization
    Init {
        /// Extract page templates
        #[arg(long)]
        templates: bool,

        /// Extract config.yaml
        #[arg(long)]
        config: bool,

        /// Extract all assets
        #[arg(long)]
        all: bool,

        /// Overwrite existing files
        #[arg(long, short)]
        force: bool,

        /// List embedded assets without extracting
        #[arg(long)]
        list: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hoa Van API",
        description = "Fabric pattern digitizer backed by a generative vision model",
        version = "0.3.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_create_session,
        api::handle_get_session,
        api::handle_session_image,
        api::handle_session_digitize,
        api::handle_delete_session,
        api::handle_digitize,
    ),
    components(schemas(
        api::ImageUpload,
        hoavan::models::PatternData,
        hoavan::models::AnalysisSummary,
        hoavan::models::TileProperties,
        hoavan::models::ColorInfo,
        hoavan::models::FileOutput,
        hoavan::models::FileMime,
        hoavan::models::RepeatType,
        services::SessionSnapshot,
        services::SessionState,
        services::ViewMode,
    )),
    tags(
        (name = "Sessions", description = "Stateful digitize flow"),
        (name = "Digitize", description = "One-shot digitize call")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Digitize {
            image,
            output,
            tiled,
        }) => run_digitize_command(&image, &output, tiled).await,
        Some(Commands::Schema) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&services::prompt::response_schema())?
            );
            Ok(())
        }
        Some(Commands::Init {
            templates,
            config,
            all,
            force,
            list,
        }) => run_init_command(templates, config, all, force, list),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn config_file() -> Option<PathBuf> {
    std::env::var("CONFIG_FILE").ok().map(PathBuf::from)
}

fn templates_dir() -> Option<PathBuf> {
    std::env::var("TEMPLATES_DIR").ok().map(PathBuf::from)
}

/// Digitize a photo from the command line (no server needed)
async fn run_digitize_command(
    image: &Path,
    output: &Path,
    tiled: Option<u32>,
) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoavan=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = AppConfig::load(config_file().as_deref())?;
    let client = GeminiClient::new(&config.gemini)?;

    let source = encoder::read_image(image).await?;
    println!("{}", ui_text::PROCESSING);

    let pattern = client
        .digitize(&encoder::encode(&source))
        .await
        .map_err(|e| anyhow::anyhow!(ui_text::error_message(&e.describe())))?;

    let report = services::write_outputs(&pattern, output, tiled).await?;
    let view = ResultView::build(&pattern, ViewMode::Single);

    println!();
    println!("{}", view.pattern_name);
    println!("  {}: {}", ui_text::REPEAT_TYPE, view.repeat_type);
    println!("  {}: {}", ui_text::TILE_SIZE, view.tile_size);
    println!("  {}: {}", ui_text::PRINT_SIZE, view.print_size);
    println!("  {}: {}", ui_text::RESOLUTION, view.resolution);
    println!("  {}: {}", ui_text::FIDELITY_NOTES, view.fidelity_notes);

    println!("\n{}:", ui_text::PALETTE_HEADING);
    for swatch in &view.palette {
        println!("  {} {} ({})", swatch.hex, swatch.name, swatch.cmyk);
    }

    println!();
    for path in report.files.iter().chain(report.tiled.iter()) {
        println!("  + {}", path.display());
    }
    println!("  + {}", report.metadata.display());

    Ok(())
}

/// Extract embedded assets to filesystem
fn run_init_command(
    templates: bool,
    config: bool,
    all: bool,
    force: bool,
    list: bool,
) -> anyhow::Result<()> {
    if list {
        println!("Embedded assets:\n");
        println!("Templates:");
        for f in AssetLoader::list_embedded(AssetCategory::Templates) {
            println!("  {f}");
        }
        println!("\nConfig:");
        for f in AssetLoader::list_embedded(AssetCategory::Config) {
            println!("  {f}");
        }
        return Ok(());
    }

    let mut categories = Vec::new();
    if all || templates {
        categories.push(AssetCategory::Templates);
    }
    if all || config {
        categories.push(AssetCategory::Config);
    }

    if categories.is_empty() {
        eprintln!("No categories specified. Use --all, --templates, or --config");
        eprintln!("\nRun 'hoavan init --list' to see embedded assets.");
        std::process::exit(1);
    }

    let report = AssetLoader::new(templates_dir()).init(&categories, force)?;

    if !report.written.is_empty() {
        println!("Extracted {} files:", report.written.len());
        for f in &report.written {
            println!("  + {f}");
        }
    }
    if !report.skipped.is_empty() {
        println!(
            "\nSkipped {} existing files (use --force to overwrite):",
            report.skipped.len()
        );
        for f in &report.skipped {
            println!("  - {f}");
        }
    }

    if report.written.is_empty() && report.skipped.is_empty() {
        println!("No files to extract.");
    }

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    fn show(name: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| "(not set)".to_string())
    }

    let api_key = match std::env::var("API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY")) {
        Ok(key) if !key.trim().is_empty() => "(set)".to_string(),
        _ => "(not set)".to_string(),
    };

    println!("Hoa Van v{VERSION} - {}", ui_text::APP_TITLE);
    println!("Fabric pattern digitizer\n");

    println!("Environment Variables:");
    println!("  API_KEY         = {api_key}");
    println!("  GEMINI_MODEL    = {}", show("GEMINI_MODEL"));
    println!("  GEMINI_BASE_URL = {}", show("GEMINI_BASE_URL"));
    println!("  BIND_ADDR       = {}", show("BIND_ADDR"));
    println!("  CONFIG_FILE     = {}", show("CONFIG_FILE"));
    println!("  TEMPLATES_DIR   = {}", show("TEMPLATES_DIR"));

    let loader = AssetLoader::new(templates_dir());
    let embedded = AssetLoader::list_embedded(AssetCategory::Templates).len();
    println!("\nTemplates: {} ({embedded} embedded)", loader.list_templates().len());

    println!("\nCommands:");
    println!("  hoavan serve       Start the HTTP server");
    println!("  hoavan digitize    Digitize a photo into a directory");
    println!("  hoavan schema      Print the model response schema");
    println!("  hoavan init        Extract embedded assets");
    println!("\nRun 'hoavan --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoavan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing credentials abort here, before anything is bound
    let config = AppConfig::load(config_file().as_deref())?;
    let bind_addr = config.bind_addr.clone();
    let ttl = Duration::from_secs(config.session.ttl_secs);
    let sweep_interval = Duration::from_secs(config.session.sweep_interval_secs.max(1));

    let templates = templates_dir();
    tracing::info!(
        templates = %templates
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        "Asset sources configured"
    );

    let state = server::create_app_state(config, AssetLoader::new(templates))?;
    let _sweeper = state.sessions.spawn_sweeper(ttl, sweep_interval);
    let sessions = Arc::clone(&state.sessions);

    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Hoa Van server listening");

    axum::serve(listener, app).await?;

    tracing::info!(live_sessions = sessions.len().await, "Server stopped");
    Ok(())
}
