//! SmartCommerce — prototype e-commerce recommendation stack.
//!
//! Two entry points: `pipeline` builds the denormalized feature table
//! from the raw warehouse CSVs; `serve` loads that table, constructs the
//! recommendation agents, and serves the REST API.

use clap::{Parser, Subcommand};
use commerce_agents::{
    Aggregator, CollaborativeAgent, ContentAgent, ContextAgent, MarketBasketAgent,
    StaticTrendSignals,
};
use commerce_api::{ApiServer, AppState};
use commerce_core::config::AppConfig;
use commerce_core::personas::PersonaRules;
use commerce_llm::{OpenAiGenerator, TextGenerator};
use commerce_pipeline::{FeaturePipeline, LexiconScorer};
use commerce_storage::CsvWarehouse;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "smart-commerce")]
#[command(about = "E-commerce recommendation stack")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "SMART_COMMERCE__API__HTTP_PORT")]
    http_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the feature table from the raw warehouse CSVs
    Pipeline,
    /// Serve the recommendation API from the processed feature table
    Serve {
        /// Disable every LLM call regardless of configuration
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "smart_commerce=info,commerce_pipeline=info,commerce_storage=info,\
                     commerce_agents=info,commerce_api=info,tower_http=info"
                        .into()
                }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("SmartCommerce starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }

    match cli.command {
        Command::Pipeline => run_pipeline(&config),
        Command::Serve { offline } => serve(config, offline).await,
    }
}

fn run_pipeline(config: &AppConfig) -> anyhow::Result<()> {
    let warehouse = CsvWarehouse::new(
        &config.pipeline.raw_data_dir,
        &config.pipeline.processed_data_dir,
    );
    let raw = warehouse.load_raw_tables()?;

    let pipeline = FeaturePipeline::new(PersonaRules::default(), Box::new(LexiconScorer::new()));
    let table = pipeline.build(&raw)?;

    let path = warehouse.write_feature_table(&table)?;
    info!(rows = table.len(), path = %path.display(), "Feature pipeline complete");
    Ok(())
}

async fn serve(config: AppConfig, offline: bool) -> anyhow::Result<()> {
    let warehouse = CsvWarehouse::new(
        &config.pipeline.raw_data_dir,
        &config.pipeline.processed_data_dir,
    );
    let table = Arc::new(warehouse.load_feature_table()?);

    let generator: Option<Arc<dyn TextGenerator>> = if offline {
        info!("Offline mode, LLM calls disabled");
        None
    } else {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => {
                Some(Arc::new(OpenAiGenerator::new(&config.llm, key)?))
            }
            _ => {
                warn!("OPENAI_API_KEY not set, narration and category selection disabled");
                None
            }
        }
    };

    let content = Arc::new(ContentAgent::new(Arc::clone(&table)));
    let collaborative = Arc::new(CollaborativeAgent::new(Arc::clone(&table)));
    info!("Mining association rules, this can take a while on large tables");
    let basket = Arc::new(MarketBasketAgent::new(&table, config.basket.clone()));
    let context = Arc::new(ContextAgent::new(
        Arc::clone(&table),
        config.context.clone(),
        Box::new(StaticTrendSignals),
        generator.clone(),
    ));
    let aggregator = Arc::new(Aggregator::new(
        Arc::clone(&content),
        Arc::clone(&collaborative),
        Arc::clone(&basket),
        Arc::clone(&context),
        generator,
    ));

    let state = AppState {
        table,
        content,
        collaborative,
        basket,
        context,
        aggregator,
        default_context_k: config.context.default_k,
        start_time: Instant::now(),
    };

    ApiServer::new(config, state).start_http().await
}
