use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use trendlab_core::ports::{ForecastModel, RelevanceScorer, TrendStore};
use trendlab_core::AppConfig;
use trendlab_engine::{EngineConfig, TrendEngine};
use trendlab_model::{LexiconScorer, ModelClient, ModelRelevanceScorer};

mod experiments;
mod sources;
mod trends;

#[cfg(test)]
mod tests;

use experiments::ExperimentCommands;

#[derive(Debug, Parser)]
#[command(name = "trendlab")]
#[command(about = "Trend intelligence engine command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect signals from JSON exports and persist the relevant trends
    Collect {
        /// Path to a JSON export holding an array of raw signals; repeatable
        #[arg(long)]
        file: Vec<PathBuf>,

        /// Keep only signals containing this keyword; repeatable
        #[arg(long)]
        keyword: Vec<String>,

        /// Upper bound on signals taken from each source
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Predict the peak for one trend, or for every active trend
    Predict {
        /// Trend id; omit to predict all active trends
        #[arg(long)]
        trend: Option<Uuid>,

        /// Emit predictions as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List trends whose opportunity window is closing, most urgent first
    Opportunities,
    /// List trends peaking 7-14 days out, worth preparing content for
    EarlySignals,
    /// Compare prediction strategies on live trends
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommands,
    },
    /// Delete trend records past their retention horizon
    PurgeExpired,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = trendlab_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = trendlab_db::PoolConfig::from_app_config(&config);
    let pool = trendlab_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = trendlab_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    let engine = build_engine(&config, pool)?;

    match cli.command {
        Commands::Collect {
            file,
            keyword,
            limit,
        } => trends::run_collect(&engine, &file, keyword, limit).await?,
        Commands::Predict {
            trend: Some(trend_id),
            json,
        } => trends::run_predict_one(&engine, trend_id, json).await?,
        Commands::Predict { trend: None, json } => trends::run_predict_all(&engine, json).await?,
        Commands::Opportunities => trends::run_opportunities(&engine).await?,
        Commands::EarlySignals => trends::run_early_signals(&engine).await?,
        Commands::Experiment { command } => match command {
            ExperimentCommands::Run { trend } => {
                experiments::run_experiment_start(&engine, trend).await?;
            }
            ExperimentCommands::Complete {
                experiment,
                peak_date,
            } => experiments::run_experiment_complete(&engine, experiment, peak_date).await?,
            ExperimentCommands::Best => experiments::run_experiment_best(&engine).await?,
        },
        Commands::PurgeExpired => trends::run_purge(&engine).await?,
    }

    Ok(())
}

/// Wire the engine from config: Postgres-backed store, plus the model
/// endpoint when one is configured, or the offline lexicon scorer and the
/// heuristic strategy alone when not.
fn build_engine(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<TrendEngine> {
    let context = trendlab_core::load_business_context(&config.context_path)?;
    let store: Arc<dyn TrendStore> = Arc::new(trendlab_db::PgTrendStore::new(pool));

    let (scorer, forecast): (Arc<dyn RelevanceScorer>, Option<Arc<dyn ForecastModel>>) =
        match config.model_base_url.as_deref() {
            Some(base_url) => {
                let client = Arc::new(
                    ModelClient::new(
                        base_url,
                        config.model_api_key.as_deref(),
                        config.model_request_timeout_secs,
                    )?
                    .with_retry_policy(
                        config.model_max_retries,
                        config.model_retry_backoff_base_ms,
                    ),
                );
                let scorer = ModelRelevanceScorer::new(Arc::clone(&client), context.clone());
                (Arc::new(scorer), Some(client as Arc<dyn ForecastModel>))
            }
            None => {
                tracing::info!("no model endpoint configured; running offline");
                (Arc::new(LexiconScorer::new(context.clone())), None)
            }
        };

    let engine_config = EngineConfig::from_app_config(config);
    Ok(TrendEngine::new(
        store,
        scorer,
        forecast,
        context,
        &engine_config,
    ))
}
