//! Command-line checker for ranking models
//!
//! Loads a model against a feature list and either prints a summary or
//! scores one feature vector.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ltr_ranker::{
    AppConfig, FeatureSet, LogFormat, LoggingConfig, NaiveAdditiveDecisionTree, ParserFactory,
    XGBoostJsonParser,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ltr-forest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and score learning-to-rank tree models", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Media type of the model
    #[arg(long, global = true, default_value = XGBoostJsonParser::TYPE)]
    model_type: String,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a model and print a summary
    Check {
        /// Model file
        model: PathBuf,

        /// Feature names, one per line
        #[arg(short, long)]
        features: PathBuf,
    },

    /// Load a model and score one feature vector
    Score {
        /// Model file
        model: PathBuf,

        /// Feature names, one per line
        #[arg(short, long)]
        features: PathBuf,

        /// Feature values in feature-list order
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<f32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)?;
    debug!(?config, "configuration loaded");

    println!("{}", run(&cli, &config)?);
    Ok(())
}

/// Execute the subcommand and return the line to print
fn run(cli: &Cli, config: &AppConfig) -> Result<String> {
    match &cli.command {
        Command::Check { model, features } => {
            let forest = load(&cli.model_type, config, model, features)?;
            info!(
                trees = forest.num_trees(),
                nodes = forest.num_nodes(),
                max_depth = forest.max_depth(),
                num_features = forest.num_features(),
                "model is valid"
            );
            Ok(format!(
                "{}: {} trees, {} nodes, max depth {}, {} features",
                model.display(),
                forest.num_trees(),
                forest.num_nodes(),
                forest.max_depth(),
                forest.num_features()
            ))
        }
        Command::Score {
            model,
            features,
            values,
        } => {
            let forest = load(&cli.model_type, config, model, features)?;
            let score = forest
                .score(values)
                .context("Feature values do not match the feature list")?;
            Ok(score.to_string())
        }
    }
}

fn load(
    model_type: &str,
    config: &AppConfig,
    model_path: &Path,
    features_path: &Path,
) -> Result<NaiveAdditiveDecisionTree> {
    let features = fs::read_to_string(features_path)
        .with_context(|| format!("Unable to read feature list {}", features_path.display()))?;
    let set = FeatureSet::from_lines(&features)
        .with_context(|| format!("Invalid feature list {}", features_path.display()))?;

    let mut factory = ParserFactory::default();
    factory.register(Box::new(XGBoostJsonParser::new(config.loader.clone())));
    let Some(parser) = factory.get(model_type) else {
        bail!(
            "Unsupported model type [{}], expected one of {:?}",
            model_type,
            factory.media_types().collect::<Vec<_>>()
        );
    };

    let model = fs::read_to_string(model_path)
        .with_context(|| format!("Unable to read model {}", model_path.display()))?;
    parser.parse(&set, &model).map_err(|err| {
        warn!(kind = ?err.kind(), location = ?err.location(), "model rejected");
        anyhow::Error::new(err).context(format!("Failed to load {}", model_path.display()))
    })
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to set tracing subscriber")
}
