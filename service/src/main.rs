use anyhow::{Context, Result};
use booking_model::{Predictor, SchemaPolicy, Trainer};
use booking_service::{create_router, AppState, ErrorMode, LogFormat, ServiceConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "booking",
    about = "Hotel booking status prediction: offline trainer and HTTP predictor",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log format, overrides LOG_FORMAT (pretty or json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model from a bookings CSV and write the artifact
    Train {
        /// Training data (CSV with a header row)
        #[arg(short, long, default_value = "Hotel_Reservations.csv")]
        data: PathBuf,

        /// Where to write the model artifact
        #[arg(short, long, default_value = "hotel_model.bin")]
        output: PathBuf,

        /// Seed for the validation split and the forest
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of trees
        #[arg(long, default_value_t = 300)]
        trees: usize,

        #[arg(long, default_value_t = 15)]
        max_depth: usize,

        #[arg(long, default_value_t = 5)]
        min_samples_split: usize,

        /// Fraction of rows held out for validation
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        #[arg(long, default_value = "booking_status")]
        label_column: String,

        /// Identifier column to drop; pass an empty string if there is none
        #[arg(long, default_value = "Booking_ID")]
        id_column: String,

        /// Also write the validation report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Port to listen on, overrides PORT
        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifact, overrides MODEL_PATH
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Error envelope, overrides ERROR_MODE (typed or compat)
        #[arg(long)]
        error_mode: Option<ErrorMode>,

        /// Schema drift handling, overrides SCHEMA_POLICY (lenient or strict)
        #[arg(long)]
        schema_policy: Option<SchemaPolicy>,
    },
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_format = match cli.log_format {
        Some(format) => format,
        None => LogFormat::from_env()?,
    };
    init_tracing(log_format);

    match cli.command {
        Commands::Train {
            data,
            output,
            seed,
            trees,
            max_depth,
            min_samples_split,
            test_size,
            label_column,
            id_column,
            report,
        } => {
            let trainer = Trainer::builder()
                .seed(seed)
                .n_estimators(trees)
                .max_depth(max_depth)
                .min_samples_split(min_samples_split)
                .test_size(test_size)
                .build();
            let id_column = Some(id_column.as_str()).filter(|c| !c.is_empty());

            info!(data = %data.display(), output = %output.display(), "training started");
            let outcome = trainer
                .fit_csv(&data, &output, &label_column, id_column)
                .with_context(|| format!("Training on {} failed", data.display()))?;

            println!("Accuracy: {:.4}", outcome.report().accuracy);
            println!("Precision: {:.4}", outcome.report().precision);
            println!("Recall: {:.4}", outcome.report().recall);
            println!("\nClassification Report:\n{}", outcome.report());

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(outcome.report())?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
            }
            info!(output = %output.display(), "model saved");
        }
        Commands::Serve {
            port,
            model,
            error_mode,
            schema_policy,
        } => {
            let config = ServiceConfig::from_env()?;
            let port = port.unwrap_or(config.port);
            let model_path = model.unwrap_or(config.model_path);
            let error_mode = error_mode.unwrap_or(config.error_mode);
            let schema_policy = schema_policy.unwrap_or(config.schema_policy);

            let predictor = Predictor::load(&model_path)
                .with_context(|| format!("Failed to load model from {}", model_path.display()))?
                .with_policy(schema_policy);
            info!(
                model = %model_path.display(),
                features = predictor.schema().len(),
                ?error_mode,
                ?schema_policy,
                "model loaded"
            );

            let app = create_router(AppState::new(predictor, error_mode));
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
                .await
                .with_context(|| format!("Failed to bind 0.0.0.0:{}", port))?;
            info!(port, "listening");

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
