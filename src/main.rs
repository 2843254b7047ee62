use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use foulcheck::config::Config;
use foulcheck::moderation::ModerationRequest;

/// foulcheck: flag foul messages with a profanity lexicon and a toxicity model.
#[derive(Parser)]
#[command(name = "foulcheck", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the moderation HTTP endpoint
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Moderate a single message and print the verdict
    Check {
        /// The message text
        text: String,

        /// Sender of the message
        #[arg(long)]
        from_user: Option<String>,

        /// Name of the bot, for self-message detection
        #[arg(long)]
        bot_name: Option<String>,

        /// Print the raw JSON response instead of the colored summary
        #[arg(long)]
        json: bool,
    },

    /// Download the ONNX toxicity model (~126 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("foulcheck=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config::load();
            info!(
                threshold = config.threshold,
                labels = ?config.labels,
                custom_words = config.custom_words.len(),
                scorer = ?config.scorer_backend,
                "Loaded configuration"
            );
            // The classifier loads lazily, so a missing model only fails requests.
            if let Err(e) = config.require_scorer() {
                warn!("{e}");
            }

            let moderator = foulcheck::build_moderator(&config)?;
            let state = foulcheck::web::AppState::new(config, moderator);
            foulcheck::web::run_server(state, port, &bind).await?;
        }

        Commands::Check {
            text,
            from_user,
            bot_name,
            json,
        } => {
            if text.is_empty() {
                anyhow::bail!("Message text must not be empty");
            }
            let config = Config::load();
            config.require_scorer()?;

            let moderator = foulcheck::build_moderator(&config)?;
            let request = ModerationRequest {
                text,
                from_user,
                bot_name,
            };
            let outcome = moderator.moderate(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                foulcheck::output::terminal::display_outcome(&outcome);
            }
        }

        Commands::DownloadModel => {
            let config = Config::load();
            let model_dir = &config.model_dir;

            println!("Downloading ONNX toxicity model (unbiased-toxic-roberta)...");
            println!("  Destination: {}", model_dir.display());

            foulcheck::toxicity::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `foulcheck serve` or `foulcheck check \"some text\"`.");
        }
    }

    Ok(())
}
