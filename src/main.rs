use card_relay::utils::{logger, validation::Validate};
use card_relay::{CliConfig, RelayEngine};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting card-relay");

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let engine = match RelayEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("❌ Could not start the relay: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // A panic inside the run is the only fault that escapes the pipeline.
    let run = tokio::spawn(async move { engine.run().await });
    match run.await {
        Ok(report) => {
            tracing::info!(
                "Run complete: {:?}, status token {:?}",
                report.outcome,
                report.status.map(|s| s.as_wire())
            );
        }
        Err(e) => {
            tracing::error!("❌ Unexpected fault during run: {}", e);
            std::process::exit(1);
        }
    }
}
