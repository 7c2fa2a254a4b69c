//! Manual test helper: writes one field payload into the consumer pipe.
//!
//! Unlike the relay, this opens the pipe in blocking mode and waits for a
//! reader to attach.

use card_relay::config::DEFAULT_FIFO_PATH;
use card_relay::domain::model::Payload;
use card_relay::utils::logger;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;

#[derive(Parser)]
#[command(name = "fifo_writer")]
#[command(about = "Write a sample card payload into the consumer pipe")]
struct Args {
    /// Named pipe to write to
    #[arg(short, long, default_value = DEFAULT_FIFO_PATH)]
    fifo_path: String,

    #[arg(long, default_value = "1234567890123456")]
    pan: String,

    /// Expiry as YYMM; pass an empty string to send the PAN alone
    #[arg(long, default_value = "1226")]
    expiry: String,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let payload = Payload::Fields {
        pan: args.pan,
        expiry: Some(args.expiry).filter(|e| !e.is_empty()),
    };

    tracing::debug!("Opening {} for writing", args.fifo_path);
    let mut pipe = match OpenOptions::new().write(true).open(&args.fifo_path) {
        Ok(pipe) => pipe,
        Err(e) => {
            eprintln!(
                "❌ Could not open {}: {}. Make sure the pipe exists (mkfifo {}).",
                args.fifo_path, e, args.fifo_path
            );
            std::process::exit(1);
        }
    };

    pipe.write_all(payload.to_wire().as_bytes())?;
    println!("✅ Wrote {} to {}", payload, args.fifo_path);
    Ok(())
}
