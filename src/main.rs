mod api;
mod cli;
mod config;
mod detail;
mod error;
mod feed;
mod model;
mod session;
mod transcript;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gavel", about = "A command-line auction house client")]
pub struct Args {
    #[arg(short = 'c', long, help = "One-shot command mode (e.g. -c \"feed art\")")]
    pub command: Option<String>,

    #[arg(long, env = "GAVEL_BASE_URL", help = "Auction API base URL")]
    pub base_url: Option<String>,

    #[arg(long, help = "API key to persist at login (overrides config/env)")]
    pub api_key: Option<String>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Session state directory")]
    pub state_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_default()
    };

    // CLI overrides beat config files
    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }
    if let Some(state_dir) = &args.state_dir {
        cfg.state_dir = Some(state_dir.clone());
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error: {}", error);
        }
        return Err(anyhow::anyhow!("invalid configuration"));
    }

    let state_dir = cfg.state_dir();
    let store = session::FileStore::new(&state_dir)?;

    let sessions_dir = state_dir.join("sessions");
    std::fs::create_dir_all(&sessions_dir)?;
    let session_id = uuid::Uuid::new_v4().to_string();
    let transcript_path = sessions_dir.join(format!("{}.jsonl", session_id));
    let transcript = transcript::Transcript::new(&transcript_path, &session_id)?;

    let ctx = cli::Context {
        args,
        config: cfg,
        store,
        transport: api::UreqTransport::new(),
        transcript: RefCell::new(transcript),
        session_id,
    };

    if let Some(command) = ctx.args.command.clone() {
        cli::run_once(&ctx, &command)
    } else {
        cli::run_repl(ctx)
    }
}
