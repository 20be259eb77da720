//! Terminal host for the discovery engine: stdin is the input control and
//! stdout is the output region.

use anyhow::Context;
use clap::Parser;
use discovery_core::{Engine, EngineHandle, Submission, Surface};
use discovery_rules::HostConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "discovery-repl", about = "Talk to the discovery layer from a terminal")]
struct Args {
    /// Host configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rule document location, overriding the config.
    #[arg(short, long)]
    rules: Option<String>,

    /// Site root for relative endpoints, overriding the config.
    #[arg(short, long)]
    base_url: Option<String>,

    /// Persist the session record here instead of in memory.
    #[arg(short, long)]
    session_file: Option<PathBuf>,
}

struct TerminalSurface;

impl Surface for TerminalSurface {
    fn show_ascii(&self, art: &str) {
        println!("{}", art);
    }

    fn show_reply(&self, text: &str) {
        println!("> {}", text);
    }

    fn show_idle(&self, text: &str) {
        println!("... {}", text);
    }

    fn reveal(&self, _path: &str, label: &str) {
        println!("[discovered: {}]", label);
    }

    fn navigate(&self, target: &str, new_context: bool) {
        if new_context {
            println!("[opening {} in a new window]", target);
        } else {
            println!("[navigating to {}]", target);
        }
    }

    fn render_nav(&self, fragment: &str) {
        if !fragment.is_empty() {
            println!("nav: {}", fragment);
        }
    }

    fn reload(&self) {
        println!("*poof*");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HostConfig::default(),
    };
    if let Some(rules) = args.rules {
        config.rules = rules;
    }
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if args.session_file.is_some() {
        config.session_file = args.session_file;
    }

    let engine = Engine::from_config(&config, Arc::new(TerminalSurface)).await;
    let handle = EngineHandle::new(engine);
    handle.start().await;

    // The terminal reads the next line only after the previous one has been
    // handled, so piped input is never dropped as overlapping.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Submission::Busy = handle.submit(&line).await {
            log::warn!("Dropped input while the engine was busy: {}", line);
        }
    }

    Ok(())
}
