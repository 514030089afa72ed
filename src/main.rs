use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use config::{initialize_config, UserConfig};
use controller::{SettleEvent, Settler};
use entity::EqualityMode;
use render::{Format, Renderer};
use tokio::io::BufReader;
use tracing::{error, info};
use usecase::forward_lines;

mod config;
mod controller;
mod entity;
mod render;
mod usecase;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    ///quiet period in milliseconds a line must hold before it is printed, negative means 0
    #[arg(short, long, allow_negative_numbers = true)]
    delay: Option<i64>,
    ///"plain" prints the value, "json" prints {"value", "seq", "elapsedMs"}
    #[arg(short, long, value_enum)]
    format: Option<Format>,
    ///how lines are compared when deciding whether the input changed
    #[arg(short, long, value_enum)]
    equality: Option<EqualityMode>,
    ///json config file, flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    ///on EOF wait for the last line to settle instead of dropping it.
    ///without it, a line still waiting when input ends is never printed,
    ///so `printf 'hello\n' | settle` prints nothing
    #[arg(long)]
    flush_on_eof: bool,
}

impl Args {
    fn overrides(&self) -> UserConfig {
        UserConfig {
            delay_ms: self.delay,
            equality: self.equality,
            format: self.format,
            flush_on_eof: self.flush_on_eof.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    //logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let file_config = match &args.config {
        Some(path) => UserConfig::load(path)?,
        None => UserConfig::default(),
    };
    let config = initialize_config(file_config.merge(args.overrides()));
    info!(
        "settling stdin with a {}ms delay",
        config.delay.as_millis()
    );

    let (render_tx, render_task) = Renderer::new(config.format).init(tokio::io::stdout());
    let (tx, settle_task) = Settler::new(render_tx).initialize()?;

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = forward_lines(stdin, &tx).await {
        error!("{:#}", e);
    }
    if tx.send(SettleEvent::Eof).await.is_err() {
        error!("settle loop stopped before EOF");
    }
    drop(tx);

    settle_task.await.context("settle loop panicked")?;
    render_task
        .await
        .context("render task panicked")?
        .context("writing to stdout")?;

    Ok(())
}
