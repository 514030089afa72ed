//! Writes settled values to the output stream.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc::{self, Sender},
    task::JoinHandle,
};
use tracing::error;

#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Format {
    /// The value as-is, one per line
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

/// A value that settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub value: String,
    /// 1-based count of values published so far
    pub seq: u64,
    /// Time since the host started
    pub elapsed: Duration,
}

pub enum RenderEvent {
    Settled(Settled),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettledLine<'a> {
    value: &'a str,
    seq: u64,
    elapsed_ms: u64,
}

impl Format {
    pub fn line(&self, settled: &Settled) -> serde_json::Result<String> {
        match self {
            Format::Plain => Ok(settled.value.clone()),
            Format::Json => serde_json::to_string(&SettledLine {
                value: &settled.value,
                seq: settled.seq,
                elapsed_ms: settled.elapsed.as_millis() as u64,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    format: Format,
}

impl Renderer {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    /// Spawn the render task. It owns `out` until every sender is dropped,
    /// then flushes and hands it back.
    pub fn init<W>(&self, mut out: W) -> (Sender<RenderEvent>, JoinHandle<std::io::Result<W>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (render_tx, mut render_rx) = mpsc::channel::<RenderEvent>(64);
        let format = self.format;

        let task = tokio::spawn(async move {
            while let Some(event) = render_rx.recv().await {
                match event {
                    RenderEvent::Settled(settled) => {
                        let mut line = match format.line(&settled) {
                            Ok(line) => line,
                            Err(e) => {
                                error!("failed to format settled value: {}", e);
                                continue;
                            }
                        };
                        line.push('\n');
                        out.write_all(line.as_bytes()).await?;
                        out.flush().await?;
                    }
                }
            }
            out.flush().await?;
            Ok::<W, std::io::Error>(out)
        });

        (render_tx, task)
    }
}
