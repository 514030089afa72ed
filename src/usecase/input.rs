use anyhow::Context;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc::Sender,
};
use tracing::{debug, warn};

use crate::{controller::SettleEvent, entity::Line};

/// Feed every line of `reader` to the settle loop until EOF.
///
/// Bad directives are logged and skipped. Returns how many lines were read.
pub async fn forward_lines<R>(reader: R, tx: &Sender<SettleEvent>) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count = 0;

    while let Some(line) = lines.next_line().await.context("reading input")? {
        count += 1;
        let event = match Line::parse(&line) {
            Ok(Line::Value(value)) => SettleEvent::Input(value),
            Ok(Line::Delay(delay)) => SettleEvent::DelayChanged(delay),
            Err(e) => {
                warn!("line {}: {}", count, e);
                continue;
            }
        };
        tx.send(event).await.context("settle loop stopped")?;
    }

    debug!("input finished after {} lines", count);
    Ok(count)
}
