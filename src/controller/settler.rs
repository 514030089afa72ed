use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, Sender},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, error, info};
use value_debouncer::{DebounceError, DebouncedValue, Delay, Subscription, TokioScheduler};

use crate::{
    config::GLOBAL_CONFIG,
    render::{RenderEvent, Settled},
};

use super::context::{SettleEvent, SettleOptions};

// Settler runs a dedicated task owning one debounced holder.
// Input lines arrive as SettleEvents, settled values leave as RenderEvents.
#[derive(Debug)]
pub struct Settler {
    render_tx: Sender<RenderEvent>,
    options: SettleOptions,
}

struct Published {
    seq: u64,
    started: Instant,
}

impl Published {
    async fn forward(&mut self, value: Option<String>, render_tx: &Sender<RenderEvent>) -> bool {
        // the holder starts empty and never goes back to empty
        let Some(value) = value else {
            return true;
        };
        self.seq += 1;
        let settled = Settled {
            value,
            seq: self.seq,
            elapsed: self.started.elapsed(),
        };
        if let Err(e) = render_tx.send(RenderEvent::Settled(settled)).await {
            error!("render tx error: {}", e);
            return false;
        }
        true
    }

    /// Forward a value published but not yet picked up by the loop.
    async fn drain(
        &mut self,
        subscription: &mut Subscription<Option<String>>,
        render_tx: &Sender<RenderEvent>,
    ) {
        if subscription.has_changed().unwrap_or(false) {
            if let Ok(value) = subscription.changed().await {
                self.forward(value, render_tx).await;
            }
        }
    }
}

impl Settler {
    /// Settler configured from [`GLOBAL_CONFIG`].
    pub fn new(render_tx: Sender<RenderEvent>) -> Self {
        let options = SettleOptions::from(&*GLOBAL_CONFIG.read());
        Self::with_options(render_tx, options)
    }

    pub fn with_options(render_tx: Sender<RenderEvent>, options: SettleOptions) -> Self {
        Self { render_tx, options }
    }

    pub fn initialize(&self) -> Result<(Sender<SettleEvent>, JoinHandle<()>), DebounceError> {
        let scheduler = Arc::new(TokioScheduler::try_current()?);
        let (tx, mut rx) = mpsc::channel::<SettleEvent>(64);
        let render_tx = self.render_tx.clone();
        let options = self.options;

        let task = tokio::spawn(async move {
            let holder =
                DebouncedValue::with_equality(None, options.delay, scheduler, options.equality);
            let mut subscription = holder.subscribe();
            let mut delay: Delay = options.delay;
            let mut latest: Option<String> = None;
            let mut published = Published {
                seq: 0,
                started: Instant::now(),
            };

            loop {
                tokio::select! {
                    some_event = rx.recv() => {
                        let event = some_event.unwrap_or(SettleEvent::Eof);
                        match event {
                            SettleEvent::Input(value) => {
                                latest = Some(value);
                                holder.observe(latest.clone(), delay);
                            }
                            SettleEvent::DelayChanged(new_delay) => {
                                debug!("delay changed to {}ms", new_delay.as_millis());
                                delay = new_delay;
                                if latest.is_some() {
                                    holder.observe(latest.clone(), delay);
                                }
                            }
                            SettleEvent::Eof => {
                                if options.flush_on_eof {
                                    holder.wait_settled().await;
                                }
                                holder.close();
                                published.drain(&mut subscription, &render_tx).await;
                                break;
                            }
                        }
                    }

                    changed = subscription.changed() => {
                        match changed {
                            Ok(value) => {
                                if !published.forward(value, &render_tx).await {
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("settled value subscription ended: {}", e);
                                break;
                            }
                        }
                    }
                }
            }

            info!("settle loop finished after {} values", published.seq);
        });

        Ok((tx, task))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        sync::mpsc::Receiver,
        time::{sleep, sleep_until},
    };

    use super::*;
    use crate::entity::EqualityMode;

    fn options(delay_ms: i64, flush_on_eof: bool) -> SettleOptions {
        SettleOptions {
            delay: Delay::from_millis(delay_ms),
            equality: EqualityMode::Exact,
            flush_on_eof,
        }
    }

    fn start(
        options: SettleOptions,
    ) -> (Sender<SettleEvent>, JoinHandle<()>, Receiver<RenderEvent>) {
        let (render_tx, render_rx) = mpsc::channel(64);
        let (tx, task) = Settler::with_options(render_tx, options)
            .initialize()
            .unwrap();
        (tx, task, render_rx)
    }

    fn values(mut render_rx: Receiver<RenderEvent>) -> Vec<(String, u64)> {
        let mut values = Vec::new();
        while let Ok(RenderEvent::Settled(settled)) = render_rx.try_recv() {
            values.push((settled.value, settled.elapsed.as_millis() as u64));
        }
        values
    }

    /// The value settled `expected_ms` after the loop started, give or take
    /// one timer tick.
    fn assert_settled_at(published: &[(String, u64)], value: &str, expected_ms: u64) {
        assert_eq!(published.len(), 1, "{:?}", published);
        assert_eq!(published[0].0, value);
        assert!(
            (expected_ms..=expected_ms + 1).contains(&published[0].1),
            "settled at {}ms, expected {}ms",
            published[0].1,
            expected_ms
        );
    }

    fn input(value: &str) -> SettleEvent {
        SettleEvent::Input(value.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_publishes_last_value() {
        let begin = Instant::now();
        let (tx, task, render_rx) = start(options(300, false));

        tx.send(input("a")).await.unwrap();
        sleep_until(begin + Duration::from_millis(100)).await;
        tx.send(input("b")).await.unwrap();
        sleep_until(begin + Duration::from_millis(150)).await;
        tx.send(input("c")).await.unwrap();

        sleep_until(begin + Duration::from_millis(600)).await;
        tx.send(SettleEvent::Eof).await.unwrap();
        task.await.unwrap();

        assert_settled_at(&values(render_rx), "c", 450);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_inputs_each_published() {
        let (tx, task, render_rx) = start(options(100, false));

        for value in ["a", "b", "a"] {
            tx.send(input(value)).await.unwrap();
            sleep(Duration::from_millis(150)).await;
        }
        // repeating the settled value publishes nothing
        tx.send(input("a")).await.unwrap();
        sleep(Duration::from_millis(150)).await;
        drop(tx);
        task.await.unwrap();

        let published: Vec<String> = values(render_rx).into_iter().map(|(v, _)| v).collect();
        assert_eq!(published, vec!["a", "b", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_discards_pending_value() {
        let (tx, task, render_rx) = start(options(300, false));

        tx.send(input("lost")).await.unwrap();
        sleep(Duration::from_millis(10)).await;
        tx.send(SettleEvent::Eof).await.unwrap();
        task.await.unwrap();

        assert!(values(render_rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_on_eof_waits_for_pending_value() {
        let (tx, task, render_rx) = start(options(300, true));

        tx.send(input("kept")).await.unwrap();
        tx.send(SettleEvent::Eof).await.unwrap();
        task.await.unwrap();

        assert_settled_at(&values(render_rx), "kept", 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_change_restarts_wait() {
        let begin = Instant::now();
        let (tx, task, render_rx) = start(options(100, true));

        tx.send(input("x")).await.unwrap();
        sleep_until(begin + Duration::from_millis(50)).await;
        tx.send(SettleEvent::DelayChanged(Delay::from_millis(400)))
            .await
            .unwrap();
        tx.send(SettleEvent::Eof).await.unwrap();
        task.await.unwrap();

        assert_settled_at(&values(render_rx), "x", 450);
    }

    #[tokio::test(start_paused = true)]
    async fn test_equality_mode_applies_to_inputs() {
        let (tx, task, render_rx) = start(SettleOptions {
            equality: EqualityMode::Trim,
            ..options(100, true)
        });

        tx.send(input("tokio")).await.unwrap();
        sleep(Duration::from_millis(150)).await;
        tx.send(input("  tokio  ")).await.unwrap();
        sleep(Duration::from_millis(150)).await;
        tx.send(SettleEvent::Eof).await.unwrap();
        task.await.unwrap();

        let published: Vec<String> = values(render_rx).into_iter().map(|(v, _)| v).collect();
        assert_eq!(published, vec!["tokio"]);
    }
}
