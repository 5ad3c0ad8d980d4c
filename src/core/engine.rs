//! Drives the market state: a refresh scheduler, a simulation clock and a
//! single state actor that applies their events one at a time.
//!
//! The scheduler and clock never touch `MarketState` directly. They send
//! `MarketEvent`s into one bounded queue; the actor owns the state, applies
//! each event to completion and publishes a fresh `MarketSnapshot` on a
//! `watch` channel. Cancelling the engine's token stops all three tasks.

use crate::core::config::ScheduleConfig;
use crate::core::currency::CurrencyConverter;
use crate::core::feed::{FeedAdapter, FeedBatch, fetch_all};
use crate::core::market::{MarketSnapshot, MarketState};
use anyhow::{Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub enum MarketEvent {
    /// A completed refresh pass.
    Refresh(FeedBatch),
    /// The refresh pass failed as a whole; reapply conversion only.
    Reconvert,
    Tick,
    Currency(Arc<dyn CurrencyConverter>),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub refresh_interval: Duration,
    pub tick_interval: Duration,
    pub refresh_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&ScheduleConfig::default())
    }
}

impl From<&ScheduleConfig> for EngineConfig {
    fn from(schedule: &ScheduleConfig) -> Self {
        Self {
            refresh_interval: schedule.refresh_interval(),
            tick_interval: schedule.tick_interval(),
            refresh_timeout: schedule.refresh_timeout(),
            queue_capacity: 64,
        }
    }
}

/// Owner-side handle of a running engine.
pub struct EngineHandle {
    events: mpsc::Sender<MarketEvent>,
    snapshots: watch::Receiver<Arc<MarketSnapshot>>,
    refresh_now: Arc<Notify>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineHandle {
    /// Spawns the state actor, refresh scheduler and simulation clock.
    /// The first refresh pass starts immediately.
    pub fn start(
        state: MarketState,
        adapters: Vec<Arc<dyn FeedAdapter>>,
        config: EngineConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(state.snapshot()));
        let refresh_now = Arc::new(Notify::new());

        info!(
            adapters = adapters.len(),
            refresh = ?config.refresh_interval,
            tick = ?config.tick_interval,
            "Starting market engine"
        );

        let tasks = vec![
            tokio::spawn(run_state_actor(
                state,
                events_rx,
                snapshot_tx,
                cancel.clone(),
            )),
            tokio::spawn(run_refresh_scheduler(
                adapters,
                events_tx.clone(),
                Arc::clone(&refresh_now),
                config.clone(),
                cancel.clone(),
            )),
            tokio::spawn(run_simulation_clock(
                events_tx.clone(),
                config.tick_interval,
                cancel.clone(),
            )),
        ];

        Self {
            events: events_tx,
            snapshots: snapshot_rx,
            refresh_now,
            cancel,
            tasks,
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<MarketSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MarketSnapshot>> {
        self.snapshots.clone()
    }

    /// Queues a display currency change behind any pending events.
    pub async fn set_converter(&self, converter: Arc<dyn CurrencyConverter>) -> Result<()> {
        self.events
            .send(MarketEvent::Currency(converter))
            .await
            .map_err(|_| anyhow!("Market engine has stopped"))
    }

    /// Starts a refresh pass now instead of waiting for the next interval.
    pub fn request_refresh(&self) {
        self.refresh_now.notify_one();
    }

    /// Token cancelled when the engine shuts down; lets consumers tie their
    /// own loops (rendering, animation) to the engine's lifetime.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops every task and waits for them. No state mutation happens after
    /// this returns.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "Engine task ended abnormally");
            }
        }
        info!("Market engine stopped");
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_state_actor(
    mut state: MarketState,
    mut events: mpsc::Receiver<MarketEvent>,
    snapshots: watch::Sender<Arc<MarketSnapshot>>,
    cancel: CancellationToken,
) {
    let mut rng = StdRng::from_os_rng();
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            MarketEvent::Refresh(batch) => state.apply_refresh(&batch),
            MarketEvent::Reconvert => {
                warn!("Refresh pass failed, reusing last known state");
                state.apply_conversion_only();
            }
            MarketEvent::Tick => state.tick(&mut rng),
            MarketEvent::Currency(converter) => state.set_converter(converter),
        }
        snapshots.send_replace(Arc::new(state.snapshot()));
    }
    events.close();
    debug!("Market state actor stopped");
}

async fn run_refresh_scheduler(
    adapters: Vec<Arc<dyn FeedAdapter>>,
    events: mpsc::Sender<MarketEvent>,
    refresh_now: Arc<Notify>,
    config: EngineConfig,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(config.refresh_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let requested = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => false,
            _ = refresh_now.notified() => true,
        };
        if requested {
            interval.reset();
        }

        debug!("Starting refresh pass");
        // Each adapter gets the deadline on its own; a slow feed only costs
        // its own category.
        let pass = fetch_all(&adapters, config.refresh_timeout);
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            result = pass => match result {
                Ok(batch) => MarketEvent::Refresh(batch),
                Err(e) => {
                    error!(error = %e, "Refresh pass failed");
                    MarketEvent::Reconvert
                }
            },
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = events.send(event) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Refresh scheduler stopped");
}

async fn run_simulation_clock(
    events: mpsc::Sender<MarketEvent>,
    period: Duration,
    cancel: CancellationToken,
) {
    // Missed ticks are delivered late rather than dropped.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = events.send(MarketEvent::Tick) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Simulation clock stopped");
}
