//! Timer-driven playback of the simulated environment.
//!
//! A [`Player`] owns one simulation session: its PRNG, the current
//! [`SeriesCollection`] and a cancellable tokio timer. While playing, every
//! tick replaces the collection with an advanced copy. Observers subscribe to
//! [`PlayerSnapshot`]s through a watch channel instead of polling.

pub mod config;

pub use config::SimulationConfig;

use crate::error::{Result, SimulationError};
use crate::player::config::{clamp_correlation, clamp_noise, normalize_interval, normalize_seed};
use crate::series::{advance_environment_series, generate_environment_series, Prng, SeriesCollection};
use crate::view::{format_environment, EnvironmentView};
use futures_util::stream::BoxStream;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

/// Playback state of a [`Player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No collection generated (after [`Player::shutdown`])
    Idle,
    /// Advancing on every timer tick
    Playing,
    /// Holding the current collection
    Paused,
}

/// What observers receive on every state change or advancement.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub seed: String,
    /// Advancements since the collection was last generated
    pub ticks: u64,
    pub collection: Arc<SeriesCollection>,
}

/// Mutable session state shared with the timer task.
struct Session {
    config: SimulationConfig,
    prng: Prng,
    collection: Arc<SeriesCollection>,
    state: PlaybackState,
    /// Bumped whenever the running timer must stop
    generation: u64,
    ticks: u64,
    updates: watch::Sender<PlayerSnapshot>,
}

impl Session {
    fn regenerate(&mut self) {
        self.prng = Prng::from_seed(&self.config.seed);
        let start = self.config.start_timestamp.unwrap_or_else(now_millis);
        let generator = self.config.generator_config(start);
        self.collection = Arc::new(generate_environment_series(&mut self.prng, &generator));
        self.ticks = 0;
        debug!(
            seed = %self.config.seed,
            points = self.collection.len(),
            "Generated series"
        );
    }

    fn advance(&mut self) {
        let start = self.config.start_timestamp.unwrap_or_else(now_millis);
        let generator = self.config.generator_config(start);
        self.collection = Arc::new(advance_environment_series(
            &self.collection,
            &mut self.prng,
            &generator,
        ));
        self.ticks += 1;
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state,
            seed: self.config.seed.clone(),
            ticks: self.ticks,
            collection: Arc::clone(&self.collection),
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

/// Stateful simulation player with play/pause transport controls.
///
/// Must be created inside a tokio runtime; the timer runs as a task on that
/// runtime. Dropping the player cancels the timer.
pub struct Player {
    session: Arc<Mutex<Session>>,
    runtime: Handle,
    timer: Option<JoinHandle<()>>,
}

impl Player {
    /// Generate the initial collection from `config.seed` and start playing,
    /// or stay paused when `config.autoplay` is false.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            SimulationError::runtime_error(format!("player requires a tokio runtime: {}", e))
        })?;
        config.validate()?;
        let config = config.normalized();
        let autoplay = config.autoplay;

        let (updates, _) = watch::channel(PlayerSnapshot {
            state: PlaybackState::Idle,
            seed: config.seed.clone(),
            ticks: 0,
            collection: Arc::new(SeriesCollection::default()),
        });
        let mut session = Session {
            prng: Prng::from_seed(&config.seed),
            config,
            collection: Arc::new(SeriesCollection::default()),
            state: PlaybackState::Idle,
            generation: 0,
            ticks: 0,
            updates,
        };
        session.regenerate();
        session.state = if autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        };
        session.publish();
        info!(
            "Player created with seed '{}' ({} points per series)",
            session.config.seed,
            session.collection.len()
        );

        let mut player = Self {
            session: Arc::new(Mutex::new(session)),
            runtime,
            timer: None,
        };
        if autoplay {
            player.arm_timer();
        }
        Ok(player)
    }

    /// Resume advancement. From [`PlaybackState::Idle`] the collection is
    /// regenerated from the current seed first.
    pub fn play(&mut self) {
        {
            let mut session = self.lock();
            match session.state {
                PlaybackState::Playing => return,
                PlaybackState::Idle => session.regenerate(),
                PlaybackState::Paused => {}
            }
            session.state = PlaybackState::Playing;
            session.publish();
        }
        self.arm_timer();
        info!("Playback started");
    }

    /// Stop advancement, keeping the current collection.
    pub fn pause(&mut self) {
        {
            let mut session = self.lock();
            if session.state != PlaybackState::Playing {
                return;
            }
            session.state = PlaybackState::Paused;
            session.generation += 1;
            session.publish();
        }
        self.cancel_timer();
        info!("Playback paused");
    }

    /// Flip between playing and paused.
    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Switch to a new seed and regenerate the collection from scratch.
    ///
    /// Blank seeds fall back to the default seed. The play/pause state is
    /// kept; while idle only the seed is stored.
    pub fn set_seed(&mut self, seed: &str) {
        let seed = normalize_seed(seed);
        let playing = {
            let mut session = self.lock();
            session.config.seed = seed;
            if session.state == PlaybackState::Idle {
                return;
            }
            session.generation += 1;
            session.regenerate();
            session.publish();
            session.state == PlaybackState::Playing
        };
        if playing {
            self.arm_timer();
        }
        info!("Seed changed, series regenerated");
    }

    /// Set the noise scale used from the next advancement on.
    pub fn set_noise(&mut self, noise: f64) {
        let mut session = self.lock();
        session.config.noise = clamp_noise(noise, session.config.noise);
        debug!("Noise set to {}", session.config.noise);
    }

    /// Set the correlation strength used from the next advancement on.
    pub fn set_correlation(&mut self, correlation: f64) {
        let mut session = self.lock();
        session.config.correlation = clamp_correlation(correlation, session.config.correlation);
        debug!("Correlation set to {}", session.config.correlation);
    }

    /// Change the tick cadence in milliseconds, keeping accumulated data.
    ///
    /// Non-finite or non-positive values keep the previous interval.
    pub fn set_update_interval(&mut self, interval_ms: f64) {
        let playing = {
            let mut session = self.lock();
            let interval = normalize_interval(interval_ms, session.config.update_interval_ms);
            if interval == session.config.update_interval_ms {
                return;
            }
            session.config.update_interval_ms = interval;
            session.state == PlaybackState::Playing
        };
        if playing {
            self.arm_timer();
        }
        debug!("Update interval set to {:?}", self.update_interval());
    }

    /// Cancel the timer and discard the collection.
    pub fn shutdown(&mut self) {
        {
            let mut session = self.lock();
            session.state = PlaybackState::Idle;
            session.generation += 1;
            session.collection = Arc::new(SeriesCollection::default());
            session.ticks = 0;
            session.publish();
        }
        self.cancel_timer();
        info!("Player shut down");
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn seed(&self) -> String {
        self.lock().config.seed.clone()
    }

    pub fn noise(&self) -> f64 {
        self.lock().config.noise
    }

    pub fn correlation(&self) -> f64 {
        self.lock().config.correlation
    }

    pub fn update_interval(&self) -> Duration {
        self.lock().config.update_interval()
    }

    pub fn window_days(&self) -> u32 {
        self.lock().config.window_days
    }

    pub fn points_per_day(&self) -> u32 {
        self.lock().config.points_per_day
    }

    pub fn window_size(&self) -> usize {
        self.lock().config.window_size()
    }

    /// Advancements since the collection was last generated.
    pub fn ticks(&self) -> u64 {
        self.lock().ticks
    }

    /// The current collection. Later ticks replace it, never modify it.
    pub fn collection(&self) -> Arc<SeriesCollection> {
        Arc::clone(&self.lock().collection)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.lock().snapshot()
    }

    /// Formatted view of the current collection.
    pub fn view(&self) -> EnvironmentView {
        let (collection, window_size) = {
            let session = self.lock();
            (Arc::clone(&session.collection), session.config.window_size())
        };
        format_environment(&collection, window_size)
    }

    /// Receiver notified on every state change and advancement.
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.lock().updates.subscribe()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn updates(&self) -> BoxStream<'static, PlayerSnapshot> {
        Box::pin(WatchStream::new(self.subscribe()))
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }

    /// Replace any running timer with a fresh one whose first tick is one full
    /// interval from now.
    fn arm_timer(&mut self) {
        self.cancel_timer();
        let (generation, period) = {
            let session = self.lock();
            (session.generation, session.config.update_interval())
        };
        let first_tick = {
            let _guard = self.runtime.enter();
            Instant::now() + period
        };
        let session = Arc::clone(&self.session);
        self.timer = Some(
            self.runtime
                .spawn(run_timer(session, generation, first_tick, period)),
        );
        debug!("Timer armed with {:?} interval", period);
    }

    fn cancel_timer(&mut self) {
        self.lock().generation += 1;
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

async fn run_timer(
    session: Arc<Mutex<Session>>,
    generation: u64,
    first_tick: Instant,
    period: Duration,
) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let advanced = {
            let mut session = lock_session(&session);
            // stale timers exit without touching the session
            if session.generation != generation || session.state != PlaybackState::Playing {
                false
            } else {
                session.advance();
                session.publish();
                debug!(
                    ticks = session.ticks,
                    points = session.collection.len(),
                    "Advanced series"
                );
                true
            }
        };
        if !advanced {
            break;
        }
    }
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::generator::{metric_baseline, DAY_MS, REVERSION};
    use crate::series::{Metric, TimeSeries};

    const START: i64 = 1_760_000_000_000;

    /// Residuals of the last two points of `series`.
    fn last_residuals(series: &TimeSeries, metric: Metric) -> (f64, f64) {
        let points = series.points();
        let residual = |i: usize| points[i].value - metric_baseline(metric, points[i].timestamp);
        (residual(points.len() - 2), residual(points.len() - 1))
    }

    fn config() -> SimulationConfig {
        SimulationConfig::new("silo-1")
            .with_window(1, 24)
            .with_update_interval_ms(1000)
            .with_start_timestamp(Some(START))
    }

    #[test]
    fn test_requires_runtime() {
        let result = Player::new(config());
        assert!(matches!(result, Err(SimulationError::Runtime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_construction_starts_playing() {
        let player = Player::new(config()).unwrap();
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.collection().len(), 24);
        assert_eq!(player.collection().latest_timestamp(), Some(START));
        assert_eq!(player.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_advance_collection() {
        let player = Player::new(config()).unwrap();
        let held = player.collection();

        time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(player.ticks(), 3);
        let current = player.collection();
        assert_eq!(current.len(), 24);
        assert_eq!(current.latest_timestamp(), Some(START + 3 * DAY_MS / 24));
        // the earlier snapshot is untouched
        assert_eq!(held.latest_timestamp(), Some(START));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume() {
        let mut player = Player::new(config()).unwrap();
        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(player.ticks(), 1);

        player.pause();
        assert!(!player.is_playing());
        time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(player.ticks(), 1);

        player.play();
        time::sleep(Duration::from_millis(900)).await;
        assert_eq!(player.ticks(), 1);
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(player.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle() {
        let mut player = Player::new(config()).unwrap();
        player.toggle();
        assert_eq!(player.state(), PlaybackState::Paused);
        player.toggle();
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seed_change_discards_history() {
        let mut player = Player::new(config()).unwrap();
        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(player.ticks(), 2);

        player.set_seed("new-seed");

        assert_eq!(player.seed(), "new-seed");
        assert_eq!(player.ticks(), 0);
        assert!(player.is_playing());
        let expected = generate_environment_series(
            &mut Prng::from_seed("new-seed"),
            &config().generator_config(START),
        );
        assert_eq!(*player.collection(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_seed_uses_default() {
        let mut player = Player::new(config()).unwrap();
        player.set_seed("   ");
        assert_eq!(player.seed(), crate::DEFAULT_SEED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parameter_clamping() {
        let mut player = Player::new(config()).unwrap();

        player.set_noise(9.0);
        assert_eq!(player.noise(), 5.0);
        player.set_noise(f64::NAN);
        assert_eq!(player.noise(), 5.0);
        player.set_correlation(-0.5);
        assert_eq!(player.correlation(), 0.0);
        player.set_update_interval(-20.0);
        assert_eq!(player.update_interval(), Duration::from_millis(1000));
        player.set_update_interval(f64::INFINITY);
        assert_eq!(player.update_interval(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_noise_change_applies_from_next_tick() {
        let mut player = Player::new(config()).unwrap();
        time::sleep(Duration::from_millis(1500)).await;
        let before = player.collection();

        player.set_noise(0.0);

        assert_eq!(player.ticks(), 1);
        assert_eq!(player.collection(), before);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(player.ticks(), 2);
        let after = player.collection();
        for metric in Metric::ALL {
            let (previous, latest) = last_residuals(after.get(metric), metric);
            assert!(
                (latest - REVERSION * previous).abs() < 1e-9,
                "{} residual should only decay",
                metric
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_correlation_change_applies_from_next_tick() {
        let mut player = Player::new(config()).unwrap();
        time::sleep(Duration::from_millis(1500)).await;
        let before = player.collection();

        player.set_correlation(1.0);

        assert_eq!(player.ticks(), 1);
        assert_eq!(player.collection(), before);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(player.ticks(), 2);
        let after = player.collection();
        // with full correlation every residual moves by the same shared
        // shock, scaled per metric (humidity runs opposite)
        let shock = |metric: Metric, scale: f64| {
            let (previous, latest) = last_residuals(after.get(metric), metric);
            (latest - REVERSION * previous) / scale
        };
        let temperature = shock(Metric::Temperature, 1.0);
        assert!((shock(Metric::Humidity, -4.0) - temperature).abs() < 1e-9);
        assert!((shock(Metric::AirQuality, 8.0) - temperature).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_keeps_history() {
        let mut player = Player::new(config()).unwrap();
        time::sleep(Duration::from_millis(2500)).await;
        let before = player.collection();

        player.set_update_interval(250.0);

        assert_eq!(player.ticks(), 2);
        assert_eq!(player.collection(), before);
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(player.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_goes_idle() {
        let mut player = Player::new(config()).unwrap();
        player.shutdown();

        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(player.collection().is_empty());
        time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(player.ticks(), 0);

        player.play();
        assert_eq!(player.collection().len(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_ticks() {
        let player = Player::new(config()).unwrap();
        let mut updates = player.subscribe();

        updates.changed().await.unwrap();

        let snapshot = updates.borrow().clone();
        assert_eq!(snapshot.ticks, 1);
        assert_eq!(snapshot.state, PlaybackState::Playing);
        assert_eq!(snapshot.collection.len(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_disabled() {
        let player = Player::new(config().with_autoplay(false)).unwrap();
        assert_eq!(player.state(), PlaybackState::Paused);
        time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(player.ticks(), 0);
        assert_eq!(player.collection().len(), 24);
    }
}
