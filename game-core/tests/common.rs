#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use game_core::{
    Audience, Clock, GameConfig, GameEvent, GameEventHandler, GameSession, Scheduler, Timer,
    TimerId, WordSource,
};
use game_types::PlayerId;
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

/// Clock that only moves when the test says so.
#[derive(Clone)]
pub struct ManualClock {
    start: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }

    pub fn set(&self, elapsed: Duration) {
        *self.offset.lock().unwrap() = elapsed;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledTimer {
    pub id: TimerId,
    pub due: Duration,
    pub timer: Timer,
}

#[derive(Default)]
struct SchedulerState {
    next_id: u64,
    pending: Vec<ScheduledTimer>,
    cancelled: Vec<Timer>,
}

/// Records timers instead of running them; `TestGame::advance` fires them.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    state: Arc<Mutex<SchedulerState>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    pub fn pending(&self) -> Vec<ScheduledTimer> {
        self.state.lock().unwrap().pending.clone()
    }

    pub fn cancelled(&self) -> Vec<Timer> {
        self.state.lock().unwrap().cancelled.clone()
    }

    /// Removes and returns the earliest timer due at or before `until`.
    pub fn pop_due(&self, until: Duration) -> Option<ScheduledTimer> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        Some(state.pending.remove(index))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerId {
        let due = self.clock.elapsed() + delay;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        state.pending.push(ScheduledTimer { id, due, timer });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        let mut state = self.state.lock().unwrap();
        if let Some(index) = state.pending.iter().position(|t| t.id == id) {
            let cancelled = state.pending.remove(index);
            state.cancelled.push(cancelled.timer);
        }
    }
}

/// Event collector for testing event emissions
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<(Audience, GameEvent)>>>,
}

impl EventCollector {
    pub fn all(&self) -> Vec<(Audience, GameEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.all().into_iter().map(|(_, e)| e).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn count(&self, check_fn: impl Fn(&GameEvent) -> bool) -> usize {
        self.events().iter().filter(|e| check_fn(e)).count()
    }

    pub fn round_ends(&self) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::RoundEnded { winner_name, .. } => Some(winner_name),
                _ => None,
            })
            .collect()
    }

    pub fn chat_lines(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::Chat { username, text } => Some((username, text)),
                _ => None,
            })
            .collect()
    }

    pub fn hints(&self) -> Vec<(usize, char)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::HintRevealed { index, letter } => Some((index, letter)),
                _ => None,
            })
            .collect()
    }
}

impl GameEventHandler for EventCollector {
    fn handle_event(&mut self, audience: Audience, event: &GameEvent) {
        self.events.lock().unwrap().push((audience, event.clone()));
    }
}

pub fn test_config() -> GameConfig {
    GameConfig {
        round_duration: Duration::from_secs(60),
        max_rounds: 3,
        round_cooldown: Duration::from_secs(3),
        game_cooldown: Duration::from_secs(10),
        ..GameConfig::default()
    }
}

pub fn test_words() -> WordSource {
    WordSource::from_word_list("Casa\nperro\ngato\narco iris\nmontaña").unwrap()
}

/// A session wired to a manual clock and scheduler, with players addressed by name.
pub struct TestGame {
    pub session: GameSession,
    pub clock: ManualClock,
    pub scheduler: ManualScheduler,
    pub events: EventCollector,
    ids: HashMap<String, PlayerId>,
}

impl TestGame {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::with_config_and_words(config, test_words())
    }

    pub fn with_config_and_words(config: GameConfig, words: WordSource) -> Self {
        let clock = ManualClock::new();
        let scheduler = ManualScheduler::new(clock.clone());
        let events = EventCollector::default();

        let mut session = GameSession::with_rng(
            config,
            words,
            Box::new(scheduler.clone()),
            Box::new(clock.clone()),
            StdRng::seed_from_u64(42),
        )
        .expect("valid test config");
        session.add_handler(Box::new(events.clone()));

        Self {
            session,
            clock,
            scheduler,
            events,
            ids: HashMap::new(),
        }
    }

    pub fn join(&mut self, name: &str) -> PlayerId {
        let id = Uuid::new_v4();
        self.join_as(name, id);
        id
    }

    pub fn join_as(&mut self, name: &str, id: PlayerId) {
        self.ids.insert(name.to_string(), id);
        self.session.join(id, name);
    }

    pub fn leave(&mut self, name: &str) {
        let id = self.id(name);
        self.session.leave(id);
    }

    pub fn id(&self, name: &str) -> PlayerId {
        self.ids[name]
    }

    pub fn guess(&mut self, name: &str, text: &str) {
        let id = self.id(name);
        self.session.guess(id, text);
    }

    /// Moves time forward, firing due timers in order.
    pub fn advance(&mut self, by: Duration) {
        let target = self.clock.elapsed() + by;
        while let Some(scheduled) = self.scheduler.pop_due(target) {
            self.clock.set(scheduled.due);
            self.session.on_timer(scheduled.timer);
        }
        self.clock.set(target);
    }

    pub fn drawer_name(&self) -> Option<String> {
        self.session
            .rounds()
            .current()
            .map(|r| r.drawer_name().to_string())
    }

    pub fn secret_word(&self) -> String {
        self.session
            .rounds()
            .current()
            .map(|r| r.word().to_string())
            .expect("a round is active")
    }

    pub fn round_id(&self) -> u64 {
        self.session
            .rounds()
            .current()
            .map(|r| r.id())
            .expect("a round is active")
    }

    /// Names of joined players other than the current drawer, in join order.
    pub fn guessers(&self) -> Vec<String> {
        let drawer = self.drawer_name();
        self.session
            .roster()
            .list()
            .iter()
            .map(|p| p.name().to_string())
            .filter(|name| Some(name) != drawer.as_ref())
            .collect()
    }

    pub fn score_of(&self, name: &str) -> u32 {
        self.session
            .roster()
            .find(self.id(name))
            .map(|p| p.score())
            .unwrap_or(0)
    }

    pub fn streak_of(&self, name: &str) -> u32 {
        self.session
            .roster()
            .find(self.id(name))
            .map(|p| p.streak())
            .unwrap_or(0)
    }
}
