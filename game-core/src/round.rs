use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use game_types::{GameError, PlayerId, RoundPhase};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::{
    Clock, GameConfig, GameEvent, GameEventBus, MIN_PLAYERS, Player, Roster, Scheduler,
    ScoringEngine, Timer, TimerId, WordSource,
};

pub const MASK_PLACEHOLDER: char = '_';

/// A secret word as guessers see it: one placeholder per character, spaces
/// kept as spaces, revealed letters shown in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedWord {
    letters: Vec<char>,
    revealed: BTreeMap<usize, char>,
}

impl MaskedWord {
    pub fn new(word: &str) -> Self {
        Self {
            letters: word.chars().collect(),
            revealed: BTreeMap::new(),
        }
    }

    pub fn render(&self) -> String {
        self.letters
            .iter()
            .enumerate()
            .map(|(i, &ch)| {
                if ch == ' ' {
                    ' '
                } else {
                    self.revealed.get(&i).copied().unwrap_or(MASK_PLACEHOLDER)
                }
            })
            .collect()
    }

    pub fn hidden_indices(&self) -> Vec<usize> {
        self.letters
            .iter()
            .enumerate()
            .filter(|(i, ch)| **ch != ' ' && !self.revealed.contains_key(i))
            .map(|(i, _)| i)
            .collect()
    }

    /// Reveals the character at `index`. Returns `None` for spaces, indices
    /// outside the word, and characters that are already visible.
    pub fn reveal(&mut self, index: usize) -> Option<char> {
        let ch = *self.letters.get(index)?;
        if ch == ' ' || self.revealed.contains_key(&index) {
            return None;
        }
        self.revealed.insert(index, ch);
        Some(ch)
    }

    pub fn reveal_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, char)> {
        let hidden = self.hidden_indices();
        if hidden.is_empty() {
            return None;
        }
        let index = hidden[rng.random_range(0..hidden.len())];
        self.reveal(index).map(|ch| (index, ch))
    }

    pub fn revealed(&self) -> &BTreeMap<usize, char> {
        &self.revealed
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

#[derive(Debug)]
pub struct Round {
    id: u64,
    drawer: PlayerId,
    drawer_name: String,
    word: String,
    normalized: String,
    mask: MaskedWord,
    started_at: Instant,
    hint_timer: Option<TimerId>,
    timeout_timer: Option<TimerId>,
}

impl Round {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn drawer(&self) -> PlayerId {
        self.drawer
    }

    pub fn drawer_name(&self) -> &str {
        &self.drawer_name
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn mask(&self) -> &MaskedWord {
        &self.mask
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    fn cancel_timers(&mut self, scheduler: &mut dyn Scheduler) {
        for timer in [self.hint_timer.take(), self.timeout_timer.take()]
            .into_iter()
            .flatten()
        {
            scheduler.cancel(timer);
        }
    }
}

/// How a round left the `Active` phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundClose {
    Guessed {
        round_id: u64,
        winner: PlayerId,
        winner_name: String,
        points: u32,
    },
    TimedOut {
        round_id: u64,
    },
    DrawerLeft {
        round_id: u64,
    },
}

/// Everything a round needs besides its own state: the roster it mutates,
/// the collaborators it consults and the bus it reports to.
pub struct RoundContext {
    pub(crate) roster: Roster,
    pub(crate) words: WordSource,
    pub(crate) scoring: ScoringEngine,
    pub(crate) events: GameEventBus,
    pub(crate) scheduler: Box<dyn Scheduler>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) rng: StdRng,
    pub(crate) round_duration: Duration,
    pub(crate) hint_delay: Duration,
}

impl RoundContext {
    pub fn new(
        config: &GameConfig,
        words: WordSource,
        scheduler: Box<dyn Scheduler>,
        clock: Box<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Self {
            roster: Roster::new(),
            words,
            scoring: ScoringEngine::new(config.scoring),
            events: GameEventBus::new(),
            scheduler,
            clock,
            rng,
            round_duration: config.round_duration,
            hint_delay: config.hint_delay(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    fn chat(&mut self, username: String, text: &str) {
        self.events.broadcast(GameEvent::Chat {
            username,
            text: text.to_string(),
        });
    }
}

/// Lifecycle of the single round in play: `Idle` → `Active` → `Resolving` → `Idle`.
#[derive(Debug)]
pub struct RoundMachine {
    phase: RoundPhase,
    current: Option<Round>,
    last_drawer: Option<PlayerId>,
    next_round_id: u64,
}

impl RoundMachine {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::Idle,
            current: None,
            last_drawer: None,
            next_round_id: 1,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn current(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    pub fn drawer(&self) -> Option<PlayerId> {
        self.current.as_ref().map(Round::drawer)
    }

    pub fn last_drawer(&self) -> Option<PlayerId> {
        self.last_drawer
    }

    pub fn start_round(&mut self, ctx: &mut RoundContext) -> Result<u64, GameError> {
        if self.phase != RoundPhase::Idle {
            debug!("Ignoring round start while {:?}", self.phase);
            return Err(GameError::RoundAlreadyActive);
        }

        if ctx.roster.len() < MIN_PLAYERS {
            debug!(
                "Not starting round: {} of {} players connected",
                ctx.roster.len(),
                MIN_PLAYERS
            );
            return Err(GameError::NotEnoughPlayers {
                required: MIN_PLAYERS as u32,
                connected: ctx.roster.len() as u32,
            });
        }

        // Nobody draws twice in a row unless they are the only candidate.
        let mut candidates: Vec<&Player> = ctx.roster.list().iter().collect();
        if let Some(last) = self.last_drawer {
            if candidates.len() > 1 {
                candidates.retain(|p| p.id() != last);
            }
        }
        let drawer = candidates[ctx.rng.random_range(0..candidates.len())];
        let drawer_id = drawer.id();
        let drawer_name = drawer.name().to_string();

        let word = ctx.words.pick_random(&mut ctx.rng).to_string();
        let round_id = self.next_round_id;
        self.next_round_id += 1;

        let hint_timer = ctx
            .scheduler
            .schedule(ctx.hint_delay, Timer::RevealHint { round_id });
        let timeout_timer = ctx
            .scheduler
            .schedule(ctx.round_duration, Timer::ExpireRound { round_id });

        let mask = MaskedWord::new(&word);
        let masked_word = mask.render();
        self.current = Some(Round {
            id: round_id,
            drawer: drawer_id,
            drawer_name: drawer_name.clone(),
            normalized: word.trim().to_lowercase(),
            word: word.clone(),
            mask,
            started_at: ctx.clock.now(),
            hint_timer: Some(hint_timer),
            timeout_timer: Some(timeout_timer),
        });
        self.phase = RoundPhase::Active;

        info!("Round {} started, {} is drawing", round_id, drawer_name);
        ctx.events.broadcast(GameEvent::RoundStarted {
            round_id,
            drawer_name,
            duration_seconds: ctx.round_duration.as_secs() as u32,
            masked_word,
        });
        ctx.events.send_to(drawer_id, GameEvent::WordAssigned { word });

        Ok(round_id)
    }

    /// Handles a chat line from a player. Only an exact (trimmed,
    /// case-insensitive) match from a guesser closes the round; everything
    /// else is relayed as chat.
    pub fn submit_guess(
        &mut self,
        ctx: &mut RoundContext,
        player_id: PlayerId,
        text: &str,
    ) -> Option<RoundClose> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let Some(username) = ctx.roster.find(player_id).map(|p| p.name().to_string()) else {
            debug!("Ignoring guess from unknown player {}", player_id);
            return None;
        };

        let round = match (self.phase, self.current.as_ref()) {
            (RoundPhase::Active, Some(round)) => round,
            _ => {
                debug!("Guess from {} outside an active round", username);
                ctx.chat(username, text);
                return None;
            }
        };

        let normalized = text.to_lowercase();
        if round.drawer == player_id {
            if normalized == round.normalized {
                debug!("Suppressed drawer {} typing the secret word", player_id);
            } else {
                ctx.chat(username, text);
            }
            return None;
        }

        if normalized != round.normalized {
            ctx.chat(username, text);
            return None;
        }

        self.phase = RoundPhase::Resolving;
        let mut round = self.current.take()?;
        let elapsed = ctx.clock.now().saturating_duration_since(round.started_at);
        let points = ctx
            .scoring
            .award(&mut ctx.roster, player_id, elapsed)
            .map(|award| award.points)
            .unwrap_or(0);
        round.cancel_timers(&mut *ctx.scheduler);

        info!(
            "Round {} won by {} after {:.1}s (+{})",
            round.id,
            username,
            elapsed.as_secs_f32(),
            points
        );
        ctx.events.broadcast(GameEvent::ScoresUpdated {
            players: ctx.roster.scores(),
        });
        ctx.events.broadcast(GameEvent::RoundEnded {
            round_id: round.id,
            drawer_name: round.drawer_name.clone(),
            word: round.word.clone(),
            winner_name: Some(username.clone()),
        });
        self.finish(&round);

        Some(RoundClose::Guessed {
            round_id: round.id,
            winner: player_id,
            winner_name: username,
            points,
        })
    }

    pub fn reveal_hint(&mut self, ctx: &mut RoundContext, round_id: u64) -> Option<(usize, char)> {
        let round = match (self.phase, self.current.as_mut()) {
            (RoundPhase::Active, Some(round)) if round.id == round_id => round,
            _ => {
                debug!("Ignoring stale hint for round {}", round_id);
                return None;
            }
        };

        if round.hint_timer.take().is_none() {
            debug!("Hint for round {} already revealed", round_id);
            return None;
        }
        let (index, letter) = round.mask.reveal_random(&mut ctx.rng)?;
        debug!("Round {} hint: index {} is '{}'", round_id, index, letter);
        ctx.events
            .broadcast(GameEvent::HintRevealed { index, letter });
        Some((index, letter))
    }

    pub fn timeout_expire(&mut self, ctx: &mut RoundContext, round_id: u64) -> Option<RoundClose> {
        match (self.phase, self.current.as_ref()) {
            (RoundPhase::Active, Some(round)) if round.id == round_id => {}
            _ => {
                debug!("Ignoring stale timeout for round {}", round_id);
                return None;
            }
        }

        self.phase = RoundPhase::Resolving;
        let mut round = self.current.take()?;
        round.timeout_timer = None;
        round.cancel_timers(&mut *ctx.scheduler);

        info!("Round {} timed out, the word was '{}'", round.id, round.word);
        self.end_without_winner(ctx, &round);
        self.finish(&round);
        Some(RoundClose::TimedOut { round_id: round.id })
    }

    /// Closes the round without scoring because its drawer is gone.
    pub fn abort_due_to_drawer_left(&mut self, ctx: &mut RoundContext) -> Option<RoundClose> {
        if self.phase != RoundPhase::Active {
            return None;
        }

        let mut round = self.current.take()?;
        round.cancel_timers(&mut *ctx.scheduler);

        info!("Round {} aborted, drawer {} left", round.id, round.drawer_name);
        self.end_without_winner(ctx, &round);
        self.finish(&round);
        Some(RoundClose::DrawerLeft { round_id: round.id })
    }

    /// Follows a player whose entry moved to a new connection id.
    pub fn rebind_player(&mut self, previous_id: PlayerId, new_id: PlayerId) {
        if let Some(round) = self.current.as_mut() {
            if round.drawer == previous_id {
                round.drawer = new_id;
            }
        }
        if self.last_drawer == Some(previous_id) {
            self.last_drawer = Some(new_id);
        }
    }

    fn end_without_winner(&self, ctx: &mut RoundContext, round: &Round) {
        ctx.events.broadcast(GameEvent::RoundEnded {
            round_id: round.id,
            drawer_name: round.drawer_name.clone(),
            word: round.word.clone(),
            winner_name: None,
        });
    }

    fn finish(&mut self, round: &Round) {
        self.last_drawer = Some(round.drawer);
        self.phase = RoundPhase::Idle;
    }
}

impl Default for RoundMachine {
    fn default() -> Self {
        Self::new()
    }
}
