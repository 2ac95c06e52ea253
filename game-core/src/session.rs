use anyhow::Result;
use game_types::{GameError, GameSnapshot, PlayerId, RoundPhase};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::{
    Clock, GameConfig, GameEvent, GameEventHandler, JoinOutcome, Roster, RoundClose,
    RoundContext, RoundMachine, Scheduler, Timer, TimerId, WordSource,
};

/// The one game in progress on this process.
///
/// A session is driven by a single owner: every command runs to completion
/// before the next one is handled, so no state here needs locking. Hosting
/// several rooms would mean one session per room, each with its own owner.
pub struct GameSession {
    config: GameConfig,
    rounds: RoundMachine,
    ctx: RoundContext,
    completed_rounds: u32,
    pending_start: Option<TimerId>,
}

impl GameSession {
    pub fn new(
        config: GameConfig,
        words: WordSource,
        scheduler: Box<dyn Scheduler>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        Self::with_rng(config, words, scheduler, clock, StdRng::from_os_rng())
    }

    pub fn with_rng(
        config: GameConfig,
        words: WordSource,
        scheduler: Box<dyn Scheduler>,
        clock: Box<dyn Clock>,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let ctx = RoundContext::new(&config, words, scheduler, clock, rng);

        Ok(Self {
            config,
            rounds: RoundMachine::new(),
            ctx,
            completed_rounds: 0,
            pending_start: None,
        })
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.ctx.events.add_handler(handler);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        self.ctx.roster()
    }

    pub fn phase(&self) -> RoundPhase {
        self.rounds.phase()
    }

    pub fn rounds(&self) -> &RoundMachine {
        &self.rounds
    }

    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    pub fn is_start_pending(&self) -> bool {
        self.pending_start.is_some()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let round = self.rounds.current();
        GameSnapshot {
            phase: self.rounds.phase(),
            completed_rounds: self.completed_rounds,
            max_rounds: self.config.max_rounds,
            drawer_name: round.map(|r| r.drawer_name().to_string()),
            masked_word: round.map(|r| r.mask().render()),
            players: self.ctx.roster.scores(),
        }
    }

    pub fn join(&mut self, player_id: PlayerId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            debug!("Ignoring join with blank name from {}", player_id);
            return;
        }

        match self.ctx.roster.add_player(player_id, name) {
            JoinOutcome::AlreadyPresent => {
                debug!("Player {} already joined", player_id);
                return;
            }
            JoinOutcome::Added => {
                info!("{} joined ({} players)", name, self.ctx.roster.len());
            }
            JoinOutcome::Rejoined { previous_id } => {
                info!("{} rejoined on a new connection", name);
                self.rounds.rebind_player(previous_id, player_id);
            }
        }

        self.ctx.events.broadcast(GameEvent::PlayerJoined {
            name: name.to_string(),
        });
        self.broadcast_scores();

        let snapshot = self.snapshot();
        self.ctx
            .events
            .send_to(player_id, GameEvent::Snapshot { snapshot });
        if let Some(round) = self.rounds.current() {
            if round.drawer() == player_id {
                let word = round.word().to_string();
                self.ctx
                    .events
                    .send_to(player_id, GameEvent::WordAssigned { word });
            }
        }

        // A start that was deferred for lack of players is retried here.
        if self.rounds.phase() == RoundPhase::Idle && self.pending_start.is_none() {
            let _ = self.try_start_round();
        }
    }

    pub fn leave(&mut self, player_id: PlayerId) {
        let Some(player) = self.ctx.roster.remove_player(player_id) else {
            debug!("Leave from unknown player {}", player_id);
            return;
        };

        info!("{} left ({} players)", player.name(), self.ctx.roster.len());
        self.ctx.events.broadcast(GameEvent::PlayerLeft {
            name: player.name().to_string(),
        });
        self.broadcast_scores();

        if self.rounds.drawer() == Some(player_id) {
            if let Some(close) = self.rounds.abort_due_to_drawer_left(&mut self.ctx) {
                self.close_round(close);
            }
        }
    }

    pub fn guess(&mut self, player_id: PlayerId, text: &str) {
        if let Some(close) = self.rounds.submit_guess(&mut self.ctx, player_id, text) {
            self.close_round(close);
        }
    }

    /// Starts a round now, replacing any scheduled start.
    pub fn start_round(&mut self) -> Result<u64, GameError> {
        let round_id = self.try_start_round()?;
        if let Some(timer) = self.pending_start.take() {
            self.ctx.scheduler.cancel(timer);
        }
        Ok(round_id)
    }

    pub fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::RevealHint { round_id } => {
                self.rounds.reveal_hint(&mut self.ctx, round_id);
            }
            Timer::ExpireRound { round_id } => {
                if let Some(close) = self.rounds.timeout_expire(&mut self.ctx, round_id) {
                    self.close_round(close);
                }
            }
            Timer::StartNextRound => {
                self.pending_start = None;
                let _ = self.try_start_round();
            }
        }
    }

    fn try_start_round(&mut self) -> Result<u64, GameError> {
        self.rounds.start_round(&mut self.ctx)
    }

    fn close_round(&mut self, close: RoundClose) {
        if let RoundClose::DrawerLeft { .. } = close {
            self.schedule_next_round(self.config.round_cooldown);
            return;
        }

        self.completed_rounds += 1;
        debug!(
            "Round closed ({}/{}): {:?}",
            self.completed_rounds, self.config.max_rounds, close
        );

        if self.completed_rounds >= self.config.max_rounds {
            self.finish_game();
            self.schedule_next_round(self.config.game_cooldown);
        } else {
            self.schedule_next_round(self.config.round_cooldown);
        }
    }

    fn finish_game(&mut self) {
        let ranking = self.ctx.roster.ranking();
        if let Some(top) = ranking.first() {
            info!("Game over, {} wins with {} points", top.name, top.score);
            let winner_name = top.name.clone();
            self.ctx
                .events
                .broadcast(GameEvent::GameOver { winner_name, ranking });
        }

        self.ctx.roster.reset_scores();
        self.completed_rounds = 0;
        self.broadcast_scores();
    }

    fn schedule_next_round(&mut self, delay: std::time::Duration) {
        if let Some(timer) = self.pending_start.take() {
            self.ctx.scheduler.cancel(timer);
        }
        self.pending_start = Some(self.ctx.scheduler.schedule(delay, Timer::StartNextRound));
    }

    fn broadcast_scores(&mut self) {
        let players = self.ctx.roster.scores();
        self.ctx.events.broadcast(GameEvent::ScoresUpdated { players });
    }
}
