use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::websocket::connection::{ConnectionId, ConnectionManager};
use game_core::{
    Audience, Clock, GameConfig, GameEvent, GameEventHandler, GameSession, Scheduler, Timer,
    TimerId, WordSource,
};
use game_types::{GameError, GameSnapshot, ServerMessage};

/// Longest free-standing timer a client may start.
pub const MAX_FREE_TIMER: Duration = Duration::from_secs(3600);

/// Work items for the task that owns the game session.
#[derive(Debug)]
pub enum GameCommand {
    Join {
        connection_id: ConnectionId,
        username: String,
    },
    Leave {
        connection_id: ConnectionId,
    },
    Guess {
        connection_id: ConnectionId,
        text: String,
    },
    StartRound {
        reply: oneshot::Sender<Result<u64, GameError>>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
    Timer(Timer),
}

/// Runs session timers as tokio sleeps that report back on the command channel.
struct TokioScheduler {
    commands: mpsc::WeakUnboundedSender<GameCommand>,
    next_id: u64,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    fn new(commands: mpsc::WeakUnboundedSender<GameCommand>) -> Self {
        Self {
            commands,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerId {
        self.tasks.retain(|_, task| !task.is_finished());

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let commands = self.commands.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(GameCommand::Timer(timer));
            }
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

/// Reads tokio's clock so paused-time tests see consistent round timings.
struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Forwards session events to the dispatch task.
struct ChannelEventHandler {
    events: mpsc::UnboundedSender<(Audience, GameEvent)>,
}

impl GameEventHandler for ChannelEventHandler {
    fn handle_event(&mut self, audience: Audience, event: &GameEvent) {
        if self.events.send((audience, event.clone())).is_err() {
            debug!("Dispatch task gone, dropping {}", event.name());
        }
    }
}

/// Front door to the game session. The session itself lives on its own task
/// and sees commands one at a time in arrival order.
pub struct GameManager {
    commands: mpsc::UnboundedSender<GameCommand>,
    connection_manager: Arc<ConnectionManager>,
}

impl GameManager {
    /// Must be called from within a tokio runtime.
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        config: GameConfig,
        words: WordSource,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut session = GameSession::new(
            config,
            words,
            Box::new(TokioScheduler::new(command_tx.downgrade())),
            Box::new(TokioClock),
        )?;
        session.add_handler(Box::new(ChannelEventHandler { events: event_tx }));

        tokio::spawn(run_session(session, command_rx));
        tokio::spawn(dispatch_events(event_rx, connection_manager.clone()));

        Ok(Self {
            commands: command_tx,
            connection_manager,
        })
    }

    pub fn join(&self, connection_id: ConnectionId, username: String) {
        self.send(GameCommand::Join {
            connection_id,
            username,
        });
    }

    pub fn leave(&self, connection_id: ConnectionId) {
        self.send(GameCommand::Leave { connection_id });
    }

    pub fn submit_guess(&self, connection_id: ConnectionId, text: String) {
        self.send(GameCommand::Guess {
            connection_id,
            text,
        });
    }

    pub async fn start_round(&self) -> Result<u64, GameError> {
        let (reply, response) = oneshot::channel();
        self.send(GameCommand::StartRound { reply });
        response.await.unwrap_or(Err(GameError::SessionUnavailable))
    }

    pub async fn snapshot(&self) -> Option<GameSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(GameCommand::Snapshot { reply });
        response.await.ok()
    }

    /// A countdown shown to everyone. It has no effect on rounds.
    pub async fn start_timer(&self, duration: Duration) -> Result<(), String> {
        if duration.is_zero() || duration > MAX_FREE_TIMER {
            return Err(format!(
                "Timer duration must be between 1 and {} seconds",
                MAX_FREE_TIMER.as_secs()
            ));
        }

        let duration_seconds = duration.as_secs() as u32;
        self.connection_manager
            .broadcast(ServerMessage::TimerStarted { duration_seconds })
            .await;

        let connection_manager = self.connection_manager.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            connection_manager.broadcast(ServerMessage::TimerEnded).await;
        });
        Ok(())
    }

    fn send(&self, command: GameCommand) {
        if let Err(e) = self.commands.send(command) {
            warn!("Game session stopped, dropping {:?}", e.0);
        }
    }
}

async fn run_session(mut session: GameSession, mut commands: mpsc::UnboundedReceiver<GameCommand>) {
    info!("Game session running");

    while let Some(command) = commands.recv().await {
        match command {
            GameCommand::Join {
                connection_id,
                username,
            } => session.join(connection_id.player_id(), &username),
            GameCommand::Leave { connection_id } => session.leave(connection_id.player_id()),
            GameCommand::Guess {
                connection_id,
                text,
            } => session.guess(connection_id.player_id(), &text),
            GameCommand::StartRound { reply } => {
                let _ = reply.send(session.start_round());
            }
            GameCommand::Snapshot { reply } => {
                let _ = reply.send(session.snapshot());
            }
            GameCommand::Timer(timer) => session.on_timer(timer),
        }
    }

    info!("Game session stopped");
}

async fn dispatch_events(
    mut events: mpsc::UnboundedReceiver<(Audience, GameEvent)>,
    connection_manager: Arc<ConnectionManager>,
) {
    while let Some((audience, event)) = events.recv().await {
        let message = to_server_message(&event);
        match audience {
            Audience::Everyone => connection_manager.broadcast(message).await,
            Audience::Player(player_id) => {
                let connection_id = ConnectionId::from(player_id);
                if let Err(e) = connection_manager
                    .send_to_connection(connection_id, message)
                    .await
                {
                    debug!("Could not deliver {} to {}: {}", event.name(), connection_id, e);
                }
            }
        }
    }
}

pub fn to_server_message(event: &GameEvent) -> ServerMessage {
    match event.clone() {
        GameEvent::PlayerJoined { name } => ServerMessage::PlayerJoined { username: name },
        GameEvent::PlayerLeft { name } => ServerMessage::PlayerLeft { username: name },
        GameEvent::ScoresUpdated { players } => ServerMessage::ScoreUpdate { players },
        GameEvent::Snapshot { snapshot } => ServerMessage::GameSnapshot { snapshot },
        GameEvent::RoundStarted {
            drawer_name,
            duration_seconds,
            masked_word,
            ..
        } => ServerMessage::RoundStart {
            drawer_name,
            duration_seconds,
            masked_word,
        },
        GameEvent::WordAssigned { word } => ServerMessage::YourWord { word },
        GameEvent::HintRevealed { index, letter } => ServerMessage::Hint {
            index: index as u32,
            letter: letter.to_string(),
        },
        GameEvent::RoundEnded {
            drawer_name,
            word,
            winner_name,
            ..
        } => ServerMessage::RoundEnd {
            drawer_name,
            word,
            winner_name,
        },
        GameEvent::GameOver {
            winner_name,
            ranking,
        } => ServerMessage::GameOver {
            winner_name,
            ranking,
        },
        GameEvent::Chat { username, text } => ServerMessage::ChatMessage { username, text },
    }
}
