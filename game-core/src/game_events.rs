use game_types::{GameSnapshot, PlayerId, PlayerScore};

/// Notifications emitted by the session for the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined {
        name: String,
    },
    PlayerLeft {
        name: String,
    },
    ScoresUpdated {
        players: Vec<PlayerScore>,
    },
    Snapshot {
        snapshot: GameSnapshot,
    },
    RoundStarted {
        round_id: u64,
        drawer_name: String,
        duration_seconds: u32,
        masked_word: String,
    },
    /// Sent privately to the drawer.
    WordAssigned {
        word: String,
    },
    HintRevealed {
        index: usize,
        letter: char,
    },
    RoundEnded {
        round_id: u64,
        drawer_name: String,
        word: String,
        winner_name: Option<String>,
    },
    GameOver {
        winner_name: String,
        ranking: Vec<PlayerScore>,
    },
    Chat {
        username: String,
        text: String,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::PlayerJoined { .. } => "player-joined",
            GameEvent::PlayerLeft { .. } => "player-left",
            GameEvent::ScoresUpdated { .. } => "score-update",
            GameEvent::Snapshot { .. } => "snapshot",
            GameEvent::RoundStarted { .. } => "round-start",
            GameEvent::WordAssigned { .. } => "your-word",
            GameEvent::HintRevealed { .. } => "hint",
            GameEvent::RoundEnded { .. } => "round-end",
            GameEvent::GameOver { .. } => "game-over",
            GameEvent::Chat { .. } => "chat-message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Player(PlayerId),
}

/// Event handler trait for processing game events
pub trait GameEventHandler: Send {
    fn handle_event(&mut self, audience: Audience, event: &GameEvent);
}

/// Fans events out to every registered handler, in registration order.
pub struct GameEventBus {
    handlers: Vec<Box<dyn GameEventHandler>>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, audience: Audience, event: GameEvent) {
        tracing::trace!("Publishing {} to {:?}", event.name(), audience);
        for handler in &mut self.handlers {
            handler.handle_event(audience, &event);
        }
    }

    pub fn broadcast(&mut self, event: GameEvent) {
        self.publish(Audience::Everyone, event);
    }

    pub fn send_to(&mut self, player_id: PlayerId, event: GameEvent) {
        self.publish(Audience::Player(player_id), event);
    }
}

impl Default for GameEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Clone, Default)]
    struct TestHandler {
        events: Arc<Mutex<Vec<(Audience, GameEvent)>>>,
    }

    impl GameEventHandler for TestHandler {
        fn handle_event(&mut self, audience: Audience, event: &GameEvent) {
            self.events.lock().unwrap().push((audience, event.clone()));
        }
    }

    #[test]
    fn test_event_bus_delivers_to_all_handlers() {
        let mut bus = GameEventBus::new();
        let first = TestHandler::default();
        let second = TestHandler::default();
        bus.add_handler(Box::new(first.clone()));
        bus.add_handler(Box::new(second.clone()));

        bus.broadcast(GameEvent::PlayerJoined {
            name: "Ana".to_string(),
        });

        for handler in [first, second] {
            let events = handler.events.lock().unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].0, Audience::Everyone);
        }
    }

    #[test]
    fn test_private_delivery_keeps_audience() {
        let mut bus = GameEventBus::new();
        let handler = TestHandler::default();
        bus.add_handler(Box::new(handler.clone()));

        let drawer = Uuid::new_v4();
        bus.send_to(
            drawer,
            GameEvent::WordAssigned {
                word: "casa".to_string(),
            },
        );

        let events = handler.events.lock().unwrap();
        assert_eq!(events[0].0, Audience::Player(drawer));
        assert_eq!(events[0].1.name(), "your-word");
    }

    #[test]
    fn test_snapshot_events_compare_by_value() {
        let snapshot = GameSnapshot {
            phase: game_types::RoundPhase::Active,
            completed_rounds: 1,
            max_rounds: 8,
            drawer_name: Some("Ana".to_string()),
            masked_word: Some("____".to_string()),
            players: vec![PlayerScore {
                name: "Ana".to_string(),
                score: 10,
            }],
        };
        let event = GameEvent::Snapshot {
            snapshot: snapshot.clone(),
        };

        assert_eq!(event, GameEvent::Snapshot { snapshot });
        assert_ne!(
            event,
            GameEvent::PlayerJoined {
                name: "Ana".to_string()
            }
        );
    }
}
