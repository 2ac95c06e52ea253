pub mod config;
pub mod game_events;
pub mod roster;
pub mod round;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod word_source;

// Re-export main components
pub use config::*;
pub use game_events::*;
pub use roster::*;
pub use round::*;
pub use scheduler::*;
pub use scoring::*;
pub use session::*;
pub use word_source::*;
