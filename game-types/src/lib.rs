pub mod errors;
pub mod messages;
pub mod player;
pub mod session;
pub mod words;

// Re-export all types
pub use errors::*;
pub use messages::*;
pub use player::*;
pub use session::*;
pub use words::*;

use uuid::Uuid;

/// Stable opaque identifier the external identity layer assigns to a client.
pub type PlayerId = Uuid;

/// Six-character join code identifying a session.
pub type SessionId = String;
