pub mod guess;
pub mod presence;
pub mod secret_store;
pub mod session;
pub mod word_lists;
pub mod word_pool;

// Re-export main components
pub use guess::*;
pub use presence::*;
pub use secret_store::*;
pub use session::*;
pub use word_pool::*;
