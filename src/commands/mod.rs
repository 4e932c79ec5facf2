pub mod export;
pub mod races;
pub mod serve;

// Re-export command functions for convenience
pub use export::export;
pub use races::{races, show};
pub use serve::serve;
