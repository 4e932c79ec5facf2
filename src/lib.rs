//! racecard - Race prediction viewer
//!
//! Resolves a race manifest from an ordered list of candidate locations and
//! renders a race card page where one race at a time is selected through a
//! query parameter.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Manifest, race and attachment types
//! - [`resolver`] - Ordered fallback manifest resolution over file or HTTP
//! - [`selection`] - Selection key handling and the race picker state
//! - [`render`] - Handlebars page and fragment rendering
//! - [`server`] - Axum viewer server
//! - [`export`] - Static site export
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use racecard::config::Config;
//! use racecard::resolver::ManifestResolver;
//! use racecard::selection::{QueryState, SelectionCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> racecard::Result<()> {
//!     let config = Config::from_env()?;
//!     let resolver = ManifestResolver::from_config(&config)?;
//!     let manifest = resolver.resolve().await;
//!
//!     let coordinator = SelectionCoordinator::new(
//!         manifest,
//!         QueryState::parse("?raceId=202405021211"),
//!         config.selection.query_param.as_str(),
//!     );
//!     if let Some(race) = coordinator.active() {
//!         println!("{}", race.label());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod render;
pub mod resolver;
pub mod selection;
pub mod server;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, RacecardErrorTrait, Result};
    pub use crate::export::StaticExporter;
    pub use crate::models::{Attachment, AttachmentKind, Manifest, ManifestFormat, RaceRecord};
    pub use crate::render::{FragmentLinks, PageRenderer};
    pub use crate::resolver::{Candidate, ManifestResolver, ManifestTransport};
    pub use crate::selection::{select, QueryState, SelectionCoordinator, SelectionState};
    pub use crate::server::ViewerServer;
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use models::{Manifest, RaceRecord};
