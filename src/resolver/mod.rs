//! Manifest resolution with ordered fallback
//!
//! The manifest may live at different paths depending on where the site is
//! deployed, so the resolver walks an ordered list of candidate locations and
//! returns the first one that yields a well-formed manifest.
//!
//! # Behaviour
//!
//! - Candidates are tried strictly in order, one at a time
//! - A candidate fails on transport error, non-success status or malformed body
//! - Failures are logged and the next candidate is tried
//! - When every candidate fails the result is an empty [`Manifest`]
//!
//! Resolution never returns an error to the caller and never caches: every
//! call retrieves the document again.
//!
//! # Usage
//!
//! ```no_run
//! use racecard::config::Config;
//! use racecard::resolver::ManifestResolver;
//!
//! # async fn run() -> racecard::error::Result<()> {
//! let config = Config::default();
//! let resolver = ManifestResolver::from_config(&config)?;
//! let manifest = resolver.resolve().await;
//! println!("{} races", manifest.len());
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod http;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{CandidateConfig, Config, TransportKind};
use crate::error::Result;
use crate::metrics;
use crate::models::{Manifest, ManifestFormat};
use crate::utils::error::{CandidateError, FetchError};

pub use file::FileTransport;
pub use http::HttpTransport;

/// Retrieves the raw body of a candidate location
#[async_trait]
pub trait ManifestTransport: Send + Sync {
    /// Retrieve the body at `location`
    ///
    /// Only success responses produce `Ok`; anything else is a [`FetchError`].
    async fn retrieve(&self, location: &str) -> std::result::Result<String, FetchError>;
}

/// One candidate source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub location: String,
    pub format: ManifestFormat,
}

impl Candidate {
    /// Candidate holding a `{ "races": [...] }` document
    pub fn races(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            format: ManifestFormat::Races,
        }
    }

    /// Candidate holding a legacy predictions document
    pub fn legacy(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            format: ManifestFormat::LegacyPredictions,
        }
    }
}

impl From<&CandidateConfig> for Candidate {
    fn from(config: &CandidateConfig) -> Self {
        Self {
            location: config.location.clone(),
            format: config.format,
        }
    }
}

/// A candidate that was skipped, and why
#[derive(Debug)]
pub struct CandidateFailure {
    pub location: String,
    pub error: CandidateError,
}

/// Which candidate produced the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub index: usize,
    pub location: String,
}

/// Outcome of walking the candidate list
#[derive(Debug)]
pub struct Resolution {
    pub manifest: Manifest,
    pub source: Option<ResolvedSource>,
    pub failures: Vec<CandidateFailure>,
}

impl Resolution {
    /// True when some candidate succeeded
    pub fn is_resolved(&self) -> bool {
        self.source.is_some()
    }

    pub fn into_manifest(self) -> Manifest {
        self.manifest
    }
}

/// Walk `candidates` in order and return the first well-formed manifest
///
/// This is the transport-independent core of resolution. Each candidate is
/// awaited to completion before the next one is tried.
pub async fn resolve_candidates<T>(transport: &T, candidates: &[Candidate]) -> Resolution
where
    T: ManifestTransport + ?Sized,
{
    let _timer = metrics::start_resolve_timer();
    let mut failures = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        match try_candidate(transport, candidate).await {
            Ok(manifest) => {
                tracing::info!(
                    location = %candidate.location,
                    format = candidate.format.as_str(),
                    races = manifest.len(),
                    skipped = failures.len(),
                    "Resolved manifest"
                );
                metrics::record_resolution(true);
                return Resolution {
                    manifest,
                    source: Some(ResolvedSource {
                        index,
                        location: candidate.location.clone(),
                    }),
                    failures,
                };
            }
            Err(error) => {
                tracing::warn!(
                    location = %candidate.location,
                    reason = error.reason(),
                    error = %error,
                    "Manifest candidate failed, trying next"
                );
                metrics::record_candidate_failure(error.reason());
                failures.push(CandidateFailure {
                    location: candidate.location.clone(),
                    error,
                });
            }
        }
    }

    tracing::warn!(
        candidates = candidates.len(),
        "No candidate yielded a manifest, using empty manifest"
    );
    metrics::record_resolution(false);

    Resolution {
        manifest: Manifest::empty(),
        source: None,
        failures,
    }
}

async fn try_candidate<T>(
    transport: &T,
    candidate: &Candidate,
) -> std::result::Result<Manifest, CandidateError>
where
    T: ManifestTransport + ?Sized,
{
    let body = transport.retrieve(&candidate.location).await?;
    Ok(Manifest::from_json_str(&body, candidate.format)?)
}

/// Resolver bound to a transport and a fixed candidate list
#[derive(Clone)]
pub struct ManifestResolver {
    transport: Arc<dyn ManifestTransport>,
    candidates: Vec<Candidate>,
}

impl ManifestResolver {
    /// Create a resolver over an explicit transport
    pub fn new(transport: Arc<dyn ManifestTransport>, candidates: Vec<Candidate>) -> Self {
        Self {
            transport,
            candidates,
        }
    }

    /// Build the transport and candidate list described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL is invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport: Arc<dyn ManifestTransport> = match config.source.transport {
            TransportKind::File => Arc::new(FileTransport::new(&config.source.public_dir)),
            TransportKind::Http => Arc::new(HttpTransport::with_config(
                &config.source.base_url,
                config.request_timeout(),
                &config.source.user_agent,
            )?),
        };

        let candidates = config.source.candidates.iter().map(Candidate::from).collect();
        Ok(Self::new(transport, candidates))
    }

    /// Candidate list in resolution order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Resolve a fresh manifest; empty when every candidate fails
    pub async fn resolve(&self) -> Manifest {
        self.resolve_detailed().await.into_manifest()
    }

    /// Resolve and report which candidate succeeded and why others failed
    pub async fn resolve_detailed(&self) -> Resolution {
        resolve_candidates(self.transport.as_ref(), &self.candidates).await
    }
}
