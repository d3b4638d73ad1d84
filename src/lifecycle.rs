// Process-wide engine slot.
//
// Nothing is loaded lazily: callers `install` an engine explicitly, queries
// clone the `Arc` out of the slot and never hold the lock while matching.
use std::path::Path;
use std::sync::{Arc, RwLock};

use corpus::CorpusSource;
use index::IndexCache;
use matcher::{MatchOptions, MatchReport};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::engine::{EngineConfig, LicenseEngine};
use crate::{EngineError, QueryError};

fn engine_slot() -> &'static RwLock<Option<Arc<LicenseEngine>>> {
    static ENGINE: OnceCell<RwLock<Option<Arc<LicenseEngine>>>> = OnceCell::new();
    ENGINE.get_or_init(|| RwLock::new(None))
}

/// Make `engine` the process-wide engine, returning the one it replaces.
pub fn install(engine: Arc<LicenseEngine>) -> Option<Arc<LicenseEngine>> {
    let mut guard = engine_slot()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    info!(version = %engine.corpus_version(), "engine_installed");
    guard.replace(engine)
}

/// The installed engine, if any.
pub fn current() -> Option<Arc<LicenseEngine>> {
    let guard = engine_slot()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Remove the installed engine. In-flight queries keep their own handle.
pub fn teardown() -> Option<Arc<LicenseEngine>> {
    let mut guard = engine_slot()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let previous = guard.take();
    if previous.is_some() {
        info!("engine_teardown");
    }
    previous
}

/// Rebuild and install a new engine unless the installed one already
/// serves `config` over the same corpus. Returns whether a new engine was
/// installed.
pub fn reload_if_changed(
    config: &EngineConfig,
    source: &dyn CorpusSource,
    cache: Option<&dyn IndexCache>,
) -> Result<bool, EngineError> {
    if let Some(engine) = current() {
        if engine.config() == config && engine.is_current(source)? {
            return Ok(false);
        }
    }
    let engine = LicenseEngine::init(config, source, cache)?;
    install(Arc::new(engine));
    Ok(true)
}

/// Match the file at `location` with the installed engine.
pub fn match_location(
    location: impl AsRef<Path>,
    opts: &MatchOptions,
) -> Result<MatchReport, QueryError> {
    let engine = current().ok_or(QueryError::EngineNotInstalled)?;
    engine.match_location(location, opts)
}
