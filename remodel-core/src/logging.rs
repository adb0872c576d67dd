//! Subscriber setup for the wiring events this crate emits.
//!
//! Defining entities logs at `debug` (entity creation, reused join
//! entities) and `trace` (each index requirement). Recovered lock poisoning
//! is a `warn`. Applications with their own subscriber can skip this module;
//! the events flow to whatever subscriber is installed.

use crate::error::{RemodelError, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber for remodel's wiring events.
///
/// `RUST_LOG` takes precedence when set. Otherwise `verbose` picks the
/// level: 0 logs warnings and above, 1 adds entity registration, 2 or more
/// adds every index requirement. `quiet` restricts output to errors.
///
/// # Errors
/// Returns a configuration error if a global subscriber is already set.
///
/// # Example
/// ```rust,no_run
/// use remodel_core::{EntityDefinition, SchemaRegistry, init_logging};
///
/// init_logging(2, false)?;
///
/// // logs the entity, the join entity and three index requirements
/// SchemaRegistry::new().define(EntityDefinition::new("Post").has_and_belongs_to_many("Tag"))?;
/// # Ok::<(), remodel_core::RemodelError>(())
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbose, quiet).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| {
            RemodelError::configuration("logging", format!("subscriber already installed: {}", e))
        })
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}
