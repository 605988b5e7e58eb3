//! Tracing initialization and the crate-wide logging prelude.
//!
//! Modules import `crate::tracing::prelude::*` for the level macros
//! rather than depending on the `tracing` crate path directly.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub mod prelude {
    pub use tracing::{Instrument, debug, error, info, trace, warn};
}

/// Install the global subscriber.
///
/// Filtering comes from `RUST_LOG` (default `info`). Interactive runs log
/// to stdout with local timestamps; non-interactive runs prefer journald,
/// falling back to plain stdout when no journal socket is available.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::io::stdout().is_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
            .init();
        return;
    }

    match tracing_journald::layer() {
        Ok(journald) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(journald)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
