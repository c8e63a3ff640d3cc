//! Process-wide structured logging, installed once at binary startup.
//!
//! This is distinct from a session's own append-only `log()` record
//! (`telescope_session::Session::log`) — that one is session-scoped data,
//! this one is operational diagnostics controlled by `RUST_LOG`.

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{
    fmt::{self, format, time},
    prelude::*,
    EnvFilter,
};

struct Guard {}

impl Drop for Guard {
    fn drop(&mut self) {}
}

/// Installs the global subscriber. Defaults to `info` when `RUST_LOG` is unset.
/// Panics if a global subscriber is already installed — callers must invoke
/// this exactly once, before any other component runs.
pub fn init() -> impl Drop {
    init_result()
        .map_err(|e| e.1)
        .expect("could not set global tracing subscriber")
}

fn init_result() -> Result<impl Drop, (impl Drop, SetGlobalDefaultError)> {
    let evt_fmt = format().with_timer(time::Uptime::default()).compact();
    let fmt_layer = fmt::layer().event_format(evt_fmt);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry().with(fmt_layer).with(filter).init();

    Ok::<_, (Guard, SetGlobalDefaultError)>(Guard {})
}
