//! Logger installation for the headless driver and tests.
//!
//! The library only talks to the `log` facade. The binary (and any test that
//! wants output) installs `env_logger` through [`init`].
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Maps a `-v` repetition count onto a level filter.
///
/// # Examples
/// ```
/// use log::LevelFilter;
/// use serpentine::logging::level_for;
/// assert_eq!(level_for(0), LevelFilter::Info);
/// assert_eq!(level_for(1), LevelFilter::Debug);
/// assert_eq!(level_for(4), LevelFilter::Trace);
/// ```
#[must_use]
pub const fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initializes the global logger.
///
/// `verbosity` selects the default filter (see [`level_for`]); `RUST_LOG`
/// overrides it. Timestamps are omitted because the simulation is tick based
/// and every tick-scoped message carries its tick number instead.
pub fn init(verbosity: u8) {
    let env = Env::default().default_filter_or(level_for(verbosity).to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp(None).format_module_path(true);

    // `try_init` only fails if a logger was already set. Ignore that case so
    // tests can call `init` multiple times without panicking.
    let _ = builder.try_init();
}
