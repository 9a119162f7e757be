//! Logger setup for the executive
//!
//! One fern dispatch feeds two sinks. The console gets Info and above, so
//! a 50 Hz control loop does not scroll the operator's terminal away; the
//! session log file receives everything down to the requested level, in
//! plain text with the log target included so per-cycle traces can be
//! matched to the module that wrote them. Both sinks timestamp with
//! seconds since the session epoch, the same clock the archives use.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error(
        "The file log level must be at least Info so the session \
        provenance lines are recorded")]
    InvalidFileLogLevel,

    #[error("Cannot open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("Cannot apply the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `file_level` controls how deep the session log file goes (Trace keeps
/// the per-cycle data); the console is always clamped to Info.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    file_level: self::LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if file_level < log::Level::Info {
        return Err(LoggerInitError::InvalidFileLogLevel);
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    // Console: coloured level tags, no targets, Info and above only
    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout());

    // File: plain text (no colour escapes) with the target, full depth
    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {:5}] {}: {}",
                session::get_elapsed_seconds(),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(log_file);

    match fern::Dispatch::new()
        .level(file_level)
        .chain(console)
        .chain(file)
        .apply()
    {
        Ok(_) => (),
        Err(e) => return Err(LoggerInitError::FernInitError(e)),
    };

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    File log level: {:?}", file_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the coloured console tag of a log level
fn level_tag(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}
