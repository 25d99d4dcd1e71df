//! Terminal Logging Module
//!
//! Provides:
//! - Daily rolling JSON log files (tracing-appender)
//! - `log` crate bridging so `log::info!` call sites land in tracing
//! - Error reporting configured for the detected terminal (miette)
//! - Background gzip compression of rotated logs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use flate2::write::GzEncoder;
use flate2::Compression;
use supports_color::Stream;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Base name of the rolling log file.
pub const LOG_FILE_NAME: &str = "pokedex.log";

static TERMINAL_CAPS: OnceLock<TerminalCapabilities> = OnceLock::new();

fn get_terminal_caps() -> &'static TerminalCapabilities {
    TERMINAL_CAPS.get_or_init(TerminalCapabilities::detect)
}

// ============================================================================
// Terminal Capability Detection
// ============================================================================

/// Terminal color support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLevel {
    /// 24-bit TrueColor (16.7M colors)
    TrueColor,
    /// 256-color palette
    Ansi256,
    /// 16 ANSI colors
    Ansi16,
    /// No color support
    NoColor,
}

/// Detected terminal capabilities
#[derive(Debug, Clone)]
pub struct TerminalCapabilities {
    pub color_level: ColorLevel,
    pub supports_unicode: bool,
    pub is_interactive: bool,
}

impl TerminalCapabilities {
    /// Detect terminal capabilities from environment
    pub fn detect() -> Self {
        use is_terminal::IsTerminal;

        let color_level = match supports_color::on(Stream::Stdout) {
            Some(support) if support.has_16m => ColorLevel::TrueColor,
            Some(support) if support.has_256 => ColorLevel::Ansi256,
            Some(support) if support.has_basic => ColorLevel::Ansi16,
            _ => ColorLevel::NoColor,
        };

        let is_interactive = io::stdout().is_terminal();

        let supports_unicode = std::env::var("TERM")
            .map(|t| !t.contains("dumb"))
            .unwrap_or(true)
            && std::env::var("LANG")
                .map(|l| l.contains("UTF-8") || l.contains("utf8"))
                .unwrap_or(true);

        Self {
            color_level,
            supports_unicode,
            is_interactive,
        }
    }

    /// Check if colors should be used
    pub fn should_colorize(&self) -> bool {
        self.is_interactive && self.color_level != ColorLevel::NoColor
    }
}

// ============================================================================
// Logging Initialization
// ============================================================================

/// Initialize logging for TUI mode.
///
/// Sets up a JSON file logger under `log_dir`, redirects `log` macros to
/// `tracing` and configures miette. Nothing is written to stdout: ratatui
/// owns the terminal while in raw/alternate-screen mode.
///
/// The returned `WorkerGuard` must be kept alive for the duration of the
/// application so buffered logs are flushed on shutdown.
pub fn init_tui(log_dir: &Path) -> WorkerGuard {
    let (file_layer, guard) = file_layer(log_dir);

    tracing_subscriber::registry().with(file_layer).init();

    finish_init(log_dir);

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join(LOG_FILE_NAME)
    );

    guard
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_layer<S>(log_dir: &Path) -> (impl Layer<S>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter());

    (layer, guard)
}

fn finish_init(log_dir: &Path) {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    init_miette();

    // Compress after the subscriber is live so the log macros work
    let log_dir = log_dir.to_path_buf();
    std::thread::spawn(move || {
        compress_old_logs(&log_dir);
    });
}

/// Whether a file in the log directory is a rotated log that should be gzipped.
///
/// `today_suffix` is today's `YYYY-MM-DD`; today's file is still being written.
fn should_compress(name: &str, today_suffix: &str) -> bool {
    let prefix = format!("{LOG_FILE_NAME}.");
    name.starts_with(&prefix) && !name.ends_with(today_suffix) && !name.ends_with(".gz")
}

/// Compress old log files in the background
fn compress_old_logs(log_dir: &Path) {
    let today_suffix = chrono::Local::now().format("%Y-%m-%d").to_string();

    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if should_compress(name, &today_suffix) {
            match compress_file(&path) {
                Ok(()) => log::info!("Compressed old log: {:?}", path),
                Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
            }
        }
    }
}

fn compress_file(path: &Path) -> io::Result<()> {
    let file = fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);

    let mut gz_path_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_path_name.push(".gz");
    let parent_dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?;
    let gz_path: PathBuf = parent_dir.join(gz_path_name);

    if gz_path.exists() {
        return Ok(());
    }

    let output = fs::File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());

    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;

    Ok(())
}

/// Initialize miette for error reporting
fn init_miette() {
    let caps = get_terminal_caps();

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(caps.color_level == ColorLevel::TrueColor)
                .unicode(caps.supports_unicode)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .color(caps.should_colorize())
                .build(),
        )
    }))
    .ok(); // Ignore if already set
}
