//! Startup configuration: which init file to source, how chatty the logs
//! are, and whether to colour output.
//!
//! | Setting | Source, highest priority first |
//! |---------|--------------------------------|
//! | init file | `-u <file>` / `-u NONE`, `$VEXINIT`, `~/.vexrc`, `<config dir>/vexrc` |
//! | log filter | `-d` (`vex=debug`), `$VEX_LOG`, `warn` |
//! | colour | off when `$NO_COLOR` is set or stderr is not a terminal |

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use crate::cli::{CliArgs, InitFile};

pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEBUG_LOG_FILTER: &str = "vex=debug";

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Config ────────────────────────────────────────────────────────────────────

/// Resolved startup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Init file to source before anything else, if one was found.
    pub init_file: Option<PathBuf>,
    /// `tracing-subscriber` filter directive.
    pub log_filter: String,
    /// Colour error messages.
    pub color: bool,
}

impl Config {
    /// Resolve settings from `args` and the process environment.
    pub fn from_args(args: &CliArgs) -> Self {
        let mut config = Self::with_env(args, |name| std::env::var(name).ok());
        config.color = config.color && stderr_is_tty();
        config
    }

    /// Resolve settings with an explicit environment lookup.  Terminal
    /// detection is left to the caller.
    pub fn with_env(args: &CliArgs, env: impl Fn(&str) -> Option<String>) -> Self {
        let init_file = match &args.init {
            InitFile::Skip => None,
            InitFile::Explicit(path) => Some(path.clone()),
            InitFile::Search => search_init_file(&env),
        };

        let log_filter = if args.debug {
            DEBUG_LOG_FILTER.to_owned()
        } else {
            env("VEX_LOG")
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
        };

        Config {
            init_file,
            log_filter,
            color: env("NO_COLOR").is_none(),
        }
    }
}

/// Candidate init files, in search order.
pub fn init_file_candidates(env: &impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = env("VEXINIT").filter(|p| !p.is_empty()) {
        candidates.push(PathBuf::from(path));
    }
    if let Some(home) = env("HOME").filter(|h| !h.is_empty()) {
        candidates.push(Path::new(&home).join(".vexrc"));
    }
    if let Some(dirs) = ProjectDirs::from("", "", "vex") {
        candidates.push(dirs.config_dir().join("vexrc"));
    }
    candidates
}

fn search_init_file(env: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    init_file_candidates(env).into_iter().find(|p| p.is_file())
}

fn stderr_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDERR_FILENO) != 0 }
}

/// Read a script file without blocking the runtime.
pub async fn read_script(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
