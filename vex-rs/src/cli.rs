//! Command-line argument parsing.
//!
//! Usage:
//!   vex [-u <init>|NONE] [-c <cmd>]... [-S <script>]... [-d] [--] [<file>]

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Init-file specification (`-u`).
    pub init: InitFile,
    /// Ex commands to run after the scripts (`-c`, repeatable).
    pub commands: Vec<String>,
    /// Script files to source after the init file (`-S`, repeatable).
    pub scripts: Vec<PathBuf>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// The file to edit.
    pub file: Option<PathBuf>,
}

/// How to choose the init file.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum InitFile {
    /// `$VEXINIT`, `~/.vexrc`, then the platform config dir (default).
    #[default]
    Search,
    /// `-u NONE`: no init file.
    Skip,
    /// `-u <file>`: this file only.
    Explicit(PathBuf),
}

pub const USAGE: &str = "Usage: vex [-u <init>|NONE] [-c <cmd>]... [-S <script>]... [-d] [--] [<file>]";

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut iter = argv.iter();

    while let Some(arg) = iter.next() {
        let arg = arg.as_str();

        // `--` ends flag processing.
        if arg == "--" {
            positional.extend(iter.by_ref().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            continue;
        }

        // Options taking a value accept it embedded (`-Sfile`) or separate.
        let flag = &arg[1..2];
        let embedded = &arg[2..];
        let mut value = |name: &str| -> Result<String, String> {
            if !embedded.is_empty() {
                Ok(embedded.to_owned())
            } else {
                iter.next()
                    .cloned()
                    .ok_or_else(|| format!("-{name} requires an argument"))
            }
        };

        match flag {
            "d" if embedded.is_empty() => args.debug = true,
            "c" => args.commands.push(value("c")?),
            "S" => args.scripts.push(PathBuf::from(value("S")?)),
            "u" => {
                let v = value("u")?;
                args.init = if v == "NONE" {
                    InitFile::Skip
                } else {
                    InitFile::Explicit(PathBuf::from(v))
                };
            }
            _ => return Err(format!("unknown option: {arg}")),
        }
    }

    match positional.len() {
        0 => {}
        1 => args.file = positional.pop().map(PathBuf::from),
        n => return Err(format!("too many file arguments ({n})")),
    }

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
