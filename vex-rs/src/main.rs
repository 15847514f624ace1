use std::io::Write as _;
use std::path::Path;

use crossterm::style::Stylize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vex::cli;
use vex::config::{self, Config};
use vex::editor::Editor;
use vex::script::{Interpreter, MessageSink};

/// A message produced by the interpreter thread.
#[derive(Debug)]
enum Message {
    Info(String),
    Error(String),
    Bell,
}

/// Forwards interpreter output to the runtime thread.
struct ChannelSink(mpsc::UnboundedSender<Message>);

impl MessageSink for ChannelSink {
    fn report(&mut self, message: &str) {
        // A closed channel means the host is shutting down; drop the line.
        let _ = self.0.send(Message::Info(message.to_owned()));
    }

    fn report_error(&mut self, message: &str) {
        let _ = self.0.send(Message::Error(message.to_owned()));
    }

    fn indicate_error(&mut self) {
        let _ = self.0.send(Message::Bell);
    }
}

/// One unit of startup work: a sourced file or a `-c` command.
struct Source {
    label: String,
    text: String,
}

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("vex: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let config = Config::from_args(&args);
    init_logging(&config.log_filter);
    debug!(?config, "resolved configuration");

    // ── Load the buffer ──────────────────────────────────────────────────────
    let editor = match &args.file {
        Some(path) => match load_buffer(path).await {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("vex: {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Editor::default(),
    };

    // ── Collect startup sources ──────────────────────────────────────────────
    let mut sources = Vec::new();
    let script_files = config.init_file.iter().chain(args.scripts.iter());
    for path in script_files {
        match config::read_script(path).await {
            Ok(text) => sources.push(Source {
                label: path.display().to_string(),
                text,
            }),
            Err(e) => {
                eprintln!("vex: {e}");
                std::process::exit(1);
            }
        }
    }
    sources.extend(args.commands.iter().map(|cmd| Source {
        label: "-c".to_owned(),
        text: cmd.clone(),
    }));

    // ── Run the interpreter off the runtime ──────────────────────────────────
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vex: can't install SIGINT handler: {e}");
            std::process::exit(1);
        }
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut job = tokio::task::spawn_blocking(move || run_sources(editor, sources, tx));

    let failed = loop {
        tokio::select! {
            Some(msg) = rx.recv() => print_message(msg, config.color),
            joined = &mut job => {
                while let Ok(msg) = rx.try_recv() {
                    print_message(msg, config.color);
                }
                match joined {
                    Ok(failed) => break failed,
                    Err(e) => {
                        eprintln!("vex: interpreter thread failed: {e}");
                        std::process::exit(1);
                    }
                }
            }
            _ = sigint.recv() => {
                eprintln!("vex: interrupted");
                std::process::exit(130);
            }
        }
    };

    if failed {
        std::process::exit(1);
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn load_buffer(path: &Path) -> std::io::Result<Editor> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    let mut editor = Editor::from_text(&text);
    editor.set_path(path);
    Ok(editor)
}

/// Run every source in order.  A failing source doesn't stop the rest;
/// a successful `:quit` does.  Returns whether anything failed.
fn run_sources(editor: Editor, sources: Vec<Source>, tx: mpsc::UnboundedSender<Message>) -> bool {
    let mut interp = Interpreter::with_sink(ChannelSink(tx));
    interp.editor = editor;

    let mut failed = false;
    for source in sources {
        info!(source = %source.label, "running");
        if interp.exec_script(&source.text).is_err() {
            failed = true;
        }
        if interp.quit_requested() {
            debug!(source = %source.label, "quit requested");
            break;
        }
    }
    failed
}

fn print_message(msg: Message, color: bool) {
    match msg {
        Message::Info(line) => println!("{line}"),
        Message::Error(line) if color => eprintln!("{}", line.red()),
        Message::Error(line) => eprintln!("{line}"),
        Message::Bell if color => {
            let mut err = std::io::stderr();
            let _ = err.write_all(b"\x07");
            let _ = err.flush();
        }
        Message::Bell => {}
    }
}
