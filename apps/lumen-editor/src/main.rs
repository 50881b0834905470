mod assets;
mod decode;
mod script;

use clap::Parser;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::Theme;
use lm_editor::Editor;
use lm_editor::EditorConfig;
use lm_ipc::EditorEvent;
use lm_layout::Viewport;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "LUMEN_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Applies an editing script to an HTML document.
#[derive(Parser, Debug)]
#[command(name = "lumen-editor")]
#[command(about = "Scripted WYSIWYG HTML editing")]
#[command(version)]
struct Cli {
    /// HTML document to load (starts from an empty document if omitted)
    input: Option<PathBuf>,

    /// Command script, one command per line
    #[arg(short, long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Write the edited document here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Charset of the input, overriding any `<meta charset>`
    #[arg(long, value_name = "LABEL")]
    charset: Option<String>,

    /// Color scheme
    #[arg(long, default_value = "light", value_parser = parse_theme)]
    theme: Theme,

    #[arg(long, default_value_t = 800.0)]
    width: f32,

    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Undo depth
    #[arg(long, default_value_t = 100)]
    history: usize,

    /// Selection-change debounce in milliseconds
    #[arg(long, default_value_t = 100)]
    debounce_ms: u64,

    /// Largest document accepted, in bytes
    #[arg(long)]
    max_document_bytes: Option<usize>,

    /// Deepest element nesting accepted
    #[arg(long)]
    max_depth: Option<usize>,

    /// Frame limit of the host event channel
    #[arg(long)]
    max_message_bytes: Option<usize>,

    /// Print every event the editor emits to stderr
    #[arg(long)]
    events: bool,

    /// Stop at the first failing script line
    #[arg(long)]
    strict: bool,
}

fn parse_theme(value: &str) -> Result<Theme, String> {
    Theme::from_name(value).ok_or_else(|| format!("unknown theme `{value}` (expected: light|dark)"))
}

fn editor_config(cli: &Cli) -> EditorConfig {
    let mut config = EditorConfig::default()
        .with_theme(cli.theme)
        .with_viewport(Viewport {
            width: cli.width,
            height: cli.height,
            ..Viewport::default()
        });
    config.history.max_entries = cli.history;
    config.surface.tracker.debounce = Duration::from_millis(cli.debounce_ms);
    if let Some(bytes) = cli.max_document_bytes {
        config.surface.load_limits.max_bytes = bytes;
    }
    if let Some(depth) = cli.max_depth {
        config.surface.load_limits.max_depth = depth;
    }
    if let Some(bytes) = cli.max_message_bytes {
        config.max_message_bytes = bytes;
    }
    config
}

fn read_file(path: &Path) -> EditorResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|error| EditorError::io("app.read", format!("cannot read {}: {error}", path.display())))
}

fn print_events(events: Vec<EditorEvent>) {
    for event in events {
        eprintln!("event {} {}", event.channel().as_str(), event.payload());
    }
}

/// Runs every script line. Failing lines are reported and skipped unless
/// `strict`. Returns the number of failed lines.
fn run_script(editor: &mut Editor, source: &str, base_dir: &Path, cli: &Cli) -> EditorResult<usize> {
    let mut failures = 0_usize;
    for (index, line) in source.lines().enumerate() {
        let number = index + 1;
        let result = script::parse_line(line)
            .and_then(|step| step.map_or(Ok(None), |step| script::run_step(editor, step, base_dir)));
        editor.flush_pending();
        let events = editor.take_events();
        if cli.events {
            print_events(events);
        }
        match result {
            Ok(Some(output)) => println!("{output}"),
            Ok(None) => {}
            Err(error) if cli.strict => {
                return Err(EditorError::new(error.kind, error.code, format!("line {number}: {}", error.message)));
            }
            Err(error) => {
                warn!(line = number, code = error.code, "{}", error.message);
                eprintln!("line {number}: {error}");
                failures += 1;
            }
        }
    }
    Ok(failures)
}

fn run(cli: &Cli) -> EditorResult<usize> {
    let mut editor = Editor::new(editor_config(cli))?;

    if let Some(path) = &cli.input {
        let html = decode::decode_html(&read_file(path)?, cli.charset.as_deref());
        editor.load_initial(&html)?;
        info!(path = %path.display(), bytes = html.len(), "document loaded");
    }
    editor.focus();

    let mut failures = 0;
    if let Some(path) = &cli.script {
        let source = String::from_utf8_lossy(&read_file(path)?).into_owned();
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        failures = run_script(&mut editor, &source, &base_dir, cli)?;
    }

    let html = editor.serialize();
    match &cli.output {
        Some(path) => std::fs::write(path, html.as_bytes()).map_err(|error| {
            EditorError::io("app.write", format!("cannot write {}: {error}", path.display()))
        })?,
        None => println!("{html}"),
    }
    Ok(failures)
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            eprintln!("lumen-editor: {failures} script line(s) failed");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("lumen-editor: {error}");
            ExitCode::FAILURE
        }
    }
}
