use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use loom_editor_core::{EditorOptions, LineSeparator, LocalScheduler, Note, NoteChange};
use loom_preview::{AttachmentStorage, LiveEditor, RecordingSink, StorageState};
use miette::{IntoDiagnostic, Result, WrapErr};

/// Upper bound on scheduler ticks for one preview run.
const MAX_TICKS: usize = 64;

#[derive(Parser)]
#[command(version, about = "Loom - live markdown preview pipeline", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Default line separator for text without newlines
    #[arg(long, global = true, value_parser = parse_separator)]
    line_separator: Option<LineSeparator>,

    /// Editor font size in points (clamped to 8..=36)
    #[arg(long, global = true)]
    font_size: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a note through the live preview pipeline
    Preview {
        /// Markdown file to load
        note: PathBuf,

        /// Directory whose files become the note's attachments
        #[arg(long)]
        attachments: Option<PathBuf>,

        /// Where attachments are written for the preview
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output file for the rendered HTML (stdout if absent)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rewrite a file with consistent line separators
    Normalize {
        file: PathBuf,

        /// Force this separator instead of the detected one
        #[arg(long = "to", value_parser = parse_separator)]
        to: Option<LineSeparator>,
    },
}

fn parse_separator(value: &str) -> std::result::Result<LineSeparator, String> {
    LineSeparator::from_name(value)
        .ok_or_else(|| format!("unknown line separator `{value}`, expected lf or crlf"))
}

fn main() -> Result<()> {
    init_miette()?;
    init_tracing();

    let cli = Cli::parse();

    let mut options = EditorOptions::from_env();
    if let Some(sep) = cli.line_separator {
        options.line_separator_default = sep;
    }
    if let Some(size) = cli.font_size {
        options.set_font_size(size);
    }
    tracing::debug!(?options, "editor options");

    match cli.command {
        Commands::Preview {
            note,
            attachments,
            store,
            out,
        } => preview(options, &note, attachments.as_deref(), store, out.as_deref()),
        Commands::Normalize { file, to } => normalize(&options, &file, to),
    }
}

fn preview(
    options: EditorOptions,
    path: &Path,
    attachments: Option<&Path>,
    store: Option<PathBuf>,
    out: Option<&Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "note".to_owned());

    let mut note = Note::new(name.as_str(), name.as_str(), content);
    if let Some(dir) = attachments {
        load_attachments(&mut note, dir)?;
    }

    let store = store.unwrap_or_else(|| default_store(path));
    let scheduler = LocalScheduler::new();
    let sink = RecordingSink::new();
    let mut editor = LiveEditor::new(
        Rc::new(scheduler.clone()),
        options,
        AttachmentStorage::new(&store, StorageState::default()),
        sink.clone(),
    );

    if editor.load_note(Some(note)) == NoteChange::Refused {
        return Err(miette::miette!("note was refused by the editing session"));
    }
    let ticks = scheduler.run_until_idle(MAX_TICKS);
    tracing::info!(
        ticks,
        separator = %editor.document().line_separator(),
        store = %store.display(),
        "preview pipeline idle"
    );
    editor.close();

    let markup = sink.last_markup().ok_or_else(|| {
        miette::miette!(
            help = "check that every attachment could be written to the store directory",
            "no preview was produced"
        )
    })?;

    match out {
        Some(out) => std::fs::write(out, markup.as_str())
            .into_diagnostic()
            .wrap_err_with(|| format!("writing {}", out.display()))?,
        None => std::io::stdout()
            .write_all(markup.as_str().as_bytes())
            .into_diagnostic()?,
    }
    Ok(())
}

fn load_attachments(note: &mut Note, dir: &Path) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading attachment directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.into_diagnostic()?;
        if !entry.file_type().into_diagnostic()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let bytes = std::fs::read(entry.path()).into_diagnostic()?;
        tracing::debug!(%name, size = bytes.len(), "attachment");
        note.set_attachment(name, bytes);
    }
    Ok(())
}

fn default_store(note: &Path) -> PathBuf {
    note.parent()
        .unwrap_or_else(|| Path::new("."))
        .join(".loom-preview")
}

fn normalize(options: &EditorOptions, path: &Path, to: Option<LineSeparator>) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    let (text, detected) = loom_editor_core::detect_and_normalize(&raw, options.line_separator_default);
    let separator = to.unwrap_or(detected);
    let output = loom_editor_core::materialize(&text, separator);

    if output == raw {
        tracing::info!(%separator, "already normalized");
        return Ok(());
    }
    std::fs::write(path, output)
        .into_diagnostic()
        .wrap_err_with(|| format!("writing {}", path.display()))?;
    println!("{}: {detected} -> {separator}", path.display());
    Ok(())
}

fn init_tracing() {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
