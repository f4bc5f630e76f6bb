use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use logsplit_filter::{FilterRegistry, RetentionPolicy};
use logsplit_tui::Retention;
use logsplit_types::FilterConfig;

mod batch;
mod interactive;

/// logsplit - split a log file into named channels by keyword and regex filters
///
/// In batch mode every channel is written to `<OUTPUT_DIR>/<channel>.txt`.
/// The output directory is deleted and recreated on every run.
#[derive(Parser, Debug)]
#[command(name = "logsplit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file to split (required in batch mode)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Filter config (.toml or .json); defaults to filters.toml or filters.json
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Batch-mode output directory; wiped before every run
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Write channel files instead of opening the viewer
    #[arg(long)]
    batch: bool,

    /// Lines kept per channel in the viewer
    #[arg(long, default_value = "10000")]
    buffer_size: usize,

    /// Which lines a full viewer channel keeps
    #[arg(long, value_enum, default_value_t = Keep::First)]
    keep: Keep,

    /// Log progress at info level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Keep {
    First,
    Last,
}

impl From<Keep> for RetentionPolicy {
    fn from(keep: Keep) -> Self {
        match keep {
            Keep::First => RetentionPolicy::KeepFirst,
            Keep::Last => RetentionPolicy::KeepLast,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Batch,
    Interactive,
}

impl Args {
    /// Batch when asked for, or when stdout is not a terminal
    fn mode(&self, stdout_is_terminal: bool) -> Mode {
        if self.batch || !stdout_is_terminal {
            Mode::Batch
        } else {
            Mode::Interactive
        }
    }

    fn retention(&self) -> Retention {
        Retention::new(self.buffer_size, self.keep.into())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let (registry, config_path) = load_registry(args.config.as_deref())?;

    match args.mode(std::io::stdout().is_terminal()) {
        Mode::Batch => {
            let Some(input) = &args.input else {
                anyhow::bail!("batch mode needs an INPUT file");
            };
            let stop = Arc::new(AtomicBool::new(false));
            spawn_interrupt_watcher(Arc::clone(&stop));

            let mut job = batch::Batch::new(&registry, &args.output_dir)
                .protect(config_path)
                .with_stop_flag(stop);
            if let Ok(cwd) = std::env::current_dir() {
                job = job.protect(cwd);
            }
            job.run(input)?;
        }
        Mode::Interactive => {
            interactive::run(&registry, args.retention(), args.input.as_deref()).await?;
        }
    }

    Ok(())
}

/// Raise `stop` on Ctrl-C so a batch run ends between lines with its files flushed
fn spawn_interrupt_watcher(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current line");
            stop.store(true, Ordering::Relaxed);
        }
    });
}

/// Read the filter config and compile it; any problem aborts startup
fn load_registry(config: Option<&Path>) -> Result<(FilterRegistry, PathBuf)> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            FilterConfig::discover(&cwd)?
        }
    };

    let config = FilterConfig::load(&path)?;
    let registry = FilterRegistry::build(config.channels)
        .with_context(|| format!("invalid filter config '{}'", path.display()))?;

    tracing::info!(
        config = %path.display(),
        channels = registry.len(),
        "filters ready"
    );
    Ok((registry, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("logsplit").chain(extra.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = args(&[]);
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert_eq!(
            args.retention(),
            Retention::new(10000, RetentionPolicy::KeepFirst)
        );
    }

    #[test]
    fn test_keep_last_flag() {
        let args = args(&["--keep", "last", "--buffer-size", "5"]);
        assert_eq!(args.retention(), Retention::new(5, RetentionPolicy::KeepLast));
    }

    #[test]
    fn test_mode_detection() {
        assert_eq!(args(&[]).mode(true), Mode::Interactive);
        assert_eq!(args(&[]).mode(false), Mode::Batch);
        assert_eq!(args(&["--batch"]).mode(true), Mode::Batch);
    }

    #[test]
    fn test_load_registry_reports_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        fs::write(
            &path,
            r#"[
                {"name": "errors", "filters": [{"keyword": "ERROR", "reg": false}]},
                {"name": "errors", "filters": [{"keyword": "FATAL", "reg": false}]}
            ]"#,
        )
        .unwrap();

        let err = load_registry(Some(&path)).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("duplicate"));
        assert!(msg.contains("errors"));
    }

    #[test]
    fn test_load_registry_reports_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.toml");
        fs::write(
            &path,
            "[[channels]]\nname = \"nums\"\nfilters = [{ keyword = '(\\d+', reg = true }]\n",
        )
        .unwrap();

        let msg = format!("{:#}", load_registry(Some(&path)).unwrap_err());
        assert!(msg.contains("nums"));
        assert!(msg.contains("rule 0"));
    }

    #[test]
    fn test_load_registry_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.toml");
        fs::write(
            &path,
            "[[channels]]\nname = \"b\"\n\n[[channels]]\nname = \"a\"\n",
        )
        .unwrap();

        let (registry, loaded_from) = load_registry(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
