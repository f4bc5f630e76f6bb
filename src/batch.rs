//! Batch mode: one text file per channel
//!
//! The output directory is removed and recreated on every run. If a run
//! aborts halfway (read or write error), the files written so far are left
//! in place.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};

use logsplit_filter::{FilterError, FilterRegistry, LineRouter, RouteStats, Sink, input};

/// Buffered writer for one channel file
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl Sink for FileSink {
    fn accept(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Turn a channel name into a file stem
///
/// Spaces become `_`, `&` becomes `_and_`, `|` becomes `_or_`, and
/// characters that are not allowed in file names on common platforms are
/// dropped.
pub fn channel_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            ' ' => stem.push('_'),
            '&' => stem.push_str("_and_"),
            '|' => stem.push_str("_or_"),
            ':' | '/' | '\\' | '?' | '<' | '>' | '*' | '"' => {}
            c if c.is_control() => {}
            c => stem.push(c),
        }
    }
    stem
}

/// `<stem>.txt` for every channel, in registry order
///
/// Fails if a name sanitises to nothing or two names share a file.
fn channel_files(registry: &FilterRegistry) -> Result<Vec<(String, String)>> {
    let mut files = Vec::with_capacity(registry.len());
    let mut taken: HashMap<String, &str> = HashMap::new();

    for name in registry.names() {
        let stem = channel_file_stem(name);
        if stem.is_empty() || stem == "." || stem == ".." {
            anyhow::bail!("channel '{}' has no usable file name", name);
        }
        let file = format!("{}.txt", stem);
        if let Some(other) = taken.insert(file.clone(), name) {
            anyhow::bail!(
                "channels '{}' and '{}' would both write to {}",
                other,
                name,
                file
            );
        }
        files.push((name.to_string(), file));
    }

    Ok(files)
}

/// Make `dir` an empty directory; refuses to touch a non-directory path
fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            anyhow::bail!("output path '{}' is not a directory", dir.display());
        }
        fs::remove_dir_all(dir)
            .with_context(|| format!("failed to clear output directory '{}'", dir.display()))?;
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    Ok(())
}

/// Fail if clearing `dir` would delete any of `paths`
fn ensure_outside(dir: &Path, paths: &[PathBuf]) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    let dir = dir
        .canonicalize()
        .with_context(|| format!("cannot resolve output directory '{}'", dir.display()))?;

    for path in paths {
        // Paths that do not exist cannot be deleted
        let Ok(resolved) = path.canonicalize() else {
            continue;
        };
        if resolved.starts_with(&dir) {
            anyhow::bail!(
                "refusing to clear output directory '{}': it contains '{}'",
                dir.display(),
                path.display()
            );
        }
    }
    Ok(())
}

/// One batch split: every channel goes to `<output_dir>/<channel>.txt`
pub struct Batch<'r> {
    registry: &'r FilterRegistry,
    output_dir: PathBuf,

    /// Paths that must survive the output directory being cleared
    protected: Vec<PathBuf>,

    stop: Option<Arc<AtomicBool>>,
}

impl<'r> Batch<'r> {
    pub fn new(registry: &'r FilterRegistry, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            output_dir: output_dir.into(),
            protected: Vec::new(),
            stop: None,
        }
    }

    /// Refuse to run if clearing the output directory would delete `path`
    pub fn protect(mut self, path: impl Into<PathBuf>) -> Self {
        self.protected.push(path.into());
        self
    }

    /// Stop between lines once `stop` is set, keeping what was written
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Split `input` into one file per channel
    pub fn run(&self, input: &Path) -> Result<RouteStats> {
        let output_dir = self.output_dir.as_path();

        // Everything that can be checked up front is, before the output dir is touched
        if !input.is_file() {
            anyhow::bail!("input file '{}' does not exist", input.display());
        }
        if output_dir.exists() && !output_dir.is_dir() {
            anyhow::bail!("output path '{}' is not a directory", output_dir.display());
        }
        let mut protected = self.protected.clone();
        protected.push(input.to_path_buf());
        ensure_outside(output_dir, &protected)?;

        let files = channel_files(self.registry)?;
        let lines = input::open_lines(input)?;

        prepare_output_dir(output_dir)?;

        let paths: HashMap<String, PathBuf> = files
            .into_iter()
            .map(|(name, file)| (name, output_dir.join(file)))
            .collect();

        let mut router = LineRouter::open(self.registry, |name| {
            let path = paths.get(name).ok_or_else(|| {
                FilterError::sink(
                    name,
                    io::Error::new(io::ErrorKind::NotFound, "no output file for channel"),
                )
            })?;
            FileSink::create(path).map_err(|e| FilterError::sink(name, e))
        })?;
        if let Some(stop) = &self.stop {
            router = router.with_stop_flag(Arc::clone(stop));
        }
        router
            .process(lines)
            .with_context(|| format!("failed while splitting '{}'", input.display()))?;
        let routed = router.finish()?;

        for (name, count) in &routed.stats.delivered {
            tracing::info!(channel = %name, lines = count, "channel written");
        }

        if routed.stats.stopped_early {
            tracing::warn!(
                lines = routed.stats.lines_read,
                output = %output_dir.display(),
                "interrupted, partial output kept"
            );
            anyhow::bail!(
                "interrupted after {} lines; partial output left in '{}'",
                routed.stats.lines_read,
                output_dir.display()
            );
        }

        tracing::info!(
            input = %input.display(),
            output = %output_dir.display(),
            lines = routed.stats.lines_read,
            blank = routed.stats.blank_skipped,
            "batch run complete"
        );

        Ok(routed.stats)
    }
}
