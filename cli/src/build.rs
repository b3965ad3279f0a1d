//! One full build: discover, copy assets, expand every page, report.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use expander::{BuildContext, DiagnosticError, ExpandError, FsLoader, Meta, Page, keys, render_page};
use tracing::{debug, info};

use crate::config::{self, ConfigError, Settings};
use crate::discover::{self, Problem};

#[derive(Debug)]
pub enum BuildError {
    Config(ConfigError),
    UnsafeOutput(PathBuf),
    Output { path: PathBuf, reason: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(e) => write!(f, "{}", e),
            BuildError::UnsafeOutput(path) => write!(
                f,
                "refusing to empty output directory '{}': it contains the source",
                path.display()
            ),
            BuildError::Output { path, reason } => {
                write!(f, "cannot prepare output directory '{}': {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        BuildError::Config(e)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub built: usize,
    pub warned: usize,
    pub failed: usize,
}

fn built_label(no_color: bool) -> &'static str {
    if no_color { "BUILT" } else { "\x1b[32mBUILT\x1b[0m" }
}

fn warn_label(no_color: bool) -> &'static str {
    if no_color { "WARN " } else { "\x1b[33mWARN \x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL " } else { "\x1b[31mFAIL \x1b[0m" }
}

struct Reporter {
    no_color: bool,
    source: PathBuf,
    writer: StandardStream,
    config: term::Config,
    summary: Summary,
}

impl Reporter {
    fn new(source: &Path, no_color: bool) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Reporter {
            no_color,
            source: source.to_path_buf(),
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
            summary: Summary::default(),
        }
    }

    fn label(&self, file: &Path) -> String {
        file.strip_prefix(&self.source)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn emit(&self, file: &Path, error: &DiagnosticError) {
        let source = fs::read_to_string(file).unwrap_or_default();
        let mut files = SimpleFiles::new();
        let file_id = files.add(self.label(file), source.clone());
        let diagnostic = error.to_diagnostic(file_id, &source);
        let _ = term::emit_to_write_style(&mut self.writer.lock(), &self.config, &files, &diagnostic);
    }

    fn page(&mut self, file: &Path, outcome: Result<Vec<DiagnosticError>, DiagnosticError>) {
        match outcome {
            Ok(warnings) if warnings.is_empty() => {
                self.summary.built += 1;
                eprintln!("  {}  {}", built_label(self.no_color), self.label(file));
            }
            Ok(warnings) => {
                self.summary.built += 1;
                self.summary.warned += 1;
                eprintln!("  {}  {}", warn_label(self.no_color), self.label(file));
                for warning in &warnings {
                    self.emit(file, warning);
                }
            }
            Err(error) => {
                self.summary.failed += 1;
                eprintln!("  {}  {}", fail_label(self.no_color), self.label(file));
                self.emit(file, &error);
            }
        }
    }

    fn problem(&mut self, problem: Problem) {
        let mut error = DiagnosticError::from(ExpandError::Custom(problem.error.to_string()));
        error.is_warning = problem.error.is_warning();
        if error.is_warning {
            self.summary.warned += 1;
            eprintln!("  {}  {}", warn_label(self.no_color), self.label(&problem.file));
            self.emit(&problem.file, &error);
        } else {
            self.page(&problem.file, Err(error));
        }
    }

    fn finish(&self) {
        let Summary { built, warned, failed } = self.summary;
        eprintln!();
        if failed == 0 {
            let ok = if self.no_color { "ok" } else { "\x1b[32mok\x1b[0m" };
            eprintln!("build result: {}. {} built, {} with warnings, 0 failed", ok, built, warned);
        } else {
            let failed_label = if self.no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" };
            eprintln!(
                "build result: {}. {} built, {} with warnings, {} failed",
                failed_label, built, warned, failed
            );
        }
    }
}

/// Build the site at `source`, returning the process exit code. `overrides`
/// replace config values after defaults are applied.
pub fn run(source: &Path, no_color: bool, overrides: &Meta) -> i32 {
    match build(source, no_color, overrides) {
        Ok(summary) if summary.failed == 0 => 0,
        Ok(_) => 1,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

pub fn build(source: &Path, no_color: bool, overrides: &Meta) -> Result<Summary, BuildError> {
    let started = Instant::now();
    let mut config = config::load(source)?;
    config.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
    let settings = Settings::from_config(&config);
    info!(source = %source.display(), output = %settings.output.display(), "building site");

    reset_output(&settings)?;
    let site = discover::discover(&settings, &config);
    let mut reporter = Reporter::new(&settings.source, no_color);

    for problem in site.problems {
        reporter.problem(problem);
    }

    for asset in &site.assets {
        let from = settings.source.join(asset);
        let to = settings.output.join(asset);
        debug!(asset = %asset.display(), "copying asset");
        if let Err(e) = copy_asset(&from, &to) {
            let error = ExpandError::UnreadableFile {
                path: from.display().to_string(),
                reason: e.to_string(),
            };
            reporter.page(&from, Err(error.into()));
        }
    }

    let loader = FsLoader::from_config(&config);
    let ctx = BuildContext::new(&config, &site.collections, &loader);
    for collection in [keys::SITE_PAGES, keys::SITE_POSTS] {
        for page in ctx.collection(collection).unwrap_or_default() {
            reporter.page(&page.file, build_page(page, &ctx));
        }
    }

    reporter.finish();
    info!(
        pages = reporter.summary.built,
        assets = site.assets.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "site built"
    );
    Ok(reporter.summary)
}

/// Empty the output directory, creating it if needed.
fn reset_output(settings: &Settings) -> Result<(), BuildError> {
    let output = &settings.output;
    if settings.source.starts_with(output) {
        return Err(BuildError::UnsafeOutput(output.clone()));
    }
    let failed = |e: std::io::Error| BuildError::Output {
        path: output.clone(),
        reason: e.to_string(),
    };
    if output.exists() {
        fs::remove_dir_all(output).map_err(failed)?;
    }
    fs::create_dir_all(output).map_err(failed)
}

fn copy_asset(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}

/// Expand one page, write it, then run what it deferred.
fn build_page(page: &Page, ctx: &BuildContext<'_>) -> Result<Vec<DiagnosticError>, DiagnosticError> {
    let (rendered, mut diagnostics) = render_page(page, ctx)?;
    write_lines(&page.out_file, &rendered.lines).map_err(|e| {
        DiagnosticError::from(ExpandError::Custom(format!(
            "cannot write '{}': {}",
            page.out_file.display(),
            e
        )))
        .with_origin(page.display_name())
    })?;
    debug!(page = %page.display_name(), out = %page.out_file.display(), "page written");

    for action in &rendered.deferred {
        diagnostics.extend(action.run(page, ctx.config));
    }
    Ok(diagnostics)
}

fn write_lines(path: &Path, lines: &[String]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    fs::write(path, text)
}
