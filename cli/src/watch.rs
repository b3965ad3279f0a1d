//! Rebuilds on source changes, driven by a polling `notify` watcher.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::config::{self, Settings};

const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Quiet time after a change before rebuilding, so one save triggers one build.
const SETTLE: Duration = Duration::from_millis(200);

#[derive(Debug)]
pub struct WatchError(notify::Error);

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot watch source: {}", self.0)
    }
}

impl std::error::Error for WatchError {}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError(e)
    }
}

/// Call `rebuild` whenever a file under `source` is added, removed or
/// touched. Returns only if the watcher cannot be started.
pub fn watch(source: &Path, mut rebuild: impl FnMut()) -> Result<(), WatchError> {
    let source = source.canonicalize().unwrap_or_else(|_| source.to_path_buf());
    let (tx, rx) = mpsc::channel();
    let mut watcher = PollWatcher::new(tx, Config::default().with_poll_interval(POLL_INTERVAL))?;
    watcher.watch(&source, RecursiveMode::Recursive)?;
    info!(source = %source.display(), "watching for changes");

    for result in &rx {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "watch error");
                continue;
            }
        };
        if !touches_sources(&event, &source, &output_dir(&source)) {
            continue;
        }
        debug!(paths = ?event.paths, "source changed");
        while rx.recv_timeout(SETTLE).is_ok() {}

        info!("change detected, rebuilding");
        rebuild();
    }
    Ok(())
}

/// The output directory named by the current config.
fn output_dir(source: &Path) -> PathBuf {
    config::load(source)
        .map(|config| Settings::from_config(&config).output)
        .unwrap_or_else(|_| source.join("_build"))
}

fn touches_sources(event: &Event, source: &Path, output: &Path) -> bool {
    event.paths.iter().any(|path| is_source_path(path, source, output))
}

/// Whether a change at `path` is a change to the site. The source directory
/// itself, the output directory and anything under a dot directory are not.
fn is_source_path(path: &Path, source: &Path, output: &Path) -> bool {
    if path == source || path.starts_with(output) {
        return false;
    }
    let relative = path.strip_prefix(source).unwrap_or(path);
    !relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use std::fs;

    #[test]
    fn output_and_hidden_paths_are_skipped() {
        let source = Path::new("/site");
        let output = Path::new("/site/_build");

        assert!(is_source_path(Path::new("/site/index.html"), source, output));
        assert!(is_source_path(Path::new("/site/_posts/2024-01-01-a.html"), source, output));
        assert!(is_source_path(Path::new("/site/_build.html"), source, output));

        assert!(!is_source_path(Path::new("/site"), source, output));
        assert!(!is_source_path(Path::new("/site/_build"), source, output));
        assert!(!is_source_path(Path::new("/site/_build/index.html"), source, output));
        assert!(!is_source_path(Path::new("/site/.git/HEAD"), source, output));
        assert!(!is_source_path(Path::new("/site/drafts/.swp"), source, output));
    }

    #[test]
    fn events_count_when_any_path_is_a_source() {
        let source = Path::new("/site");
        let output = Path::new("/site/public");

        let written = Event::new(EventKind::Any).add_path(PathBuf::from("/site/public/index.html"));
        assert!(!touches_sources(&written, source, output));

        let renamed = Event::new(EventKind::Any)
            .add_path(PathBuf::from("/site/public/old.html"))
            .add_path(PathBuf::from("/site/about.html"));
        assert!(touches_sources(&renamed, source, output));
    }

    #[test]
    fn output_dir_follows_the_config() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(output_dir(dir.path()), dir.path().join("_build"));

        fs::write(dir.path().join("_config.toml"), "[compiler]\noutput = \"public\"\n").unwrap();
        assert_eq!(output_dir(dir.path()), dir.path().join("public"));
    }
}
