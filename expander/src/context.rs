use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExpandError;
use crate::keys;
use crate::page::{Collections, Meta, Page};
use crate::scope::Scope;
use crate::special::DeferredAction;

/// Where include and template files come from.
pub trait Loader {
    fn include(&self, name: &str) -> Result<Vec<String>, ExpandError>;
    fn template(&self, name: &str) -> Result<Vec<String>, ExpandError>;
}

/// Reads includes and templates from the site's directories. Templates are
/// looked up by name with an `.html` suffix.
#[derive(Debug, Clone)]
pub struct FsLoader {
    include_dir: PathBuf,
    template_dir: PathBuf,
}

impl FsLoader {
    pub fn new(include_dir: impl Into<PathBuf>, template_dir: impl Into<PathBuf>) -> Self {
        FsLoader {
            include_dir: include_dir.into(),
            template_dir: template_dir.into(),
        }
    }

    /// Resolve the include and template directories against `compiler.source`.
    pub fn from_config(config: &Meta) -> Self {
        let value = |key: &str, default: &str| {
            config
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        let source = PathBuf::from(value(keys::SOURCE, "."));
        FsLoader::new(
            source.join(value(keys::INCLUDE_DIR, "_includes")),
            source.join(value(keys::TEMPLATE_DIR, "_templates")),
        )
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, ExpandError> {
    fs::read_to_string(path)
        .map(|text| text.lines().map(String::from).collect())
        .map_err(|e| ExpandError::UnreadableFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

impl Loader for FsLoader {
    fn include(&self, name: &str) -> Result<Vec<String>, ExpandError> {
        read_lines(&self.include_dir.join(name))
    }

    fn template(&self, name: &str) -> Result<Vec<String>, ExpandError> {
        read_lines(&self.template_dir.join(format!("{}.html", name)))
    }
}

/// In-memory includes and templates, keyed by the name used in the markup.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    includes: HashMap<String, String>,
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, name: &str, text: &str) -> Self {
        self.includes.insert(name.to_string(), text.to_string());
        self
    }

    pub fn with_template(mut self, name: &str, text: &str) -> Self {
        self.templates.insert(name.to_string(), text.to_string());
        self
    }

    fn lookup(files: &HashMap<String, String>, name: &str) -> Result<Vec<String>, ExpandError> {
        files
            .get(name)
            .map(|text| text.lines().map(String::from).collect())
            .ok_or_else(|| ExpandError::UnreadableFile {
                path: name.to_string(),
                reason: "no such file".to_string(),
            })
    }
}

impl Loader for MemoryLoader {
    fn include(&self, name: &str) -> Result<Vec<String>, ExpandError> {
        Self::lookup(&self.includes, name)
    }

    fn template(&self, name: &str) -> Result<Vec<String>, ExpandError> {
        Self::lookup(&self.templates, name)
    }
}

/// Everything that stays fixed for a whole build.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub config: &'a Meta,
    pub collections: &'a Collections,
    pub loader: &'a dyn Loader,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a Meta, collections: &'a Collections, loader: &'a dyn Loader) -> Self {
        BuildContext {
            config,
            collections,
            loader,
        }
    }

    pub fn collection(&self, name: &str) -> Option<&'a [Page]> {
        self.collections.get(name).map(Vec::as_slice)
    }
}

/// Mutable state for expanding one page.
#[derive(Debug)]
pub struct Session<'a> {
    pub scope: Scope<'a>,
    /// Side effects to run after the page is written, in registration order.
    pub deferred: Vec<DeferredAction>,
}

impl<'a> Session<'a> {
    pub fn new(page: &'a Meta, config: &'a Meta) -> Self {
        Session {
            scope: Scope::new(page, config),
            deferred: Vec::new(),
        }
    }

    /// Run `f` with `overlay` pushed onto the scope. The overlay is popped
    /// before returning, whatever `f` returns.
    pub fn with_overlay<R>(&mut self, overlay: Meta, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scope.push_overlay(overlay);
        let result = f(self);
        self.scope.pop_overlay();
        result
    }
}
