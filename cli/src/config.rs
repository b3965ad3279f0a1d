//! `_config.toml` loading.
//!
//! The file is flattened into the same lowercase dotted keys templates use,
//! so `[site] title = "x"` is visible as `site.title`.

use std::fmt;
use std::path::{Path, PathBuf};

use expander::Meta;
use expander::keys;
use tracing::debug;

pub const CONFIG_FILE: &str = "_config.toml";

const DEFAULTS: &[(&str, &str)] = &[
    (keys::OUTPUT, "_build"),
    ("site.template", "default"),
    (keys::TEMPLATE_DIR, "_templates"),
    (keys::INCLUDE_DIR, "_includes"),
    (keys::POSTS_DIR, "_posts"),
    (keys::POSTS_IMAGE_DIR, "_posts/images"),
    (keys::DRAFTS_DIR, "_posts/_drafts"),
    (keys::META_TAG, "---"),
    (keys::BLOG_PERMALINK, "/blog/%slug%"),
    (keys::BLOG_FOLDERICIZE, "true"),
    (keys::BLOG_EXCERPT, "<!-- more -->"),
];

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, reason: String },
    Parse { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, reason } => {
                write!(f, "cannot read '{}': {}", path.display(), reason)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "invalid config '{}': {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read and flatten `<source>/_config.toml`, then fill in defaults.
pub fn load(source: &Path) -> Result<Meta, ConfigError> {
    let path = source.join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let config = parse(&text, source).map_err(|reason| ConfigError::Parse { path, reason })?;
    debug!(keys = config.len(), "config loaded");
    Ok(config)
}

/// Flatten `text` and apply defaults, with `source` as `compiler.source`.
pub fn parse(text: &str, source: &Path) -> Result<Meta, String> {
    let table: toml::Table = text.parse().map_err(|e: toml::de::Error| e.message().to_string())?;
    let mut config = Meta::new();
    flatten("", &table, &mut config);
    config.insert(keys::SOURCE.to_string(), source.display().to_string());
    apply_defaults(&mut config);
    Ok(config)
}

/// Stringify every leaf of `table` under `prefix`, lowercasing the keys.
pub fn flatten(prefix: &str, table: &toml::Table, out: &mut Meta) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.to_lowercase()
        } else {
            format!("{}.{}", prefix, key.to_lowercase())
        };
        match value {
            toml::Value::Table(inner) => flatten(&key, inner, out),
            other => {
                out.insert(key, stringify(other));
            }
        }
    }
}

fn stringify(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        toml::Value::Table(_) => String::new(),
        other => other.to_string(),
    }
}

fn apply_defaults(config: &mut Meta) {
    for (key, default) in DEFAULTS {
        let value = config.entry(key.to_string()).or_default();
        if value.trim().is_empty() {
            *value = default.to_string();
        }
    }

    let url = config.entry(keys::SITE_URL.to_string()).or_default();
    if !url.ends_with('/') {
        url.push('/');
    }

    if let Some(permalink) = config.get_mut(keys::BLOG_PERMALINK) {
        *permalink = permalink.trim_start_matches('/').to_string();
    }

    let mut ignore: Vec<String> = config
        .get(keys::IGNORE)
        .map(|list| {
            list.split(',')
                .map(|entry| entry.trim().trim_matches('/').to_string())
                .filter(|entry| !entry.is_empty())
                .collect()
        })
        .unwrap_or_default();
    for key in [keys::OUTPUT, keys::INCLUDE_DIR, keys::TEMPLATE_DIR, keys::POSTS_IMAGE_DIR, keys::DRAFTS_DIR] {
        if let Some(dir) = config.get(key) {
            let dir = dir.trim_matches('/').to_string();
            if !ignore.contains(&dir) {
                ignore.push(dir);
            }
        }
    }
    config.insert(keys::IGNORE.to_string(), ignore.join(","));
}

/// Typed view of the directory settings, all resolved against the source.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: PathBuf,
    pub output: PathBuf,
    pub posts_dir: PathBuf,
    pub posts_image_dir: PathBuf,
    /// Ignored directories, relative to the source.
    pub ignore: Vec<PathBuf>,
    pub meta_tag: String,
}

impl Settings {
    pub fn from_config(config: &Meta) -> Self {
        let get = |key: &str| config.get(key).map(String::as_str).unwrap_or_default();
        let source = PathBuf::from(get(keys::SOURCE));
        Settings {
            output: source.join(get(keys::OUTPUT)),
            posts_dir: source.join(get(keys::POSTS_DIR)),
            posts_image_dir: source.join(get(keys::POSTS_IMAGE_DIR)),
            ignore: get(keys::IGNORE)
                .split(',')
                .filter(|entry| !entry.is_empty())
                .map(PathBuf::from)
                .collect(),
            meta_tag: get(keys::META_TAG).to_string(),
            source,
        }
    }

    /// Whether `path` (relative to the source) is inside an ignored directory.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        self.ignore.iter().any(|dir| relative.starts_with(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_tables() {
        let text = r#"
            [Site]
            Title = "My Site"
            tags = ["a", "b"]
            year = 2024

            [site.author]
            name = "Ann"
        "#;
        let config = parse(text, Path::new("src")).unwrap();
        assert_eq!(config["site.title"], "My Site");
        assert_eq!(config["site.tags"], "a,b");
        assert_eq!(config["site.year"], "2024");
        assert_eq!(config["site.author.name"], "Ann");
        assert_eq!(config[keys::SOURCE], "src");
    }

    #[test]
    fn defaults_fill_unset_keys() {
        let config = parse("[blog]\npermalink = \"/posts/%year%/%slug%\"\n", Path::new(".")).unwrap();
        assert_eq!(config[keys::OUTPUT], "_build");
        assert_eq!(config[keys::META_TAG], "---");
        assert_eq!(config[keys::SITE_URL], "/");
        assert_eq!(config[keys::BLOG_PERMALINK], "posts/%year%/%slug%");
        assert_eq!(config[keys::BLOG_FOLDERICIZE], "true");
    }

    #[test]
    fn site_url_gains_trailing_slash() {
        let config = parse("[site]\nurl = \"https://example.com\"\n", Path::new(".")).unwrap();
        assert_eq!(config[keys::SITE_URL], "https://example.com/");
    }

    #[test]
    fn ignore_list_is_extended() {
        let config = parse("[compiler]\nignore = [\"drafts/\"]\n", Path::new(".")).unwrap();
        let settings = Settings::from_config(&config);
        assert!(settings.is_ignored(Path::new("drafts/a.html")));
        assert!(settings.is_ignored(Path::new("_build/index.html")));
        assert!(settings.is_ignored(Path::new("_templates/default.html")));
        assert!(settings.is_ignored(Path::new("_posts/images/x/a.png")));
        assert!(!settings.is_ignored(Path::new("_posts/2024-01-02-a-b.html")));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse("[site\n", Path::new(".")).is_err());
    }
}
