//! `daphne new` and `daphne new-post`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use daphne::text::url_safe;
use serde::Serialize;
use tracing::info;

use crate::config::{self, CONFIG_FILE, ConfigError, Settings};

const PROJECT_DIRS: &[&str] = &["_includes", "_templates", "_posts"];

#[derive(Serialize)]
struct StarterConfig {
    site: StarterSite,
    blog: StarterBlog,
}

#[derive(Serialize)]
struct StarterSite {
    title: String,
    url: String,
    template: String,
}

#[derive(Serialize)]
struct StarterBlog {
    permalink: String,
    foldericize: bool,
}

#[derive(Serialize)]
struct PostFrontMatter<'a> {
    title: &'a str,
    template: &'a str,
}

#[derive(Debug)]
pub enum ScaffoldError {
    Io { path: PathBuf, source: io::Error },
    Config(ConfigError),
    Serialize(toml::ser::Error),
    EmptyTitle,
    Exists(PathBuf),
}

impl fmt::Display for ScaffoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaffoldError::Io { path, source } => write!(f, "cannot write '{}': {}", path.display(), source),
            ScaffoldError::Config(e) => write!(f, "{}", e),
            ScaffoldError::Serialize(e) => write!(f, "cannot serialize front matter: {}", e),
            ScaffoldError::EmptyTitle => write!(f, "post title has no usable characters"),
            ScaffoldError::Exists(path) => write!(f, "'{}' already exists", path.display()),
        }
    }
}

impl std::error::Error for ScaffoldError {}

impl From<ConfigError> for ScaffoldError {
    fn from(e: ConfigError) -> Self {
        ScaffoldError::Config(e)
    }
}

impl From<toml::ser::Error> for ScaffoldError {
    fn from(e: toml::ser::Error) -> Self {
        ScaffoldError::Serialize(e)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ScaffoldError + '_ {
    move |source| ScaffoldError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Create the site skeleton under `source`. Existing files are left alone.
/// Returns what was created.
pub fn new_project(source: &Path) -> Result<Vec<PathBuf>, ScaffoldError> {
    let mut created = Vec::new();
    for dir in PROJECT_DIRS {
        let path = source.join(dir);
        if !path.exists() {
            fs::create_dir_all(&path).map_err(io_error(&path))?;
            created.push(path);
        }
    }

    let config_path = source.join(CONFIG_FILE);
    if !config_path.exists() {
        let starter = StarterConfig {
            site: StarterSite {
                title: "My Site".to_string(),
                url: String::new(),
                template: "default".to_string(),
            },
            blog: StarterBlog {
                permalink: "/blog/%slug%".to_string(),
                foldericize: true,
            },
        };
        fs::write(&config_path, toml::to_string(&starter)?).map_err(io_error(&config_path))?;
        created.push(config_path);
    }

    info!(source = %source.display(), created = created.len(), "project scaffolded");
    Ok(created)
}

/// Write an empty post dated `today` and its image directory.
pub fn new_post(source: &Path, title: &str, today: NaiveDate) -> Result<PathBuf, ScaffoldError> {
    let config = config::load(source)?;
    let settings = Settings::from_config(&config);

    let slug = url_safe(title);
    if slug.is_empty() {
        return Err(ScaffoldError::EmptyTitle);
    }

    let path = settings
        .posts_dir
        .join(format!("{}-{}.html", today.format("%Y-%m-%d"), slug));
    if path.exists() {
        return Err(ScaffoldError::Exists(path));
    }

    let front_matter = toml::to_string(&PostFrontMatter {
        title: title.trim(),
        template: "post",
    })?;
    let tag = &settings.meta_tag;
    fs::create_dir_all(&settings.posts_dir).map_err(io_error(&settings.posts_dir))?;
    fs::write(&path, format!("{}\n{}{}\n\n", tag, front_matter, tag)).map_err(io_error(&path))?;

    let images = settings.posts_image_dir.join(&slug);
    fs::create_dir_all(&images).map_err(io_error(&images))?;

    info!(post = %path.display(), "post created");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::{discover, parse_page};
    use expander::keys;

    #[test]
    fn new_project_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let created = new_project(dir.path()).unwrap();
        assert_eq!(created.len(), 4);
        assert!(dir.path().join("_posts").is_dir());

        let config = config::load(dir.path()).unwrap();
        assert_eq!(config["site.title"], "My Site");
        assert_eq!(config[keys::BLOG_PERMALINK], "blog/%slug%");

        assert!(new_project(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn new_post_is_discovered() {
        let dir = tempfile::tempdir().unwrap();
        new_project(dir.path()).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

        let path = new_post(dir.path(), "Hello, World", today).unwrap();
        assert_eq!(path.file_name().unwrap(), "2024-05-06-hello-world.html");
        assert!(dir.path().join("_posts/images/hello-world").is_dir());

        let text = fs::read_to_string(&path).unwrap();
        let (meta, content) = parse_page(&text, "---").unwrap();
        assert_eq!(meta["page.title"], "Hello, World");
        assert_eq!(meta["page.template"], "post");
        assert!(content.is_empty());

        let config = config::load(dir.path()).unwrap();
        let site = discover(&Settings::from_config(&config), &config);
        let posts = &site.collections[keys::SITE_POSTS];
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].get(keys::PAGE_SLUG), Some("hello-world"));

        assert!(matches!(
            new_post(dir.path(), "Hello, World", today),
            Err(ScaffoldError::Exists(_))
        ));
        assert!(matches!(new_post(dir.path(), "!!!", today), Err(ScaffoldError::EmptyTitle)));
    }
}
