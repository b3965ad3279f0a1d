//! Walks the source tree and turns it into page collections and assets.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use daphne::text::url_safe;
use expander::{Collections, Meta, Page, keys};
use tracing::{debug, warn};

use crate::config::{Settings, flatten};

/// Page keys that fall back to the `site.*` value of the same name.
const INHERITED: &[&str] = &["author", "description", "title", "template"];

#[derive(Debug)]
pub enum DiscoverError {
    Unreadable(String),
    MissingFrontMatter(String),
    UnclosedFrontMatter(String),
    InvalidFrontMatter(String),
    PostName(String),
    PostDate(String),
}

impl DiscoverError {
    /// A post with a malformed file name is skipped, not failed.
    pub fn is_warning(&self) -> bool {
        matches!(self, DiscoverError::PostName(_))
    }
}

impl fmt::Display for DiscoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoverError::Unreadable(reason) => write!(f, "cannot read file: {}", reason),
            DiscoverError::MissingFrontMatter(tag) => {
                write!(f, "page must start with front matter opened by '{}'", tag)
            }
            DiscoverError::UnclosedFrontMatter(tag) => {
                write!(f, "front matter is never closed by '{}'", tag)
            }
            DiscoverError::InvalidFrontMatter(reason) => write!(f, "invalid front matter: {}", reason),
            DiscoverError::PostName(name) => write!(
                f,
                "post '{}' is not named YYYY-MM-DD-title.html and will not be added",
                name
            ),
            DiscoverError::PostDate(date) => write!(f, "post date '{}' is not a valid date", date),
        }
    }
}

impl std::error::Error for DiscoverError {}

/// A file that could not be turned into a page.
#[derive(Debug)]
pub struct Problem {
    pub file: PathBuf,
    pub error: DiscoverError,
}

/// Everything found under the source directory.
#[derive(Debug, Default)]
pub struct Site {
    pub collections: Collections,
    /// Static files to copy, relative to the source.
    pub assets: Vec<PathBuf>,
    pub problems: Vec<Problem>,
}

enum Kind {
    Post,
    Collection(String),
    Page,
    Asset,
    Private,
}

pub fn discover(settings: &Settings, config: &Meta) -> Site {
    let mut files = Vec::new();
    walk(&settings.source, settings, &mut files);
    files.sort();

    let mut site = Site::default();
    site.collections.insert(keys::SITE_PAGES.to_string(), Vec::new());
    site.collections.insert(keys::SITE_POSTS.to_string(), Vec::new());

    for relative in files {
        let collection = match kind(&relative, settings) {
            Kind::Asset => {
                site.assets.push(relative);
                continue;
            }
            Kind::Private => continue,
            Kind::Post => keys::SITE_POSTS.to_string(),
            Kind::Page => keys::SITE_PAGES.to_string(),
            Kind::Collection(name) => name,
        };

        let loaded = if collection == keys::SITE_POSTS {
            load_post(&relative, settings, config)
        } else {
            load_page(&relative, settings, config)
        };
        match loaded {
            Ok(page) => {
                debug!(file = %relative.display(), collection = %collection, "discovered page");
                site.collections.entry(collection).or_default().push(page);
            }
            Err(error) => site.problems.push(Problem {
                file: settings.source.join(&relative),
                error,
            }),
        }
    }

    if let Some(posts) = site.collections.get_mut(keys::SITE_POSTS) {
        posts.sort_by(|a, b| {
            let date = |page: &Page| page.get("page.date_short").unwrap_or_default().to_string();
            date(b).cmp(&date(a)).then_with(|| a.file.cmp(&b.file))
        });
    }
    site
}

fn walk(dir: &Path, settings: &Settings, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let relative = path.strip_prefix(&settings.source).unwrap_or(&path).to_path_buf();
        if settings.is_ignored(&relative) {
            continue;
        }
        if path.is_dir() {
            walk(&path, settings, out);
        } else if !name.starts_with('_') {
            out.push(relative);
        }
    }
}

fn kind(relative: &Path, settings: &Settings) -> Kind {
    let dir = relative.parent().unwrap_or(Path::new(""));
    let private = dir
        .components()
        .next()
        .and_then(|c| c.as_os_str().to_str())
        .is_some_and(|first| first.starts_with('_'));

    let is_markup = relative
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));

    match (is_markup, private) {
        (false, false) => Kind::Asset,
        (false, true) => Kind::Private,
        (true, false) => Kind::Page,
        (true, true) if settings.source.join(dir) == settings.posts_dir => Kind::Post,
        (true, true) => Kind::Collection(collection_name(dir)),
    }
}

/// `_data/team` becomes `site.data.team`.
fn collection_name(dir: &Path) -> String {
    let joined = dir
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join(".");
    format!("site.{}", joined.trim_start_matches('_').to_lowercase())
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Split a page into its flattened front matter and its content lines.
pub fn parse_page(text: &str, meta_tag: &str) -> Result<(Meta, Vec<String>), DiscoverError> {
    let mut lines = text.lines();
    if lines.next().map(str::trim) != Some(meta_tag) {
        return Err(DiscoverError::MissingFrontMatter(meta_tag.to_string()));
    }

    let mut front = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == meta_tag {
            closed = true;
            break;
        }
        front.push(line);
    }
    if !closed {
        return Err(DiscoverError::UnclosedFrontMatter(meta_tag.to_string()));
    }

    let table: toml::Table = front
        .join("\n")
        .parse()
        .map_err(|e: toml::de::Error| DiscoverError::InvalidFrontMatter(e.message().to_string()))?;
    let mut meta = Meta::new();
    flatten("page", &table, &mut meta);

    let content = lines
        .skip_while(|line| line.trim().is_empty())
        .map(String::from)
        .collect();
    Ok((meta, content))
}

/// Content up to the excerpt marker, or all of it when the marker is absent.
fn excerpt(content: &[String], marker: &str) -> String {
    let mut kept = Vec::new();
    for line in content {
        if !marker.is_empty() {
            if let Some((before, _)) = line.split_once(marker) {
                if !before.trim().is_empty() {
                    kept.push(before);
                }
                break;
            }
        }
        kept.push(line.as_str());
    }
    kept.join("\n")
}

/// The URL a page at `relative` is served from. `index` pages map to their
/// directory.
pub fn page_url(site_url: &str, relative: &Path) -> String {
    let is_index = relative.file_stem().and_then(|s| s.to_str()) == Some("index");
    if !is_index {
        return format!("{}{}", site_url, slash_path(relative));
    }
    match relative.parent().map(slash_path) {
        Some(dir) if !dir.is_empty() => format!("{}{}/", site_url, dir),
        _ => site_url.to_string(),
    }
}

fn read_page(relative: &Path, settings: &Settings, config: &Meta) -> Result<(Meta, Vec<String>), DiscoverError> {
    let text = fs::read_to_string(settings.source.join(relative))
        .map_err(|e| DiscoverError::Unreadable(e.to_string()))?;
    let (mut meta, content) = parse_page(&text, &settings.meta_tag)?;

    meta.insert(keys::PAGE_FILE.to_string(), slash_path(relative));
    if meta.get(keys::PAGE_EXCERPT).is_none_or(|v| v.trim().is_empty()) {
        let marker = config.get(keys::BLOG_EXCERPT).map(String::as_str).unwrap_or_default();
        meta.insert(keys::PAGE_EXCERPT.to_string(), excerpt(&content, marker));
    }
    Ok((meta, content))
}

fn inherit_site_defaults(meta: &mut Meta, config: &Meta) {
    for key in INHERITED {
        let page_key = format!("page.{}", key);
        let unset = meta.get(&page_key).is_none_or(|v| v.trim().is_empty());
        if let (true, Some(value)) = (unset, config.get(&format!("site.{}", key))) {
            meta.insert(page_key, value.clone());
        }
    }
}

fn load_page(relative: &Path, settings: &Settings, config: &Meta) -> Result<Page, DiscoverError> {
    let (mut meta, content) = read_page(relative, settings, config)?;
    inherit_site_defaults(&mut meta, config);
    let site_url = config.get(keys::SITE_URL).map(String::as_str).unwrap_or("/");
    meta.insert(keys::PAGE_URL.to_string(), page_url(site_url, relative));

    Ok(Page::new(
        settings.source.join(relative),
        settings.output.join(relative),
        meta,
        content,
    ))
}

fn load_post(relative: &Path, settings: &Settings, config: &Meta) -> Result<Page, DiscoverError> {
    let stem = relative.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let parts: Vec<&str> = stem.splitn(4, '-').collect();
    if parts.len() < 4 {
        return Err(DiscoverError::PostName(slash_path(relative)));
    }
    let date_text = parts[..3].join("-");
    let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")
        .map_err(|_| DiscoverError::PostDate(date_text.clone()))?;

    let (mut meta, content) = read_page(relative, settings, config)?;
    // The slug comes from the post's own title, before site defaults apply.
    let slug = match meta.get("page.title").map(|t| url_safe(t)) {
        Some(slug) if !slug.is_empty() => slug,
        _ => url_safe(&parts[3].replace('-', " ")),
    };
    inherit_site_defaults(&mut meta, config);
    for (key, format) in [
        ("page.date", "%B %-d, %Y"),
        ("page.date_year", "%Y"),
        ("page.date_month", "%m"),
        ("page.date_day", "%d"),
        ("page.date_short", "%Y-%m-%d"),
    ] {
        meta.insert(key.to_string(), date.format(format).to_string());
    }
    meta.insert(keys::PAGE_SLUG.to_string(), slug.clone());

    let get = |key: &str| config.get(key).map(String::as_str).unwrap_or_default();
    let permalink = get(keys::BLOG_PERMALINK)
        .replace("%slug%", &slug)
        .replace("%year%", &date.format("%Y").to_string())
        .replace("%month%", &date.format("%m").to_string())
        .replace("%day%", &date.format("%d").to_string());
    let permalink = permalink.trim_matches('/');

    let (out_file, url) = if get(keys::BLOG_FOLDERICIZE).eq_ignore_ascii_case("true") {
        (
            settings.output.join(permalink).join("index.html"),
            format!("{}{}/", get(keys::SITE_URL), permalink),
        )
    } else {
        (
            settings.output.join(format!("{}.html", permalink)),
            format!("{}{}.html", get(keys::SITE_URL), permalink),
        )
    };
    meta.insert(keys::PAGE_URL.to_string(), url);

    let mut page = Page::new(settings.source.join(relative), out_file, meta, content);
    page.is_post = true;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn discover_in(root: &Path, config_text: &str) -> (Site, Settings) {
        let config = config::parse(config_text, root).unwrap();
        let settings = Settings::from_config(&config);
        (discover(&settings, &config), settings)
    }

    #[test]
    fn front_matter_is_flattened() {
        let text = "---\ntitle = \"Hi\"\n[Author]\nname = \"Ann\"\n---\n\n\nbody\n";
        let (meta, content) = parse_page(text, "---").unwrap();
        assert_eq!(meta["page.title"], "Hi");
        assert_eq!(meta["page.author.name"], "Ann");
        assert_eq!(content, vec!["body".to_string()]);
    }

    #[test]
    fn front_matter_errors() {
        assert!(matches!(
            parse_page("body\n", "---"),
            Err(DiscoverError::MissingFrontMatter(_))
        ));
        assert!(matches!(
            parse_page("---\ntitle = \"x\"\n", "---"),
            Err(DiscoverError::UnclosedFrontMatter(_))
        ));
        assert!(matches!(
            parse_page("---\ntitle = \n---\n", "---"),
            Err(DiscoverError::InvalidFrontMatter(_))
        ));
    }

    #[test]
    fn urls_for_pages() {
        assert_eq!(page_url("https://x.io/", Path::new("about.html")), "https://x.io/about.html");
        assert_eq!(page_url("https://x.io/", Path::new("index.html")), "https://x.io/");
        assert_eq!(page_url("/", Path::new("docs/index.htm")), "/docs/");
    }

    #[test]
    fn excerpt_stops_at_marker() {
        let content: Vec<String> = ["one", "two <!-- more -->", "three"].iter().map(|s| s.to_string()).collect();
        assert_eq!(excerpt(&content, "<!-- more -->"), "one\ntwo ");
        assert_eq!(excerpt(&content, "missing"), "one\ntwo <!-- more -->\nthree");
    }

    #[test]
    fn sorts_files_into_collections() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "index.html", "---\n---\nhome\n");
        write(root, "style.css", "body {}");
        write(root, "_posts/2024-01-02-first-post.html", "---\ntitle = \"First Post\"\n---\nfirst\n");
        write(root, "_posts/2024-03-04-second.html", "---\n---\nsecond\n");
        write(root, "_posts/bad.html", "---\n---\nx\n");
        write(root, "_team/people/ann.html", "---\nname = \"Ann\"\n---\nann\n");
        write(root, "_templates/default.html", "{{ content }}");
        write(root, "_skipped.html", "---\n---\n");
        write(root, ".git/config", "");

        let (site, _) = discover_in(root, "[site]\ntitle = \"Site\"\ntemplate = \"default\"\n");

        let pages = &site.collections[keys::SITE_PAGES];
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].get("page.title"), Some("Site"));
        assert_eq!(pages[0].get(keys::PAGE_TEMPLATE), Some("default"));
        assert_eq!(pages[0].get(keys::PAGE_URL), Some("/"));

        let posts = &site.collections[keys::SITE_POSTS];
        let slugs: Vec<_> = posts.iter().map(|p| p.get(keys::PAGE_SLUG).unwrap()).collect();
        assert_eq!(slugs, vec!["second", "first-post"]);
        assert!(posts.iter().all(|p| p.is_post));

        assert_eq!(site.collections["site.team.people"].len(), 1);
        assert_eq!(site.assets, vec![PathBuf::from("style.css")]);

        assert_eq!(site.problems.len(), 1);
        assert!(site.problems[0].error.is_warning());
    }

    #[test]
    fn post_dates_and_permalinks() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "_posts/2023-07-09-hello.html", "---\ntitle = \"Hello There\"\n---\nhi\n");

        let (site, settings) = discover_in(root, "[site]\nurl = \"https://x.io\"\n");
        let post = &site.collections[keys::SITE_POSTS][0];
        assert_eq!(post.get("page.date"), Some("July 9, 2023"));
        assert_eq!(post.get("page.date_year"), Some("2023"));
        assert_eq!(post.get("page.date_month"), Some("07"));
        assert_eq!(post.get("page.date_day"), Some("09"));
        assert_eq!(post.get(keys::PAGE_URL), Some("https://x.io/blog/hello-there/"));
        assert_eq!(post.out_file, settings.output.join("blog/hello-there/index.html"));

        let (site, settings) = discover_in(
            root,
            "[blog]\npermalink = \"/%year%/%month%/%slug%\"\nfoldericize = false\n",
        );
        let post = &site.collections[keys::SITE_POSTS][0];
        assert_eq!(post.get(keys::PAGE_URL), Some("/2023/07/hello-there.html"));
        assert_eq!(post.out_file, settings.output.join("2023/07/hello-there.html"));
    }

    #[test]
    fn invalid_post_date_fails_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_posts/2023-13-40-nope.html", "---\n---\nx\n");
        let (site, _) = discover_in(dir.path(), "");
        assert!(site.collections[keys::SITE_POSTS].is_empty());
        assert!(matches!(site.problems[0].error, DiscoverError::PostDate(_)));
        assert!(!site.problems[0].error.is_warning());
    }
}
