//! Well-known metadata and configuration keys.

pub const CONTENT: &str = "content";

pub const PAGE_FILE: &str = "page.file";
pub const PAGE_URL: &str = "page.url";
pub const PAGE_SLUG: &str = "page.slug";
pub const PAGE_TEMPLATE: &str = "page.template";
pub const PAGE_EXCERPT: &str = "page.excerpt";

pub const SOURCE: &str = "compiler.source";
pub const OUTPUT: &str = "compiler.output";
pub const TEMPLATE_DIR: &str = "compiler.template_dir";
pub const INCLUDE_DIR: &str = "compiler.include_dir";
pub const POSTS_DIR: &str = "compiler.posts_dir";
pub const POSTS_IMAGE_DIR: &str = "compiler.posts_image_dir";
pub const DRAFTS_DIR: &str = "compiler.drafts_dir";
pub const META_TAG: &str = "compiler.tags.meta";
pub const IGNORE: &str = "compiler.ignore";

pub const SITE_URL: &str = "site.url";
pub const SITE_PAGES: &str = "site.pages";
pub const SITE_POSTS: &str = "site.posts";

pub const BLOG_PERMALINK: &str = "blog.permalink";
pub const BLOG_FOLDERICIZE: &str = "blog.foldericize";
pub const BLOG_EXCERPT: &str = "blog.excerpt";
