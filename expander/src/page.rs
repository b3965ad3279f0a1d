use std::collections::HashMap;
use std::path::PathBuf;

use crate::keys;

/// Flat metadata: lowercase dotted key to string value.
pub type Meta = HashMap<String, String>;

/// Named page collections such as `site.posts`, in display order.
pub type Collections = HashMap<String, Vec<Page>>;

/// A parsed source page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub file: PathBuf,
    pub out_file: PathBuf,
    pub meta: Meta,
    pub content: Vec<String>,
    pub is_post: bool,
}

impl Page {
    /// Builds a page, mirroring its content into the `content` meta key.
    pub fn new(file: PathBuf, out_file: PathBuf, mut meta: Meta, content: Vec<String>) -> Self {
        meta.insert(keys::CONTENT.to_string(), content.join("\n"));
        Page {
            file,
            out_file,
            meta,
            content,
            is_post: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn template(&self) -> Option<&str> {
        self.get(keys::PAGE_TEMPLATE)
    }

    pub fn display_name(&self) -> String {
        self.file.display().to_string()
    }
}
