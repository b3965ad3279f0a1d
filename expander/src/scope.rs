use crate::page::Meta;

/// Three-tier variable lookup: loop overlays (innermost first), then the page
/// being expanded, then the global configuration.
///
/// A tier only answers for a name when it holds a non-empty value; an empty
/// string falls through to the next tier.
#[derive(Debug)]
pub struct Scope<'a> {
    overlays: Vec<Meta>,
    page: &'a Meta,
    config: &'a Meta,
}

impl<'a> Scope<'a> {
    pub fn new(page: &'a Meta, config: &'a Meta) -> Self {
        Scope {
            overlays: Vec::new(),
            page,
            config,
        }
    }

    pub fn push_overlay(&mut self, overlay: Meta) {
        self.overlays.push(overlay);
    }

    pub fn pop_overlay(&mut self) -> Option<Meta> {
        self.overlays.pop()
    }

    /// Number of overlays currently pushed.
    pub fn depth(&self) -> usize {
        self.overlays.len()
    }

    /// Case-insensitive lookup of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_lowercase();
        self.overlays
            .iter()
            .rev()
            .chain([self.page, self.config])
            .find_map(|tier| tier.get(&name).filter(|value| !value.is_empty()))
            .map(String::as_str)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
