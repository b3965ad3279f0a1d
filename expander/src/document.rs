use std::ops::RangeInclusive;

use daphne::directive::split_markers;

/// The lines being expanded, rewritten in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    name: String,
    lines: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Document {
            name: name.into(),
            lines,
        }
    }

    /// The page, template or loop this document was made from, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn set_line(&mut self, index: usize, text: String) {
        if let Some(line) = self.lines.get_mut(index) {
            *line = text;
        }
    }

    /// Replace the lines in `range` with `replacement`.
    pub fn splice(&mut self, range: RangeInclusive<usize>, replacement: Vec<String>) {
        let end = (*range.end() + 1).min(self.lines.len());
        let start = (*range.start()).min(end);
        self.lines.splice(start..end, replacement);
    }

    /// Replace the line at `index` with its `\n`-separated parts. Returns false
    /// when the line holds no newline.
    pub fn split_line(&mut self, index: usize) -> bool {
        let Some(line) = self.lines.get(index) else {
            return false;
        };
        if !line.contains('\n') {
            return false;
        }
        let parts: Vec<String> = line
            .split('\n')
            .map(|part| part.strip_suffix('\r').unwrap_or(part).to_string())
            .collect();
        self.lines.splice(index..=index, parts);
        true
    }

    /// Put each marker of the line at `index` on a line of its own. Returns
    /// false when the line holds fewer than two markers.
    pub fn split_markers(&mut self, index: usize) -> bool {
        let Some(pieces) = self.lines.get(index).and_then(|line| split_markers(line)) else {
            return false;
        };
        let pieces: Vec<String> = pieces.into_iter().map(str::to_string).collect();
        self.lines.splice(index..=index, pieces);
        true
    }
}
