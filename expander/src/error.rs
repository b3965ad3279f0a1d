use std::fmt;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

#[derive(Debug)]
pub enum ExpandError {
    UnreadableFile { path: String, reason: String },
    UnknownBlock(String),
    UnknownCollection(String),
    UnmatchedClose(String),
    UnclosedBlock(String),
    StrayElse,
    MalformedForEach(String),
    MalformedMarker(String),
    RescanLimit(usize),
    DepthLimit(usize),
    NoTemplate(String),
    EmptyPage(String),
    Custom(String),
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandError::UnreadableFile { path, reason } => {
                write!(f, "cannot read '{}': {}", path, reason)
            }
            ExpandError::UnknownBlock(keyword) => write!(f, "unknown block keyword: {}", keyword),
            ExpandError::UnknownCollection(name) => {
                write!(f, "unknown collection '{}', loop produces nothing", name)
            }
            ExpandError::UnmatchedClose(keyword) => {
                write!(f, "'end {}' does not close any open block", keyword)
            }
            ExpandError::UnclosedBlock(keyword) => {
                write!(f, "'{}' block is never closed", keyword)
            }
            ExpandError::StrayElse => write!(f, "'else' outside of an if block"),
            ExpandError::MalformedForEach(condition) => write!(
                f,
                "malformed foreach '{}': expected '<collection> as <alias>'",
                condition
            ),
            ExpandError::MalformedMarker(body) => write!(f, "malformed block marker: {{% {} %}}", body),
            ExpandError::RescanLimit(limit) => {
                write!(f, "document was rescanned more than {} times (recursive include?)", limit)
            }
            ExpandError::DepthLimit(limit) => {
                write!(f, "expansion nested deeper than {} levels", limit)
            }
            ExpandError::NoTemplate(file) => {
                write!(f, "no template specified for {}, only its content is written", file)
            }
            ExpandError::EmptyPage(file) => write!(f, "{} is empty", file),
            ExpandError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ExpandError {}

/// An expansion error or warning, with the offending line when one is known.
#[derive(Debug)]
pub struct DiagnosticError {
    pub error: ExpandError,
    /// The text of the line that triggered the error.
    pub snippet: Option<String>,
    /// The page, template or include the error was raised from.
    pub origin: Option<String>,
    pub is_warning: bool,
}

impl DiagnosticError {
    pub fn warning(error: ExpandError) -> Self {
        DiagnosticError {
            error,
            snippet: None,
            origin: None,
            is_warning: true,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        if self.origin.is_none() {
            self.origin = Some(origin.into());
        }
        self
    }

    pub fn severity(&self) -> Severity {
        if self.is_warning {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// Render for codespan-reporting. The snippet is labelled when it can be
    /// found in `source`; otherwise the diagnostic carries a note instead.
    pub fn to_diagnostic(&self, file_id: usize, source: &str) -> Diagnostic<usize> {
        let mut diagnostic = Diagnostic::new(self.severity()).with_message(self.error.to_string());

        let mut notes = Vec::new();
        if let Some(snippet) = self.snippet.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            match source.find(snippet) {
                Some(start) => {
                    diagnostic = diagnostic
                        .with_labels(vec![Label::primary(file_id, start..start + snippet.len())]);
                }
                None => notes.push(format!("at: {}", snippet)),
            }
        }
        if let Some(origin) = &self.origin {
            notes.push(format!("in {}", origin));
        }
        diagnostic.with_notes(notes)
    }
}

impl From<ExpandError> for DiagnosticError {
    fn from(error: ExpandError) -> Self {
        DiagnosticError {
            error,
            snippet: None,
            origin: None,
            is_warning: false,
        }
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for DiagnosticError {}
