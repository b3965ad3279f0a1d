//! Built-in functions callable from print tags, and the side effects they
//! schedule for after the page is written.

use std::fs;
use std::path::PathBuf;

use daphne::directive::SpecialCall;
use tracing::{debug, warn};

use crate::error::{DiagnosticError, ExpandError};
use crate::keys;
use crate::page::{Meta, Page};

pub const POST_IMAGE: &str = "post_image";

/// Work that must wait until the page's output file exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// Copy `<source>/<posts_image_dir>/<slug>/<image>` next to the output file.
    CopyPostImages { images: Vec<String> },
}

pub fn is_special_function(name: &str) -> bool {
    name == POST_IMAGE
}

/// Evaluate a known special function. Returns `None` for unknown names.
pub fn call(call: &SpecialCall<'_>, deferred: &mut Vec<DeferredAction>) -> Option<String> {
    match call.name {
        POST_IMAGE => {
            let images: Vec<String> = call
                .args
                .iter()
                .map(|arg| daphne::text::strip_quotes(arg).to_string())
                .filter(|arg| !arg.is_empty())
                .collect();
            let printed = images.first().cloned().unwrap_or_default();
            deferred.push(DeferredAction::CopyPostImages { images });
            Some(printed)
        }
        _ => None,
    }
}

impl DeferredAction {
    /// Run the action for a page that has just been written. Failures are
    /// returned as warnings.
    pub fn run(&self, page: &Page, config: &Meta) -> Vec<DiagnosticError> {
        match self {
            DeferredAction::CopyPostImages { images } => copy_post_images(images, page, config),
        }
    }
}

fn copy_post_images(images: &[String], page: &Page, config: &Meta) -> Vec<DiagnosticError> {
    let mut warnings = Vec::new();
    let setting = |key: &str| config.get(key).map(String::as_str).unwrap_or_default();

    let image_dir = PathBuf::from(setting(keys::SOURCE))
        .join(setting(keys::POSTS_IMAGE_DIR))
        .join(page.get(keys::PAGE_SLUG).unwrap_or_default());
    let out_dir = page.out_file.parent().map(PathBuf::from).unwrap_or_default();

    for image in images {
        let from = image_dir.join(image);
        let to = out_dir.join(image);
        debug!(from = %from.display(), to = %to.display(), "copying post image");
        if let Err(e) = fs::copy(&from, &to) {
            warn!(image = %from.display(), error = %e, "failed to copy post image");
            warnings.push(
                DiagnosticError::warning(ExpandError::UnreadableFile {
                    path: from.display().to_string(),
                    reason: e.to_string(),
                })
                .with_origin(page.display_name()),
            );
        }
    }
    warnings
}
