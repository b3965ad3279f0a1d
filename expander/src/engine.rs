//! Line-oriented template expansion.
//!
//! The document is scanned top to bottom. Every structural edit (an include
//! spliced in, a block replaced by its chosen branch, a loop unrolled) rewrites
//! the document and restarts the scan from the first line with an empty frame
//! stack, so nested blocks always resolve innermost first.

use daphne::directive::{Marker, find_print_tags, parse_marker, split_markers};
use tracing::{debug, warn};

use crate::context::{BuildContext, Session};
use crate::document::Document;
use crate::error::{DiagnosticError, ExpandError};
use crate::evaluator::{evaluate_print_tag, is_true};
use crate::frame::{Branch, Control, Frame, FrameStack};
use crate::page::{Meta, Page};
use crate::special::DeferredAction;

/// Restarts allowed per document before expansion is abandoned.
pub const MAX_RESCANS: usize = 4096;
/// Nested loop expansions allowed.
pub const MAX_DEPTH: usize = 64;

/// A fully expanded page and the side effects it scheduled.
#[derive(Debug)]
pub struct Rendered {
    pub lines: Vec<String>,
    pub deferred: Vec<DeferredAction>,
}

/// Expand `page` through its template.
///
/// A page without a template is rendered from its own content, with a
/// warning. The deferred actions in the result are the caller's to run once
/// the output is written.
pub fn render_page(
    page: &Page,
    ctx: &BuildContext<'_>,
) -> Result<(Rendered, Vec<DiagnosticError>), DiagnosticError> {
    let name = page.display_name();
    let mut diagnostics = Vec::new();

    if page.content.iter().all(|line| line.trim().is_empty()) {
        diagnostics.push(
            DiagnosticError::warning(ExpandError::EmptyPage(name.clone())).with_origin(name.clone()),
        );
    }

    let mut document = match page.template() {
        Some(template) => {
            let lines = ctx
                .loader
                .template(template)
                .map_err(|e| DiagnosticError::from(e).with_origin(name.clone()))?;
            Document::new(format!("template '{}'", template), lines)
        }
        None => {
            diagnostics.push(
                DiagnosticError::warning(ExpandError::NoTemplate(name.clone()))
                    .with_origin(name.clone()),
            );
            Document::new(name.clone(), page.content.clone())
        }
    };

    let mut session = Session::new(&page.meta, ctx.config);
    expand(&mut document, ctx, &mut session, 0, &mut diagnostics)
        .map_err(|e| e.with_origin(name.clone()))?;

    debug!(page = %name, lines = document.len(), "page expanded");
    Ok((
        Rendered {
            lines: document.into_lines(),
            deferred: session.deferred,
        },
        diagnostics,
    ))
}

enum Scan {
    Done,
    Rescan,
}

/// Expand `document` in place until no directive is left.
pub fn expand(
    document: &mut Document,
    ctx: &BuildContext<'_>,
    session: &mut Session<'_>,
    depth: usize,
    diagnostics: &mut Vec<DiagnosticError>,
) -> Result<(), DiagnosticError> {
    if depth > MAX_DEPTH {
        return Err(DiagnosticError::from(ExpandError::DepthLimit(MAX_DEPTH)).with_origin(document.name()));
    }

    let mut rescans = 0;
    loop {
        match scan(document, ctx, session, depth, diagnostics)? {
            Scan::Done => return Ok(()),
            Scan::Rescan => {
                rescans += 1;
                if rescans > MAX_RESCANS {
                    return Err(DiagnosticError::from(ExpandError::RescanLimit(MAX_RESCANS))
                        .with_origin(document.name()));
                }
                debug!(document = document.name(), rescans, "rescanning");
            }
        }
    }
}

fn located(error: ExpandError, line: &str, document: &Document) -> DiagnosticError {
    DiagnosticError::from(error)
        .with_snippet(line.trim())
        .with_origin(document.name())
}

fn scan(
    document: &mut Document,
    ctx: &BuildContext<'_>,
    session: &mut Session<'_>,
    depth: usize,
    diagnostics: &mut Vec<DiagnosticError>,
) -> Result<Scan, DiagnosticError> {
    let mut frames = FrameStack::default();
    let mut index = 0;

    while index < document.len() {
        if document.split_line(index) || document.split_markers(index) {
            return Ok(Scan::Rescan);
        }
        let mut line = document.lines()[index].clone();

        if let Some(Marker::Include(path)) = parse_marker(&line) {
            let included = ctx
                .loader
                .include(path)
                .map_err(|e| located(e, &line, document))?;
            debug!(include = path, lines = included.len(), "splicing include");
            document.splice(index..=index, included);
            return Ok(Scan::Rescan);
        }

        // Inside a loop body everything is kept raw until the loop closes.
        let closes_loop = match frames.top_mut() {
            Some(frame) if frame.control == Control::ForEach => {
                Some(frame.closes_loop(parse_marker(&line).as_ref()))
            }
            _ => None,
        };
        match closes_loop {
            Some(true) if frames.len() > 1 => {
                // A loop inside an unresolved block stays raw until that block
                // picks its branch.
                if let Some(frame) = frames.pop() {
                    let opener = document.lines().get(frame.start_line).cloned().unwrap_or_default();
                    frames.buffer(opener);
                    for body_line in frame.true_branch {
                        frames.buffer(body_line);
                    }
                    frames.buffer(line);
                }
                index += 1;
                continue;
            }
            Some(true) => {
                if let Some(mut frame) = frames.pop() {
                    frame.end_line = index;
                    let start = frame.start_line;
                    let unrolled = expand_foreach(frame, document.name(), ctx, session, depth, diagnostics)
                        .map_err(|e| e.with_snippet(line.trim()))?;
                    document.splice(start..=index, unrolled);
                    return Ok(Scan::Rescan);
                }
            }
            Some(false) => {
                frames.buffer(line);
                index += 1;
                continue;
            }
            None => {}
        }

        if frames.is_empty() {
            if let Some(substituted) = substitute_print_tags(&line, session) {
                // Substituted values may carry markup of their own.
                let rescan = substituted.contains('\n')
                    || !find_print_tags(&substituted).is_empty()
                    || parse_marker(&substituted).is_some_and(|marker| marker.is_include())
                    || split_markers(&substituted).is_some();
                document.set_line(index, substituted.clone());
                if rescan {
                    return Ok(Scan::Rescan);
                }
                line = substituted;
            }
        }

        match parse_marker(&line) {
            Some(Marker::Close(keyword)) => {
                let Some(top) = frames.top() else {
                    return Err(located(ExpandError::UnmatchedClose(keyword.to_string()), &line, document));
                };
                if top.control.keyword() == keyword {
                    if let Some(mut frame) = frames.pop() {
                        frame.end_line = index;
                        let start = frame.start_line;
                        let holds = is_true(&frame.condition, &session.scope);
                        debug!(condition = %frame.condition, holds, "resolving if block");
                        document.splice(start..=index, frame.into_branch(holds));
                        return Ok(Scan::Rescan);
                    }
                }
                frames.buffer(line.clone());
            }
            Some(Marker::Open { keyword, condition }) => {
                let Some(control) = Control::from_keyword(keyword) else {
                    return Err(located(ExpandError::UnknownBlock(keyword.to_string()), &line, document));
                };
                debug!(keyword, condition, line = index, "opening block");
                frames.push(Frame::open(control, condition, index));
            }
            Some(Marker::Else) => match frames.top_mut() {
                Some(frame) if frame.control == Control::If => {
                    frame.reading = Branch::False;
                }
                _ => return Err(located(ExpandError::StrayElse, &line, document)),
            },
            Some(Marker::Malformed(body)) => {
                return Err(located(ExpandError::MalformedMarker(body.to_string()), &line, document));
            }
            Some(Marker::Include(_)) | None => frames.buffer(line.clone()),
        }
        index += 1;
    }

    if let Some(frame) = frames.top() {
        let opener = document.lines().get(frame.start_line).cloned().unwrap_or_default();
        return Err(located(
            ExpandError::UnclosedBlock(frame.control.keyword().to_string()),
            &opener,
            document,
        ));
    }
    Ok(Scan::Done)
}

/// Replace every print tag on `line` with its value. `None` when the line has
/// no tags.
fn substitute_print_tags(line: &str, session: &mut Session<'_>) -> Option<String> {
    let tags = find_print_tags(line);
    if tags.is_empty() {
        return None;
    }

    let mut substituted = String::with_capacity(line.len());
    let mut last = 0;
    for tag in &tags {
        substituted.push_str(&line[last..tag.span.start]);
        substituted.push_str(&evaluate_print_tag(tag.text, &session.scope, &mut session.deferred));
        last = tag.span.end;
    }
    substituted.push_str(&line[last..]);
    Some(substituted)
}

/// Split `"<collection> as <alias>"`.
fn parse_foreach(condition: &str) -> Option<(String, String)> {
    let (collection, alias) = condition.split_once(" as ")?;
    let collection = collection.trim().to_lowercase();
    let alias = alias.trim().to_lowercase();
    if collection.is_empty() || alias.is_empty() {
        return None;
    }
    Some((collection, alias))
}

/// Rename every dotted key's first segment to `alias`
/// (`page.title` becomes `post.title`). Undotted keys are kept as they are.
fn alias_meta(meta: &Meta, alias: &str) -> Meta {
    meta.iter()
        .map(|(key, value)| {
            let key = match key.split_once('.') {
                Some((_, rest)) => format!("{}.{}", alias, rest),
                None => key.clone(),
            };
            (key, value.clone())
        })
        .collect()
}

/// Expand a loop body once per page of its collection, in collection order.
fn expand_foreach(
    frame: Frame,
    parent: &str,
    ctx: &BuildContext<'_>,
    session: &mut Session<'_>,
    depth: usize,
    diagnostics: &mut Vec<DiagnosticError>,
) -> Result<Vec<String>, DiagnosticError> {
    let (collection, alias) = parse_foreach(&frame.condition).ok_or_else(|| {
        DiagnosticError::from(ExpandError::MalformedForEach(frame.condition.clone())).with_origin(parent)
    })?;

    let pages: &[Page] = match ctx.collection(&collection) {
        Some(pages) => pages,
        None => {
            warn!(collection = %collection, "unknown collection in foreach");
            diagnostics.push(
                DiagnosticError::warning(ExpandError::UnknownCollection(collection.clone()))
                    .with_origin(parent),
            );
            &[]
        }
    };

    let mut unrolled = Vec::new();
    for (iteration, page) in pages.iter().enumerate() {
        debug!(collection = %collection, alias = %alias, iteration, "expanding loop body");
        let mut body = Document::new(parent, frame.true_branch.clone());
        session.with_overlay(alias_meta(&page.meta, &alias), |session| {
            expand(&mut body, ctx, session, depth + 1, diagnostics)
        })?;
        unrolled.extend(body.into_lines());
    }
    Ok(unrolled)
}
