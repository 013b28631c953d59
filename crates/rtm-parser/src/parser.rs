//! The recovering document parser
//!
//! One parser invocation per document. Parsing walks the text line by
//! line, maintaining at most one open requirement block; malformed blocks
//! are reported and skipped without aborting the document.

use crate::lines::{classify, classify_assertion_item, AssertionItem, Line, WAIVED_MARKER};
use rtm_ident::{ReqId, ReqLevel};
use rtm_record::{
    Assertion, CheckKind, ContentDigest, Diagnostic, Reference, ReqStatus, Requirement,
    SourceLocation,
};
use tracing::debug;

/// Everything extracted from one document
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Requirements in document order
    pub requirements: Vec<Requirement>,
    /// Line-anchored parse diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

/// Line-oriented recovering parser for requirement documents
///
/// Stateless between invocations; one call to [`parse`](Self::parse)
/// handles one fully-read document.
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    _private: (),
}

/// Mutable state for the block currently being assembled
struct OpenBlock {
    req: Requirement,
    body_lines: Vec<String>,
    in_assertions: bool,
    in_rationale: bool,
    last_content_line: u32,
}

impl DocumentParser {
    /// Create a parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one document
    ///
    /// `path` is recorded on every extracted element for source-accurate
    /// diagnostics; the first directory component becomes the
    /// requirement's category.
    #[must_use]
    pub fn parse(&self, text: &str, path: &str) -> ParsedDocument {
        let mut out = ParsedDocument::default();
        let category = category_of(path);

        let mut open: Option<OpenBlock> = None;
        // After a malformed header: swallow lines until the next header.
        let mut skipping = false;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);

            match classify(raw) {
                Line::Header { id_text, title, meta } => {
                    finish_block(open.take(), &mut out);
                    skipping = false;

                    match ReqId::parse(id_text) {
                        Ok(id) => {
                            let block = start_block(
                                id,
                                &title,
                                meta.as_deref(),
                                path,
                                line_no,
                                category.clone(),
                                &mut out,
                            );
                            open = Some(block);
                        }
                        Err(err) if looks_like_id(id_text) => {
                            let mut message =
                                format!("malformed requirement header '{id_text}': {err}");
                            if let Some(suggestion) = err.suggestion() {
                                message.push_str(&format!(" (did you mean '{suggestion}'?)"));
                            }
                            out.diagnostics.push(
                                Diagnostic::warning(CheckKind::Parse, message)
                                    .with_location(SourceLocation::new(path, line_no)),
                            );
                            skipping = true;
                        }
                        Err(_) => {
                            // A plain document heading, not an attempted block.
                        }
                    }
                    continue;
                }
                line => {
                    if skipping {
                        continue;
                    }
                    let Some(block) = open.as_mut() else {
                        // Preamble text before the first block is not an error.
                        continue;
                    };
                    handle_block_line(block, line, path, line_no, &mut out);
                }
            }
        }
        finish_block(open.take(), &mut out);

        debug!(
            path,
            requirements = out.requirements.len(),
            diagnostics = out.diagnostics.len(),
            "parsed document"
        );
        out
    }
}

/// Apply one non-header line to the open block
fn handle_block_line(
    block: &mut OpenBlock,
    line: Line<'_>,
    path: &str,
    line_no: u32,
    out: &mut ParsedDocument,
) {
    match line {
        Line::Header { .. } => {} // handled by the caller
        Line::Digest(text) => {
            block.in_rationale = false;
            match text.parse::<ContentDigest>() {
                Ok(digest) => block.req.declared_digest = Some(digest),
                Err(err) => out.diagnostics.push(
                    Diagnostic::warning(
                        CheckKind::Parse,
                        format!("unreadable digest '{text}': {err}"),
                    )
                    .with_id(block.req.id.clone())
                    .with_location(SourceLocation::new(path, line_no)),
                ),
            }
            block.last_content_line = line_no;
        }
        Line::Tags(list) => {
            block.in_rationale = false;
            block.req.tags.extend(
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
            block.last_content_line = line_no;
        }
        Line::Rationale(text) => {
            block.in_assertions = false;
            block.in_rationale = true;
            block.req.rationale = Some(text.trim().to_string());
            block.last_content_line = line_no;
        }
        Line::AssertionsStart => {
            block.in_rationale = false;
            block.in_assertions = true;
            block.last_content_line = line_no;
        }
        Line::Reference { verb, corrected, targets } => {
            block.in_assertions = false;
            block.in_rationale = false;
            if let Some(canonical) = corrected {
                out.diagnostics.push(
                    Diagnostic::warning(
                        CheckKind::Parse,
                        format!(
                            "reference keyword '{verb}' should be '{canonical}'"
                        ),
                    )
                    .with_id(block.req.id.clone())
                    .with_location(SourceLocation::new(path, line_no)),
                );
            }
            let relation = corrected.unwrap_or(verb).to_ascii_lowercase();
            parse_targets(block, &relation, targets, path, line_no, out);
            block.last_content_line = line_no;
        }
        Line::Blank => {
            block.in_rationale = false;
        }
        Line::Text(raw) => {
            consume_text(block, raw, path, line_no, out);
        }
    }
}

/// Whether a header token was probably meant to be an identifier
///
/// Plain prose headings ("Requirements", "Frequency") must not trip the
/// malformed-header diagnostic, so the prefix has to stand alone.
fn looks_like_id(token: &str) -> bool {
    let upper = token.to_ascii_uppercase();
    let Some(pos) = upper.find("REQ") else {
        return false;
    };
    matches!(
        upper[pos + 3..].chars().next(),
        None | Some('-' | '_' | '.' | ':')
    )
}

/// First directory component of the document path, if any
fn category_of(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let mut parts = normalized.split('/').filter(|p| !p.is_empty());
    let first = parts.next()?;
    // Only a directory counts, not a bare file name.
    parts.next()?;
    Some(first.to_string())
}

/// Open a new block from a parsed header
fn start_block(
    id: ReqId,
    title: &str,
    meta: Option<&str>,
    path: &str,
    line_no: u32,
    category: Option<String>,
    out: &mut ParsedDocument,
) -> OpenBlock {
    let title = title.trim();
    if title.is_empty() {
        out.diagnostics.push(
            Diagnostic::warning(CheckKind::Parse, "requirement header has no title")
                .with_id(id.clone())
                .with_location(SourceLocation::new(path, line_no)),
        );
    }
    if id.is_assertion_scoped() {
        out.diagnostics.push(
            Diagnostic::warning(
                CheckKind::Parse,
                "requirement header must use a whole-requirement identifier",
            )
            .with_id(id.clone())
            .with_location(SourceLocation::new(path, line_no)),
        );
    }

    let mut req = Requirement::new(
        id.requirement_id(),
        title,
        SourceLocation::new(path, line_no),
    );
    req.category = category;

    if let Some(meta) = meta {
        apply_header_meta(&mut req, meta, path, line_no, out);
    }

    OpenBlock {
        req,
        body_lines: Vec::new(),
        in_assertions: false,
        in_rationale: false,
        last_content_line: line_no,
    }
}

/// Apply the parenthesized `(level[, status])` header segment
fn apply_header_meta(
    req: &mut Requirement,
    meta: &str,
    path: &str,
    line_no: u32,
    out: &mut ParsedDocument,
) {
    let mut parts = meta.split(',').map(str::trim).filter(|p| !p.is_empty());

    if let Some(level_text) = parts.next() {
        match ReqLevel::parse_keyword(level_text) {
            Ok(level) if level != req.id.level() => out.diagnostics.push(
                Diagnostic::warning(
                    CheckKind::Parse,
                    format!(
                        "header level '{level_text}' disagrees with identifier level '{}'",
                        req.id.level()
                    ),
                )
                .with_id(req.id.clone())
                .with_location(SourceLocation::new(path, line_no)),
            ),
            Ok(_) => {}
            Err(err) => {
                let mut message = format!("unknown level keyword '{level_text}'");
                if let Some(suggestion) = err.suggestion() {
                    message.push_str(&format!(" (did you mean '{suggestion}'?)"));
                }
                out.diagnostics.push(
                    Diagnostic::warning(CheckKind::Parse, message)
                        .with_id(req.id.clone())
                        .with_location(SourceLocation::new(path, line_no)),
                );
            }
        }
    }

    if let Some(status_text) = parts.next() {
        match status_text.parse::<ReqStatus>() {
            Ok(status) => req.status = status,
            Err(err) => out.diagnostics.push(
                Diagnostic::warning(CheckKind::Parse, err.to_string())
                    .with_id(req.id.clone())
                    .with_location(SourceLocation::new(path, line_no)),
            ),
        }
    }
}

/// Parse the comma-separated target list of a reference line
fn parse_targets(
    block: &mut OpenBlock,
    relation: &str,
    targets: &str,
    path: &str,
    line_no: u32,
    out: &mut ParsedDocument,
) {
    for target_text in targets.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match ReqId::parse(target_text) {
            Ok(target) => block
                .req
                .references
                .push(Reference::new(relation, target, line_no)),
            Err(err) => {
                let mut message =
                    format!("unparsable reference target '{target_text}': {err}");
                if let Some(suggestion) = err.suggestion() {
                    message.push_str(&format!(" (did you mean '{suggestion}'?)"));
                }
                out.diagnostics.push(
                    Diagnostic::warning(CheckKind::Parse, message)
                        .with_id(block.req.id.clone())
                        .with_location(SourceLocation::new(path, line_no)),
                );
            }
        }
    }
}

/// Route a free-text line: assertion item, rationale continuation,
/// assertion continuation, or body
fn consume_text(
    block: &mut OpenBlock,
    raw: &str,
    path: &str,
    line_no: u32,
    out: &mut ParsedDocument,
) {
    if block.in_assertions {
        if let Some(item) = classify_assertion_item(raw) {
            push_assertion(block, item, path, line_no, out);
            block.last_content_line = line_no;
            return;
        }
        if raw.starts_with(char::is_whitespace) {
            // Indented continuation of the previous assertion.
            if let Some(last) = block.req.assertions.last_mut() {
                last.text.push(' ');
                last.text.push_str(raw.trim());
                block.last_content_line = line_no;
                return;
            }
        }
        block.in_assertions = false;
    }

    if block.in_rationale && raw.starts_with(char::is_whitespace) {
        if let Some(rationale) = block.req.rationale.as_mut() {
            rationale.push(' ');
            rationale.push_str(raw.trim());
            block.last_content_line = line_no;
            return;
        }
    }
    block.in_rationale = false;

    block.body_lines.push(raw.trim_end().to_string());
    block.last_content_line = line_no;
}

/// Append one assertion item, assigning positional labels to unlabelled
/// styles and rejecting duplicate labels
fn push_assertion(
    block: &mut OpenBlock,
    item: AssertionItem<'_>,
    path: &str,
    line_no: u32,
    out: &mut ParsedDocument,
) {
    let (label, text) = match item {
        AssertionItem::Lettered { label, text } => (label, text),
        AssertionItem::Unlabelled { text } => {
            let next = next_free_label(&block.req);
            (next, text)
        }
    };

    if block.req.assertion(label).is_some() {
        out.diagnostics.push(
            Diagnostic::warning(
                CheckKind::Parse,
                format!("duplicate assertion label '{label}'"),
            )
            .with_id(block.req.id.clone())
            .with_location(SourceLocation::new(path, line_no)),
        );
        return;
    }

    let (text, waived) = match text.trim().strip_suffix(WAIVED_MARKER) {
        Some(stripped) => (stripped.trim_end().to_string(), true),
        None => (text.trim().to_string(), false),
    };

    let mut assertion = Assertion::new(label, text, line_no);
    assertion.waived = waived;
    block.req.assertions.push(assertion);
}

/// First unused letter for positionally-labelled assertion styles
fn next_free_label(req: &Requirement) -> char {
    for candidate in 'A'..='Z' {
        if req.assertion(candidate).is_none() {
            return candidate;
        }
    }
    'Z'
}

/// Close the open block: trim the body, refresh the digest, record the
/// end line
fn finish_block(open: Option<OpenBlock>, out: &mut ParsedDocument) {
    let Some(mut block) = open else { return };

    while block.body_lines.last().is_some_and(|l| l.trim().is_empty()) {
        block.body_lines.pop();
    }
    block.req.body = block.body_lines.join("\n");
    block.req.refresh_digest();
    if block.last_content_line > block.req.location.line {
        block.req.location.end_line = Some(block.last_content_line);
    }
    out.requirements.push(block.req);
}
