//! Link tag rewriting
//!
//! Takes every link annotation found by the walker, filters to those under a
//! base URL prefix, and sets their `tag` query parameter to a caller-supplied
//! value. The rewrite is idempotent: a link that already carries the requested
//! tag is counted but not rewritten.

use std::path::Path;
use log::warn;
use lopdf::{Document, Object, StringFormat};
use url::Url;

use crate::error::{Error, Result};
use crate::pdf::annotations::{collect_annotation_slots, link_uri, AnnotationSlot};

/// Options for retagging links in a PDF
#[derive(Debug, Clone)]
pub struct RetagOptions {
    /// Base URL prefix identifying links in scope (literal prefix match)
    pub base_url: String,
    /// Value to write into the `tag` query parameter
    pub tag: String,
}

/// Result of a retagging run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetagReport {
    /// Links whose URI starts with the base URL prefix
    pub total: usize,
    /// Of those, links whose URI was actually changed
    pub updated: usize,
    /// Human-readable warnings (malformed URLs left unchanged)
    pub warnings: Vec<String>,
}

/// Outcome of rewriting a single decoded URI
#[derive(Debug, Clone, PartialEq)]
pub enum UriRewrite {
    /// URI does not start with the base URL prefix; not counted
    OutOfScope,
    /// In scope, but the text is not a parseable URL; counted, left untouched
    Malformed,
    /// In scope and already carries the requested tag; counted, left untouched
    Unchanged,
    /// In scope and rewritten to the contained text
    Rewritten(String),
}

/// Rewrite the `tag` query parameter of one URI
///
/// The scope filter is a literal string-prefix match on the decoded URI, not
/// a parsed-host comparison. A URL whose host matches but whose scheme or
/// path spelling differs is out of scope on purpose; callers depend on this
/// exact behavior.
pub fn rewrite_query_tag(uri: &str, base_url: &str, tag: &str) -> UriRewrite {
    if !uri.starts_with(base_url) {
        return UriRewrite::OutOfScope;
    }

    let mut url = match Url::parse(uri) {
        Ok(url) => url,
        Err(_) => return UriRewrite::Malformed,
    };

    set_query_param(&mut url, "tag", tag);

    let rewritten = url.to_string();
    if rewritten == uri {
        UriRewrite::Unchanged
    } else {
        UriRewrite::Rewritten(rewritten)
    }
}

/// Insert-or-replace a query parameter
///
/// The first occurrence takes the new value, later duplicates are dropped,
/// and all other parameters keep their order. Percent-encoding of the value
/// is handled by the query serializer, never by string concatenation.
fn set_query_param(url: &mut Url, name: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut seen = false;
    pairs.retain(|(k, _)| {
        if k == name {
            if seen {
                return false;
            }
            seen = true;
        }
        true
    });

    match pairs.iter_mut().find(|(k, _)| k == name) {
        Some(pair) => pair.1 = value.to_string(),
        None => pairs.push((name.to_string(), value.to_string())),
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
}

/// Rewrite the tag parameter of every in-scope link annotation in a document
///
/// Traversal is sequential and the document is mutated in place; each
/// annotation is visited exactly once. Malformed URLs under the base prefix
/// are counted, warned about, and left byte-identical.
pub fn retag_links(doc: &mut Document, options: &RetagOptions) -> Result<RetagReport> {
    if options.tag.trim().is_empty() {
        return Err(Error::EmptyTag);
    }

    // Read-only walk first; each matching slot gets its own commit below
    let slots = collect_annotation_slots(doc);
    let mut report = RetagReport::default();

    for (page, slot) in slots {
        let uri = match slot.dict(doc).and_then(link_uri) {
            Some(uri) => uri,
            None => continue,
        };

        match rewrite_query_tag(&uri, &options.base_url, &options.tag) {
            UriRewrite::OutOfScope => {}
            UriRewrite::Unchanged => {
                report.total += 1;
            }
            UriRewrite::Malformed => {
                report.total += 1;
                warn!("Page {}: malformed link URL left unchanged: {}", page, uri);
                report.warnings.push(format!("Malformed link URL left unchanged: {}", uri));
            }
            UriRewrite::Rewritten(new_uri) => {
                report.total += 1;
                if commit_uri(&slot, doc, &new_uri) {
                    report.updated += 1;
                } else {
                    warn!("Page {}: rewrite could not be written back: {}", page, uri);
                    report
                        .warnings
                        .push(format!("Rewrite could not be written back: {}", uri));
                }
            }
        }
    }

    Ok(report)
}

/// Write a rewritten URI back through the slot the walker produced
fn commit_uri(slot: &AnnotationSlot, doc: &mut Document, new_uri: &str) -> bool {
    let action = slot
        .dict_mut(doc)
        .and_then(|annot| annot.get_mut(b"A").ok())
        .and_then(|action| action.as_dict_mut().ok());

    match action {
        Some(action) => {
            action.set(
                "URI",
                Object::String(new_uri.as_bytes().to_vec(), StringFormat::Literal),
            );
            true
        }
        None => false,
    }
}

/// Retag links in a PDF file and save the result
///
/// Loads `input`, rewrites matching link annotations, and saves to `output`.
/// The document is always saved, even when nothing changed, so the output
/// path is valid either way.
pub fn retag_pdf(input: &Path, output: &Path, options: &RetagOptions) -> Result<RetagReport> {
    if !input.exists() {
        return Err(Error::FileNotFound(input.to_path_buf()));
    }

    let mut doc = Document::load(input)?;
    let report = retag_links(&mut doc, options)?;
    doc.save(output)?;

    Ok(report)
}
