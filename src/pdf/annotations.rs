//! Annotation traversal over the PDF object graph
//!
//! Walks every page's `Annots` collection, resolving indirect references to
//! concrete annotation dictionaries. Traversal is read-only; mutation happens
//! through an [`AnnotationSlot`], the address of an annotation inside the
//! document, so edits land on the same object the document will serialize.

use std::path::Path;
use log::{debug, warn};
use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::{Error, Result};

/// Address of one annotation dictionary inside a document
///
/// PDF writers store annotations in three shapes: as their own indirect
/// objects, as direct dictionaries inside an `Annots` array that is itself an
/// indirect object, or as direct dictionaries inside an inline `Annots` array
/// on the page. A slot can re-resolve the annotation at any time, including
/// mutably for write-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationSlot {
    /// Annotation stored as its own indirect object
    Object(ObjectId),
    /// Direct dictionary at `index` of an indirect `Annots` array
    ArrayEntry { array_id: ObjectId, index: usize },
    /// Direct dictionary at `index` of a page's inline `Annots` array
    PageEntry { page_id: ObjectId, index: usize },
}

impl AnnotationSlot {
    /// Resolve this slot to its annotation dictionary
    pub fn dict<'a>(&self, doc: &'a Document) -> Option<&'a Dictionary> {
        match *self {
            AnnotationSlot::Object(id) => doc.get_object(id).ok()?.as_dict().ok(),
            AnnotationSlot::ArrayEntry { array_id, index } => doc
                .get_object(array_id)
                .ok()?
                .as_array()
                .ok()?
                .get(index)?
                .as_dict()
                .ok(),
            AnnotationSlot::PageEntry { page_id, index } => doc
                .get_object(page_id)
                .ok()?
                .as_dict()
                .ok()?
                .get(b"Annots")
                .ok()?
                .as_array()
                .ok()?
                .get(index)?
                .as_dict()
                .ok(),
        }
    }

    /// Resolve this slot mutably, for writing a rewritten URI back
    pub fn dict_mut<'a>(&self, doc: &'a mut Document) -> Option<&'a mut Dictionary> {
        match *self {
            AnnotationSlot::Object(id) => doc.get_object_mut(id).ok()?.as_dict_mut().ok(),
            AnnotationSlot::ArrayEntry { array_id, index } => doc
                .get_object_mut(array_id)
                .ok()?
                .as_array_mut()
                .ok()?
                .get_mut(index)?
                .as_dict_mut()
                .ok(),
            AnnotationSlot::PageEntry { page_id, index } => doc
                .get_object_mut(page_id)
                .ok()?
                .as_dict_mut()
                .ok()?
                .get_mut(b"Annots")
                .ok()?
                .as_array_mut()
                .ok()?
                .get_mut(index)?
                .as_dict_mut()
                .ok(),
        }
    }
}

/// Collect the slot of every annotation in the document, paired with its
/// 1-based page number
///
/// Order follows document page order, then `Annots` array order, so results
/// are reproducible across runs. Pages without annotations contribute
/// nothing. Dangling references and entries that resolve to non-dictionaries
/// are skipped, never raised.
pub fn collect_annotation_slots(doc: &Document) -> Vec<(u32, AnnotationSlot)> {
    let mut slots = Vec::new();

    for (page_num, page_id) in doc.get_pages() {
        let page_dict = match doc.get_object(page_id).and_then(Object::as_dict) {
            Ok(dict) => dict,
            Err(_) => continue,
        };

        let annots = match page_dict.get(b"Annots") {
            Ok(annots) => annots,
            Err(_) => continue,
        };

        // The Annots array may be inline on the page or an indirect object
        match annots {
            Object::Reference(array_id) => {
                let entries = match doc.get_object(*array_id).and_then(Object::as_array) {
                    Ok(entries) => entries,
                    Err(_) => {
                        warn!("Page {}: Annots reference does not resolve to an array", page_num);
                        continue;
                    }
                };
                for (index, entry) in entries.iter().enumerate() {
                    let inline = AnnotationSlot::ArrayEntry { array_id: *array_id, index };
                    push_entry(doc, page_num, entry, inline, &mut slots);
                }
            }
            Object::Array(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    let inline = AnnotationSlot::PageEntry { page_id, index };
                    push_entry(doc, page_num, entry, inline, &mut slots);
                }
            }
            _ => {
                warn!("Page {}: Annots is neither an array nor a reference", page_num);
            }
        }
    }

    slots
}

/// Classify one entry of an Annots array and record its slot
fn push_entry(
    doc: &Document,
    page_num: u32,
    entry: &Object,
    inline: AnnotationSlot,
    slots: &mut Vec<(u32, AnnotationSlot)>,
) {
    match entry {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Dictionary(_)) => slots.push((page_num, AnnotationSlot::Object(*id))),
            Ok(_) => debug!("Annotation {:?} is not a dictionary, skipping", id),
            Err(_) => warn!("Dangling annotation reference {:?}, skipping", id),
        },
        Object::Dictionary(_) => slots.push((page_num, inline)),
        _ => debug!("Page {}: non-dictionary Annots entry, skipping", page_num),
    }
}

/// Extract the URI of a link annotation, if that is what this dictionary is
///
/// Returns `Some` only for the exact shape a hyperlink takes: `Subtype` is
/// `Link`, `A` is a direct action dictionary whose `S` is `URI`, and the
/// `URI` entry is a text string. Everything else is not a rewrite candidate.
pub fn link_uri(annot: &Dictionary) -> Option<String> {
    if !name_equals(annot.get(b"Subtype"), b"Link") {
        return None;
    }

    let action = annot.get(b"A").ok()?.as_dict().ok()?;
    if !name_equals(action.get(b"S"), b"URI") {
        return None;
    }

    match action.get(b"URI") {
        Ok(Object::String(bytes, _)) => decode_text_string(bytes),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when the BOM is present, otherwise
/// UTF-8 with a Latin-1 fallback
fn decode_text_string(bytes: &[u8]) -> Option<String> {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        String::from_utf16(&units).ok()
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => Some(s.to_string()),
            Err(_) => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

fn name_equals(entry: std::result::Result<&Object, lopdf::Error>, expected: &[u8]) -> bool {
    matches!(entry, Ok(Object::Name(name)) if name.as_slice() == expected)
}

/// A resolved hyperlink found in a document
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEntry {
    /// 1-based page number the link appears on
    pub page: u32,
    /// Decoded URI text
    pub uri: String,
}

/// List every link-annotation URI in the document, in traversal order
pub fn list_links(doc: &Document) -> Vec<LinkEntry> {
    collect_annotation_slots(doc)
        .into_iter()
        .filter_map(|(page, slot)| {
            let uri = slot.dict(doc).and_then(link_uri)?;
            Some(LinkEntry { page, uri })
        })
        .collect()
}

/// List every link-annotation URI in a PDF file
pub fn list_pdf_links(path: &Path) -> Result<Vec<LinkEntry>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    Ok(list_links(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri_link(uri: &str) -> Dictionary {
        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"URI".to_vec()));
        action.set(
            "URI",
            Object::String(uri.as_bytes().to_vec(), lopdf::StringFormat::Literal),
        );

        let mut annot = Dictionary::new();
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        annot.set("A", Object::Dictionary(action));
        annot
    }

    #[test]
    fn test_link_uri_extracts_text() {
        let annot = uri_link("https://example.com/page");
        assert_eq!(link_uri(&annot), Some("https://example.com/page".to_string()));
    }

    #[test]
    fn test_link_uri_decodes_utf16be_text() {
        // PDF text strings may be UTF-16BE with a leading BOM
        let uri = "https://example.com/page";
        let mut bytes = vec![0xFE, 0xFF];
        for unit in uri.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }

        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"URI".to_vec()));
        action.set("URI", Object::String(bytes, lopdf::StringFormat::Hexadecimal));

        let mut annot = Dictionary::new();
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        annot.set("A", Object::Dictionary(action));
        assert_eq!(link_uri(&annot), Some(uri.to_string()));
    }

    #[test]
    fn test_link_uri_decodes_latin1_text() {
        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"URI".to_vec()));
        action.set(
            "URI",
            Object::String(
                vec![b'h', b't', b't', b'p', b':', b'/', b'/', b'x', b'/', 0xE9],
                lopdf::StringFormat::Literal,
            ),
        );

        let mut annot = Dictionary::new();
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        annot.set("A", Object::Dictionary(action));
        assert_eq!(link_uri(&annot), Some("http://x/é".to_string()));
    }

    #[test]
    fn test_link_uri_rejects_other_subtypes() {
        let mut annot = uri_link("https://example.com");
        annot.set("Subtype", Object::Name(b"Text".to_vec()));
        assert_eq!(link_uri(&annot), None);
    }

    #[test]
    fn test_link_uri_rejects_missing_action() {
        let mut annot = Dictionary::new();
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        assert_eq!(link_uri(&annot), None);
    }

    #[test]
    fn test_link_uri_rejects_non_uri_action() {
        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"GoTo".to_vec()));
        action.set(
            "D",
            Object::String(b"chapter1".to_vec(), lopdf::StringFormat::Literal),
        );

        let mut annot = Dictionary::new();
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        annot.set("A", Object::Dictionary(action));
        assert_eq!(link_uri(&annot), None);
    }

    #[test]
    fn test_link_uri_rejects_indirect_action() {
        // An action stored behind a reference is not a direct dictionary;
        // the classifier leaves it alone rather than chasing the reference.
        let mut annot = Dictionary::new();
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        annot.set("A", Object::Reference((42, 0)));
        assert_eq!(link_uri(&annot), None);
    }

    #[test]
    fn test_link_uri_rejects_non_string_uri() {
        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"URI".to_vec()));
        action.set("URI", Object::Name(b"NotAString".to_vec()));

        let mut annot = Dictionary::new();
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        annot.set("A", Object::Dictionary(action));
        assert_eq!(link_uri(&annot), None);
    }

    #[test]
    fn test_list_pdf_links_nonexistent_file() {
        let result = list_pdf_links(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    // Traversal over full documents is covered in tests/integration.rs
}
