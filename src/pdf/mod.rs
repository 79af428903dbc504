//! PDF annotation traversal and link rewriting

pub mod annotations;
pub mod retag;

// Re-export commonly used items
pub use annotations::{
    collect_annotation_slots, link_uri, list_links, list_pdf_links, AnnotationSlot, LinkEntry,
};
pub use retag::{retag_links, retag_pdf, rewrite_query_tag, RetagOptions, RetagReport, UriRewrite};
