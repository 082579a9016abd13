use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Unique identifier for a parent unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParentId(pub u64);

impl ParentId {
    /// Derive a deterministic id from a unit's provenance.
    ///
    /// Re-ingesting an identical document produces the same ids, so a
    /// repeated `put` overwrites instead of duplicating.
    pub fn derive(source: &str, page: Option<usize>, offset: usize) -> Self {
        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        page.hash(&mut hasher);
        offset.hash(&mut hasher);
        ParentId(hasher.finish())
    }
}

/// Provenance carried by every unit, sufficient for citation building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source document filename
    pub source: String,

    /// Page number (for paginated sources)
    pub page: Option<usize>,

    /// Character offset of the unit within the source text
    pub offset: usize,

    /// Identifier of the parser that extracted the text
    pub parser_tag: Option<String>,
}

/// Large contiguous slice of a source document.
///
/// The atomic unit of retrievable evidence. Immutable once stored; the only
/// mutation is wholesale deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentUnit {
    /// Unique identifier
    pub id: ParentId,

    /// Text content
    pub text: String,

    /// Source information
    pub metadata: SourceMetadata,
}

/// Small slice of a parent unit, used only for fine-grained dense indexing.
///
/// Children live exclusively inside the dense index and reference their
/// parent through storage identity, never by ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildUnit {
    /// Owning parent unit
    pub parent_id: ParentId,

    /// Text content
    pub text: String,
}

/// One document handed over by the upstream ingestion collaborator.
///
/// The collaborator has already done file handling and text extraction;
/// the engine applies parent/child chunking on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Extracted text content
    pub text: String,

    /// Source document filename
    pub source: String,

    /// Page number, when the collaborator split by page
    pub page: Option<usize>,

    /// Identifier of the parser that extracted the text
    pub parser_tag: Option<String>,
}

impl DocumentInput {
    /// Create a new document input with just text and a source name
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            page: None,
            parser_tag: None,
        }
    }

    /// Set the page number
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the parser tag
    pub fn with_parser_tag(mut self, tag: impl Into<String>) -> Self {
        self.parser_tag = Some(tag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_id_deterministic() {
        let a = ParentId::derive("manual.pdf", Some(3), 2000);
        let b = ParentId::derive("manual.pdf", Some(3), 2000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parent_id_unique_per_provenance() {
        let base = ParentId::derive("manual.pdf", Some(3), 2000);
        assert_ne!(base, ParentId::derive("manual.pdf", Some(3), 2001));
        assert_ne!(base, ParentId::derive("manual.pdf", Some(4), 2000));
        assert_ne!(base, ParentId::derive("other.pdf", Some(3), 2000));
    }

    #[test]
    fn test_document_input_builder() {
        let input = DocumentInput::new("text", "report.pdf").with_page(2).with_parser_tag("pdf");
        assert_eq!(input.source, "report.pdf");
        assert_eq!(input.page, Some(2));
        assert_eq!(input.parser_tag.as_deref(), Some("pdf"));
    }
}
