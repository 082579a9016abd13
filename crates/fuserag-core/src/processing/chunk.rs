use crate::config::ChunkingConfig;
use crate::error::{FuseragError, Result};
use crate::models::{ChildUnit, DocumentInput, ParentId, ParentUnit, SourceMetadata};

/// Separators tried in order when looking for a cut point: paragraph
/// breaks, then line breaks, then spaces, then a hard character cut.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Byte range of one unit within the input text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Splits text into units of at most `size` bytes, each carrying
/// `overlap` bytes from the previous unit's tail.
///
/// Units are exact contiguous slices of the input, so concatenating them
/// minus the recorded overlaps reconstructs the original text.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    size: usize,
    overlap: usize,
}

impl TextSplitter {
    /// Create a splitter with the given target size and overlap.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(FuseragError::ConfigInvalid {
                key: "chunk_size".to_string(),
                reason: "size must be non-zero".to_string(),
            });
        }

        // Overlap below half the size guarantees every unit advances past
        // the previous one.
        if overlap * 2 >= size {
            return Err(FuseragError::ConfigInvalid {
                key: "chunk_overlap".to_string(),
                reason: format!(
                    "overlap ({}) must be less than half the unit size ({})",
                    overlap, size
                ),
            });
        }

        Ok(Self { size, overlap })
    }

    /// Split `text` into contiguous, overlapping spans.
    ///
    /// Empty input yields an empty list.
    pub fn split(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        let mut start = 0usize;

        loop {
            let end = if text.len() - start <= self.size {
                text.len()
            } else {
                self.cut_point(text, start)
            };

            spans.push(Span { start, end });

            if end >= text.len() {
                break;
            }

            let mut next = end.saturating_sub(self.overlap).max(start + 1);
            while next < text.len() && !text.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }

        spans
    }

    /// Find the cut point for a unit starting at `start`, preferring the
    /// last separator in the back half of the target window.
    fn cut_point(&self, text: &str, start: usize) -> usize {
        let mut hard_end = start + self.size;
        while hard_end > start && !text.is_char_boundary(hard_end) {
            hard_end -= 1;
        }
        if hard_end == start {
            hard_end = start + 1;
            while hard_end < text.len() && !text.is_char_boundary(hard_end) {
                hard_end += 1;
            }
            return hard_end;
        }

        let mut floor = start + self.size / 2;
        while floor < hard_end && !text.is_char_boundary(floor) {
            floor += 1;
        }
        if floor >= hard_end {
            return hard_end;
        }

        let window = &text[floor..hard_end];
        for sep in SEPARATORS {
            if let Some(pos) = window.rfind(sep) {
                return floor + pos + sep.len();
            }
        }

        hard_end
    }
}

/// Hierarchical chunker producing parent units and their child units.
#[derive(Debug, Clone)]
pub struct Chunker {
    parent: TextSplitter,
    child: TextSplitter,
}

impl Chunker {
    /// Create a chunker from validated chunking configuration.
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.child_size > config.parent_size {
            return Err(FuseragError::ConfigInvalid {
                key: "chunking.child_size".to_string(),
                reason: format!(
                    "child_size ({}) must not exceed parent_size ({})",
                    config.child_size, config.parent_size
                ),
            });
        }

        Ok(Self {
            parent: TextSplitter::new(config.parent_size, config.parent_overlap)?,
            child: TextSplitter::new(config.child_size, config.child_overlap)?,
        })
    }

    /// Re-derive the child units of a stored parent.
    ///
    /// Used when rebuilding the dense index from the parent store; child
    /// units are never persisted, only re-split.
    pub fn child_units(&self, parent: &ParentUnit) -> Vec<ChildUnit> {
        self.child
            .split(&parent.text)
            .into_iter()
            .map(|span| ChildUnit {
                parent_id: parent.id,
                text: parent.text[span.start..span.end].to_string(),
            })
            .collect()
    }

    /// Split one ingested document into parent units, each paired with the
    /// child units derived from its text.
    ///
    /// A document that yields no text produces an empty list, not an error.
    pub fn chunk_document(&self, input: &DocumentInput) -> Vec<(ParentUnit, Vec<ChildUnit>)> {
        self.parent
            .split(&input.text)
            .into_iter()
            .map(|span| {
                let text = input.text[span.start..span.end].to_string();
                let id = ParentId::derive(&input.source, input.page, span.start);

                let children = self
                    .child
                    .split(&text)
                    .into_iter()
                    .map(|c| ChildUnit {
                        parent_id: id,
                        text: text[c.start..c.end].to_string(),
                    })
                    .collect();

                let parent = ParentUnit {
                    id,
                    text,
                    metadata: SourceMetadata {
                        source: input.source.clone(),
                        page: input.page,
                        offset: span.start,
                        parser_tag: input.parser_tag.clone(),
                    },
                };

                (parent, children)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> TextSplitter {
        TextSplitter::new(size, overlap).unwrap()
    }

    #[test]
    fn test_new_rejects_large_overlap() {
        assert!(TextSplitter::new(100, 50).is_err());
        assert!(TextSplitter::new(100, 49).is_ok());
    }

    #[test]
    fn test_split_empty() {
        assert!(splitter(100, 10).split("").is_empty());
    }

    #[test]
    fn test_split_short_text_single_span() {
        let text = "Short text.";
        let spans = splitter(100, 10).split(text);
        assert_eq!(spans, vec![Span { start: 0, end: text.len() }]);
    }

    #[test]
    fn test_spans_within_size() {
        let text = "word ".repeat(200);
        for span in splitter(50, 10).split(&text) {
            assert!(span.end - span.start <= 50);
        }
    }

    #[test]
    fn test_prefers_paragraph_break() {
        // A paragraph break sits in the back half of the window; the cut
        // should land right after it rather than at the hard limit.
        let text = format!("{}\n\n{}", "a".repeat(40), "b".repeat(60));
        let spans = splitter(50, 5).split(&text);
        assert_eq!(spans[0].end, 42);
    }

    #[test]
    fn test_prefers_space_over_hard_cut() {
        let text = format!("{} {}", "a".repeat(40), "b".repeat(60));
        let spans = splitter(50, 5).split(&text);
        assert_eq!(spans[0].end, 41);
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let text = "x".repeat(120);
        let spans = splitter(50, 5).split(&text);
        assert_eq!(spans[0], Span { start: 0, end: 50 });
        assert_eq!(spans[1].start, 45);
    }

    #[test]
    fn test_overlap_carried_from_previous_tail() {
        let text = "word ".repeat(100);
        let spans = splitter(50, 10).split(&text);
        for pair in spans.windows(2) {
            let carried = pair[0].end - pair[1].start;
            assert!(carried > 0, "consecutive spans should overlap");
            assert!(carried <= 10);
        }
    }

    #[test]
    fn test_split_multibyte_safe() {
        let text = "héllo wörld ".repeat(40);
        let spans = splitter(50, 10).split(&text);
        for span in spans {
            // Slicing must not panic on char boundaries
            let _ = &text[span.start..span.end];
        }
    }

    fn reconstruct(parents: &[(ParentUnit, Vec<ChildUnit>)]) -> String {
        let mut out = String::new();
        let mut prev_end = 0usize;
        for (parent, _) in parents {
            let overlap = prev_end - parent.metadata.offset;
            out.push_str(&parent.text[overlap..]);
            prev_end = parent.metadata.offset + parent.text.len();
        }
        out
    }

    #[test]
    fn test_chunk_document_reconstructs_input() {
        let text = "First paragraph with some content.\n\nSecond paragraph, longer, \
                    with more words in it.\n\nThird paragraph closes the document."
            .repeat(8);
        let config = ChunkingConfig {
            parent_size: 120,
            parent_overlap: 20,
            child_size: 40,
            child_overlap: 8,
        };
        let chunker = Chunker::new(&config).unwrap();

        let parents = chunker.chunk_document(&DocumentInput::new(text.clone(), "doc.txt"));
        assert!(parents.len() > 1);
        assert_eq!(reconstruct(&parents), text);
    }

    #[test]
    fn test_chunk_document_empty_input() {
        let chunker = Chunker::new(&ChunkingConfig::default()).unwrap();
        let parents = chunker.chunk_document(&DocumentInput::new("", "empty.txt"));
        assert!(parents.is_empty());
    }

    #[test]
    fn test_children_reference_their_parent() {
        let config = ChunkingConfig {
            parent_size: 200,
            parent_overlap: 40,
            child_size: 60,
            child_overlap: 10,
        };
        let chunker = Chunker::new(&config).unwrap();
        let text = "sentence one. sentence two. sentence three. ".repeat(20);

        let parents = chunker.chunk_document(&DocumentInput::new(text, "doc.txt"));
        for (parent, children) in &parents {
            assert!(!children.is_empty());
            for child in children {
                assert_eq!(child.parent_id, parent.id);
                assert!(parent.text.contains(&child.text));
                assert!(child.text.len() <= 60);
            }
        }
    }

    #[test]
    fn test_units_tagged_with_source() {
        let chunker = Chunker::new(&ChunkingConfig::default()).unwrap();
        let input = DocumentInput::new("some text", "manual.pdf").with_page(4);
        let parents = chunker.chunk_document(&input);

        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].0.metadata.source, "manual.pdf");
        assert_eq!(parents[0].0.metadata.page, Some(4));
        assert_eq!(parents[0].0.metadata.offset, 0);
    }
}
