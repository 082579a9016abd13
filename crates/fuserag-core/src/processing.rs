pub mod chunk;

pub use chunk::{Chunker, Span, TextSplitter};
