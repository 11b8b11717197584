//! Document ingestion: text extraction and chunking

mod chunker;
mod extractor;

pub use chunker::{chunk_text, split_into_sentences, TextChunker};
pub use extractor::{DocumentExtractor, TextExtractor};
