//! Sentence-aware text chunking with overlap
//!
//! Chunks are packed greedily from whole sentences up to `chunk_size`
//! characters. When a chunk closes, the next one is seeded with the last
//! sentence found in the trailing `overlap` characters of the closed chunk,
//! so consecutive chunks share context across the boundary.

use crate::config::ChunkingConfig;

/// Text chunker configured with a target size and overlap (in characters)
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker; parameters are taken as-is and sanity-checked per call
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Split `text` into chunks
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.chunk_size, self.overlap)
    }
}

impl From<&ChunkingConfig> for TextChunker {
    fn from(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }
}

/// Split text into sentence-aware chunks of at most `chunk_size` characters
/// with `overlap` characters of context carried across chunk boundaries.
///
/// All lengths are measured in characters. Words are never split: a single
/// word longer than `chunk_size` becomes its own oversized chunk. The
/// function never panics; with unusable parameters (`chunk_size == 0` or
/// `overlap >= chunk_size`) it degrades to returning the whole trimmed text
/// as a single chunk. Output is deterministic.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if chunk_size == 0 || overlap >= chunk_size {
        tracing::warn!(
            chunk_size,
            overlap,
            "unusable chunking parameters, returning text as a single chunk"
        );
        return vec![text.to_string()];
    }

    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }

    let sentences = split_into_sentences(text);
    tracing::debug!(
        chars = char_len(text),
        sentences = sentences.len(),
        "chunking text"
    );

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        if fits(&current, sentence, chunk_size) {
            append_piece(&mut current, sentence);
            continue;
        }

        // Close the full buffer and seed the next one with overlap context.
        if !current.is_empty() {
            push_chunk(&mut chunks, &current);
            current = overlap_seed(chunks.last().map(String::as_str), overlap);

            if fits(&current, sentence, chunk_size) {
                append_piece(&mut current, sentence);
                continue;
            }
        }

        if char_len(sentence) > chunk_size {
            // Oversized sentence: flush any seed and pack words directly,
            // without overlap seeding inside the sentence.
            if !current.is_empty() {
                push_chunk(&mut chunks, &current);
                current = String::new();
            }
            for word in sentence.split_whitespace() {
                if fits(&current, word, chunk_size) {
                    append_piece(&mut current, word);
                } else {
                    if !current.is_empty() {
                        push_chunk(&mut chunks, &current);
                    }
                    current = word.to_string();
                }
            }
        } else {
            // The overlap seed plus this sentence would overflow; drop the
            // seed and start fresh so the index keeps advancing.
            current = sentence.to_string();
        }
    }

    if !current.trim().is_empty() {
        push_chunk(&mut chunks, &current);
    }

    chunks
}

/// Split text into sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace; the terminator
/// stays with the sentence. Fragments are trimmed and empties dropped.
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?') {
            if let Some(&(next_idx, next_ch)) = chars.peek() {
                if next_ch.is_whitespace() {
                    let sentence = text[start..next_idx].trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence);
                    }
                    start = next_idx;
                }
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Seed for the next chunk: the last sentence within the trailing `overlap`
/// characters of the previous chunk (the whole chunk if it is shorter).
fn overlap_seed(previous: Option<&str>, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    let Some(previous) = previous else {
        return String::new();
    };

    let tail = tail_chars(previous, overlap);
    split_into_sentences(tail)
        .last()
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Last `n` characters of `s` as a subslice on a char boundary
fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let skip = count - n;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Whether `piece` (plus a separating space when needed) fits in the buffer
fn fits(current: &str, piece: &str, chunk_size: usize) -> bool {
    let separator = usize::from(!current.is_empty());
    char_len(current) + separator + char_len(piece) <= chunk_size
}

fn append_piece(current: &mut String, piece: &str) {
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(piece);
}

fn push_chunk(chunks: &mut Vec<String>, current: &str) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
