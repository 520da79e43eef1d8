//! Document chunking for index construction.
//!
//! Splits course documents into overlapping windows suitable for embedding
//! and similarity search. Window sizes are measured in bytes; multibyte text
//! yields proportionally shorter chunks, which is the safe direction for
//! embedding input limits.

use crate::config::ChunkingSettings;

/// Approximate characters per token (rough estimate).
const CHARS_PER_TOKEN: usize = 4;

/// A chunk of text cut from a course document.
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// Chunk text.
    pub content: String,
    /// Position of this chunk within its document.
    pub order: i32,
    /// Byte offset of the chunk start in the source text.
    pub start_offset: usize,
    /// Byte offset of the chunk end in the source text.
    pub end_offset: usize,
}

/// Configuration for the sliding-window chunker.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk size.
    pub max_chars: usize,
    /// Overlap between consecutive chunks for context continuity.
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 2048,
            overlap_chars: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            max_chars: settings.max_chars,
            overlap_chars: settings.overlap_chars,
        }
    }
}

/// Split a document into ordered, overlapping chunks.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    sliding_window(text, config.max_chars, config.overlap_chars)
        .into_iter()
        .enumerate()
        .map(|(index, (content, start, end))| TextChunk {
            content,
            order: index as i32,
            start_offset: start,
            end_offset: end,
        })
        .collect()
}

/// Estimate the number of tokens in text.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Split text into overlapping chunks using a sliding window approach.
/// Returns tuples of (chunk_text, start_offset, end_offset).
fn sliding_window(text: &str, max_chars: usize, overlap: usize) -> Vec<(String, usize, usize)> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    // If text is small enough, return as single chunk
    if text.len() <= max_chars {
        return vec![(text.to_string(), 0, text.len())];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = floor_char_boundary(text, (start + max_chars).min(text.len()));

        // Try to find a good break point (sentence or paragraph boundary)
        let chunk_end = if end < text.len() {
            find_break_point(&text[start..end])
                .map(|offset| start + offset)
                .unwrap_or(end)
        } else {
            end
        };

        let chunk_text = text[start..chunk_end].trim().to_string();
        if !chunk_text.is_empty() {
            chunks.push((chunk_text, start, chunk_end));
        }

        // Move start position, accounting for overlap
        let step = chunk_end - start;
        if step <= overlap {
            // Avoid infinite loop if chunk is too small
            start = chunk_end;
        } else {
            start = floor_char_boundary(text, chunk_end - overlap);
        }
    }

    chunks
}

/// Find a good break point in a window (prefer sentence/paragraph boundaries).
///
/// Handles both CJK and Western punctuation; course materials mix the two.
fn find_break_point(window: &str) -> Option<usize> {
    let len = window.len();

    // Look for paragraph boundary (double newline)
    if let Some(pos) = window.rfind("\n\n") {
        if pos > len / 3 {
            return Some(pos + 2);
        }
    }

    // Look for sentence boundary
    for pattern in &["。", "！", "？", ". ", "! ", "? ", ".\n", "!\n", "?\n"] {
        if let Some(pos) = window.rfind(pattern) {
            if pos > len / 3 {
                return Some(pos + pattern.len());
            }
        }
    }

    // Look for any newline
    if let Some(pos) = window.rfind('\n') {
        if pos > len / 3 {
            return Some(pos + 1);
        }
    }

    // Look for clause boundary
    for pattern in &["，", "；", ", ", "; "] {
        if let Some(pos) = window.rfind(pattern) {
            if pos > len / 2 {
                return Some(pos + pattern.len());
            }
        }
    }

    // Fall back to word boundary
    if let Some(pos) = window.rfind(' ') {
        return Some(pos + 1);
    }

    None
}
