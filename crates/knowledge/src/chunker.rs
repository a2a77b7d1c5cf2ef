//! Word-window chunking with configurable size and overlap.

/// Split text into overlapping windows of whitespace-separated words.
///
/// Each window holds up to `size` words joined by single spaces. Consecutive
/// windows start `max(1, size - overlap)` words apart, so the last window may
/// be shorter than `size`. Text without words yields no chunks.
pub fn chunk_words(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || size == 0 {
        return Vec::new();
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::with_capacity(words.len() / step + 1);
    let mut start = 0;

    while start < words.len() {
        let end = (start + size).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += step;
    }

    tracing::trace!(
        "Chunked {} words into {} chunks (size: {}, overlap: {})",
        words.len(),
        chunks.len(),
        size,
        overlap
    );

    chunks
}
