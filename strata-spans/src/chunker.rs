//! Overlapping fixed-size windows over UTF-8 content.

/// Chunking policy: window size and overlap, both in bytes.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPolicy {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkPolicy {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        // Overlap must leave forward progress.
        debug_assert!(chunk_overlap < chunk_size);
        Self {
            chunk_size,
            chunk_overlap,
        }
    }
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_size: strata_core::constants::DEFAULT_CHUNK_SIZE,
            chunk_overlap: strata_core::constants::DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split `content` into byte ranges of at most `chunk_size`, each window
/// starting `chunk_size - chunk_overlap` after the previous one so cut
/// points are covered twice. Ranges are clamped to char boundaries and
/// never empty.
pub fn chunk_windows(content: &str, policy: ChunkPolicy) -> Vec<(usize, usize)> {
    let len = content.len();
    if len == 0 {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut start = 0usize;
    loop {
        let mut end = (start + policy.chunk_size).min(len);
        end = floor_char_boundary(content, end);
        // A run of multi-byte chars could floor us back to start; push
        // forward to the next boundary instead.
        if end <= start {
            end = ceil_char_boundary(content, start + 1).min(len);
        }
        windows.push((start, end));

        if end >= len {
            break;
        }
        let next = end.saturating_sub(policy.chunk_overlap).max(start + 1);
        start = ceil_char_boundary(content, next);
        if start >= len {
            break;
        }
    }
    windows
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx.min(s.len())
}
