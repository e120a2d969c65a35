//! Progressive rendering support: fixed-size character chunks with a
//! monotonically growing "loaded" window.

use serde::{Deserialize, Serialize};

pub const CHUNK_SIZE: usize = 5_000;
pub const INITIAL_CHUNKS: usize = 3;
pub const LOAD_MORE_STEP: usize = 2;
pub const LOAD_MORE_THRESHOLD_PERCENT: f64 = 70.0;

/// Splits on character count only; markdown structure is ignored.
pub fn chunk_text(text: &str, chunk_chars: usize) -> Vec<&str> {
    let chunk_chars = chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;

    for (idx, _) in text.char_indices() {
        if count == chunk_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDocument {
    chunks: Vec<String>,
    loaded: usize,
}

impl ChunkedDocument {
    pub fn new(text: &str) -> Self {
        Self::with_chunk_size(text, CHUNK_SIZE)
    }

    pub fn with_chunk_size(text: &str, chunk_chars: usize) -> Self {
        let chunks = chunk_text(text, chunk_chars)
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let loaded = INITIAL_CHUNKS.min(chunks.len());
        Self { chunks, loaded }
    }

    /// Rebuilds the cursor at a known loaded count, clamped to the chunk count.
    pub fn resume(text: &str, loaded: usize) -> Self {
        let mut doc = Self::new(text);
        doc.loaded = loaded.min(doc.chunks.len());
        doc
    }

    pub fn total(&self) -> usize {
        self.chunks.len()
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.loaded >= self.chunks.len()
    }

    pub fn visible(&self) -> &[String] {
        &self.chunks[..self.loaded]
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Reveals up to [`LOAD_MORE_STEP`] more chunks; a no-op once everything is loaded.
    pub fn load_more(&mut self) -> usize {
        if !self.is_fully_loaded() {
            self.loaded = (self.loaded + LOAD_MORE_STEP).min(self.chunks.len());
        }
        self.loaded
    }

    /// Loads more when the scroll position passes the threshold.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        if !metrics.should_load_more() || self.is_fully_loaded() {
            return false;
        }
        let before = self.loaded;
        self.load_more() > before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// `None` when the content does not scroll.
    pub fn percent(&self) -> Option<f64> {
        let scrollable = self.scroll_height - self.client_height;
        if scrollable <= 0.0 {
            return None;
        }
        Some(self.scroll_top / scrollable * 100.0)
    }

    pub fn should_load_more(&self) -> bool {
        self.percent()
            .is_some_and(|percent| percent > LOAD_MORE_THRESHOLD_PERCENT)
    }
}
