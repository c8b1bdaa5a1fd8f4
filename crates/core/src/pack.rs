//! Packing of content blocks into slides.
//!
//! Images always get a slide of their own and headings always open a new
//! text slide. Text is the only content that shares a slide, up to a
//! capacity budget measured in characters plus a small per-item overhead.

use crate::normalize::char_len;
use crate::segment::{TextSegmenter, DEFAULT_MAX_CHUNK_LEN};
use crate::types::{Article, ContentBlock, Slide, SlideItem};

/// Default capacity of a text slide.
pub const DEFAULT_CAPACITY: usize = 300;

/// Extra weight charged for a heading, for its larger type.
pub const HEADING_SURCHARGE: usize = 10;

/// Extra weight charged for each text chunk, for paragraph spacing.
pub const TEXT_OVERHEAD: usize = 2;

/// Text slide under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackState {
    items: Vec<SlideItem>,
    weight: usize,
}

impl PackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SlideItem] {
        &self.items
    }

    /// Accumulated weight, including heading surcharges and text overheads.
    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Close the accumulator. Returns the emptied state and the finished
    /// slide, or no slide if nothing had been accumulated.
    fn flush(self, article_label: &str) -> (Self, Option<Slide>) {
        if self.items.is_empty() {
            return (Self::new(), None);
        }
        let slide = Slide::TextBody {
            items: self.items,
            article_label: article_label.to_string(),
        };
        (Self::new(), Some(slide))
    }
}

/// Packs article blocks into slides.
#[derive(Debug, Clone)]
pub struct SlidePacker {
    /// Maximum weight of one text slide.
    capacity: usize,

    /// Splits text blocks longer than the segmentation threshold.
    segmenter: TextSegmenter,
}

impl Default for SlidePacker {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            segmenter: TextSegmenter::new().with_max_len(DEFAULT_MAX_CHUNK_LEN),
        }
    }
}

impl SlidePacker {
    /// Create a packer with a capacity of 300 and a segmentation threshold of 180.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text slide capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the length above which text blocks are split into sentence chunks.
    pub fn with_segment_threshold(mut self, threshold: usize) -> Self {
        self.segmenter = self.segmenter.with_max_len(threshold);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn segment_threshold(&self) -> usize {
        self.segmenter.max_len()
    }

    /// Apply one block to the packing state.
    ///
    /// Returns the new state and the slides completed by this block, in order.
    pub fn step(
        &self,
        state: PackState,
        block: &ContentBlock,
        article_label: &str,
    ) -> (PackState, Vec<Slide>) {
        let mut emitted = Vec::new();

        match block {
            ContentBlock::Image { asset, caption } => {
                let (state, slide) = state.flush(article_label);
                emitted.extend(slide);
                emitted.push(Slide::Image {
                    asset: asset.clone(),
                    caption: caption.clone(),
                    article_label: article_label.to_string(),
                });
                (state, emitted)
            }
            ContentBlock::Heading { text } => {
                let (mut state, slide) = state.flush(article_label);
                emitted.extend(slide);
                state.weight = char_len(text) + HEADING_SURCHARGE;
                state.items.push(SlideItem::Heading { text: text.clone() });
                (state, emitted)
            }
            ContentBlock::Text { text } => {
                let mut state = state;
                for chunk in self.chunks(text) {
                    let len = char_len(&chunk);
                    if state.weight + len > self.capacity {
                        let (flushed, slide) = state.flush(article_label);
                        emitted.extend(slide);
                        state = flushed;
                    }
                    state.items.push(SlideItem::Text { text: chunk });
                    state.weight += len + TEXT_OVERHEAD;
                }
                (state, emitted)
            }
        }
    }

    /// Close out packing, emitting the last text slide if any.
    pub fn finish(&self, state: PackState, article_label: &str) -> Vec<Slide> {
        state.flush(article_label).1.into_iter().collect()
    }

    /// Pack a whole block sequence.
    pub fn pack(&self, blocks: &[ContentBlock], article_label: &str) -> Vec<Slide> {
        let mut slides = Vec::new();
        let mut state = PackState::new();

        for block in blocks {
            let (next, emitted) = self.step(state, block, article_label);
            slides.extend(emitted);
            state = next;
        }

        slides.extend(self.finish(state, article_label));
        slides
    }

    /// Pack an article's body, labelled with its title.
    ///
    /// The article title slide is not included.
    pub fn pack_article(&self, article: &Article) -> Vec<Slide> {
        let slides = self.pack(&article.blocks, &article.title);
        log::debug!(
            "Packed {} blocks of '{}' into {} slides",
            article.blocks.len(),
            article.title,
            slides.len()
        );
        slides
    }

    /// Build a whole deck: one cover, then each article's title and body slides.
    pub fn build_deck(&self, articles: &[Article]) -> Vec<Slide> {
        let mut slides = vec![Slide::Cover];
        for article in articles {
            slides.push(Slide::article_title(article));
            slides.extend(self.pack_article(article));
        }
        slides
    }

    /// Text chunks for one text block.
    fn chunks(&self, text: &str) -> Vec<String> {
        if char_len(text) > self.segmenter.max_len() {
            self.segmenter.segment(text)
        } else if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        }
    }
}
