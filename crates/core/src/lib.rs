//! Core domain types, text segmentation, and slide packing for turning
//! archived web articles into slide decks.

pub mod asset;
pub mod error;
pub mod normalize;
pub mod pack;
pub mod segment;
pub mod types;

pub use asset::{AssetKind, AssetRef, AssetSink};
pub use error::{Error, Result};
pub use pack::{PackState, SlidePacker};
pub use segment::TextSegmenter;
pub use types::{Article, ContentBlock, Slide, SlideItem};
