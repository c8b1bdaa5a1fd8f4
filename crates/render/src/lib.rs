//! Slide rendering and deck output.
//!
//! Each [`deck_core::Slide`] becomes one self-contained HTML document; the
//! [`Manifest`] lists the documents in deck order for downstream packaging.

pub mod html;
pub mod manifest;

pub use html::{escape_html, CoverInfo, SlideRenderer};
pub use manifest::{slide_file_name, DeckWriter, Manifest};
