//! MHTML (saved web page) reader: MIME container parsing, markup decoding,
//! and extraction of the article body into content blocks.
//!
//! Images found in the archive are handed to an [`deck_core::AssetSink`];
//! the markup is then flattened into ordered blocks that refer to the stored
//! assets.

pub mod archive;
pub mod charset;
pub mod dom;
pub mod extract;
pub mod locator;
pub mod metadata;
pub mod parser;

pub use archive::{Archive, ArchivePart};
pub use extract::{BlockExtractor, Extraction};
pub use locator::{normalize_locator, AssetMap};
pub use metadata::ArticleMeta;
pub use parser::{ArchiveParser, ParsedArchive};
