//! Asset materialization for slide deck generation.
//!
//! [`AssetStore`] writes archived images under content-derived names and is
//! the [`deck_core::AssetSink`] the archive reader stores through.
//! [`AssetUnifier`] then collects the images an article actually uses into one
//! shared directory, converting WebP to PNG on the way.

pub mod store;
pub mod unify;

pub use store::{asset_file_name, asset_id, AssetStore};
pub use unify::AssetUnifier;
