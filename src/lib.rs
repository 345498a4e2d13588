//! Assetforge - media asset normalization pipeline
//!
//! Heterogeneous media assets (photos, animated images, videos) from a
//! platform library, a remote URL, or a local handoff are normalized into a
//! small set of canonical representations suitable for upload, display, and
//! caching. This library crate exposes the pipeline for embedding and
//! integration testing.

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod images;
pub mod selection;
pub mod sniff;
pub mod source;
pub mod video;

pub use convert::{AssetConverter, ConverterOptions};
pub use error::ConvertError;
pub use selection::{ImageSelection, Selection, VideoSelection};
