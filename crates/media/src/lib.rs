//! Clients for the external media services: the video processor that
//! transcodes uploads, the blob store that hosts images, and the
//! text-generation API behind the metadata jobs.
//!
//! Each service sits behind an async trait so the api and worker
//! crates can substitute in-memory fakes in tests.

pub mod error;
pub mod images;
pub mod processor;
pub mod text;

pub use error::MediaError;
pub use images::{HttpImageHost, ImageHost, StoredFile};
pub use processor::{AssetInfo, DirectUpload, HttpVideoProcessor, UploadInfo, VideoProcessor};
pub use text::{HttpTextGenerator, TextGenerator};
