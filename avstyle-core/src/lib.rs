//! Core library for transcoding uploaded media into named styles.
//!
//! Given a source file and the options of one style, the [`Transcoder`]
//! decides whether the file is media at all, builds an ffmpeg job from the
//! style's geometry and convert options, runs it once, and records the
//! probed source and measured output dimensions under the style name in the
//! attachment's metadata document.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use avstyle_core::{Attachment, JsonFileMetadataStore, TranscodeOptions, Transcoder};
//! use std::path::Path;
//!
//! let options = TranscodeOptions::builder()
//!     .style("thumb")
//!     .geometry("320x240#")
//!     .format("jpg")
//!     .seek_secs(2.0)
//!     .build();
//!
//! let mut store = JsonFileMetadataStore::new("clip.meta.json");
//! let mut attachment = Attachment::new(&mut store);
//!
//! let output = Transcoder::with_defaults()
//!     .run(Path::new("clip.mov"), &options, Some(&mut attachment))
//!     .unwrap();
//! output.persist(Path::new("clip-thumb.jpg")).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod geometry;
pub mod job;
pub mod logging;
pub mod metadata;
pub mod store;
pub mod transcoder;

// Re-exports for public API
pub use config::{ConvertOptions, SeekTime, StyleSet, TranscodeOptions, TranscoderConfig};
pub use error::{CoreError, CoreResult};
pub use geometry::{Dimension, GeometryDirective, Modifier};
pub use job::{OutputParams, TranscodeJobSpec, build_job};
pub use metadata::{MeasuredDimensions, MetadataDocument, MetadataRecord, OutputMetadata, SourceMetadata};
pub use store::{Attachment, JsonFileMetadataStore, MemoryMetadataStore, MetadataStore};
pub use transcoder::{TranscodeOutput, TranscodeState, Transcoder};
