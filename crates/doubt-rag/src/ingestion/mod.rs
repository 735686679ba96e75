//! Document ingestion pipeline with multi-format parsing

mod chunker;
pub mod detect;
mod pipeline;
mod reader;

pub use chunker::{Span, TextChunker};
pub use detect::{detect, detect_document, image_mime, Detection};
pub use pipeline::{BuildOutcome, IngestPipeline, PreparedBatch};
pub use reader::{BatchRead, FileReader};
