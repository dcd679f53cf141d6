//! apk-resign workflow - the resigning pipeline
//!
//! Ties the package and signing stages together: keystore resolution,
//! per-artifact unsign / sign / align, output naming and export of the
//! produced paths.

pub mod error;
pub mod export;
pub mod keystore_source;
pub mod naming;
pub mod pipeline;

pub use error::{PipelineError, Result};
pub use export::{export_values, OutputExporter};
pub use keystore_source::{redact_url, KeystoreSource};
pub use naming::{output_path, pretty_basename};
pub use pipeline::{load_signature_configuration, PipelineOptions, PipelineResult, ResignPipeline};
