//! apk-resign package handling
//!
//! Everything that looks inside or rewrites a package archive: listing and
//! classifying entries, removing an existing signature, reading the manifest
//! and aligning the final file.

pub mod align;
#[cfg(test)]
mod axml_fixture;
pub mod error;
pub mod inspector;
pub mod manifest;
pub mod unsign;

pub use align::{decide_page_aligned, AlignOutcome, AlignmentDecisionEngine};
pub use error::{ManifestParseError, PackageError, Result};
pub use inspector::{classify_signing_files, has_signature_block, ArtifactInspector};
pub use manifest::{decode_manifest, extract_native_libs_from_xml, ApkManifestReader, ManifestReader};
pub use unsign::{UnsignOutcome, UnsignStage};
