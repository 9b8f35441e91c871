// src/pipeline/mod.rs

//! Assembly pipeline: fetched fragments to on-disk documents.
//!
//! - Shared page scaffolding (`page`)
//! - Image localization pass (`ImagePipeline`)
//! - Embedded artifact replacement (`ArtifactPipeline`)
//! - Problem, card and company assemblers
//! - Submission export (`SubmissionExporter`)
//! - Print conversion of finished documents (`PdfConverter`)

pub mod artifacts;
pub mod cards;
pub mod companies;
pub mod convert;
pub mod images;
pub mod page;
pub mod problem;
pub mod submissions;

pub use artifacts::ArtifactPipeline;
pub use cards::CardAssembler;
pub use companies::CompanyAssembler;
pub use convert::PdfConverter;
pub use images::ImagePipeline;
pub use problem::{ProblemAssembler, RunSummary};
pub use submissions::SubmissionExporter;
