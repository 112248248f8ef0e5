//! Workflow pipelines orchestrating stateless services.

pub mod sign;
pub mod timestamp;

pub use sign::{SignWorkflow, SignatureArtifact};
pub use timestamp::{TimestampWorkflow, TimestampedSignature};
