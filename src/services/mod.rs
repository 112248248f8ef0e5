//! Service layer module root.
//! Stateless building blocks of the signing pipeline.

pub mod chain_resolver;
pub mod pkcs7_builder;
pub mod signed_attributes_builder;
pub mod signer_identifier;
pub mod timestamp_applier;
pub mod timestamp_parser;
pub mod timestamp_request_builder;

pub use chain_resolver::ChainResolver;
pub use pkcs7_builder::Pkcs7BuilderService;
pub use signed_attributes_builder::SignedAttributesBuilder;
pub use signer_identifier::{SelectedSignerIdentifier, SignerIdentifierSelector};
pub use timestamp_applier::TimestampApplier;
pub use timestamp_parser::TimestampParserService;
pub use timestamp_request_builder::{TimestampRequest, TimestampRequestBuilder};
