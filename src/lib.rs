//! oob-adapter - confirm out-of-band DNS/HTTP interactions through
//! third-party interaction-log services
//!
//! Callers build an [`OobAdapter`] for one provider, hand a generated
//! callback address to the system under test, then ask the adapter whether
//! the embedded token showed up in the provider's log.

pub mod adapter;
pub mod config;
pub mod connector;
pub mod error;
pub mod http;
pub mod models;
pub mod records;
pub mod token;

pub use adapter::OobAdapter;
pub use error::{OobError, Result};
pub use models::{
    ConnectionParams, FilterType, MatchPolicy, ProviderKind, Record, ValidateParams,
    ValidationDomains, ValidationResult,
};
