//! Config model - options and relation data into typed settings
//!
//! - **options**: raw charm options with their defaults
//! - **settings**: validated domain types ([`CanonicalSettings`] and friends)
//! - **validation**: the pure `validate` step and its error taxonomy

pub mod options;
pub mod settings;
pub mod validation;

pub use options::CharmOptions;
pub use settings::{
    AmfEndpoint, CanonicalSettings, FixedHex, Imsi, InterfaceMode, Plmn, SequenceNumber, Slice,
    SliceDifferentiator, Tac, UsimKey,
};
pub use validation::{validate, ConfigModelError, ValidationError};
