//! CLI library for testing purposes

pub mod family;
pub mod validation;

pub use family::{Family, expand_inputs, family_sources, load_preferences};
pub use propbundle::BundleSession;
