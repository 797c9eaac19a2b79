//! Reference collaborators and fixtures for tests and examples.
//!
//! The pipeline takes its transformer, classifiers, and metric from the
//! caller. The implementations here are deliberately small so that the
//! pipeline can be exercised end to end without an external model library.

mod data;
mod models;
mod transformer;

pub use data::retail_frames;
pub use models::{MajorityFactory, MatchRate, Precision, StumpFactory};
pub use transformer::{ColumnTransformer, StandardScaler};
