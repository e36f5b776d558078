//! Risk Scorer : combines reachability confidence, taint
//! verdict, and CVSS/EPSS/KEV signals into a 0-100 score with a top-factor
//! explanation, optionally trained from prior feedback.

pub mod errors;
pub mod feedback;
pub mod features;
pub mod model;
pub mod risk;

pub use errors::{Result, RiskError};
pub use feedback::{labeled_examples, should_retrain, FeedbackStore, ModelStore};
pub use features::{extract, FeatureVector, RiskContext};
pub use model::{train, LogisticModel, TrainingExample};
pub use risk::{RiskMode, RiskScorer};
