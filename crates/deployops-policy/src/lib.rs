//! Template checks run before a deployment is applied.
//!
//! - [`policy_length`]: estimated size of IAM policy documents in a template.
//! - [`change_set`]: resources a change set would replace or remove.

pub mod change_set;
pub mod error;
pub mod policy_length;
pub mod template;

pub use change_set::{FlaggedChange, flagged_changes, load_change_set};
pub use error::PolicyError;
pub use policy_length::{
    DEFAULT_MAX_POLICY_LENGTH, DEFAULT_TEMPLATE_PATH, PLATFORM_POLICY_LIMIT, PolicyLengthReport,
    PolicyMeasurement, measure_policies, policy_length,
};
pub use template::Template;
