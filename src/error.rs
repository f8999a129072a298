//! Harness error taxonomy
//!
//! Every fallible harness operation returns [`anyhow::Result`]. The variants
//! below are attached either as the root error (configuration failures) or as
//! context on top of a collaborator/I/O error, so callers can recover the
//! category with [`anyhow::Error::downcast_ref`] while the original cause
//! stays in the chain.

use std::{fmt, path::PathBuf, time::Duration};

/// Errors raised by the evaluation harness itself
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// Policy identity that maps to no known agent constructor
    UnknownPolicy {
        /// Name as it was supplied
        name: String,
    },

    /// An experiment constant or hyperparameter is out of range
    InvalidConfig {
        /// Offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// An environment or policy failed during a trial
    Collaborator {
        /// Repetition index the trial belonged to
        repetition: usize,
        /// Step index at which the failure surfaced
        step: usize,
    },

    /// A trial exceeded its wall-clock limit
    TrialTimeout {
        /// Repetition index the trial belonged to
        repetition: usize,
        /// Steps completed before the limit was hit
        step: usize,
        /// Configured limit
        limit: Duration,
    },

    /// Writing an artifact failed
    Export {
        /// Destination that could not be written
        path: PathBuf,
    },

    /// No value of a sweep produced a comparable score
    EmptySweep {
        /// Axis the sweep varied
        axis: String,
    },
}

impl HarnessError {
    /// Shorthand for an [`HarnessError::InvalidConfig`]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        HarnessError::InvalidConfig { field: field.into(), message: message.into() }
    }

    /// Whether this error belongs to the configuration category
    pub fn is_configuration(&self) -> bool {
        matches!(self, HarnessError::UnknownPolicy { .. } | HarnessError::InvalidConfig { .. })
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::UnknownPolicy { name } => {
                write!(f, "Policy '{}' not implemented (expected Dyna or PrioritizedSweeping)", name)
            }
            HarnessError::InvalidConfig { field, message } => {
                write!(f, "Invalid configuration for '{}': {}", field, message)
            }
            HarnessError::Collaborator { repetition, step } => {
                write!(f, "Collaborator failed in repetition {} at step {}", repetition, step)
            }
            HarnessError::TrialTimeout { repetition, step, limit } => write!(
                f,
                "Trial in repetition {} exceeded {:.1}s after {} steps",
                repetition,
                limit.as_secs_f64(),
                step
            ),
            HarnessError::Export { path } => {
                write!(f, "Failed to write artifact '{}'", path.display())
            }
            HarnessError::EmptySweep { axis } => {
                write!(f, "Sweep over '{}' has no scorable learning curve", axis)
            }
        }
    }
}

impl std::error::Error for HarnessError {}

/// Recover the outermost [`HarnessError`] attached to an error, if any
pub fn harness_error(err: &anyhow::Error) -> Option<&HarnessError> {
    err.downcast_ref::<HarnessError>()
}
