//! Error types for the state minimiser
//!
//! This module provides the central [`StaminaError`] enum. Variants are
//! programmatically distinguishable and carry enough context to diagnose the
//! failure without re-running the pipeline.

use std::fmt;
use std::io;
use std::sync::Arc;

/// The main error type for the state minimiser
///
/// Input-validation failures (`InvalidCube`, `DimensionMismatch`,
/// `ConflictingTransitions`) abort before any reduction work begins.
/// `CoverInfeasible` and `ClosureViolation` are internal-consistency
/// failures: by construction a feasible, closed cover always exists, so
/// either indicates a formulation bug and the run aborts rather than emitting
/// an incorrect machine.
#[derive(Debug)]
pub enum StaminaError {
    /// A cube string could not be parsed
    InvalidCube {
        /// Name of the state whose transition carried the cube
        state: Arc<str>,
        /// Parse failure detail
        message: String,
    },

    /// A transition's cube widths don't match the machine's dimensions
    DimensionMismatch {
        /// Name of the state the transition was added to
        state: Arc<str>,
        /// Declared primary input count
        expected_inputs: usize,
        /// Declared primary output count
        expected_outputs: usize,
        /// Input cube width supplied
        actual_inputs: usize,
        /// Output cube width supplied
        actual_outputs: usize,
    },

    /// A state's own transitions conflict under overlapping inputs
    ///
    /// Two transitions of the same state fire on intersecting input patterns
    /// but disagree on outputs or concrete next states. This is a fatal input
    /// specification error, detected before any reduction work.
    ConflictingTransitions {
        /// Name of the offending state
        state: Arc<str>,
        /// Index of the first transition involved
        first: usize,
        /// Index of the second transition involved
        second: usize,
    },

    /// The covering solver reported infeasibility
    ///
    /// Never expected: the trivial cover (every state as its own singleton
    /// prime) is always feasible. Carries descriptions of the rows left
    /// unsatisfied.
    CoverInfeasible {
        /// Human-readable descriptions of the unsatisfied rows
        unsatisfied: Vec<String>,
    },

    /// Post-cover closure verification failed
    ///
    /// A chosen class's implied set is not contained in any chosen class.
    /// Never expected in a correct formulation.
    ClosureViolation {
        /// State ids of the chosen class whose closure is broken
        class: Vec<usize>,
        /// The implied set with no covering class
        implied: Vec<usize>,
    },

    /// IO error wrapper
    Io(io::Error),
}

impl fmt::Display for StaminaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaminaError::InvalidCube { state, message } => {
                write!(
                    f,
                    "Invalid cube in transition of state '{}': {}",
                    state, message
                )
            }
            StaminaError::DimensionMismatch {
                state,
                expected_inputs,
                expected_outputs,
                actual_inputs,
                actual_outputs,
            } => write!(
                f,
                "Transition of state '{}' has dimensions (inputs: {}, outputs: {}) but the \
                 machine declares (inputs: {}, outputs: {})",
                state, actual_inputs, actual_outputs, expected_inputs, expected_outputs
            ),
            StaminaError::ConflictingTransitions {
                state,
                first,
                second,
            } => write!(
                f,
                "State '{}' has conflicting transitions {} and {}: overlapping input patterns \
                 with incompatible outputs or next states",
                state, first, second
            ),
            StaminaError::CoverInfeasible { unsatisfied } => write!(
                f,
                "Covering solver reported infeasibility; unsatisfied rows: {}",
                unsatisfied.join(", ")
            ),
            StaminaError::ClosureViolation { class, implied } => write!(
                f,
                "Closure verification failed: class {:?} implies set {:?}, which no chosen \
                 class contains",
                class, implied
            ),
            StaminaError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StaminaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StaminaError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StaminaError {
    fn from(err: io::Error) -> Self {
        StaminaError::Io(err)
    }
}

impl From<StaminaError> for io::Error {
    fn from(err: StaminaError) -> Self {
        match err {
            StaminaError::Io(io_err) => io_err,
            other => io::Error::other(other),
        }
    }
}
