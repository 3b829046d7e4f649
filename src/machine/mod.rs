//! In-memory flow-table model
//!
//! This module provides the state/transition model the reduction pipeline
//! operates on: a [`Machine`] holds a list of [`State`]s, each with outgoing
//! [`Transition`]s keyed by ternary input patterns and producing ternary
//! output patterns plus a [`NextState`] reference.
//!
//! Dimensions are fixed per machine: every transition's input cube has the
//! primary-input width and every output cube the primary-output width.
//!
//! # Examples
//!
//! ```
//! use stamina_logic::{Machine, NextState};
//!
//! let mut machine = Machine::new(1, 1);
//! let s0 = machine.add_state("s0");
//! let s1 = machine.add_state("s1");
//!
//! machine
//!     .add_transition(s0, "0", "1", NextState::To(s1))
//!     .unwrap();
//! machine
//!     .add_transition(s0, "1", "0", NextState::DontCare)
//!     .unwrap();
//!
//! assert_eq!(machine.num_states(), 2);
//! assert!(machine.state(s0).is_fully_specified());
//! ```

mod cube;

pub use cube::{Cube, CubeParseError};

use crate::error::StaminaError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Next-state reference of a transition
///
/// Either a concrete state id or a don't-care marker (the transition's
/// destination is unconstrained and may be assigned freely).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    /// Concrete next state, by id
    To(usize),
    /// Unspecified next state (written `*` in flow-table text)
    DontCare,
}

impl NextState {
    /// The concrete state id, if any
    pub fn id(&self) -> Option<usize> {
        match self {
            NextState::To(id) => Some(*id),
            NextState::DontCare => None,
        }
    }

    /// True if the next state is unconstrained
    pub fn is_dont_care(&self) -> bool {
        matches!(self, NextState::DontCare)
    }
}

/// A single flow-table row: input pattern, output pattern, next state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub(crate) inputs: Cube,
    pub(crate) outputs: Cube,
    pub(crate) next: NextState,
}

impl Transition {
    /// The ternary input pattern this transition fires on
    pub fn inputs(&self) -> &Cube {
        &self.inputs
    }

    /// The ternary output pattern this transition produces
    pub fn outputs(&self) -> &Cube {
        &self.outputs
    }

    /// The next-state reference
    pub fn next(&self) -> NextState {
        self.next
    }
}

/// A state of the machine
///
/// The `fully_specified` flag is established when transitions are added: a
/// state stays fully specified as long as every output bit of every
/// transition is concrete. States that are not fully specified are exempt
/// from compatibility merging and pass through reduction unchanged.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) name: Arc<str>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) fully_specified: bool,
}

impl State {
    /// The state's name
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The state's outgoing transitions, in insertion order
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Whether every output bit of every transition is concrete
    pub fn is_fully_specified(&self) -> bool {
        self.fully_specified
    }
}

/// A flow table: states, transitions, and fixed input/output widths
#[derive(Clone)]
pub struct Machine {
    num_inputs: usize,
    num_outputs: usize,
    states: Vec<State>,
    name_map: HashMap<Arc<str>, usize>,
    reset: Option<usize>,
}

impl Machine {
    /// Create an empty machine with the given primary input/output widths
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Machine {
            num_inputs,
            num_outputs,
            states: Vec::new(),
            name_map: HashMap::new(),
            reset: None,
        }
    }

    /// Primary input count (input cube width)
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Primary output count (output cube width)
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Number of states
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// All states, indexed by id
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The state with the given id
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn state(&self, id: usize) -> &State {
        &self.states[id]
    }

    /// Find a state id by name
    pub fn find_state(&self, name: &str) -> Option<usize> {
        self.name_map.get(name).copied()
    }

    /// The designated reset state, if one was declared
    pub fn reset_state(&self) -> Option<usize> {
        self.reset
    }

    /// Declare the reset state
    pub fn set_reset_state(&mut self, id: usize) {
        self.reset = Some(id);
    }

    /// Add a state, or return the id of an existing state with the same name
    pub fn add_state(&mut self, name: &str) -> usize {
        if let Some(&id) = self.name_map.get(name) {
            return id;
        }
        let name: Arc<str> = Arc::from(name);
        let id = self.states.len();
        self.states.push(State {
            name: Arc::clone(&name),
            transitions: Vec::new(),
            fully_specified: true,
        });
        self.name_map.insert(name, id);
        id
    }

    /// Add a transition to a state
    ///
    /// Input and output patterns are given as cube text (`0`/`1`/`-`). The
    /// widths must match the machine's declared dimensions. Adding a
    /// transition with a don't-care output bit marks the source state as not
    /// fully specified.
    ///
    /// # Examples
    ///
    /// ```
    /// use stamina_logic::{Machine, NextState};
    ///
    /// let mut machine = Machine::new(2, 1);
    /// let s0 = machine.add_state("s0");
    /// machine.add_transition(s0, "0-", "1", NextState::To(s0)).unwrap();
    /// ```
    pub fn add_transition(
        &mut self,
        state: usize,
        inputs: &str,
        outputs: &str,
        next: NextState,
    ) -> Result<(), StaminaError> {
        let inputs: Cube = inputs
            .parse()
            .map_err(|e: CubeParseError| StaminaError::InvalidCube {
                state: Arc::clone(&self.states[state].name),
                message: e.to_string(),
            })?;
        let outputs: Cube = outputs
            .parse()
            .map_err(|e: CubeParseError| StaminaError::InvalidCube {
                state: Arc::clone(&self.states[state].name),
                message: e.to_string(),
            })?;
        self.add_transition_cubes(state, inputs, outputs, next)
    }

    /// Add a transition with pre-built cubes
    pub fn add_transition_cubes(
        &mut self,
        state: usize,
        inputs: Cube,
        outputs: Cube,
        next: NextState,
    ) -> Result<(), StaminaError> {
        if inputs.len() != self.num_inputs || outputs.len() != self.num_outputs {
            return Err(StaminaError::DimensionMismatch {
                state: Arc::clone(&self.states[state].name),
                expected_inputs: self.num_inputs,
                expected_outputs: self.num_outputs,
                actual_inputs: inputs.len(),
                actual_outputs: outputs.len(),
            });
        }
        let entry = &mut self.states[state];
        if outputs.literal_count() != outputs.len() {
            entry.fully_specified = false;
        }
        entry.transitions.push(Transition {
            inputs,
            outputs,
            next,
        });
        Ok(())
    }

    /// Ids of the fully-specified states, in id order
    pub fn fully_specified_states(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.fully_specified)
            .map(|(id, _)| id)
            .collect()
    }

    /// Total transition count across all states
    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Machine({} inputs, {} outputs, {} states, {} transitions)",
            self.num_inputs,
            self.num_outputs,
            self.num_states(),
            self.num_transitions()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_state_deduplicates_by_name() {
        let mut machine = Machine::new(1, 1);
        let a = machine.add_state("s0");
        let b = machine.add_state("s0");
        assert_eq!(a, b);
        assert_eq!(machine.num_states(), 1);
        assert_eq!(machine.find_state("s0"), Some(a));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut machine = Machine::new(2, 1);
        let s0 = machine.add_state("s0");
        let err = machine
            .add_transition(s0, "0", "1", NextState::DontCare)
            .unwrap_err();
        assert!(matches!(err, StaminaError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_output_dont_care_clears_fully_specified() {
        let mut machine = Machine::new(1, 2);
        let s0 = machine.add_state("s0");
        let s1 = machine.add_state("s1");
        machine
            .add_transition(s0, "0", "11", NextState::To(s1))
            .unwrap();
        machine
            .add_transition(s1, "0", "1-", NextState::To(s0))
            .unwrap();
        assert!(machine.state(s0).is_fully_specified());
        assert!(!machine.state(s1).is_fully_specified());
        assert_eq!(machine.fully_specified_states(), vec![s0]);
    }
}
