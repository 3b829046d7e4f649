//! The state-reduction pipeline
//!
//! Stages run strictly in sequence, each consuming the previous stage's
//! output: pairwise compatibility with closure ([`compat`]), maximal
//! compatible classes ([`maximal`]), prime classes ([`prime`]), binate cover
//! selection with the shrink pass ([`covering`]), and output encoding into
//! the reduced machine ([`mapping`]). [`reduce_machine`] drives all five;
//! the [`Reducible`] trait puts that behind a method on [`Machine`].
//!
//! When no compatible pair exists at all, the machine is already minimal
//! with respect to the compatibility relation and the remaining stages are
//! skipped.
//!
//! # Examples
//!
//! ```
//! use stamina_logic::{Machine, NextState, Reducible};
//!
//! let mut machine = Machine::new(1, 1);
//! let s0 = machine.add_state("s0");
//! let s1 = machine.add_state("s1");
//! let s2 = machine.add_state("s2");
//! let s3 = machine.add_state("s3");
//! machine.add_transition(s0, "0", "0", NextState::To(s1)).unwrap();
//! machine.add_transition(s1, "0", "1", NextState::To(s2)).unwrap();
//! machine.add_transition(s2, "0", "0", NextState::To(s3)).unwrap();
//! machine.add_transition(s3, "0", "1", NextState::To(s0)).unwrap();
//!
//! let reduction = machine.reduce().unwrap();
//! assert_eq!(reduction.machine.num_states(), 2);
//! assert_eq!(reduction.report.original_states, 4);
//! ```

pub mod compat;
pub mod covering;
pub mod mapping;
pub mod maximal;
pub mod prime;

pub use compat::{CompatStatus, PairTable};
pub use covering::solve_cover;
pub use mapping::{map_outputs, MapHeuristic};
pub use maximal::{generate_maximals, CompatibleClass, MaximalResult};
pub use prime::generate_primes;

use crate::error::StaminaError;
use crate::machine::Machine;
use crate::solver::SolveMode;

/// Tunable parameters of the reduction pipeline
///
/// # Examples
///
/// ```
/// use stamina_logic::{MapHeuristic, SolveMode, StaminaConfig};
///
/// let config = StaminaConfig {
///     solve_mode: SolveMode::Exact,
///     ..Default::default()
/// };
/// assert_eq!(config.map_heuristic, MapHeuristic::RowColumnProduct);
/// assert!(config.shrink_pass);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaminaConfig {
    /// How the binate covering instance is solved
    pub solve_mode: SolveMode,
    /// Whether the isomorphism pre-pass runs before maximal-class search
    pub isomorphism_reduction: bool,
    /// Strategy for ambiguous next-state choices during output encoding
    pub map_heuristic: MapHeuristic,
    /// Whether the post-cover shrink pass runs
    pub shrink_pass: bool,
    /// Cap on the maximal-class working list; `None` means unbounded
    ///
    /// Exceeding the cap stops enumeration early and is reported through
    /// [`ReductionReport::bound_reached`]; the result stays correct but may
    /// not be minimal.
    pub max_classes: Option<usize>,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        StaminaConfig {
            solve_mode: SolveMode::Heuristic,
            isomorphism_reduction: true,
            map_heuristic: MapHeuristic::RowColumnProduct,
            shrink_pass: true,
            max_classes: None,
        }
    }
}

/// Statistics gathered over one reduction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReductionReport {
    /// States in the input machine
    pub original_states: usize,
    /// States in the reduced machine (merged classes plus pass-throughs)
    pub reduced_states: usize,
    /// Input states that bypassed reduction as not fully specified
    pub passthrough_states: usize,
    /// State pairs that survived the compatibility closure
    pub compatible_pairs: usize,
    /// Maximal compatible classes found
    pub maximal_classes: usize,
    /// Prime classes after dominance filtering
    pub prime_classes: usize,
    /// Classes selected by the cover
    pub chosen_classes: usize,
    /// True when the maximal-class bound stopped enumeration early
    pub bound_reached: bool,
}

/// The outcome of a reduction run: the new machine plus its statistics
#[derive(Debug, Clone)]
pub struct Reduction {
    /// The reduced, fully-resolved machine
    pub machine: Machine,
    /// Statistics of the run
    pub report: ReductionReport,
}

/// Run the full reduction pipeline over a machine
pub fn reduce_machine(
    machine: &Machine,
    config: &StaminaConfig,
) -> Result<Reduction, StaminaError> {
    let candidates = machine.fully_specified_states();
    let passthrough_states = machine.num_states() - candidates.len();

    // Building the table also validates every candidate's own transitions,
    // so malformed input aborts before any reduction work.
    let table = PairTable::build(machine, &candidates)?;

    if !table.has_compatible_pair() {
        return Ok(Reduction {
            machine: machine.clone(),
            report: ReductionReport {
                original_states: machine.num_states(),
                reduced_states: machine.num_states(),
                passthrough_states,
                ..Default::default()
            },
        });
    }
    let compatible_pairs = table.num_compatible_pairs();

    let maximals = generate_maximals(
        machine,
        &table,
        config.isomorphism_reduction,
        config.max_classes,
    );
    let primes = generate_primes(machine, &candidates, &maximals.classes);
    let chosen = solve_cover(
        machine,
        &candidates,
        &primes,
        config.solve_mode,
        config.shrink_pass,
    )?;
    let reduced = map_outputs(machine, &chosen, config.map_heuristic)?;

    let report = ReductionReport {
        original_states: machine.num_states(),
        reduced_states: reduced.num_states(),
        passthrough_states,
        compatible_pairs,
        maximal_classes: maximals.classes.len(),
        prime_classes: primes.len(),
        chosen_classes: chosen.len(),
        bound_reached: maximals.bound_reached,
    };
    Ok(Reduction {
        machine: reduced,
        report,
    })
}

/// Types that can be put through the reduction pipeline
pub trait Reducible {
    /// Reduce with an explicit configuration
    fn reduce_with_config(&self, config: &StaminaConfig) -> Result<Reduction, StaminaError>;

    /// Reduce with the default configuration
    fn reduce(&self) -> Result<Reduction, StaminaError> {
        self.reduce_with_config(&StaminaConfig::default())
    }
}

impl Reducible for Machine {
    fn reduce_with_config(&self, config: &StaminaConfig) -> Result<Reduction, StaminaError> {
        reduce_machine(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::NextState;

    #[test]
    fn test_incompatible_machine_passes_through() {
        let mut m = Machine::new(1, 2);
        let a = m.add_state("a");
        let b = m.add_state("b");
        m.add_transition(a, "0", "01", NextState::To(a)).unwrap();
        m.add_transition(b, "0", "10", NextState::To(b)).unwrap();

        let reduction = m.reduce().unwrap();
        assert_eq!(reduction.report.original_states, 2);
        assert_eq!(reduction.report.reduced_states, 2);
        assert_eq!(reduction.report.maximal_classes, 0);
        // Untouched: same names in the same order.
        assert_eq!(reduction.machine.state(0).name().as_ref(), "a");
        assert_eq!(reduction.machine.state(1).name().as_ref(), "b");
    }

    #[test]
    fn test_malformed_input_aborts_early() {
        let mut m = Machine::new(1, 1);
        let a = m.add_state("a");
        m.add_transition(a, "-", "0", NextState::To(a)).unwrap();
        m.add_transition(a, "1", "1", NextState::To(a)).unwrap();

        let err = m.reduce().unwrap_err();
        assert!(matches!(err, StaminaError::ConflictingTransitions { .. }));
    }

    #[test]
    fn test_report_counts_are_monotonic() {
        let mut m = Machine::new(1, 1);
        let s0 = m.add_state("s0");
        let s1 = m.add_state("s1");
        let s2 = m.add_state("s2");
        let s3 = m.add_state("s3");
        m.add_transition(s0, "0", "0", NextState::To(s1)).unwrap();
        m.add_transition(s1, "0", "1", NextState::To(s2)).unwrap();
        m.add_transition(s2, "0", "0", NextState::To(s3)).unwrap();
        m.add_transition(s3, "0", "1", NextState::To(s0)).unwrap();

        let reduction = m.reduce().unwrap();
        let report = &reduction.report;
        assert!(report.reduced_states <= report.maximal_classes + report.passthrough_states);
        assert!(report.maximal_classes <= report.original_states);
        assert_eq!(report.compatible_pairs, 2);
        assert_eq!(report.reduced_states, 2);
        assert!(!report.bound_reached);
    }

    #[test]
    fn test_exact_and_heuristic_agree_on_small_machine() {
        let mut m = Machine::new(1, 1);
        let s0 = m.add_state("s0");
        let s1 = m.add_state("s1");
        let s2 = m.add_state("s2");
        let s3 = m.add_state("s3");
        m.add_transition(s0, "0", "0", NextState::To(s1)).unwrap();
        m.add_transition(s1, "0", "1", NextState::To(s2)).unwrap();
        m.add_transition(s2, "0", "0", NextState::To(s3)).unwrap();
        m.add_transition(s3, "0", "1", NextState::To(s0)).unwrap();

        let heuristic = m.reduce().unwrap();
        let exact = m
            .reduce_with_config(&StaminaConfig {
                solve_mode: SolveMode::Exact,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            heuristic.machine.num_states(),
            exact.machine.num_states()
        );
    }
}
