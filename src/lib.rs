//! # Stamina State Minimiser
//!
//! This crate reduces incompletely specified finite-state machines to
//! smaller, behaviourally equivalent machines, following the classic
//! compatible-class approach from the UC Berkeley sequential synthesis
//! tools.
//!
//! ## Overview
//!
//! The input is a flow table: states with transitions keyed by ternary input
//! patterns, producing ternary output patterns and a next state that may be
//! unspecified. The reduction pipeline runs five sequential stages:
//!
//! 1. **Compatibility closure** - a three-valued pairwise relation over the
//!    fully-specified states, closed over implied next-state pairs.
//! 2. **Maximal classes** - all inclusion-maximal cliques of mutually
//!    compatible states, with an isomorphism pre-pass that collapses
//!    interchangeable states during the search.
//! 3. **Prime classes** - sub-classes that survive dominance filtering and
//!    can enable cheaper covers than the maximal classes alone.
//! 4. **Binate covering** - selection of a closed set of classes covering
//!    every state, followed by a shrink pass removing redundant members.
//! 5. **Output encoding** - construction of the reduced machine, resolving
//!    ambiguous next states with a configurable overlap heuristic and
//!    merging adjacent product terms.
//!
//! ## Reducing a KISS2 flow table
//!
//! ```
//! use stamina_logic::{KissReader, KissWriter, Machine, Reducible};
//!
//! # fn main() -> std::io::Result<()> {
//! let table = "\
//! .i 1
//! .o 1
//! 0 s0 s1 0
//! 0 s1 s2 1
//! 0 s2 s3 0
//! 0 s3 s0 1
//! ";
//!
//! let machine = Machine::from_kiss_string(table).map_err(std::io::Error::from)?;
//! let reduction = machine.reduce().map_err(std::io::Error::from)?;
//!
//! assert_eq!(reduction.report.original_states, 4);
//! assert_eq!(reduction.report.reduced_states, 2);
//!
//! let text = reduction.to_kiss_string().map_err(std::io::Error::from)?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Building a machine programmatically
//!
//! ```
//! use stamina_logic::{Machine, NextState, Reducible};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut machine = Machine::new(2, 1);
//! let idle = machine.add_state("idle");
//! let busy = machine.add_state("busy");
//!
//! machine.add_transition(idle, "1-", "0", NextState::To(busy)).map_err(std::io::Error::from)?;
//! machine.add_transition(idle, "0-", "0", NextState::To(idle)).map_err(std::io::Error::from)?;
//! machine.add_transition(busy, "--", "1", NextState::To(idle)).map_err(std::io::Error::from)?;
//!
//! let reduction = machine.reduce().map_err(std::io::Error::from)?;
//! assert!(reduction.report.reduced_states <= 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Tuning the pipeline
//!
//! Every stage knob lives in [`StaminaConfig`]: the covering solve mode
//! (greedy or exact branch-and-bound), the isomorphism pre-pass, the output
//! mapping heuristic, the shrink pass, and the maximal-class bound.
//!
//! ```
//! use stamina_logic::{MapHeuristic, Machine, NextState, Reducible, SolveMode, StaminaConfig};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut machine = Machine::new(1, 1);
//! let a = machine.add_state("a");
//! let b = machine.add_state("b");
//! machine.add_transition(a, "0", "1", NextState::To(b)).map_err(std::io::Error::from)?;
//! machine.add_transition(b, "0", "1", NextState::To(a)).map_err(std::io::Error::from)?;
//!
//! let config = StaminaConfig {
//!     solve_mode: SolveMode::Exact,
//!     map_heuristic: MapHeuristic::FirstCandidate,
//!     ..Default::default()
//! };
//! let reduction = machine.reduce_with_config(&config).map_err(std::io::Error::from)?;
//! assert_eq!(reduction.machine.num_states(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Incompletely specified states
//!
//! States with don't-care output bits are exempt from merging: they pass
//! through reduction unchanged, with their next-state references renumbered
//! to point into the reduced machine.

// Public modules
pub mod error;
pub mod kiss;
pub mod machine;
pub mod reduce;
pub mod solver;

// Re-export high-level public API
pub use error::StaminaError;
pub use kiss::{KissError, KissReadError, KissReader, KissWriteError, KissWriter};
pub use machine::{Cube, CubeParseError, Machine, NextState, State, Transition};
pub use reduce::{
    reduce_machine, CompatStatus, CompatibleClass, MapHeuristic, PairTable, Reducible, Reduction,
    ReductionReport, StaminaConfig,
};
pub use solver::{
    CoverMatrix, CoverRow, CoverSolver, ExactSolver, GreedySolver, SolveError, SolveMode,
};
