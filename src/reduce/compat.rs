//! Pairwise state compatibility and its closure
//!
//! For every unordered pair of candidate states this stage decides one of
//! three outcomes: the states can never be merged ([`CompatStatus::Incompatible`]),
//! they can be merged unconditionally ([`CompatStatus::Compatible`]), or they
//! can be merged only if certain other pairs can also be merged
//! ([`CompatStatus::Conditional`], with the obligations recorded as implied
//! pairs). A worklist closure pass then propagates incompatibility through
//! the implied pairs until a fixpoint is reached.
//!
//! The relation is stored in a flat triangular table indexed by a closed-form
//! pair-to-index mapping; no per-pair allocation happens.

use crate::error::StaminaError;
use crate::machine::Machine;
use std::collections::HashMap;
use std::sync::Arc;

/// Three-valued compatibility status of an unordered state pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatStatus {
    /// The pair can never be merged
    Incompatible,
    /// Mergeable only if every implied pair is also mergeable
    Conditional,
    /// Mergeable with no further obligations
    Compatible,
}

impl CompatStatus {
    /// True unless the pair is `Incompatible`
    ///
    /// Conditional pairs count as compatible for clique membership; their
    /// obligations surface later as class closure requirements.
    pub fn is_compatible(&self) -> bool {
        !matches!(self, CompatStatus::Incompatible)
    }

    /// True only for unconditional compatibility
    pub fn is_definite(&self) -> bool {
        matches!(self, CompatStatus::Compatible)
    }
}

#[derive(Debug, Clone)]
struct Cell {
    status: CompatStatus,
    /// Deferred obligations: state-id pairs that must themselves stay
    /// compatible for this pair to remain compatible.
    implied: Vec<(usize, usize)>,
}

/// Triangular table of pairwise compatibility over a set of candidate states
///
/// Built from the machine's fully-specified states (or any explicit candidate
/// set, which keeps the stage independently testable). Status lookups are
/// symmetric by construction: both orders of a pair map to the same cell.
#[derive(Debug, Clone)]
pub struct PairTable {
    ids: Vec<usize>,
    index_of: HashMap<usize, usize>,
    cells: Vec<Cell>,
}

impl PairTable {
    /// Build the compatibility relation for the given candidate states
    ///
    /// Validates each state's own transitions first: two transitions of one
    /// state firing on intersecting inputs must have intersecting outputs and
    /// agreeing concrete next states, otherwise the input specification is
    /// broken and the run aborts.
    pub fn build(machine: &Machine, candidates: &[usize]) -> Result<PairTable, StaminaError> {
        let ids: Vec<usize> = candidates.to_vec();
        let index_of: HashMap<usize, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        for &id in &ids {
            validate_state(machine, id)?;
        }

        let n = ids.len();
        let mut cells = vec![
            Cell {
                status: CompatStatus::Compatible,
                implied: Vec::new(),
            };
            n * n.saturating_sub(1) / 2
        ];

        for j in 1..n {
            for i in 0..j {
                let cell = &mut cells[pair_index(i, j)];
                *cell = test_pair(machine, &index_of, ids[i], ids[j]);
            }
        }

        let mut table = PairTable {
            ids,
            index_of,
            cells,
        };
        table.close();
        Ok(table)
    }

    /// Run the closure worklist to a fixpoint
    ///
    /// Repeatedly scans every conditional pair; a pair whose implied pair has
    /// become incompatible becomes incompatible itself. The scan repeats
    /// until a full pass changes nothing.
    fn close(&mut self) {
        loop {
            let mut changed = false;
            for j in 1..self.ids.len() {
                for i in 0..j {
                    let idx = pair_index(i, j);
                    if self.cells[idx].status != CompatStatus::Conditional {
                        continue;
                    }
                    let failed = self.cells[idx]
                        .implied
                        .iter()
                        .any(|&(a, b)| self.status(a, b) == CompatStatus::Incompatible);
                    if failed {
                        self.cells[idx].status = CompatStatus::Incompatible;
                        self.cells[idx].implied.clear();
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// The candidate state ids this table covers, in build order
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Compatibility status of a state pair
    ///
    /// Symmetric in its arguments. A state paired with itself is
    /// `Compatible`; a state outside the candidate set is `Incompatible`
    /// with everything.
    pub fn status(&self, a: usize, b: usize) -> CompatStatus {
        if a == b {
            return CompatStatus::Compatible;
        }
        match (self.index_of.get(&a), self.index_of.get(&b)) {
            (Some(&i), Some(&j)) => {
                let (i, j) = if i < j { (i, j) } else { (j, i) };
                self.cells[pair_index(i, j)].status
            }
            _ => CompatStatus::Incompatible,
        }
    }

    /// The implied pairs a conditional pair depends on
    pub fn implied(&self, a: usize, b: usize) -> &[(usize, usize)] {
        match (self.index_of.get(&a), self.index_of.get(&b)) {
            (Some(&i), Some(&j)) if i != j => {
                let (i, j) = if i < j { (i, j) } else { (j, i) };
                &self.cells[pair_index(i, j)].implied
            }
            _ => &[],
        }
    }

    /// True if any candidate pair survived closure
    ///
    /// When this is false the machine is already minimal with respect to the
    /// compatibility relation and the rest of the pipeline is skipped.
    pub fn has_compatible_pair(&self) -> bool {
        self.cells.iter().any(|c| c.status.is_compatible())
    }

    /// Number of pairs that survived closure
    pub fn num_compatible_pairs(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.status.is_compatible())
            .count()
    }

    /// Sorted list of candidates compatible with the given state
    ///
    /// Two states with identical neighborhoods are interchangeable for
    /// maximal-class search; the isomorphism pre-pass groups on this.
    pub fn neighborhood(&self, id: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .ids
            .iter()
            .copied()
            .filter(|&other| other != id && self.status(id, other).is_compatible())
            .collect();
        out.sort_unstable();
        out
    }
}

/// Closed-form index of the unordered pair (i, j) with i < j in a flat
/// triangular buffer.
fn pair_index(i: usize, j: usize) -> usize {
    debug_assert!(i < j);
    j * (j - 1) / 2 + i
}

/// Check a single state's transitions for internal conflicts
fn validate_state(machine: &Machine, id: usize) -> Result<(), StaminaError> {
    let state = machine.state(id);
    let transitions = state.transitions();
    for second in 1..transitions.len() {
        for first in 0..second {
            let ta = &transitions[first];
            let tb = &transitions[second];
            if !ta.inputs().intersects(tb.inputs()) {
                continue;
            }
            let outputs_conflict = !ta.outputs().intersects(tb.outputs());
            let next_conflict = match (ta.next().id(), tb.next().id()) {
                (Some(x), Some(y)) => x != y,
                _ => false,
            };
            if outputs_conflict || next_conflict {
                return Err(StaminaError::ConflictingTransitions {
                    state: Arc::clone(state.name()),
                    first,
                    second,
                });
            }
        }
    }
    Ok(())
}

/// Test one state pair, producing its initial status and implied pairs
fn test_pair(machine: &Machine, index_of: &HashMap<usize, usize>, a: usize, b: usize) -> Cell {
    let mut implied: Vec<(usize, usize)> = Vec::new();

    for ta in machine.state(a).transitions() {
        for tb in machine.state(b).transitions() {
            if !ta.inputs().intersects(tb.inputs()) {
                continue;
            }
            // A single output conflict decides the pair.
            if !ta.outputs().intersects(tb.outputs()) {
                return Cell {
                    status: CompatStatus::Incompatible,
                    implied: Vec::new(),
                };
            }
            let (na, nb) = match (ta.next().id(), tb.next().id()) {
                (Some(x), Some(y)) => (x, y),
                // A don't-care next state follows whatever the partner does.
                _ => continue,
            };
            if na == nb {
                continue;
            }
            // Merging forces the two next states to merge too. If either is
            // outside the candidate set it can never be merged.
            if !index_of.contains_key(&na) || !index_of.contains_key(&nb) {
                return Cell {
                    status: CompatStatus::Incompatible,
                    implied: Vec::new(),
                };
            }
            let pair = if na < nb { (na, nb) } else { (nb, na) };
            // The parent pair implying itself imposes nothing.
            let parent = if a < b { (a, b) } else { (b, a) };
            if pair != parent && !implied.contains(&pair) {
                implied.push(pair);
            }
        }
    }

    let status = if implied.is_empty() {
        CompatStatus::Compatible
    } else {
        CompatStatus::Conditional
    };
    Cell { status, implied }
}
