//! Closed-cover selection over the prime classes
//!
//! The prime classes become columns of a covering matrix. Every candidate
//! state contributes a unate row over the primes containing it, and every
//! implied set of every prime contributes a binate row: selecting that prime
//! activates the row, which only the primes containing the whole implied set
//! can satisfy. A solution is therefore a closed cover by construction.
//!
//! The solver's answer is still verified here before use. Singleton primes
//! guarantee the trivial cover exists, so an infeasibility report or a
//! closure gap in the returned selection indicates a formulation bug and
//! aborts the run instead of producing a wrong machine.
//!
//! An optional shrink pass afterwards removes redundant members from the
//! chosen classes (states already covered elsewhere) whenever the removal
//! keeps the cover closed, then drops classes that became subsets of others.

use super::maximal::CompatibleClass;
use crate::error::StaminaError;
use crate::machine::Machine;
use crate::solver::{CoverMatrix, SolveError, SolveMode};

/// Select a minimal closed cover from the prime classes
pub fn solve_cover(
    machine: &Machine,
    candidates: &[usize],
    primes: &[CompatibleClass],
    mode: SolveMode,
    shrink: bool,
) -> Result<Vec<CompatibleClass>, StaminaError> {
    let matrix = build_matrix(machine, candidates, primes);
    let solver = mode.solver();
    let chosen_columns = solver
        .solve(&matrix, None)
        .map_err(|SolveError::Infeasible { unsatisfied }| StaminaError::CoverInfeasible {
            unsatisfied,
        })?;

    let mut chosen: Vec<CompatibleClass> = chosen_columns
        .into_iter()
        .map(|c| primes[c].clone())
        .collect();

    verify_cover(candidates, &chosen)?;

    if shrink {
        chosen = shrink_classes(machine, candidates, chosen);
        verify_cover(candidates, &chosen)?;
    }

    Ok(chosen)
}

/// Build the covering matrix: unate coverage rows plus binate closure rows
fn build_matrix(machine: &Machine, candidates: &[usize], primes: &[CompatibleClass]) -> CoverMatrix {
    let mut matrix = CoverMatrix::new(primes.len());

    for &id in candidates {
        let present: Vec<usize> = primes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.contains(id))
            .map(|(i, _)| i)
            .collect();
        matrix.add_row(&format!("state {}", machine.state(id).name()), present);
    }

    for (i, prime) in primes.iter().enumerate() {
        for set in &prime.class_set {
            let companions: Vec<usize> = primes
                .iter()
                .enumerate()
                .filter(|(_, p)| p.contains_all(set))
                .map(|(j, _)| j)
                .collect();
            matrix.add_binate_row(&format!("closure of prime {}", i), i, companions);
        }
    }

    matrix
}

/// Check coverage and closure of a chosen selection
fn verify_cover(candidates: &[usize], chosen: &[CompatibleClass]) -> Result<(), StaminaError> {
    let uncovered: Vec<String> = candidates
        .iter()
        .filter(|&&id| !chosen.iter().any(|c| c.contains(id)))
        .map(|id| format!("state {}", id))
        .collect();
    if !uncovered.is_empty() {
        return Err(StaminaError::CoverInfeasible {
            unsatisfied: uncovered,
        });
    }

    for class in chosen {
        for set in &class.class_set {
            if !chosen.iter().any(|c| c.contains_all(set)) {
                return Err(StaminaError::ClosureViolation {
                    class: class.states.clone(),
                    implied: set.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Remove redundant members from the chosen classes
///
/// A member can leave a class when another chosen class still covers it and
/// the cover stays closed after the class's implied sets are recomputed.
/// Runs to a fixpoint, then discards classes whose members became a subset
/// of another chosen class.
fn shrink_classes(
    machine: &Machine,
    candidates: &[usize],
    mut chosen: Vec<CompatibleClass>,
) -> Vec<CompatibleClass> {
    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..chosen.len() {
            let members = chosen[i].states.clone();
            for &member in &members {
                if chosen[i].len() < 2 {
                    break;
                }
                let elsewhere = chosen
                    .iter()
                    .enumerate()
                    .any(|(j, c)| j != i && c.contains(member));
                if !elsewhere {
                    continue;
                }
                let reduced: Vec<usize> = chosen[i]
                    .states
                    .iter()
                    .copied()
                    .filter(|&id| id != member)
                    .collect();
                let mut trial = chosen.clone();
                trial[i] = CompatibleClass::new(machine, reduced);
                if verify_cover(candidates, &trial).is_ok() {
                    chosen = trial;
                    changed = true;
                }
            }
        }
    }

    let snapshot = chosen.clone();
    chosen.retain(|class| {
        !snapshot
            .iter()
            .any(|other| other.len() > class.len() && class.is_subset_of(other))
    });
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::NextState;
    use crate::reduce::compat::PairTable;
    use crate::reduce::maximal::generate_maximals;
    use crate::reduce::prime::generate_primes;

    fn pipeline_to_primes(m: &Machine) -> (Vec<usize>, Vec<CompatibleClass>) {
        let ids = m.fully_specified_states();
        let table = PairTable::build(m, &ids).unwrap();
        let maximals = generate_maximals(m, &table, true, None);
        let primes = generate_primes(m, &ids, &maximals.classes);
        (ids, primes)
    }

    #[test]
    fn test_two_classes_cover_four_states() {
        let mut m = Machine::new(1, 1);
        let s0 = m.add_state("s0");
        let s1 = m.add_state("s1");
        let s2 = m.add_state("s2");
        let s3 = m.add_state("s3");
        m.add_transition(s0, "0", "0", NextState::To(s1)).unwrap();
        m.add_transition(s1, "0", "1", NextState::To(s2)).unwrap();
        m.add_transition(s2, "0", "0", NextState::To(s3)).unwrap();
        m.add_transition(s3, "0", "1", NextState::To(s0)).unwrap();

        let (ids, primes) = pipeline_to_primes(&m);
        for mode in [SolveMode::Heuristic, SolveMode::Exact] {
            let chosen = solve_cover(&m, &ids, &primes, mode, true).unwrap();
            assert_eq!(chosen.len(), 2);
            for &id in &ids {
                assert!(chosen.iter().any(|c| c.contains(id)));
            }
        }
    }

    #[test]
    fn test_closure_pulls_in_companion_class() {
        // Merging {a,b} forces their successors {c,d} into one class too.
        let mut m = Machine::new(1, 1);
        let a = m.add_state("a");
        let b = m.add_state("b");
        let c = m.add_state("c");
        let d = m.add_state("d");
        m.add_transition(a, "0", "1", NextState::To(c)).unwrap();
        m.add_transition(b, "0", "1", NextState::To(d)).unwrap();
        m.add_transition(a, "1", "0", NextState::To(a)).unwrap();
        m.add_transition(b, "1", "0", NextState::To(b)).unwrap();
        m.add_transition(c, "0", "1", NextState::To(c)).unwrap();
        m.add_transition(d, "0", "1", NextState::To(d)).unwrap();
        m.add_transition(c, "1", "1", NextState::To(a)).unwrap();
        m.add_transition(d, "1", "1", NextState::To(b)).unwrap();

        let (ids, primes) = pipeline_to_primes(&m);
        let chosen = solve_cover(&m, &ids, &primes, SolveMode::Exact, false).unwrap();

        // Every chosen class with an implied set has a companion covering it.
        for class in &chosen {
            for set in &class.class_set {
                assert!(chosen.iter().any(|k| k.contains_all(set)));
            }
        }
        // The cover is smaller than the original state count.
        assert!(chosen.len() < ids.len());
    }

    #[test]
    fn test_shrink_removes_overlap_members() {
        // Two overlapping classes; the shared state only needs to live in one.
        let mut m = Machine::new(2, 1);
        let a = m.add_state("a");
        let b = m.add_state("b");
        let c = m.add_state("c");
        m.add_transition(a, "0-", "1", NextState::DontCare).unwrap();
        m.add_transition(b, "0-", "1", NextState::DontCare).unwrap();
        m.add_transition(c, "0-", "1", NextState::DontCare).unwrap();
        // a and c conflict; b is compatible with both.
        m.add_transition(a, "10", "0", NextState::DontCare).unwrap();
        m.add_transition(c, "10", "1", NextState::DontCare).unwrap();

        let chosen = vec![
            CompatibleClass::new(&m, vec![a, b]),
            CompatibleClass::new(&m, vec![b, c]),
        ];
        let shrunk = shrink_classes(&m, &[a, b, c], chosen);
        let total: usize = shrunk.iter().map(|c| c.len()).sum();
        assert_eq!(total, 3, "shared member kept in exactly one class");
    }

    #[test]
    fn test_incompatible_states_keep_singletons() {
        let mut m = Machine::new(1, 1);
        let a = m.add_state("a");
        let b = m.add_state("b");
        m.add_transition(a, "0", "0", NextState::To(a)).unwrap();
        m.add_transition(b, "0", "1", NextState::To(b)).unwrap();

        let (ids, primes) = pipeline_to_primes(&m);
        let chosen = solve_cover(&m, &ids, &primes, SolveMode::Heuristic, true).unwrap();
        assert_eq!(chosen.len(), 2);
    }

    #[test]
    fn test_empty_candidate_list() {
        let m = Machine::new(1, 1);
        let chosen = solve_cover(&m, &[], &[], SolveMode::Heuristic, true).unwrap();
        assert!(chosen.is_empty());
    }
}
