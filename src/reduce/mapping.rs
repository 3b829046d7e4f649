//! Output encoding: from chosen classes to a concrete reduced machine
//!
//! Each chosen class becomes one merged state. Its transitions are rebuilt
//! probe by probe: every distinct input cube among member transitions forms
//! one row whose output is the intersection of the member outputs and whose
//! next state is the chosen class covering the members' successors. When
//! several chosen classes cover the successors the row is ambiguous, and a
//! configurable heuristic scores the candidates by literal overlap with rows
//! already routed to them: a row weight (overlap with same-source rows) and
//! a column weight (overlap with all rows targeting the candidate).
//!
//! States that were not fully specified bypass reduction entirely; they are
//! appended after the merged states with their next-state references
//! renumbered. A final adjacency pass merges row pairs that agree on output
//! and target and differ in exactly one input position.

use super::maximal::CompatibleClass;
use crate::error::StaminaError;
use crate::machine::{Cube, Machine, NextState};
use std::collections::BTreeSet;
use std::collections::HashMap;

/// Strategy for resolving an ambiguous next-state choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapHeuristic {
    /// Always pick the lowest-numbered candidate class
    FirstCandidate,
    /// Maximise overlap with rows of the same source already routed there
    RowWeight,
    /// Maximise overlap with all rows already routed there
    ColumnWeight,
    /// Maximise the product of row and column weight
    #[default]
    RowColumnProduct,
}

/// One rebuilt flow-table row, next state possibly still undecided
struct Row {
    inputs: Cube,
    outputs: Cube,
    next: Option<NextState>,
    candidates: Vec<usize>,
}

/// A row routed to a merged class, kept for weight scoring
struct Routed {
    source: usize,
    inputs: Cube,
    outputs: Cube,
    target: usize,
}

/// Build the reduced machine from the chosen cover
///
/// Merged states come first (one per chosen class, in cover order), followed
/// by the pass-through states in their original order. The reset state, if
/// declared, is remapped to the first class containing it.
pub fn map_outputs(
    machine: &Machine,
    chosen: &[CompatibleClass],
    heuristic: MapHeuristic,
) -> Result<Machine, StaminaError> {
    let passthrough: Vec<usize> = (0..machine.num_states())
        .filter(|&id| !machine.state(id).is_fully_specified())
        .collect();
    let mut passthrough_new: HashMap<usize, usize> = HashMap::new();
    for (offset, &id) in passthrough.iter().enumerate() {
        passthrough_new.insert(id, chosen.len() + offset);
    }

    // Concrete old-state reference to new-state reference.
    let resolve_concrete = |id: usize| -> Result<usize, StaminaError> {
        if let Some(&new_id) = passthrough_new.get(&id) {
            return Ok(new_id);
        }
        chosen
            .iter()
            .position(|c| c.contains(id))
            .ok_or_else(|| StaminaError::ClosureViolation {
                class: Vec::new(),
                implied: vec![id],
            })
    };

    let mut rows: Vec<Vec<Row>> = Vec::new();
    let mut routed: Vec<Routed> = Vec::new();

    for (class_index, class) in chosen.iter().enumerate() {
        let mut class_rows = Vec::new();
        for probe in probes_of(machine, &class.states) {
            let mut outputs: Option<Cube> = None;
            let mut succ: BTreeSet<usize> = BTreeSet::new();
            for &id in &class.states {
                for t in machine.state(id).transitions() {
                    if !t.inputs().intersects(&probe) {
                        continue;
                    }
                    outputs = Some(match outputs {
                        None => t.outputs().clone(),
                        Some(acc) => acc.intersection(t.outputs()).ok_or_else(|| {
                            StaminaError::ClosureViolation {
                                class: class.states.clone(),
                                implied: succ.iter().copied().collect(),
                            }
                        })?,
                    });
                    if let Some(next) = t.next().id() {
                        succ.insert(next);
                    }
                }
            }
            let outputs = match outputs {
                Some(outputs) => outputs,
                None => continue,
            };
            let succ: Vec<usize> = succ.into_iter().collect();

            // A lone pass-through successor resolves directly; anything else
            // resolves through the chosen classes.
            if let [single] = succ[..] {
                if let Some(&new_id) = passthrough_new.get(&single) {
                    class_rows.push(Row {
                        inputs: probe,
                        outputs,
                        next: Some(NextState::To(new_id)),
                        candidates: Vec::new(),
                    });
                    continue;
                }
            }

            let candidates: Vec<usize> = if succ.is_empty() {
                (0..chosen.len()).collect()
            } else {
                chosen
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.contains_all(&succ))
                    .map(|(i, _)| i)
                    .collect()
            };
            match candidates[..] {
                [] => {
                    return Err(StaminaError::ClosureViolation {
                        class: class.states.clone(),
                        implied: succ,
                    })
                }
                [only] => {
                    routed.push(Routed {
                        source: class_index,
                        inputs: probe.clone(),
                        outputs: outputs.clone(),
                        target: only,
                    });
                    class_rows.push(Row {
                        inputs: probe,
                        outputs,
                        next: Some(NextState::To(only)),
                        candidates: Vec::new(),
                    });
                }
                _ => class_rows.push(Row {
                    inputs: probe,
                    outputs,
                    next: None,
                    candidates,
                }),
            }
        }
        rows.push(class_rows);
    }

    // Resolve the ambiguous rows in deterministic order, feeding each choice
    // back into the weights for the next.
    for source in 0..rows.len() {
        for row_index in 0..rows[source].len() {
            if rows[source][row_index].next.is_some() {
                continue;
            }
            let choice = {
                let row = &rows[source][row_index];
                pick_candidate(row, source, &routed, heuristic)
            };
            let row = &mut rows[source][row_index];
            row.next = Some(NextState::To(choice));
            routed.push(Routed {
                source,
                inputs: row.inputs.clone(),
                outputs: row.outputs.clone(),
                target: choice,
            });
        }
    }

    let mut reduced = Machine::new(machine.num_inputs(), machine.num_outputs());
    for class in chosen {
        let name = class
            .states
            .iter()
            .map(|&id| machine.state(id).name().as_ref())
            .collect::<Vec<_>>()
            .join("+");
        reduced.add_state(&name);
    }
    for &id in &passthrough {
        reduced.add_state(machine.state(id).name());
    }

    for (source, mut class_rows) in rows.into_iter().enumerate() {
        merge_adjacent(&mut class_rows);
        for row in class_rows {
            let next = match row.next {
                Some(next) => next,
                None => NextState::DontCare,
            };
            reduced.add_transition_cubes(source, row.inputs, row.outputs, next)?;
        }
    }

    for &id in &passthrough {
        let new_id = passthrough_new[&id];
        let mut pass_rows = Vec::new();
        for t in machine.state(id).transitions() {
            let next = match t.next().id() {
                Some(target) => NextState::To(resolve_concrete(target)?),
                None => NextState::DontCare,
            };
            pass_rows.push(Row {
                inputs: t.inputs().clone(),
                outputs: t.outputs().clone(),
                next: Some(next),
                candidates: Vec::new(),
            });
        }
        merge_adjacent(&mut pass_rows);
        for row in pass_rows {
            let next = match row.next {
                Some(next) => next,
                None => NextState::DontCare,
            };
            reduced.add_transition_cubes(new_id, row.inputs, row.outputs, next)?;
        }
    }

    if let Some(reset) = machine.reset_state() {
        reduced.set_reset_state(resolve_concrete(reset)?);
    }

    Ok(reduced)
}

/// Distinct input cubes among the members' transitions, in member order
fn probes_of(machine: &Machine, states: &[usize]) -> Vec<Cube> {
    let mut probes = Vec::new();
    for &id in states {
        for t in machine.state(id).transitions() {
            if !probes.contains(t.inputs()) {
                probes.push(t.inputs().clone());
            }
        }
    }
    probes
}

/// Score the candidates of an ambiguous row and pick one
///
/// Ties on the heuristic score prefer a candidate some same-source row with
/// identical output is already routed to, then the lowest class index.
fn pick_candidate(row: &Row, source: usize, routed: &[Routed], heuristic: MapHeuristic) -> usize {
    if heuristic == MapHeuristic::FirstCandidate {
        return row.candidates[0];
    }

    let weight = |records: &mut dyn Iterator<Item = &Routed>| -> usize {
        records
            .map(|r| r.inputs.overlap(&row.inputs) + r.outputs.overlap(&row.outputs))
            .sum()
    };

    let mut best_score = 0usize;
    let mut best: Vec<usize> = Vec::new();
    for &candidate in &row.candidates {
        let row_weight = weight(
            &mut routed
                .iter()
                .filter(|r| r.source == source && r.target == candidate),
        );
        let column_weight = weight(&mut routed.iter().filter(|r| r.target == candidate));
        let score = match heuristic {
            MapHeuristic::FirstCandidate => 0,
            MapHeuristic::RowWeight => row_weight,
            MapHeuristic::ColumnWeight => column_weight,
            MapHeuristic::RowColumnProduct => row_weight * column_weight,
        };
        if best.is_empty() || score > best_score {
            best_score = score;
            best = vec![candidate];
        } else if score == best_score {
            best.push(candidate);
        }
    }

    if best.len() > 1 {
        let sibling = best.iter().copied().find(|&candidate| {
            routed
                .iter()
                .any(|r| r.source == source && r.target == candidate && r.outputs == row.outputs)
        });
        if let Some(candidate) = sibling {
            return candidate;
        }
    }
    best[0]
}

/// Coalesce adjacent rows of one state until no merge applies
///
/// Two rows merge when they agree on output and next state and their input
/// cubes differ in exactly one specified position.
fn merge_adjacent(rows: &mut Vec<Row>) {
    loop {
        let mut merged = None;
        'search: for i in 0..rows.len() {
            for j in (i + 1)..rows.len() {
                if rows[i].next != rows[j].next || rows[i].outputs != rows[j].outputs {
                    continue;
                }
                if let Some(position) = rows[i].inputs.single_difference(&rows[j].inputs) {
                    merged = Some((i, j, position));
                    break 'search;
                }
            }
        }
        match merged {
            Some((i, j, position)) => {
                let widened = rows[i].inputs.with_dont_care(position);
                rows[i].inputs = widened;
                rows.remove(j);
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::compat::PairTable;
    use crate::reduce::covering::solve_cover;
    use crate::reduce::maximal::generate_maximals;
    use crate::reduce::prime::generate_primes;
    use crate::solver::SolveMode;

    fn reduce(m: &Machine, heuristic: MapHeuristic) -> Machine {
        let ids = m.fully_specified_states();
        let table = PairTable::build(m, &ids).unwrap();
        let maximals = generate_maximals(m, &table, true, None);
        let primes = generate_primes(m, &ids, &maximals.classes);
        let chosen = solve_cover(m, &ids, &primes, SolveMode::Exact, true).unwrap();
        map_outputs(m, &chosen, heuristic).unwrap()
    }

    #[test]
    fn test_four_states_reduce_to_two() {
        let mut m = Machine::new(1, 1);
        let s0 = m.add_state("s0");
        let s1 = m.add_state("s1");
        let s2 = m.add_state("s2");
        let s3 = m.add_state("s3");
        m.add_transition(s0, "0", "0", NextState::To(s1)).unwrap();
        m.add_transition(s1, "0", "1", NextState::To(s2)).unwrap();
        m.add_transition(s2, "0", "0", NextState::To(s3)).unwrap();
        m.add_transition(s3, "0", "1", NextState::To(s0)).unwrap();

        let reduced = reduce(&m, MapHeuristic::default());
        assert_eq!(reduced.num_states(), 2);
        assert_eq!(reduced.find_state("s0+s2"), Some(0));
        assert_eq!(reduced.find_state("s1+s3"), Some(1));
        // Every next state is concrete and the two states reference each
        // other.
        for state in reduced.states() {
            for t in state.transitions() {
                assert!(t.next().id().is_some());
            }
        }
    }

    #[test]
    fn test_passthrough_state_renumbered() {
        let mut m = Machine::new(1, 1);
        let a = m.add_state("a");
        let b = m.add_state("b");
        let p = m.add_state("p");
        m.add_transition(a, "0", "1", NextState::To(b)).unwrap();
        m.add_transition(b, "0", "1", NextState::To(a)).unwrap();
        // p has a don't-care output, so it bypasses reduction but still
        // points into the merged pair.
        m.add_transition(p, "0", "-", NextState::To(a)).unwrap();

        let reduced = reduce(&m, MapHeuristic::default());
        assert_eq!(reduced.num_states(), 2);
        let p_new = reduced.find_state("p").unwrap();
        assert_eq!(p_new, 1);
        let t = &reduced.state(p_new).transitions()[0];
        assert_eq!(t.next(), NextState::To(0));
        assert_eq!(t.outputs().to_string(), "-");
    }

    #[test]
    fn test_adjacent_rows_merge() {
        let mut m = Machine::new(2, 1);
        let a = m.add_state("a");
        m.add_transition(a, "00", "1", NextState::To(a)).unwrap();
        m.add_transition(a, "01", "1", NextState::To(a)).unwrap();
        m.add_transition(a, "1-", "0", NextState::To(a)).unwrap();

        let reduced = reduce(&m, MapHeuristic::default());
        assert_eq!(reduced.num_states(), 1);
        let transitions = reduced.state(0).transitions();
        assert_eq!(transitions.len(), 2);
        assert!(transitions
            .iter()
            .any(|t| t.inputs().to_string() == "0-" && t.outputs().to_string() == "1"));
    }

    #[test]
    fn test_unconstrained_next_gets_resolved() {
        let mut m = Machine::new(1, 1);
        let a = m.add_state("a");
        let b = m.add_state("b");
        m.add_transition(a, "0", "1", NextState::DontCare).unwrap();
        m.add_transition(b, "0", "0", NextState::To(b)).unwrap();

        let reduced = reduce(&m, MapHeuristic::FirstCandidate);
        assert_eq!(reduced.num_states(), 2);
        for state in reduced.states() {
            for t in state.transitions() {
                assert!(t.next().id().is_some());
            }
        }
    }

    #[test]
    fn test_first_candidate_is_deterministic() {
        let mut m = Machine::new(1, 1);
        let a = m.add_state("a");
        let b = m.add_state("b");
        m.add_transition(a, "0", "1", NextState::DontCare).unwrap();
        m.add_transition(b, "0", "0", NextState::To(b)).unwrap();

        let first = reduce(&m, MapHeuristic::FirstCandidate);
        let second = reduce(&m, MapHeuristic::FirstCandidate);
        assert_eq!(first.num_states(), second.num_states());
        for (x, y) in first.states().iter().zip(second.states().iter()) {
            assert_eq!(x.transitions(), y.transitions());
        }
    }

    #[test]
    fn test_reset_state_remapped() {
        let mut m = Machine::new(1, 1);
        let s0 = m.add_state("s0");
        let s1 = m.add_state("s1");
        let s2 = m.add_state("s2");
        let s3 = m.add_state("s3");
        m.add_transition(s0, "0", "0", NextState::To(s1)).unwrap();
        m.add_transition(s1, "0", "1", NextState::To(s2)).unwrap();
        m.add_transition(s2, "0", "0", NextState::To(s3)).unwrap();
        m.add_transition(s3, "0", "1", NextState::To(s0)).unwrap();
        m.set_reset_state(s3);

        let reduced = reduce(&m, MapHeuristic::default());
        let reset = reduced.reset_state().unwrap();
        assert_eq!(reduced.state(reset).name().as_ref(), "s1+s3");
    }
}
