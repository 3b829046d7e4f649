//! Prime compatible class generation
//!
//! Maximal classes alone do not always admit the smallest closed cover: a
//! smaller sub-class can carry a strictly weaker closure requirement and
//! enable a cheaper solution. This stage enumerates sub-classes of every
//! maximal class (down to size 2) and keeps the ones no retained class
//! dominates. Maximal classes themselves are always prime.
//!
//! A class `p` dominates a candidate `c` when `p`'s members contain `c`'s
//! and every implied set of `p` is contained in some implied set of `c`:
//! it covers at least as much while being no harder to close.

use super::maximal::{class_set_for, CompatibleClass};
use crate::machine::Machine;
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Generate the prime classes from the maximal classes
///
/// The returned list starts with the maximal classes (largest first) and
/// appends surviving sub-classes in descending size order. Every candidate
/// state not contained in any selectable prime afterwards gets a singleton
/// prime with an empty closure requirement, so the trivial cover always
/// exists. Selectability matters when the maximal-class bound stopped
/// enumeration early: a found prime can then carry an implied set whose
/// containing class was never enumerated, and such a prime can never be
/// part of a closed cover.
pub fn generate_primes(
    machine: &Machine,
    candidates: &[usize],
    maximals: &[CompatibleClass],
) -> Vec<CompatibleClass> {
    let mut primes: Vec<CompatibleClass> = maximals.to_vec();
    primes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.states.cmp(&b.states)));

    // Sub-class enumeration, one level of removal at a time, deduplicated
    // globally so shared subsets are examined once.
    let mut seen: HashSet<Vec<usize>> = primes.iter().map(|p| p.states.clone()).collect();
    let mut by_size: BTreeMap<usize, Vec<Vec<usize>>> = BTreeMap::new();
    for prime in &primes {
        push_children(&prime.states, &mut seen, &mut by_size);
    }

    while let Some((&size, _)) = by_size.iter().next_back() {
        let batch = by_size.remove(&size).unwrap_or_default();
        for states in batch {
            let class_set = class_set_for(machine, &states);
            let candidate = CompatibleClass {
                states: states.clone(),
                class_set,
            };
            if !primes.iter().any(|p| dominates(p, &candidate)) {
                primes.push(candidate);
            }
            // Dominated candidates can still have prime subsets; keep
            // descending either way.
            if size > 2 {
                push_children(&states, &mut seen, &mut by_size);
            }
        }
    }

    let selectable = selectable_primes(&primes);
    for &id in candidates {
        let covered = primes
            .iter()
            .enumerate()
            .any(|(i, p)| selectable[i] && p.contains(id));
        if !covered {
            let singleton = vec![id];
            if !primes.iter().any(|p| p.states == singleton) {
                primes.push(CompatibleClass {
                    states: singleton,
                    class_set: Vec::new(),
                });
            }
        }
    }

    primes
}

/// Mark the primes that can actually appear in a closed cover
///
/// A prime whose implied set is contained in no prime at all is unselectable,
/// and unselectability propagates: losing the only absorbers of an implied
/// set takes the depending prime down with them. Runs to a fixpoint.
fn selectable_primes(primes: &[CompatibleClass]) -> Vec<bool> {
    let mut selectable = vec![true; primes.len()];
    loop {
        let mut changed = false;
        for (i, prime) in primes.iter().enumerate() {
            if !selectable[i] {
                continue;
            }
            let blocked = prime.class_set.iter().any(|set| {
                !primes
                    .iter()
                    .enumerate()
                    .any(|(j, p)| selectable[j] && p.contains_all(set))
            });
            if blocked {
                selectable[i] = false;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    selectable
}

/// Queue every one-element-removed subset of `states` not yet seen
fn push_children(
    states: &[usize],
    seen: &mut HashSet<Vec<usize>>,
    by_size: &mut BTreeMap<usize, Vec<Vec<usize>>>,
) {
    if states.len() < 3 {
        return;
    }
    for drop in 0..states.len() {
        let child: Vec<usize> = states
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != drop)
            .map(|(_, &id)| id)
            .collect();
        if seen.insert(child.clone()) {
            by_size.entry(child.len()).or_default().push(child);
        }
    }
}

/// Dominance test: `p` makes `candidate` redundant
fn dominates(p: &CompatibleClass, candidate: &CompatibleClass) -> bool {
    if !candidate.is_subset_of(p) {
        return false;
    }
    p.class_set.iter().all(|p_set| {
        candidate
            .class_set
            .iter()
            .any(|c_set| p_set.iter().all(|id| c_set.contains(id)))
    })
}
