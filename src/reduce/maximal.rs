//! Maximal compatible class generation
//!
//! From the pairwise compatibility relation this stage enumerates every
//! inclusion-maximal clique of mutually compatible states. An isomorphism
//! pre-pass first collapses states with identical compatibility
//! neighborhoods down to one representative each, and the classes found are
//! expanded back afterwards so no legal clique is missed.
//!
//! Each class is annotated with its closure requirement (the
//! [`CompatibleClass::class_set`]): the groups of next states that must land
//! together in a single chosen class when this class is used as one merged
//! state.

use super::compat::PairTable;
use crate::machine::Machine;
use std::collections::BTreeSet;
use std::collections::HashMap;

/// A set of pairwise-compatible states plus its closure requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleClass {
    /// Member state ids, sorted ascending
    pub states: Vec<usize>,
    /// Implied state sets: each must be contained in some chosen class
    pub class_set: Vec<Vec<usize>>,
}

impl CompatibleClass {
    /// Build a class over the given members, deriving its closure requirement
    pub fn new(machine: &Machine, mut states: Vec<usize>) -> Self {
        states.sort_unstable();
        states.dedup();
        let class_set = class_set_for(machine, &states);
        CompatibleClass { states, class_set }
    }

    /// Number of member states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if the class has no members
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// True if this class contains the given state
    pub fn contains(&self, id: usize) -> bool {
        self.states.binary_search(&id).is_ok()
    }

    /// True if this class's members contain every state of `set`
    pub fn contains_all(&self, set: &[usize]) -> bool {
        set.iter().all(|&id| self.contains(id))
    }

    /// True if this class's members are a subset of `other`'s
    pub fn is_subset_of(&self, other: &CompatibleClass) -> bool {
        other.contains_all(&self.states)
    }
}

/// Derive the closure requirement for a set of member states
///
/// Every distinct input cube appearing among member transitions is used as a
/// probe: the concrete next states of all member transitions intersecting the
/// probe must end up together in one chosen class. Groups that are singletons
/// or already contained in the class itself impose nothing; groups contained
/// in another kept group are implied by it and dropped too.
pub fn class_set_for(machine: &Machine, states: &[usize]) -> Vec<Vec<usize>> {
    let mut probes = Vec::new();
    for &id in states {
        for t in machine.state(id).transitions() {
            if !probes.contains(t.inputs()) {
                probes.push(t.inputs().clone());
            }
        }
    }

    let mut sets: Vec<Vec<usize>> = Vec::new();
    for probe in &probes {
        let mut succ = BTreeSet::new();
        for &id in states {
            for t in machine.state(id).transitions() {
                if !t.inputs().intersects(probe) {
                    continue;
                }
                if let Some(next) = t.next().id() {
                    succ.insert(next);
                }
            }
        }
        let succ: Vec<usize> = succ.into_iter().collect();
        if succ.len() < 2 {
            continue;
        }
        if succ.iter().all(|id| states.binary_search(id).is_ok()) {
            continue;
        }
        if !sets.contains(&succ) {
            sets.push(succ);
        }
    }

    // Drop sets contained in another kept set; the superset requirement
    // already forces the subset into the same chosen class.
    let mut kept: Vec<Vec<usize>> = Vec::new();
    for (i, set) in sets.iter().enumerate() {
        let covered = sets.iter().enumerate().any(|(j, other)| {
            i != j
                && set.len() <= other.len()
                && set.iter().all(|id| other.contains(id))
                && (set.len() < other.len() || j < i)
        });
        if !covered {
            kept.push(set.clone());
        }
    }
    kept.sort();
    kept
}

/// Result of the maximal-class search
#[derive(Debug, Clone)]
pub struct MaximalResult {
    /// All inclusion-maximal classes, closure-annotated
    pub classes: Vec<CompatibleClass>,
    /// True when the class bound stopped enumeration early
    ///
    /// The classes found so far still form a valid (possibly non-minimal)
    /// basis for covering; optimality degrades, correctness does not.
    pub bound_reached: bool,
    /// Groups of interchangeable states found by the isomorphism pre-pass
    pub iso_groups: Vec<Vec<usize>>,
}

/// Enumerate all maximal compatible classes
///
/// Search runs incrementally over the candidate order: each state either
/// enlarges every class it is compatible with all members of, spawns reduced
/// copies for classes it partially matches, or seeds fresh two-element
/// classes; a dominance sweep after every step removes classes that became
/// subsets of others. `max_classes` caps the working list; when exceeded,
/// enumeration stops and the result is flagged.
pub fn generate_maximals(
    machine: &Machine,
    table: &PairTable,
    isomorphism_reduction: bool,
    max_classes: Option<usize>,
) -> MaximalResult {
    let (order, iso_groups) = if isomorphism_reduction {
        isomorphism_order(table)
    } else {
        (table.ids().to_vec(), Vec::new())
    };

    let mut classes: Vec<Vec<usize>> = Vec::new();
    let mut bound_reached = false;

    for (pos, &s) in order.iter().enumerate() {
        let earlier: Vec<usize> = order[..pos]
            .iter()
            .copied()
            .filter(|&t| table.status(t, s).is_compatible())
            .collect();
        if earlier.is_empty() {
            continue;
        }

        let mut additions: Vec<Vec<usize>> = Vec::new();
        for class in classes.iter_mut() {
            let members: Vec<usize> = class
                .iter()
                .copied()
                .filter(|&t| table.status(t, s).is_compatible())
                .collect();
            if members.len() == class.len() {
                class.push(s);
            } else if !members.is_empty() {
                let mut reduced = members;
                reduced.push(s);
                additions.push(reduced);
            }
        }
        for &t in &earlier {
            additions.push(vec![t, s]);
        }
        classes.append(&mut additions);
        remove_dominated(&mut classes);

        if let Some(bound) = max_classes {
            if classes.len() > bound {
                bound_reached = true;
                break;
            }
        }
    }
    remove_dominated(&mut classes);

    if isomorphism_reduction {
        expand_iso_groups(&iso_groups, &mut classes);
        remove_dominated(&mut classes);
    }

    let classes = classes
        .into_iter()
        .map(|states| CompatibleClass::new(machine, states))
        .collect();

    MaximalResult {
        classes,
        bound_reached,
        iso_groups,
    }
}

/// Group interchangeable states and keep one representative per group
///
/// Two states are interchangeable when their compatibility neighborhoods are
/// identical; such states are never compatible with each other (a state is
/// absent from its own neighborhood), so substituting one for the other in
/// any clique is always legal.
fn isomorphism_order(table: &PairTable) -> (Vec<usize>, Vec<Vec<usize>>) {
    let mut by_neighborhood: HashMap<Vec<usize>, Vec<usize>> = HashMap::new();
    for &id in table.ids() {
        by_neighborhood
            .entry(table.neighborhood(id))
            .or_default()
            .push(id);
    }

    let mut dropped: BTreeSet<usize> = BTreeSet::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for members in by_neighborhood.values() {
        if members.len() > 1 {
            let mut group = members.clone();
            group.sort_unstable();
            for &extra in &group[1..] {
                dropped.insert(extra);
            }
            groups.push(group);
        }
    }
    groups.sort();

    let order: Vec<usize> = table
        .ids()
        .iter()
        .copied()
        .filter(|id| !dropped.contains(id))
        .collect();
    (order, groups)
}

/// Re-expand classes containing a group representative
///
/// For every class holding a representative, one substituted copy is added
/// per remaining interchangeable sibling.
fn expand_iso_groups(groups: &[Vec<usize>], classes: &mut Vec<Vec<usize>>) {
    for group in groups {
        let representative = group[0];
        let with_rep: Vec<Vec<usize>> = classes
            .iter()
            .filter(|c| c.contains(&representative))
            .cloned()
            .collect();
        for class in with_rep {
            for &sibling in &group[1..] {
                let substituted: Vec<usize> = class
                    .iter()
                    .map(|&id| if id == representative { sibling } else { id })
                    .collect();
                classes.push(substituted);
            }
        }
    }
}

/// Remove classes whose member set is contained in another class's
fn remove_dominated(classes: &mut Vec<Vec<usize>>) {
    for class in classes.iter_mut() {
        class.sort_unstable();
    }
    classes.sort();
    classes.dedup();
    let snapshot = classes.clone();
    classes.retain(|class| {
        !snapshot.iter().any(|other| {
            other.len() > class.len() && class.iter().all(|id| other.contains(id))
        })
    });
}
