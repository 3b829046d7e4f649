//! End-to-end tests of the reduction pipeline over KISS2 flow tables

use stamina_logic::{
    CompatStatus, KissReader, KissWriter, Machine, MapHeuristic, NextState, PairTable, Reducible,
    SolveMode, StaminaConfig, StaminaError,
};

const FOUR_STATE_CYCLE: &str = "\
.i 1
.o 1
.s 4
.r s0
0 s0 s1 0
0 s1 s2 1
0 s2 s3 0
0 s3 s0 1
.e
";

#[test]
fn test_four_state_scenario_reduces_to_two() {
    // {s0,s2} and {s1,s3} are the only compatible pairs: two maximal
    // classes, both prime, trivial cover selects both.
    let machine = Machine::from_kiss_string(FOUR_STATE_CYCLE).unwrap();
    let reduction = machine.reduce().unwrap();

    assert_eq!(reduction.report.original_states, 4);
    assert_eq!(reduction.report.maximal_classes, 2);
    assert_eq!(reduction.report.prime_classes, 2);
    assert_eq!(reduction.report.chosen_classes, 2);
    assert_eq!(reduction.machine.num_states(), 2);

    // Both reduced states are fully resolved and reference each other.
    for state in reduction.machine.states() {
        for t in state.transitions() {
            assert!(t.next().id().is_some());
        }
    }
}

#[test]
fn test_compatibility_is_symmetric() {
    let machine = Machine::from_kiss_string(FOUR_STATE_CYCLE).unwrap();
    let ids = machine.fully_specified_states();
    let table = PairTable::build(&machine, &ids).unwrap();
    for &a in &ids {
        for &b in &ids {
            assert_eq!(table.status(a, b), table.status(b, a));
        }
    }
}

#[test]
fn test_incompatible_implied_pair_propagates() {
    // (a,b) agree on outputs but route to (c,d) under input 0; c and d
    // conflict on output under input 1, so closure must reject (a,b) too.
    let mut m = Machine::new(1, 1);
    let a = m.add_state("a");
    let b = m.add_state("b");
    let c = m.add_state("c");
    let d = m.add_state("d");
    m.add_transition(a, "0", "1", NextState::To(c)).unwrap();
    m.add_transition(b, "0", "1", NextState::To(d)).unwrap();
    m.add_transition(c, "0", "1", NextState::To(c)).unwrap();
    m.add_transition(d, "0", "1", NextState::To(d)).unwrap();
    m.add_transition(c, "1", "0", NextState::To(c)).unwrap();
    m.add_transition(d, "1", "1", NextState::To(d)).unwrap();

    let ids = m.fully_specified_states();
    let table = PairTable::build(&m, &ids).unwrap();
    assert_eq!(table.status(c, d), CompatStatus::Incompatible);
    assert_eq!(table.status(a, b), CompatStatus::Incompatible);
}

#[test]
fn test_conflicting_transitions_abort_the_run() {
    let table = "\
.i 1
.o 1
- bad x 0
1 bad x 1
0 x x 0
1 x x 0
";
    let machine = Machine::from_kiss_string(table).unwrap();
    let err = machine.reduce().unwrap_err();
    match err {
        StaminaError::ConflictingTransitions { state, .. } => {
            assert_eq!(state.as_ref(), "bad");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_idempotent_under_fixed_configuration() {
    let machine = Machine::from_kiss_string(FOUR_STATE_CYCLE).unwrap();
    let first = machine.reduce().unwrap();
    let second = machine.reduce().unwrap();

    assert_eq!(
        first.report.reduced_states,
        second.report.reduced_states
    );
    for (x, y) in first
        .machine
        .states()
        .iter()
        .zip(second.machine.states().iter())
    {
        assert_eq!(x.name(), y.name());
        assert_eq!(x.transitions(), y.transitions());
    }
}

#[test]
fn test_reduction_monotonicity() {
    let table = "\
.i 2
.o 1
00 s0 s1 1
01 s0 s2 0
00 s1 s1 1
01 s1 s2 0
00 s2 s0 1
01 s2 s1 0
00 s3 s3 1
01 s3 s0 0
";
    let machine = Machine::from_kiss_string(table).unwrap();
    let reduction = machine
        .reduce_with_config(&StaminaConfig {
            solve_mode: SolveMode::Exact,
            ..Default::default()
        })
        .unwrap();

    let report = &reduction.report;
    assert!(report.reduced_states <= report.original_states);
    assert!(report.maximal_classes <= report.original_states);
    assert!(
        report.chosen_classes <= report.maximal_classes,
        "exact cover never needs more classes than the maximal-class cover"
    );
}

#[test]
fn test_isomorphic_states_are_interchangeable() {
    // p and q have identical (empty) compatibility neighborhoods and are
    // not compatible with each other; feeding them in either order must
    // give equal-size minimizations.
    let forward = "\
.i 1
.o 2
0 a b 10
0 b a 10
0 p p 01
0 q q 00
";
    let swapped = "\
.i 1
.o 2
0 a b 10
0 b a 10
0 q q 00
0 p p 01
";
    let first = Machine::from_kiss_string(forward)
        .unwrap()
        .reduce()
        .unwrap();
    let second = Machine::from_kiss_string(swapped)
        .unwrap()
        .reduce()
        .unwrap();
    assert_eq!(
        first.report.reduced_states,
        second.report.reduced_states
    );
}

#[test]
fn test_passthrough_states_survive_with_renumbered_targets() {
    let table = "\
.i 1
.o 2
0 s0 s1 01
0 s1 s0 01
0 partial s0 0-
";
    let machine = Machine::from_kiss_string(table).unwrap();
    let reduction = machine.reduce().unwrap();

    assert_eq!(reduction.report.passthrough_states, 1);
    let partial = reduction.machine.find_state("partial").unwrap();
    let t = &reduction.machine.state(partial).transitions()[0];
    // Still pointing at a real state of the reduced machine.
    let target = t.next().id().unwrap();
    assert!(target < reduction.machine.num_states());
    assert_eq!(t.outputs().to_string(), "0-");
}

#[test]
fn test_class_bound_degrades_gracefully() {
    // Compatibility graph is a 4-cycle: (s0,s2) and (s1,s3) conflict on
    // dedicated input rows, every other pair never intersects.
    let table = "\
.i 2
.o 1
00 s0 s0 0
00 s2 s2 1
01 s1 s1 0
01 s3 s3 1
";
    let machine = Machine::from_kiss_string(table).unwrap();
    let bounded = machine
        .reduce_with_config(&StaminaConfig {
            max_classes: Some(1),
            isomorphism_reduction: false,
            ..Default::default()
        })
        .unwrap();
    assert!(bounded.report.bound_reached);
    // Degraded, not broken: still a valid machine covering every state.
    assert!(bounded.machine.num_states() <= machine.num_states());

    let unbounded = machine.reduce().unwrap();
    assert!(!unbounded.report.bound_reached);
    assert!(unbounded.machine.num_states() <= bounded.machine.num_states());
}

#[test]
fn test_bound_with_pending_closure_still_covers() {
    // With the class list capped at one, enumeration stops before the class
    // absorbing {a,b}'s implied successors {c,d,e} is found. The run must
    // degrade to a coarser cover, never fail.
    let table = "\
.i 2
.o 1
0- a c 1
00 b d 1
01 b e 1
-- c c 0
-- d d 0
-- e e 0
";
    let machine = Machine::from_kiss_string(table).unwrap();
    let bounded = machine
        .reduce_with_config(&StaminaConfig {
            max_classes: Some(1),
            isomorphism_reduction: false,
            ..Default::default()
        })
        .unwrap();
    assert!(bounded.report.bound_reached);
    assert!(bounded.machine.num_states() <= machine.num_states());
    for state in bounded.machine.states() {
        for t in state.transitions() {
            assert!(t.next().id().unwrap() < bounded.machine.num_states());
        }
    }

    let unbounded = machine.reduce().unwrap();
    assert!(!unbounded.report.bound_reached);
    assert_eq!(unbounded.machine.num_states(), 2);
}

#[test]
fn test_mapping_heuristics_all_produce_valid_machines() {
    let machine = Machine::from_kiss_string(FOUR_STATE_CYCLE).unwrap();
    for heuristic in [
        MapHeuristic::FirstCandidate,
        MapHeuristic::RowWeight,
        MapHeuristic::ColumnWeight,
        MapHeuristic::RowColumnProduct,
    ] {
        let reduction = machine
            .reduce_with_config(&StaminaConfig {
                map_heuristic: heuristic,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(reduction.machine.num_states(), 2);
        for state in reduction.machine.states() {
            for t in state.transitions() {
                assert!(t.next().id().unwrap() < reduction.machine.num_states());
            }
        }
    }
}

#[test]
fn test_kiss_file_roundtrip_through_reduction() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.kiss2");
    let output_path = dir.path().join("reduced.kiss2");

    std::fs::write(&input_path, FOUR_STATE_CYCLE).unwrap();

    let machine = Machine::from_kiss_file(&input_path).unwrap();
    let reduction = machine.reduce().unwrap();
    reduction.to_kiss_file(&output_path).unwrap();

    let reduced = Machine::from_kiss_file(&output_path).unwrap();
    assert_eq!(reduced.num_states(), 2);
    assert_eq!(reduced.reset_state(), Some(reduced.find_state("s0+s2").unwrap()));

    let text = std::fs::read_to_string(&output_path).unwrap();
    assert!(text.starts_with("# 4 states reduced to 2"));
}

#[test]
fn test_reset_state_follows_its_class() {
    let machine = Machine::from_kiss_string(FOUR_STATE_CYCLE).unwrap();
    let reduction = machine.reduce().unwrap();
    let reset = reduction.machine.reset_state().unwrap();
    let name = reduction.machine.state(reset).name();
    assert!(name.contains("s0"), "reset class must contain s0, got {}", name);
}

#[test]
fn test_already_minimal_machine_is_left_alone() {
    let table = "\
.i 1
.o 2
0 a b 01
0 b a 10
";
    let machine = Machine::from_kiss_string(table).unwrap();
    let reduction = machine.reduce().unwrap();
    assert_eq!(reduction.report.reduced_states, 2);
    let text = reduction.to_kiss_string().unwrap();
    assert!(text.contains("# 2 states reduced to 2"));
}
