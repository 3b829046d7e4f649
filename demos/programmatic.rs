//! Build a flow table in code, reduce it, and inspect the result.

use stamina_logic::{Machine, NextState, Reducible, SolveMode, StaminaConfig};
use std::io;

fn main() -> io::Result<()> {
    // A 4-state sequence detector with two redundant states: s0/s2 and
    // s1/s3 behave identically.
    let mut machine = Machine::new(1, 1);
    let s0 = machine.add_state("s0");
    let s1 = machine.add_state("s1");
    let s2 = machine.add_state("s2");
    let s3 = machine.add_state("s3");

    machine
        .add_transition(s0, "0", "0", NextState::To(s1))
        .map_err(io::Error::from)?;
    machine
        .add_transition(s1, "0", "1", NextState::To(s2))
        .map_err(io::Error::from)?;
    machine
        .add_transition(s2, "0", "0", NextState::To(s3))
        .map_err(io::Error::from)?;
    machine
        .add_transition(s3, "0", "1", NextState::To(s0))
        .map_err(io::Error::from)?;
    machine.set_reset_state(s0);

    let config = StaminaConfig {
        solve_mode: SolveMode::Exact,
        ..Default::default()
    };
    let reduction = machine.reduce_with_config(&config).map_err(io::Error::from)?;

    println!(
        "{} states reduced to {}",
        reduction.report.original_states, reduction.report.reduced_states
    );
    for state in reduction.machine.states() {
        println!("state {}", state.name());
        for t in state.transitions() {
            let next = match t.next() {
                NextState::To(id) => reduction.machine.state(id).name().to_string(),
                NextState::DontCare => "*".to_string(),
            };
            println!("  {} -> {}  outputs {}", t.inputs(), next, t.outputs());
        }
    }
    Ok(())
}
