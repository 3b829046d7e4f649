//! Reduce a KISS2 flow table given on the command line and print the result.
//!
//! Usage: cargo run --example reduce_kiss -- input.kiss2

use stamina_logic::{KissReader, KissWriter, Machine, Reducible};
use std::env;
use std::io;

fn main() -> io::Result<()> {
    let path = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: reduce_kiss <input.kiss2>");
        std::process::exit(2);
    });

    let machine = Machine::from_kiss_file(&path).map_err(io::Error::from)?;
    eprintln!("Read {:?}", machine);

    let reduction = machine.reduce().map_err(io::Error::from)?;
    eprintln!(
        "{} states reduced to {}",
        reduction.report.original_states, reduction.report.reduced_states
    );

    let text = reduction.to_kiss_string().map_err(io::Error::from)?;
    print!("{}", text);
    Ok(())
}
