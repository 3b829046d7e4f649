//! Stamina State Minimiser - Command Line Interface
//!
//! Reads a KISS2 flow table, runs the reduction pipeline, and writes the
//! reduced KISS2 table.

use clap::{Parser, ValueEnum};
use stamina_logic::{
    KissReader, KissWriter, Machine, MapHeuristic, Reducible, SolveMode, StaminaConfig,
};
use std::path::PathBuf;
use std::process;

const VERSION: &str = "UC Berkeley, Stamina (Rust implementation 0.2.0)";

#[derive(Debug, Clone, ValueEnum)]
enum Command {
    /// Run the full state-reduction pipeline (default)
    Reduce,
    /// Echo the flow table without modification
    Echo,
    /// Print statistics about the flow table
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CoverMode {
    /// Greedy covering heuristic
    Heuristic,
    /// Exact branch-and-bound covering
    Exact,
}

impl From<CoverMode> for SolveMode {
    fn from(val: CoverMode) -> Self {
        match val {
            CoverMode::Heuristic => SolveMode::Heuristic,
            CoverMode::Exact => SolveMode::Exact,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mapping {
    /// Always pick the first admissible class
    First,
    /// Maximise row weight
    Row,
    /// Maximise column weight
    Column,
    /// Maximise the product of row and column weight
    Product,
}

impl From<Mapping> for MapHeuristic {
    fn from(val: Mapping) -> Self {
        match val {
            Mapping::First => MapHeuristic::FirstCandidate,
            Mapping::Row => MapHeuristic::RowWeight,
            Mapping::Column => MapHeuristic::ColumnWeight,
            Mapping::Product => MapHeuristic::RowColumnProduct,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "stamina")]
#[command(about = "Finite state machine minimiser", long_about = None)]
#[command(version = VERSION)]
struct Args {
    /// Input KISS2 file (required)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Subcommand to execute
    #[arg(short = 'D', long = "do", value_enum, default_value = "reduce")]
    command: Command,

    /// Covering solve mode
    #[arg(short = 'c', long = "cover", value_enum, default_value = "heuristic")]
    cover: CoverMode,

    /// Output mapping heuristic
    #[arg(short = 'm', long = "map", value_enum, default_value = "product")]
    map: Mapping,

    /// Disable the isomorphism pre-pass
    #[arg(long = "no-isomorphism")]
    no_isomorphism: bool,

    /// Disable the post-cover shrink pass
    #[arg(long = "no-shrink")]
    no_shrink: bool,

    /// Cap on the maximal-class working list (unbounded if not given)
    #[arg(long = "max-classes", value_name = "N")]
    max_classes: Option<usize>,

    /// Provide execution summary
    #[arg(short = 's', long = "summary")]
    summary: bool,

    /// Suppress printing of solution
    #[arg(short = 'x', long = "no-output")]
    no_output: bool,

    /// Output file (writes to stdout if not specified)
    #[arg(short = 'O', long = "out-file")]
    output_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if args.summary {
        eprintln!("{}", VERSION);
        eprintln!();
    }

    let machine = match Machine::from_kiss_file(&args.input) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("Error reading KISS file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    if args.summary {
        eprintln!("Input: {:?}", machine);
        eprintln!();
    }

    match args.command {
        Command::Reduce => {
            let config = StaminaConfig {
                solve_mode: args.cover.into(),
                isomorphism_reduction: !args.no_isomorphism,
                map_heuristic: args.map.into(),
                shrink_pass: !args.no_shrink,
                max_classes: args.max_classes,
            };
            let reduction = match machine.reduce_with_config(&config) {
                Ok(reduction) => reduction,
                Err(e) => {
                    eprintln!("Error reducing machine: {}", e);
                    process::exit(1);
                }
            };
            if reduction.report.bound_reached {
                eprintln!(
                    "Warning: maximal-class bound reached; result may not be minimal"
                );
            }
            if args.summary {
                eprintln!(
                    "Reduced {} states to {} ({} compatible pairs, {} maximal, {} prime, {} chosen)",
                    reduction.report.original_states,
                    reduction.report.reduced_states,
                    reduction.report.compatible_pairs,
                    reduction.report.maximal_classes,
                    reduction.report.prime_classes,
                    reduction.report.chosen_classes,
                );
                eprintln!();
            }
            if !args.no_output {
                write_output(&reduction, &args);
            }
        }
        Command::Echo => {
            if !args.no_output {
                write_output(&machine, &args);
            }
        }
        Command::Stats => {
            println!("Flow table statistics:");
            println!("  Inputs:              {}", machine.num_inputs());
            println!("  Outputs:             {}", machine.num_outputs());
            println!("  States:              {}", machine.num_states());
            println!("  Transitions:         {}", machine.num_transitions());
            println!(
                "  Fully specified:     {}",
                machine.fully_specified_states().len()
            );
            if !args.no_output {
                write_output(&machine, &args);
            }
        }
    }

    if args.summary {
        eprintln!("Done.");
    }
}

fn write_output<T: KissWriter>(table: &T, args: &Args) {
    if let Some(ref output_path) = args.output_file {
        if let Err(e) = table.to_kiss_file(output_path) {
            eprintln!("Error writing output file: {}", e);
            process::exit(1);
        }
        if args.summary {
            eprintln!("Wrote output to: {}", output_path.display());
        }
    } else {
        let text = match table.to_kiss_string() {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error writing output: {}", e);
                process::exit(1);
            }
        };
        print!("{}", text);
    }
}
