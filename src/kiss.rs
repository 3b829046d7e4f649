//! KISS2 flow-table format support
//!
//! This module handles KISS2 file I/O for [`Machine`] and [`Reduction`].
//! A KISS2 file carries `.i`/`.o` dimension directives, optional `.s`/`.p`
//! count directives, an optional `.r` reset-state directive, and one row per
//! transition: `input current-state next-state output`, with `*` standing
//! for an unconstrained next state.
//!
//! # Examples
//!
//! ```
//! use stamina_logic::{KissReader, KissWriter, Machine, Reducible};
//!
//! let table = "\
//! .i 1
//! .o 1
//! 0 s0 s1 0
//! 0 s1 s2 1
//! 0 s2 s3 0
//! 0 s3 s0 1
//! .e
//! ";
//! let machine = Machine::from_kiss_string(table).unwrap();
//! let reduction = machine.reduce().unwrap();
//! assert_eq!(reduction.machine.num_states(), 2);
//!
//! let text = reduction.to_kiss_string().unwrap();
//! assert!(text.contains("4 states reduced to 2"));
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::machine::{Cube, CubeParseError, Machine, NextState};
use crate::reduce::{Reduction, ReductionReport};

pub mod error;

pub use error::{KissError, KissReadError, KissWriteError};

/// Internal trait for types that can be serialized to and deserialized from
/// KISS2 format
///
/// It is used as the basis for the public `KissReader` and `KissWriter`
/// traits.
pub(crate) trait KissSerialisable: Sized {
    /// The flow table to serialize
    fn flow_table(&self) -> &Machine;

    /// State count before reduction, emitted as a header comment if known
    fn original_state_count(&self) -> Option<usize> {
        None
    }

    /// Create an instance from a parsed flow table
    fn create_from_kiss_parts(machine: Machine) -> Self;
}

/// Trait for types that support KISS2 serialization (writing)
///
/// This trait is automatically implemented for all types that implement
/// `KissSerialisable`.
pub trait KissWriter {
    /// Write this flow table in KISS2 format using a writer
    ///
    /// This is the core serialization method; `to_kiss_string` and
    /// `to_kiss_file` delegate to it.
    fn write_kiss<W: Write>(&self, writer: &mut W) -> Result<(), KissWriteError>;

    /// Convert this flow table to a KISS2 format string
    fn to_kiss_string(&self) -> Result<String, KissWriteError> {
        let mut buffer = Vec::new();
        self.write_kiss(&mut buffer)?;
        // KISS2 format is ASCII, so this conversion is safe
        Ok(String::from_utf8(buffer).unwrap())
    }

    /// Write this flow table to a KISS2 file
    fn to_kiss_file<P: AsRef<Path>>(&self, path: P) -> Result<(), KissWriteError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_kiss(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Blanket implementation of KissWriter for all KissSerialisable types
impl<T: KissSerialisable> KissWriter for T {
    fn write_kiss<W: Write>(&self, writer: &mut W) -> Result<(), KissWriteError> {
        let machine = self.flow_table();

        if let Some(original) = self.original_state_count() {
            writeln!(
                writer,
                "# {} states reduced to {}",
                original,
                machine.num_states()
            )?;
        }

        writeln!(writer, ".i {}", machine.num_inputs())?;
        writeln!(writer, ".o {}", machine.num_outputs())?;
        writeln!(writer, ".p {}", machine.num_transitions())?;
        writeln!(writer, ".s {}", machine.num_states())?;
        if let Some(reset) = machine.reset_state() {
            writeln!(writer, ".r {}", machine.state(reset).name())?;
        }

        for state in machine.states() {
            for t in state.transitions() {
                let next = match t.next() {
                    NextState::To(id) => machine.state(id).name().to_string(),
                    NextState::DontCare => "*".to_string(),
                };
                writeln!(
                    writer,
                    "{} {} {} {}",
                    t.inputs(),
                    state.name(),
                    next,
                    t.outputs()
                )?;
            }
        }

        writeln!(writer, ".e")?;
        Ok(())
    }
}

/// Trait for types that support KISS2 deserialization (reading/parsing)
///
/// This trait is automatically implemented for all types that implement
/// `KissSerialisable`. The convenience methods delegate to the core
/// `from_kiss_reader` method.
pub trait KissReader: Sized {
    /// Parse a flow table from a KISS2 format reader
    fn from_kiss_reader<R: io::BufRead>(reader: R) -> Result<Self, KissReadError>;

    /// Parse a flow table from a KISS2 format string
    ///
    /// # Examples
    ///
    /// ```
    /// use stamina_logic::{KissReader, Machine};
    ///
    /// let machine = Machine::from_kiss_string("0 a b 1\n1 b a 0\n").unwrap();
    /// assert_eq!(machine.num_states(), 2);
    /// assert_eq!(machine.num_inputs(), 1);
    /// ```
    fn from_kiss_string(s: &str) -> Result<Self, KissReadError> {
        let cursor = io::Cursor::new(s.as_bytes());
        Self::from_kiss_reader(cursor)
    }

    /// Load a flow table from a KISS2 format file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use stamina_logic::{KissReader, Machine};
    ///
    /// let machine = Machine::from_kiss_file("input.kiss2").unwrap();
    /// println!("Loaded {} states", machine.num_states());
    /// ```
    fn from_kiss_file<P: AsRef<Path>>(path: P) -> Result<Self, KissReadError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Self::from_kiss_reader(reader)
    }
}

/// Blanket implementation of KissReader for all KissSerialisable types
impl<T: KissSerialisable> KissReader for T {
    fn from_kiss_reader<R: io::BufRead>(reader: R) -> Result<Self, KissReadError> {
        let mut num_inputs: Option<usize> = None;
        let mut num_outputs: Option<usize> = None;
        let mut machine: Option<Machine> = None;
        let mut reset_name: Option<String> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let number = index + 1;

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('.') {
                let parts: Vec<&str> = line.split_whitespace().collect();
                match parts.first().copied() {
                    Some(".i") => {
                        let val: usize =
                            parts.get(1).and_then(|s| s.parse().ok()).ok_or_else(|| {
                                KissError::InvalidInputDirective {
                                    value: Arc::from(*parts.get(1).unwrap_or(&"")),
                                }
                            })?;
                        num_inputs = Some(val);
                    }
                    Some(".o") => {
                        let val: usize =
                            parts.get(1).and_then(|s| s.parse().ok()).ok_or_else(|| {
                                KissError::InvalidOutputDirective {
                                    value: Arc::from(*parts.get(1).unwrap_or(&"")),
                                }
                            })?;
                        num_outputs = Some(val);
                    }
                    Some(".r") => {
                        reset_name = parts.get(1).map(|s| s.to_string());
                    }
                    Some(".e") | Some(".end") => break,
                    // .s and .p are recomputed on write, nothing to keep
                    _ => {}
                }
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let [input_str, current, next, output_str] = fields[..] else {
                return Err(KissError::MalformedRow {
                    line: number,
                    content: Arc::from(line),
                }
                .into());
            };

            // Infer dimensions from the first row if not declared
            let ni = *num_inputs.get_or_insert(input_str.len());
            let no = *num_outputs.get_or_insert(output_str.len());
            if input_str.len() != ni || output_str.len() != no {
                return Err(KissError::RowDimensionMismatch {
                    line: number,
                    expected_inputs: ni,
                    actual_inputs: input_str.len(),
                    expected_outputs: no,
                    actual_outputs: output_str.len(),
                }
                .into());
            }

            let inputs: Cube =
                input_str
                    .parse()
                    .map_err(|e: CubeParseError| KissError::InvalidInputCharacter {
                        line: number,
                        character: e.character,
                        position: e.position,
                    })?;
            let outputs: Cube =
                output_str
                    .parse()
                    .map_err(|e: CubeParseError| KissError::InvalidOutputCharacter {
                        line: number,
                        character: e.character,
                        position: e.position,
                    })?;

            let m = machine.get_or_insert_with(|| Machine::new(ni, no));
            let state = m.add_state(current);
            let next = match next {
                "*" => NextState::DontCare,
                name => NextState::To(m.add_state(name)),
            };
            m.add_transition_cubes(state, inputs, outputs, next)
                .map_err(|e| KissReadError::Io(e.into()))?;
        }

        let mut machine = match machine {
            Some(m) => m,
            None => match (num_inputs, num_outputs) {
                (Some(ni), Some(no)) => Machine::new(ni, no),
                _ => return Err(KissError::MissingDimensions.into()),
            },
        };

        if let Some(name) = reset_name {
            let id = machine
                .find_state(&name)
                .ok_or_else(|| KissError::UnknownResetState {
                    name: Arc::from(name.as_str()),
                })?;
            machine.set_reset_state(id);
        }

        Ok(Self::create_from_kiss_parts(machine))
    }
}

impl KissSerialisable for Machine {
    fn flow_table(&self) -> &Machine {
        self
    }

    fn create_from_kiss_parts(machine: Machine) -> Self {
        machine
    }
}

impl KissSerialisable for Reduction {
    fn flow_table(&self) -> &Machine {
        &self.machine
    }

    fn original_state_count(&self) -> Option<usize> {
        Some(self.report.original_states)
    }

    fn create_from_kiss_parts(machine: Machine) -> Self {
        let states = machine.num_states();
        Reduction {
            machine,
            report: ReductionReport {
                original_states: states,
                reduced_states: states,
                ..Default::default()
            },
        }
    }
}
