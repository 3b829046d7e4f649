//! Minimum-cover solver interface and implementations
//!
//! The covering stage hands its constraints to a solver through the sparse
//! [`CoverMatrix`] contract: one column per selectable class, one row per
//! requirement. A unate row lists the columns that can satisfy it ("at least
//! one of these"). A binate row additionally names a negated column: the row
//! is satisfied when that column is left out, or when one of the listed
//! companion columns is brought in ("this column forces exclusion unless a
//! companion is present").
//!
//! Any conforming solver preserves correctness of the pipeline; only the
//! size of the solution may vary. Two are provided: [`GreedySolver`]
//! (bounded heuristic) and [`ExactSolver`] (branch-and-bound). Both are
//! deterministic.
//!
//! # Examples
//!
//! ```
//! use stamina_logic::{CoverMatrix, CoverSolver, GreedySolver};
//!
//! let mut matrix = CoverMatrix::new(3);
//! matrix.add_row("state a", vec![0, 1]);
//! matrix.add_row("state b", vec![1, 2]);
//!
//! let chosen = GreedySolver.solve(&matrix, None).unwrap();
//! assert_eq!(chosen, vec![1]);
//! ```

use std::fmt;

/// A single covering requirement
#[derive(Debug, Clone)]
pub struct CoverRow {
    /// Human-readable description, used in infeasibility diagnostics
    pub label: String,
    /// Columns that satisfy the row when selected
    pub present: Vec<usize>,
    /// Column whose selection activates the row (binate rows only)
    pub negated: Option<usize>,
}

impl CoverRow {
    /// Whether the given column selection satisfies this row
    pub fn satisfied_by(&self, selected: &[bool]) -> bool {
        if let Some(neg) = self.negated {
            if !selected[neg] {
                return true;
            }
        }
        self.present.iter().any(|&c| selected[c])
    }
}

/// Sparse row/column covering matrix with optional binate rows
#[derive(Debug, Clone, Default)]
pub struct CoverMatrix {
    num_columns: usize,
    rows: Vec<CoverRow>,
}

impl CoverMatrix {
    /// Create a matrix with the given column count and no rows
    pub fn new(num_columns: usize) -> Self {
        CoverMatrix {
            num_columns,
            rows: Vec::new(),
        }
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// The rows added so far
    pub fn rows(&self) -> &[CoverRow] {
        &self.rows
    }

    /// Add a unate row: at least one of `present` must be selected
    pub fn add_row(&mut self, label: &str, present: Vec<usize>) {
        self.rows.push(CoverRow {
            label: label.to_string(),
            present,
            negated: None,
        });
    }

    /// Add a binate row: selecting `negated` requires one of `present`
    pub fn add_binate_row(&mut self, label: &str, negated: usize, present: Vec<usize>) {
        self.rows.push(CoverRow {
            label: label.to_string(),
            present,
            negated: Some(negated),
        });
    }

    /// Check a full selection against every row
    pub fn all_satisfied(&self, selected: &[bool]) -> bool {
        self.rows.iter().all(|r| r.satisfied_by(selected))
    }

    /// Labels of the rows a selection leaves unsatisfied
    pub fn unsatisfied_labels(&self, selected: &[bool]) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| !r.satisfied_by(selected))
            .map(|r| r.label.clone())
            .collect()
    }

    /// Columns that can never be selected
    ///
    /// A binate row whose companion list is empty forbids its negated column
    /// outright, and the exclusion propagates: a row whose companions are all
    /// forbidden forbids its negated column too. Runs to a fixpoint.
    fn forbidden_columns(&self) -> Vec<bool> {
        let mut forbidden = vec![false; self.num_columns];
        loop {
            let mut changed = false;
            for row in &self.rows {
                if let Some(neg) = row.negated {
                    if !forbidden[neg] && row.present.iter().all(|&c| forbidden[c]) {
                        forbidden[neg] = true;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        forbidden
    }
}

/// Error returned by a cover solve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// No selection satisfies every row
    Infeasible {
        /// Labels of the rows that could not be satisfied
        unsatisfied: Vec<String>,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Infeasible { unsatisfied } => {
                write!(f, "No feasible cover; unsatisfied rows: {}", unsatisfied.join(", "))
            }
        }
    }
}

impl std::error::Error for SolveError {}

/// A minimum-cover solver
///
/// Implementations must return a feasible column subset (sorted ascending)
/// or report infeasibility; they should aim for small solutions but are not
/// required to be optimal. `weights` gives a non-negative cost per column;
/// `None` means unit cost.
pub trait CoverSolver {
    /// Solve the covering instance
    fn solve(&self, matrix: &CoverMatrix, weights: Option<&[u32]>) -> Result<Vec<usize>, SolveError>;
}

/// Which solver the pipeline invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMode {
    /// Greedy heuristic: fast, near-minimal covers
    #[default]
    Heuristic,
    /// Branch-and-bound: guaranteed minimum-cost covers
    Exact,
}

impl SolveMode {
    /// Instantiate the solver for this mode
    pub fn solver(&self) -> Box<dyn CoverSolver> {
        match self {
            SolveMode::Heuristic => Box::new(GreedySolver),
            SolveMode::Exact => Box::new(ExactSolver::default()),
        }
    }
}

/// Greedy heuristic solver
///
/// Repeatedly selects the column satisfying the most unsatisfied rows per
/// unit cost (lowest index on ties), then repairs binate rows activated by
/// the selection the same way. Terminates after at most one selection per
/// column.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl CoverSolver for GreedySolver {
    fn solve(&self, matrix: &CoverMatrix, weights: Option<&[u32]>) -> Result<Vec<usize>, SolveError> {
        let n = matrix.num_columns();
        let mut selected = vec![false; n];
        let forbidden = matrix.forbidden_columns();
        let cost = |c: usize| weights.map_or(1, |w| w[c].max(1));

        for _ in 0..n {
            if matrix.all_satisfied(&selected) {
                break;
            }
            // Score candidate columns by unsatisfied rows they would fix.
            let mut best: Option<(usize, f64)> = None;
            for c in 0..n {
                if selected[c] || forbidden[c] {
                    continue;
                }
                let fixes = matrix
                    .rows()
                    .iter()
                    .filter(|r| !r.satisfied_by(&selected) && r.present.contains(&c))
                    .count();
                if fixes == 0 {
                    continue;
                }
                let score = fixes as f64 / cost(c) as f64;
                let better = match best {
                    None => true,
                    Some((_, s)) => score > s,
                };
                if better {
                    best = Some((c, score));
                }
            }
            match best {
                Some((c, _)) => selected[c] = true,
                None => break,
            }
        }

        if !matrix.all_satisfied(&selected) {
            return Err(SolveError::Infeasible {
                unsatisfied: matrix.unsatisfied_labels(&selected),
            });
        }
        Ok((0..n).filter(|&c| selected[c]).collect())
    }
}

/// Exact branch-and-bound solver
///
/// Branches on the first unsatisfied row: for a unate row, try including
/// each undecided candidate column; for a binate row, additionally try
/// excluding the negated column. Partial costs prune against the best
/// solution found so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

impl CoverSolver for ExactSolver {
    fn solve(&self, matrix: &CoverMatrix, weights: Option<&[u32]>) -> Result<Vec<usize>, SolveError> {
        let n = matrix.num_columns();
        let mut best: Option<(u64, Vec<bool>)> = None;
        let mut decision: Vec<Option<bool>> = vec![None; n];
        branch(matrix, weights, &mut decision, 0, &mut best);

        match best {
            Some((_, selected)) => Ok((0..n).filter(|&c| selected[c]).collect()),
            None => {
                let none = vec![false; n];
                Err(SolveError::Infeasible {
                    unsatisfied: matrix.unsatisfied_labels(&none),
                })
            }
        }
    }
}

fn column_cost(weights: Option<&[u32]>, c: usize) -> u64 {
    weights.map_or(1, |w| u64::from(w[c].max(1)))
}

fn branch(
    matrix: &CoverMatrix,
    weights: Option<&[u32]>,
    decision: &mut Vec<Option<bool>>,
    cost: u64,
    best: &mut Option<(u64, Vec<bool>)>,
) {
    if let Some((best_cost, _)) = best {
        if cost >= *best_cost {
            return;
        }
    }

    // Find the first row not yet satisfied under the optimistic reading
    // (undecided columns count as excluded). An unsatisfied row can resolve
    // by excluding its negated column or including an undecided present
    // column; a row with neither option kills the branch below.
    let selected: Vec<bool> = decision.iter().map(|d| *d == Some(true)).collect();
    let open = matrix.rows().iter().find(|row| !row.satisfied_by(&selected));

    let row = match open {
        None => {
            *best = Some((cost, selected));
            return;
        }
        Some(row) => row,
    };

    // Binate rows may resolve by excluding the negated column.
    if let Some(neg) = row.negated {
        if decision[neg].is_none() {
            decision[neg] = Some(false);
            branch(matrix, weights, decision, cost, best);
            decision[neg] = None;
        }
    }
    // Either kind of row may resolve by including a present column.
    for &c in &row.present {
        if decision[c].is_none() {
            decision[c] = Some(true);
            branch(matrix, weights, decision, cost + column_cost(weights, c), best);
            decision[c] = None;
        }
    }
}
