use crate::core::{Error, Incidence, LinkInt, RowSet};
use crate::matrix::Matrix;

/// The state of the cover search. At any point in time, the solver is
/// either advancing (ready to branch deeper), backtracking (undoing row
/// choices), solved (every column covered), or exhausted (no cover
/// exists).
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum DlxSolverState {
    Advancing,
    Backtracking,
    Solved,
    Exhausted,
}

/// A view on the state and associated data for the solver.
pub trait DlxSolverView {
    fn get_state(&self) -> DlxSolverState;
    fn is_done(&self) -> bool;
    fn selection(&self) -> &RowSet;
}

const SEARCH_ALREADY_DONE: Error = Error::new_const("Search already done");
const SEARCH_ALREADY_STARTED: Error = Error::new_const("Cannot force rows once the search has started");
const UNKNOWN_FORCED_ROW: Error = Error::new_const("Forced row has no incidences");
const DUPLICATE_FORCED_ROW: Error = Error::new_const("Row forced twice");

/// One branch level: the column covered at this level and the node of the
/// row currently tried in its vertical ring.
#[derive(Debug, Clone, Copy)]
struct Frame {
    col: usize,
    node: usize,
}

/// Exact cover search over a [`Matrix`], one transition per `step()`.
/// If you want control over the solving process (watching states, or
/// bounding work), drive this directly; most users should prefer
/// [`FindFirstCover`] or the [`first_cover`] helpers.
///
/// Rows in a chosen column are tried in the order they appear in the
/// incidence list, and columns are chosen by fewest remaining rows with
/// ties going to the earliest header in the ring, so the first cover
/// found is deterministic for a given input.
#[derive(Debug)]
pub struct DlxSolver<I: LinkInt> {
    matrix: Matrix<I>,
    selected: RowSet,
    stack: Vec<Frame>,
    state: DlxSolverState,
    started: bool,
}

impl <I: LinkInt> DlxSolverView for DlxSolver<I> {
    fn get_state(&self) -> DlxSolverState {
        self.state
    }

    fn is_done(&self) -> bool {
        self.state == DlxSolverState::Solved || self.state == DlxSolverState::Exhausted
    }

    fn selection(&self) -> &RowSet {
        &self.selected
    }
}

impl <I: LinkInt> DlxSolver<I> {
    pub fn new(matrix: Matrix<I>) -> Self {
        let selected = RowSet::new(matrix.num_rows());
        // Every level covers at least one column, and a level consumes a
        // row, so the stack can never grow past either count.
        let depth = matrix.num_cols().min(matrix.num_rows());
        DlxSolver {
            selected,
            stack: Vec::with_capacity(depth),
            state: DlxSolverState::Advancing,
            started: false,
            matrix,
        }
    }

    /// Forces `row` into the cover before the search begins, covering
    /// every column the row satisfies. This is how puzzle givens enter
    /// the problem. Two forced rows must not share a column; that
    /// precondition is the caller's to uphold and is only checked in
    /// debug builds.
    pub fn force_row(&mut self, row: usize) -> Result<(), Error> {
        if self.started {
            return Err(SEARCH_ALREADY_STARTED);
        }
        let node = match self.matrix.first_node_of_row(row) {
            Some(n) => n,
            None => return Err(UNKNOWN_FORCED_ROW),
        };
        if self.selected.contains(row) {
            return Err(DUPLICATE_FORCED_ROW);
        }
        self.selected.insert(row);
        // Unlike a searched row, the starting node's own column is not
        // covered yet, so the walk includes it exactly once.
        let mut j = node;
        loop {
            let col = self.matrix.c(j);
            self.matrix.cover(col);
            j = self.matrix.r(j);
            if j == node {
                break;
            }
        }
        Ok(())
    }

    pub fn force_rows(&mut self, rows: &[usize]) -> Result<(), Error> {
        for &row in rows {
            self.force_row(row)?;
        }
        Ok(())
    }

    /// Performs one transition of the search. Errors once the search has
    /// finished in either direction.
    pub fn step(&mut self) -> Result<(), Error> {
        self.started = true;
        match self.state {
            DlxSolverState::Solved | DlxSolverState::Exhausted => Err(SEARCH_ALREADY_DONE),
            DlxSolverState::Advancing => {
                let root = self.matrix.root();
                if self.matrix.r(root) == root {
                    // No live columns left; the selection is a cover.
                    self.state = DlxSolverState::Solved;
                    return Ok(());
                }
                let pick = self.min_count_column();
                if self.matrix.s(pick) == 0 {
                    // No row can cover `pick`; unwind without covering.
                    self.state = DlxSolverState::Backtracking;
                    return Ok(());
                }
                self.matrix.cover(pick);
                let node = self.matrix.d(pick);
                self.enter_row(node);
                self.stack.push(Frame { col: pick, node });
                Ok(())
            }
            DlxSolverState::Backtracking => {
                let frame = match self.stack.pop() {
                    Some(f) => f,
                    None => {
                        self.state = DlxSolverState::Exhausted;
                        return Ok(());
                    }
                };
                self.leave_row(frame.node);
                let next = self.matrix.d(frame.node);
                if next != frame.col {
                    // Advance this level to its next candidate row.
                    self.enter_row(next);
                    self.stack.push(Frame { col: frame.col, node: next });
                    self.state = DlxSolverState::Advancing;
                } else {
                    // This level is out of rows; release its column and
                    // keep unwinding.
                    self.matrix.uncover(frame.col);
                }
                Ok(())
            }
        }
    }

    /// Minimum-remaining-rows column choice, ties going to the header
    /// encountered first when walking the ring from the root.
    fn min_count_column(&self) -> usize {
        let root = self.matrix.root();
        let mut pick = self.matrix.r(root);
        let mut h = self.matrix.r(pick);
        while h != root {
            if self.matrix.s(h) < self.matrix.s(pick) {
                pick = h;
            }
            h = self.matrix.r(h);
        }
        pick
    }

    /// Adds the row of `node` to the partial cover: marks its caller row
    /// selected and covers every other column the row satisfies, left to
    /// right. The node's own column was covered when this level branched.
    fn enter_row(&mut self, node: usize) {
        self.selected.insert(self.matrix.rm(node));
        let mut j = self.matrix.r(node);
        while j != node {
            let col = self.matrix.c(j);
            self.matrix.cover(col);
            j = self.matrix.r(j);
        }
    }

    /// Exact inverse of [`Self::enter_row`]: uncovers right to left, then
    /// unmarks the row.
    fn leave_row(&mut self, node: usize) {
        let mut j = self.matrix.l(node);
        while j != node {
            let col = self.matrix.c(j);
            self.matrix.uncover(col);
            j = self.matrix.l(j);
        }
        self.selected.remove(self.matrix.rm(node));
    }
}

/// Runs the search to the first cover. Wraps [`DlxSolver`] the way most
/// callers want it: hand over the matrix (optionally with forced rows)
/// and ask for the answer.
pub struct FindFirstCover<I: LinkInt>(DlxSolver<I>);

impl <I: LinkInt> DlxSolverView for FindFirstCover<I> {
    fn get_state(&self) -> DlxSolverState {
        self.0.get_state()
    }

    fn is_done(&self) -> bool {
        self.0.is_done()
    }

    fn selection(&self) -> &RowSet {
        self.0.selection()
    }
}

impl <I: LinkInt> FindFirstCover<I> {
    pub fn new(matrix: Matrix<I>) -> Self {
        FindFirstCover(DlxSolver::new(matrix))
    }

    /// Forces the given rows into the cover before searching.
    pub fn with_forced(matrix: Matrix<I>, forced: &[usize]) -> Result<Self, Error> {
        let mut solver = DlxSolver::new(matrix);
        solver.force_rows(forced)?;
        Ok(FindFirstCover(solver))
    }

    pub fn step(&mut self) -> Result<&dyn DlxSolverView, Error> {
        self.0.step()?;
        Ok(&self.0)
    }

    /// Runs to completion. `Ok(None)` means no cover exists; it is not
    /// an error.
    pub fn solve(&mut self) -> Result<Option<&RowSet>, Error> {
        while !self.0.is_done() {
            self.0.step()?;
        }
        if self.0.get_state() == DlxSolverState::Solved {
            Ok(Some(self.0.selection()))
        } else {
            Ok(None)
        }
    }
}

/// Builds the structure and returns the first exact cover, if any.
pub fn first_cover<I: LinkInt>(
    num_cols: usize,
    num_rows: usize,
    incidences: &[Incidence],
) -> Result<Option<RowSet>, Error> {
    first_cover_with_forced::<I>(num_cols, num_rows, incidences, &[])
}

/// Same as [`first_cover`], with the given rows forced into the cover.
pub fn first_cover_with_forced<I: LinkInt>(
    num_cols: usize,
    num_rows: usize,
    incidences: &[Incidence],
    forced: &[usize],
) -> Result<Option<RowSet>, Error> {
    let matrix: Matrix<I> = Matrix::build(num_cols, num_rows, incidences)?;
    let mut finder = FindFirstCover::with_forced(matrix, forced)?;
    Ok(finder.solve()?.cloned())
}
