use crate::core::{Error, Incidence, RowSet};
use crate::matrix::Matrix;
use crate::solver::FindFirstCover;

pub const OUT_OF_BOUNDS_ERROR: Error = Error::new_const("Out of bounds");
pub const BAD_DIGIT_ERROR: Error = Error::new_const("Digit out of range");
pub const ALREADY_FILLED_ERROR: Error = Error::new_const("Cell already filled");
const BOARD_TOO_BIG_FOR_STRING: Error =
    Error::new_const("Single-character parsing only works up to 9 digits");

/// An order-N Sudoku board: N²×N² cells holding digits 1..=N², some of
/// them given. Standard Sudoku is N = 3.
///
/// The board reduces to an exact cover problem with four column classes
/// of N⁴ each: row i holds digit n, column j holds digit n, box b holds
/// digit n, and cell (i, j) is occupied. Each candidate placement
/// (i, j, n) is one cover row with one entry in each class; the givens
/// become forced rows.
#[derive(Debug, Clone)]
pub struct Sudoku<const N: usize = 3> {
    givens: Box<[Option<u8>]>,
}

impl <const N: usize> Sudoku<N> {
    /// Cells per side, and equally the number of digits.
    pub const fn side() -> usize {
        N * N
    }

    pub const fn num_cols() -> usize {
        4 * Self::side() * Self::side()
    }

    pub const fn num_rows() -> usize {
        Self::side() * Self::side() * Self::side()
    }

    pub fn new() -> Self {
        Sudoku {
            givens: vec![None; Self::side() * Self::side()].into_boxed_slice(),
        }
    }

    /// Parses the canonical puzzle string: one character per cell in
    /// reading order, `'0'` or `'.'` for an empty cell.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let side = Self::side();
        if side > 9 {
            return Err(BOARD_TOO_BIG_FOR_STRING);
        }
        let mut board = Self::new();
        let cells: Vec<char> = s.chars().collect();
        if cells.len() != side * side {
            return Err(Error::new(format!(
                "Expected {} cells, got {}", side * side, cells.len())));
        }
        for (pos, ch) in cells.into_iter().enumerate() {
            match ch {
                '0' | '.' => {}
                '1'..='9' => {
                    let digit = ch as u8 - b'0';
                    board.set(pos / side, pos % side, digit)?;
                }
                _ => return Err(Error::new(format!("Invalid cell character: {}", ch))),
            }
        }
        Ok(board)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.givens[row * Self::side() + col]
    }

    pub fn set(&mut self, row: usize, col: usize, digit: u8) -> Result<(), Error> {
        let side = Self::side();
        if row >= side || col >= side {
            return Err(OUT_OF_BOUNDS_ERROR);
        }
        if digit == 0 || digit as usize > side {
            return Err(BAD_DIGIT_ERROR);
        }
        if self.givens[row * side + col].is_some() {
            return Err(ALREADY_FILLED_ERROR);
        }
        self.givens[row * side + col] = Some(digit);
        Ok(())
    }

    /// The full incidence list for an order-N board, independent of any
    /// givens: one cover row per (i, j, n) candidate with entries in the
    /// four column classes, in class order.
    pub fn incidences() -> Vec<Incidence> {
        let side = Self::side();
        let class = side * side;
        let mut positions = Vec::with_capacity(4 * side * side * side);
        for i in 0..side {
            for j in 0..side {
                let b = (i / N) * N + j / N;
                for n in 0..side {
                    let row = (i * side + j) * side + n;
                    positions.push(Incidence::new(row, i * side + n));
                    positions.push(Incidence::new(row, class + j * side + n));
                    positions.push(Incidence::new(row, 2 * class + b * side + n));
                    positions.push(Incidence::new(row, 3 * class + i * side + j));
                }
            }
        }
        positions
    }

    /// The cover rows pinned down by the givens.
    pub fn forced_rows(&self) -> Vec<usize> {
        let side = Self::side();
        let mut forced = Vec::new();
        for i in 0..side {
            for j in 0..side {
                if let Some(digit) = self.givens[i * side + j] {
                    forced.push((i * side + j) * side + digit as usize - 1);
                }
            }
        }
        forced
    }

    /// Runs the cover search and decodes the first solution, if one
    /// exists. Givens that contradict each other outright (sharing a
    /// cover column) are rejected as an error rather than searched.
    pub fn solve(&self) -> Result<Option<SolvedBoard<N>>, Error> {
        let forced = self.forced_rows();
        if let Some(clash) = self.conflicting_givens() {
            return Err(Error::new(clash));
        }
        let matrix: Matrix<u32> =
            Matrix::build(Self::num_cols(), Self::num_rows(), &Self::incidences())?;
        let mut finder = FindFirstCover::with_forced(matrix, &forced)?;
        let cover = match finder.solve()? {
            Some(rows) => rows,
            None => return Ok(None),
        };
        Ok(Some(SolvedBoard::decode(cover)))
    }

    /// Reports a description of the first pair of givens that collide on
    /// a row, column, box, or cell, if any.
    fn conflicting_givens(&self) -> Option<String> {
        let side = Self::side();
        for i in 0..side {
            for j in 0..side {
                let Some(d) = self.givens[i * side + j] else { continue };
                for i2 in 0..side {
                    for j2 in 0..side {
                        if (i2, j2) <= (i, j) {
                            continue;
                        }
                        let Some(d2) = self.givens[i2 * side + j2] else { continue };
                        if d != d2 {
                            continue;
                        }
                        let same_row = i == i2;
                        let same_col = j == j2;
                        let same_box = (i / N, j / N) == (i2 / N, j2 / N);
                        if same_row || same_col || same_box {
                            return Some(format!(
                                "Givens at ({}, {}) and ({}, {}) both hold {}",
                                i, j, i2, j2, d));
                        }
                    }
                }
            }
        }
        None
    }
}

/// A fully decoded board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedBoard<const N: usize = 3> {
    cells: Box<[u8]>,
}

impl <const N: usize> SolvedBoard<N> {
    fn decode(cover: &RowSet) -> Self {
        let side = N * N;
        let mut cells = vec![0u8; side * side].into_boxed_slice();
        for r in cover.iter() {
            let n = r % side;
            let j = (r / side) % side;
            let i = r / (side * side);
            debug_assert_eq!(cells[i * side + j], 0, "cell decoded twice");
            cells[i * side + j] = n as u8 + 1;
        }
        SolvedBoard { cells }
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * N * N + col]
    }
}
