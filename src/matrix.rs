use crate::core::{Error, Incidence, LinkInt};

const NO_COLUMNS: Error = Error::new_const("Must have at least one column");
const NO_ROWS: Error = Error::new_const("Must have at least one row");
const EMPTY_PROBLEM: Error = Error::new_const("Incidence list must not be empty");
const COLUMN_OUT_OF_RANGE: Error = Error::new_const("Incidence column out of range");
const ROW_OUT_OF_RANGE: Error = Error::new_const("Incidence row out of range");
const ROWS_NOT_CONTIGUOUS: Error = Error::new_const("Incidences of a row must be contiguous");

/// The toroidal structure Algorithm X dances on.
///
/// Rather than cross-linked node allocations (whose aliasing the borrow
/// checker rightly hates), every slot lives in one flat index space of
/// `num_cols + 1 + num_nodes` entries: column headers first, the root at
/// `num_cols`, then one data node per incidence in input order. The link
/// "pointers" are indices into parallel arrays, so splicing a node out of
/// a ring and back in never touches an allocator.
///
/// Field names follow the usual presentation of the algorithm: `l`/`r`
/// and `u`/`d` are the horizontal and vertical rings, `c` points a node
/// at its column header, `s` counts the live nodes of each column, and
/// `rm` maps a node back to the caller's row id (headers and the root
/// carry `num_rows` there as a sentinel).
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<I: LinkInt> {
    l: Vec<I>,
    r: Vec<I>,
    u: Vec<I>,
    d: Vec<I>,
    c: Vec<I>,
    s: Vec<usize>,
    rm: Vec<usize>,
    row_first: Vec<Option<I>>,
    num_cols: usize,
    num_rows: usize,
    num_nodes: usize,
}

impl <I: LinkInt> Matrix<I> {
    /// Builds the structure from a row-grouped incidence list.
    ///
    /// The list length is the node capacity. Out-of-range ids, a row whose
    /// entries are not contiguous, or a slot count that does not fit the
    /// link width are rejected up front; after that the structure is only
    /// ever mutated by matched cover/uncover pairs.
    pub fn build(
        num_cols: usize,
        num_rows: usize,
        incidences: &[Incidence],
    ) -> Result<Self, Error> {
        if num_cols == 0 {
            return Err(NO_COLUMNS);
        }
        if num_rows == 0 {
            return Err(NO_ROWS);
        }
        if incidences.is_empty() {
            return Err(EMPTY_PROBLEM);
        }
        let num_nodes = incidences.len();
        let dim = num_cols + 1 + num_nodes;
        if dim - 1 > I::max_index() {
            return Err(Error::new(format!(
                "{} slots do not fit the chosen link width", dim)));
        }

        let mut m = Matrix {
            l: vec![I::zero(); dim],
            r: vec![I::zero(); dim],
            u: vec![I::zero(); dim],
            d: vec![I::zero(); dim],
            c: vec![I::zero(); dim],
            s: vec![0; num_cols + 1],
            rm: vec![num_rows; dim],
            row_first: vec![None; num_rows],
            num_cols,
            num_rows,
            num_nodes,
        };

        // Header ring. The root sits at `num_cols`, between the last
        // column and column 0.
        let ring = num_cols + 1;
        for i in 0..ring {
            m.set_u(i, i);
            m.set_d(i, i);
            m.set_c(i, i);
            m.set_r(i, (i + 1) % ring);
            m.set_l(i, (i + ring - 1) % ring);
        }

        // Data nodes, one maximal run of equal row ids at a time.
        let mut k = 0;
        while k < num_nodes {
            let row = incidences[k].row;
            if row >= num_rows {
                return Err(ROW_OUT_OF_RANGE);
            }
            if m.row_first[row].is_some() {
                return Err(ROWS_NOT_CONTIGUOUS);
            }
            let start = k;
            let mut end = k;
            while end < num_nodes && incidences[end].row == row {
                end += 1;
            }
            m.row_first[row] = Some(I::from_usize(ring + start));

            for idx in start..end {
                let col = incidences[idx].col;
                if col >= num_cols {
                    return Err(COLUMN_OUT_OF_RANGE);
                }
                let slot = ring + idx;
                m.set_c(slot, col);
                m.rm[slot] = row;

                // Splice into the bottom of the column's vertical ring.
                let bottom = m.u(col);
                m.set_u(slot, bottom);
                m.set_d(slot, col);
                m.set_d(bottom, slot);
                m.set_u(col, slot);
                m.s[col] += 1;

                // Horizontal ring within the row. Earlier entries of the
                // run are already linked; reflecting the new node's links
                // closes the ring once the run ends.
                m.set_l(slot, if idx > start { slot - 1 } else { slot });
                m.set_r(slot, if idx + 1 < end { slot + 1 } else { ring + start });
                let rgt = m.r(slot);
                let lft = m.l(slot);
                m.set_l(rgt, slot);
                m.set_r(lft, slot);
            }
            k = end;
        }
        Ok(m)
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// The sentinel header whose horizontal ring holds every live column.
    pub(crate) fn root(&self) -> usize {
        self.num_cols
    }

    pub(crate) fn first_node_of_row(&self, row: usize) -> Option<usize> {
        self.row_first.get(row).copied().flatten().map(|i| i.as_usize())
    }

    // Link accessors, keeping the width conversions in one place so the
    // algorithm code reads like the textbook version.

    pub(crate) fn l(&self, i: usize) -> usize {
        self.l[i].as_usize()
    }

    pub(crate) fn r(&self, i: usize) -> usize {
        self.r[i].as_usize()
    }

    pub(crate) fn u(&self, i: usize) -> usize {
        self.u[i].as_usize()
    }

    pub(crate) fn d(&self, i: usize) -> usize {
        self.d[i].as_usize()
    }

    pub(crate) fn c(&self, i: usize) -> usize {
        self.c[i].as_usize()
    }

    pub(crate) fn s(&self, h: usize) -> usize {
        self.s[h]
    }

    pub(crate) fn rm(&self, i: usize) -> usize {
        self.rm[i]
    }

    fn set_l(&mut self, i: usize, v: usize) {
        self.l[i] = I::from_usize(v);
    }

    fn set_r(&mut self, i: usize, v: usize) {
        self.r[i] = I::from_usize(v);
    }

    fn set_u(&mut self, i: usize, v: usize) {
        self.u[i] = I::from_usize(v);
    }

    fn set_d(&mut self, i: usize, v: usize) {
        self.d[i] = I::from_usize(v);
    }

    fn set_c(&mut self, i: usize, v: usize) {
        self.c[i] = I::from_usize(v);
    }

    /// Whether header `h` is still threaded into the root ring.
    pub(crate) fn is_live_header(&self, h: usize) -> bool {
        self.r(self.l(h)) == h
    }

    /// Covers column `h`: splices it out of the header ring, then removes
    /// every row intersecting it from the other columns' vertical rings
    /// (top-down, left-to-right). The removed nodes keep their own links,
    /// which is what makes `uncover` possible.
    pub(crate) fn cover(&mut self, h: usize) {
        debug_assert!(h < self.num_cols, "not a column header: {}", h);
        debug_assert!(self.is_live_header(h), "column {} already covered", h);

        let (hl, hr) = (self.l(h), self.r(h));
        self.set_l(hr, hl);
        self.set_r(hl, hr);

        let mut i = self.d(h);
        while i != h {
            let mut j = self.r(i);
            while j != i {
                let (ju, jd) = (self.u(j), self.d(j));
                self.set_u(jd, ju);
                self.set_d(ju, jd);
                let col = self.c(j);
                self.s[col] -= 1;
                j = self.r(j);
            }
            i = self.d(i);
        }
    }

    /// Exact inverse of [`Self::cover`], in the opposite traversal order
    /// (bottom-up, right-to-left). Must only be called when the structure
    /// is in the state the matching `cover(h)` produced, possibly with
    /// balanced cover/uncover pairs in between.
    pub(crate) fn uncover(&mut self, h: usize) {
        debug_assert!(h < self.num_cols, "not a column header: {}", h);

        let mut i = self.u(h);
        while i != h {
            let mut j = self.l(i);
            while j != i {
                let col = self.c(j);
                self.s[col] += 1;
                let (ju, jd) = (self.u(j), self.d(j));
                self.set_d(ju, j);
                self.set_u(jd, j);
                j = self.l(j);
            }
            i = self.u(i);
        }

        let (hl, hr) = (self.l(h), self.r(h));
        self.set_r(hl, h);
        self.set_l(hr, h);
    }
}

#[cfg(test)]
impl <I: LinkInt> Matrix<I> {
    /// Structural checks that must hold whenever the matrix is quiescent:
    /// both rings are symmetric at every slot, and each live column's
    /// count matches a walk of its vertical ring.
    pub(crate) fn check_links(&self) {
        let dim = self.num_cols + 1 + self.num_nodes;
        for i in 0..dim {
            assert_eq!(self.r(self.l(i)), i, "horizontal asymmetry at slot {}", i);
            assert_eq!(self.l(self.r(i)), i, "horizontal asymmetry at slot {}", i);
            assert_eq!(self.d(self.u(i)), i, "vertical asymmetry at slot {}", i);
            assert_eq!(self.u(self.d(i)), i, "vertical asymmetry at slot {}", i);
        }
        let root = self.root();
        let mut h = self.r(root);
        while h != root {
            let mut count = 0;
            let mut i = self.d(h);
            while i != h {
                count += 1;
                i = self.d(i);
            }
            assert_eq!(count, self.s(h), "count mismatch for column {}", h);
            h = self.r(h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The 6-column toy problem:
    //    0 1 2 3 4 5
    // r0 1 0 1 0 1 0
    // r1 1 1 0 1 0 1
    // r2 0 1 0 1 0 0
    // r3 0 0 0 0 0 1
    fn toy_incidences() -> Vec<Incidence> {
        vec![
            Incidence::new(0, 0), Incidence::new(0, 2), Incidence::new(0, 4),
            Incidence::new(1, 0), Incidence::new(1, 1), Incidence::new(1, 3), Incidence::new(1, 5),
            Incidence::new(2, 1), Incidence::new(2, 3),
            Incidence::new(3, 5),
        ]
    }

    #[test]
    fn build_links_toy_problem() {
        let m: Matrix<u16> = Matrix::build(6, 4, &toy_incidences()).unwrap();
        m.check_links();
        assert_eq!(m.num_cols(), 6);
        assert_eq!(m.num_rows(), 4);
        assert_eq!(m.num_nodes(), 10);

        // Column populations.
        assert_eq!((0..6).map(|h| m.s(h)).collect::<Vec<_>>(), vec![2, 2, 1, 2, 1, 2]);

        // The root ring holds all six headers, in order.
        let root = m.root();
        let mut ring = Vec::new();
        let mut h = m.r(root);
        while h != root {
            ring.push(h);
            h = m.r(h);
        }
        assert_eq!(ring, vec![0, 1, 2, 3, 4, 5]);

        // Headers and the root carry the row sentinel; data nodes their row.
        assert_eq!(m.rm(0), 4);
        assert_eq!(m.rm(root), 4);
        assert_eq!(m.rm(7), 0);
        assert_eq!(m.first_node_of_row(0), Some(7));
        assert_eq!(m.first_node_of_row(3), Some(16));
        assert_eq!(m.first_node_of_row(4), None);

        // r1's horizontal ring, left to right from its first node.
        let first = m.first_node_of_row(1).unwrap();
        let mut row_cols = vec![m.c(first)];
        let mut j = m.r(first);
        while j != first {
            row_cols.push(m.c(j));
            j = m.r(j);
        }
        assert_eq!(row_cols, vec![0, 1, 3, 5]);
    }

    #[test]
    fn single_node_rows_self_link() {
        let m: Matrix<u16> = Matrix::build(2, 2,
            &[Incidence::new(0, 0), Incidence::new(1, 1)]).unwrap();
        m.check_links();
        let n = m.first_node_of_row(0).unwrap();
        assert_eq!(m.l(n), n);
        assert_eq!(m.r(n), n);
    }

    #[test]
    fn cover_removes_column_and_intersecting_rows() {
        let mut m: Matrix<u16> = Matrix::build(6, 4, &toy_incidences()).unwrap();
        m.cover(0);

        // Header 0 is out of the root ring; its neighbors joined up.
        assert!(!m.is_live_header(0));
        assert_eq!(m.r(m.root()), 1);
        assert_eq!(m.l(1), m.root());

        // r0 and r1 both used column 0, so their other nodes left their
        // columns: 2 and 4 are now empty, 1, 3 and 5 lost one node each.
        assert_eq!((1..6).map(|h| m.s(h)).collect::<Vec<_>>(), vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn cover_uncover_round_trips_bitwise() {
        let m: Matrix<u16> = Matrix::build(6, 4, &toy_incidences()).unwrap();
        let mut working = m.clone();

        working.cover(0);
        working.uncover(0);
        assert_eq!(working, m);

        // Balanced nested pairs restore the structure too.
        working.cover(3);
        working.cover(5);
        working.cover(2);
        working.uncover(2);
        working.uncover(5);
        working.uncover(3);
        assert_eq!(working, m);
        working.check_links();
    }

    #[test]
    fn build_rejects_malformed_input() {
        let toy = toy_incidences();
        assert!(Matrix::<u16>::build(0, 4, &toy).is_err());
        assert!(Matrix::<u16>::build(6, 0, &toy).is_err());
        assert!(Matrix::<u16>::build(6, 4, &[]).is_err());

        // Column and row ids must be in range.
        assert!(Matrix::<u16>::build(5, 4, &toy).is_err());
        assert!(Matrix::<u16>::build(6, 3, &toy).is_err());

        // A row id must not recur after its run ended.
        let split = vec![
            Incidence::new(0, 0),
            Incidence::new(1, 1),
            Incidence::new(0, 2),
        ];
        assert!(Matrix::<u16>::build(3, 2, &split).is_err());
    }

    #[test]
    fn build_rejects_links_wider_than_the_index_type() {
        // 300 single-node rows need more than 255 slots.
        let incidences: Vec<_> = (0..300).map(|r| Incidence::new(r, r % 4)).collect();
        assert!(Matrix::<u8>::build(4, 300, &incidences).is_err());
        assert!(Matrix::<u16>::build(4, 300, &incidences).is_ok());
    }
}
