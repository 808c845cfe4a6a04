use itertools::Itertools;
use crate::core::{Error, Incidence, RowSet};
use crate::matrix::Matrix;
use crate::solver::FindFirstCover;

const BAD_PARAMETERS: Error = Error::new_const("Design parameters must satisfy 1 <= t <= k <= v");

/// Binomial coefficient, 0 when r > n.
pub fn ncr(n: usize, r: usize) -> usize {
    if n < r {
        return 0;
    }
    let r = r.min(n - r);
    let mut f: u128 = 1;
    for i in 0..r {
        // The division is exact: f passes through C(n, 1), C(n, 2), ...
        f = f * (n - i) as u128 / (i + 1) as u128;
    }
    f as usize
}

/// Lexicographic rank of a strictly increasing k-subset of [0, v).
pub fn rank_ksubset(v: usize, set: &[usize]) -> usize {
    let k = set.len();
    let mut rank = 0;
    let mut next = 0;
    for (i, &e) in set.iter().enumerate() {
        for x in next..e {
            rank += ncr(v - 1 - x, k - 1 - i);
        }
        next = e + 1;
    }
    rank
}

/// Inverse of [`rank_ksubset`]: the k-subset of [0, v) with the given
/// lexicographic rank.
pub fn unrank_ksubset(v: usize, k: usize, rank: usize) -> Vec<usize> {
    let mut rank = rank;
    let mut set = Vec::with_capacity(k);
    let mut x = 0;
    for i in 0..k {
        loop {
            let with_x = ncr(v - 1 - x, k - 1 - i);
            if rank < with_x {
                break;
            }
            rank -= with_x;
            x += 1;
        }
        set.push(x);
        x += 1;
    }
    set
}

/// A t-(v, k, 1) design: a family of k-subsets ("blocks") of a v-set
/// such that every t-subset occurs in exactly one block. Steiner triple
/// systems are the t = 2, k = 3 case.
///
/// As an exact cover problem the columns are the C(v, t) t-subsets by
/// lexicographic rank and the rows are the C(v, k) k-subsets; a row
/// covers each t-subset its block contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TDesign {
    t: usize,
    v: usize,
    k: usize,
}

impl TDesign {
    pub fn new(t: usize, v: usize, k: usize) -> Result<Self, Error> {
        if t < 1 || t > k || k > v {
            return Err(BAD_PARAMETERS);
        }
        Ok(TDesign { t, v, k })
    }

    pub fn num_cols(&self) -> usize {
        ncr(self.v, self.t)
    }

    pub fn num_rows(&self) -> usize {
        ncr(self.v, self.k)
    }

    /// One cover row per k-subset, in rank order; within a row, one node
    /// per t-subset of the block. The node order follows the choice of
    /// positions within the block, so the column ranks of a row are not
    /// sorted in general.
    pub fn incidences(&self) -> Vec<Incidence> {
        let mut positions = Vec::with_capacity(self.num_rows() * ncr(self.k, self.t));
        for (row, kset) in (0..self.v).combinations(self.k).enumerate() {
            for choice in (0..self.k).combinations(self.t) {
                let tset: Vec<usize> = choice.iter().map(|&i| kset[i]).collect();
                positions.push(Incidence::new(row, rank_ksubset(self.v, &tset)));
            }
        }
        positions
    }

    /// Decodes selected cover rows back into blocks.
    pub fn blocks(&self, cover: &RowSet) -> Vec<Vec<usize>> {
        cover.iter().map(|r| unrank_ksubset(self.v, self.k, r)).collect()
    }

    /// Builds the cover problem and returns the blocks of the first
    /// design found, or `None` when no such design exists (for example
    /// STS(8): a 2-(8, 3, 1) design fails the divisibility conditions).
    pub fn solve(&self) -> Result<Option<Vec<Vec<usize>>>, Error> {
        let matrix: Matrix<u32> =
            Matrix::build(self.num_cols(), self.num_rows(), &self.incidences())?;
        let mut finder = FindFirstCover::new(matrix);
        Ok(finder.solve()?.map(|cover| self.blocks(cover)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use super::*;

    /// Every t-subset of [0, v) must occur in exactly one block.
    fn assert_design(t: usize, v: usize, blocks: &[Vec<usize>]) {
        let mut covered = HashSet::new();
        for block in blocks {
            for tset in block.iter().copied().combinations(t) {
                assert!(covered.insert(tset.clone()),
                        "{:?} appears in more than one block", tset);
            }
        }
        assert_eq!(covered.len(), ncr(v, t), "some t-subset is uncovered");
    }

    #[test]
    fn ncr_values() {
        assert_eq!(ncr(11, 4), 330);
        assert_eq!(ncr(11, 7), 330);
        assert_eq!(ncr(7, 2), 21);
        assert_eq!(ncr(15, 3), 455);
        assert_eq!(ncr(4, 0), 1);
        assert_eq!(ncr(3, 5), 0);
        assert_eq!(ncr(52, 26), 495_918_532_948_104);
    }

    #[test]
    fn rank_and_unrank_are_inverse() {
        let (v, k) = (8, 3);
        for rank in 0..ncr(v, k) {
            let set = unrank_ksubset(v, k, rank);
            assert_eq!(set.len(), k);
            assert!(set.windows(2).all(|w| w[0] < w[1]));
            assert!(set.iter().all(|&e| e < v));
            assert_eq!(rank_ksubset(v, &set), rank);
        }
    }

    #[test]
    fn rank_matches_lexicographic_enumeration() {
        for (i, set) in (0..6).combinations(4).enumerate() {
            assert_eq!(rank_ksubset(6, &set), i);
            assert_eq!(unrank_ksubset(6, 4, i), set);
        }
    }

    #[test]
    fn parameters_are_validated() {
        assert!(TDesign::new(0, 7, 3).is_err());
        assert!(TDesign::new(4, 7, 3).is_err());
        assert!(TDesign::new(2, 3, 7).is_err());
        assert!(TDesign::new(2, 7, 3).is_ok());
    }

    #[test]
    fn steiner_triple_system_of_order_7() {
        let design = TDesign::new(2, 7, 3).unwrap();
        assert_eq!(design.num_cols(), 21);
        assert_eq!(design.num_rows(), 35);
        assert_eq!(design.incidences().len(), 105);

        let blocks = design.solve().unwrap().expect("STS(7) exists");
        assert_eq!(blocks.len(), 7);
        assert_design(2, 7, &blocks);
    }

    #[test]
    fn no_steiner_triple_system_of_order_8() {
        let design = TDesign::new(2, 8, 3).unwrap();
        assert_eq!(design.solve().unwrap(), None);
    }

    #[test]
    fn steiner_triple_system_of_order_15() {
        let design = TDesign::new(2, 15, 3).unwrap();
        let blocks = design.solve().unwrap().expect("STS(15) exists");
        assert_eq!(blocks.len(), 35);
        assert_design(2, 15, &blocks);
    }

    #[test]
    fn steiner_quadruple_systems() {
        let design = TDesign::new(3, 8, 4).unwrap();
        let blocks = design.solve().unwrap().expect("SQS(8) exists");
        assert_eq!(blocks.len(), 14);
        assert_design(3, 8, &blocks);

        let design = TDesign::new(3, 10, 4).unwrap();
        let blocks = design.solve().unwrap().expect("SQS(10) exists");
        assert_eq!(blocks.len(), 30);
        assert_design(3, 10, &blocks);
    }
}
