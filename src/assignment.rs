//! Pairing of existing tracks (rows) with new detections (columns).

use munkres::{solve_assignment, WeightMatrix};
use ndarray::ArrayView2;

/// Cost given to pairs that must never be chosen by the min-cost solver.
const UNMATCHED_COST: f32 = 1_000_000.0;

/// Turns a (tracks x detections) cost matrix into `(row, column)` pairs.
///
/// A pair is only returned if its cost does not exceed `threshold`. Rows and
/// columns appear at most once.
pub trait Assignment: std::fmt::Debug {
    fn assign(&self, cost: ArrayView2<'_, f32>, threshold: f32) -> Vec<(usize, usize)>;
}

/// Order-sensitive nearest-neighbour pairing.
///
/// Rows are visited by ascending row minimum (ties keep row order). Every row
/// only ever tries its own nearest column (first one on ties); when that
/// column is already taken the row stays unmatched.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyAssignment;

impl Assignment for GreedyAssignment {
    fn assign(&self, cost: ArrayView2<'_, f32>, threshold: f32) -> Vec<(usize, usize)> {
        let (nrows, ncols) = cost.dim();
        if nrows == 0 || ncols == 0 {
            return Vec::new();
        }

        let nearest: Vec<(usize, f32)> = cost
            .outer_iter()
            .map(|row| {
                row.iter()
                    .copied()
                    .enumerate()
                    .fold((0, f32::INFINITY), |best, (col, d)| {
                        if d < best.1 {
                            (col, d)
                        } else {
                            best
                        }
                    })
            })
            .collect();

        let mut rows: Vec<usize> = (0..nrows).collect();
        rows.sort_by(|&a, &b| nearest[a].1.total_cmp(&nearest[b].1));

        let mut used_rows = vec![false; nrows];
        let mut used_cols = vec![false; ncols];
        let mut pairs = Vec::new();

        for row in rows {
            let (col, d) = nearest[row];

            if used_rows[row] || used_cols[col] || d > threshold {
                continue;
            }

            used_rows[row] = true;
            used_cols[col] = true;
            pairs.push((row, col));
        }

        pairs
    }
}

/// Globally optimal pairing (Hungarian method), thresholded afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct MunkresAssignment;

impl Assignment for MunkresAssignment {
    fn assign(&self, cost: ArrayView2<'_, f32>, threshold: f32) -> Vec<(usize, usize)> {
        let (nrows, ncols) = cost.dim();
        if nrows == 0 || ncols == 0 {
            return Vec::new();
        }

        let n = nrows.max(ncols);
        let mut mat = WeightMatrix::from_fn(n, |(r, c)| {
            if r < nrows && c < ncols && cost[[r, c]] <= threshold {
                cost[[r, c]]
            } else {
                UNMATCHED_COST
            }
        });

        match solve_assignment(&mut mat) {
            Ok(positions) => positions
                .into_iter()
                .filter(|p| p.row < nrows && p.column < ncols)
                .filter(|p| cost[[p.row, p.column]] <= threshold)
                .map(|p| (p.row, p.column))
                .collect(),
            Err(err) => {
                log::warn!("assignment could not be solved: {:?}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn greedy_visits_rows_by_their_minimum() {
        let cost = array![[5.0, 50.0], [1.0, 60.0]];
        let pairs = GreedyAssignment.assign(cost.view(), 100.0);

        // row 1 has the smaller minimum and takes column 0 first; row 0
        // wanted column 0 as well and is left unmatched
        assert_eq!(pairs, vec![(1, 0)]);
    }

    #[test]
    fn greedy_respects_threshold_inclusively() {
        let cost = array![[100.0], [100.5]];
        assert_eq!(GreedyAssignment.assign(cost.view(), 100.0), vec![(0, 0)]);

        let cost = array![[100.5]];
        assert!(GreedyAssignment.assign(cost.view(), 100.0).is_empty());
    }

    #[test]
    fn greedy_ties_keep_row_order() {
        let cost = array![[3.0, 9.0], [3.0, 9.0]];
        assert_eq!(GreedyAssignment.assign(cost.view(), 100.0), vec![(0, 0)]);
    }

    #[test]
    fn greedy_matches_disjoint_pairs() {
        let cost = array![[2.0, 80.0, 90.0], [70.0, 4.0, 90.0]];
        let pairs = GreedyAssignment.assign(cost.view(), 100.0);
        assert_eq!(pairs, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn empty_matrices() {
        let cost = ndarray::Array2::<f32>::zeros((0, 3));
        assert!(GreedyAssignment.assign(cost.view(), 100.0).is_empty());
        assert!(MunkresAssignment.assign(cost.view(), 100.0).is_empty());
    }

    #[test]
    fn munkres_finds_the_global_optimum() {
        let cost = array![[5.0, 50.0], [1.0, 60.0]];
        let mut pairs = MunkresAssignment.assign(cost.view(), 100.0);
        pairs.sort();

        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn munkres_drops_pairs_over_threshold() {
        let cost = array![[5.0, 500.0], [1.0, 600.0]];
        let pairs = MunkresAssignment.assign(cost.view(), 100.0);

        assert_eq!(pairs.len(), 1);
        let (row, col) = pairs[0];
        assert_eq!(col, 0);
        assert!(row == 0 || row == 1);
    }
}
