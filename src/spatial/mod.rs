use std::collections::HashMap;

use crate::types::{Rect, Vec2};

/// Buckets boxes into a uniform grid so point queries only touch nearby boxes.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Each box lands in every cell it overlaps.
    pub fn rebuild(&mut self, rects: &[Rect]) {
        self.clear();
        for (idx, rect) in rects.iter().enumerate() {
            if rect.width <= 0.0 || rect.height <= 0.0 {
                continue;
            }
            let (x0, y0) = self.cell_key(Vec2::new(rect.x, rect.y));
            let (x1, y1) = self.cell_key(Vec2::new(
                rect.right() - f32::EPSILON,
                rect.bottom() - f32::EPSILON,
            ));
            for cy in y0..=y1 {
                for cx in x0..=x1 {
                    self.cells.entry((cx, cy)).or_default().push(idx);
                }
            }
        }
    }

    /// Candidates whose cell contains `pos`; callers still test the exact box.
    pub fn query_point(&self, pos: Vec2, out: &mut Vec<usize>) {
        out.clear();
        if let Some(indices) = self.cells.get(&self.cell_key(pos)) {
            out.extend_from_slice(indices);
        }
    }

    fn cell_key(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod spatial_hash_new {
        use super::*;

        #[test]
        fn creates_with_valid_cell_size() {
            let hash = SpatialHash::new(10.0);
            assert_eq!(hash.cell_size, 10.0);
        }

        #[test]
        #[should_panic(expected = "cell_size must be positive and finite")]
        fn panics_with_zero_cell_size() {
            SpatialHash::new(0.0);
        }

        #[test]
        #[should_panic(expected = "cell_size must be positive and finite")]
        fn panics_with_infinite_cell_size() {
            SpatialHash::new(f32::INFINITY);
        }
    }

    mod spatial_hash_rebuild {
        use super::*;

        #[test]
        fn wide_box_spans_several_cells() {
            let mut hash = SpatialHash::new(4.0);
            hash.rebuild(&[Rect::new(0.0, 0.0, 10.0, 3.0)]);
            assert_eq!(hash.cells.len(), 3);
            assert!(hash.cells.contains_key(&(2, 0)));
            assert!(!hash.cells.contains_key(&(0, 1)));
        }

        #[test]
        fn empty_boxes_are_skipped() {
            let mut hash = SpatialHash::new(4.0);
            hash.rebuild(&[Rect::new(1.0, 1.0, 0.0, 3.0)]);
            assert!(hash.cells.is_empty());
        }

        #[test]
        fn clears_previous_data_on_rebuild() {
            let mut hash = SpatialHash::new(10.0);
            hash.rebuild(&[Rect::new(1.0, 1.0, 2.0, 2.0)]);
            hash.rebuild(&[Rect::new(15.0, 15.0, 2.0, 2.0)]);
            assert!(hash.cells.get(&(0, 0)).is_none());
            assert!(hash.cells.get(&(1, 1)).is_some());
        }
    }

    mod spatial_hash_query_point {
        use super::*;

        #[test]
        fn finds_boxes_sharing_the_cell() {
            let mut hash = SpatialHash::new(8.0);
            hash.rebuild(&[
                Rect::new(0.0, 0.0, 5.0, 3.0),
                Rect::new(6.0, 0.0, 5.0, 3.0),
                Rect::new(20.0, 0.0, 5.0, 3.0),
            ]);
            let mut out = Vec::new();
            hash.query_point(Vec2::new(7.0, 1.0), &mut out);
            assert!(out.contains(&0));
            assert!(out.contains(&1));
            assert!(!out.contains(&2));
        }

        #[test]
        fn returns_empty_for_isolated_query() {
            let mut hash = SpatialHash::new(10.0);
            hash.rebuild(&[Rect::new(1.0, 1.0, 2.0, 2.0)]);
            let mut out = vec![42];
            hash.query_point(Vec2::new(100.0, 100.0), &mut out);
            assert!(out.is_empty());
        }

        #[test]
        fn clear_empties_the_index() {
            let mut hash = SpatialHash::new(10.0);
            hash.rebuild(&[Rect::new(1.0, 1.0, 2.0, 2.0)]);
            hash.clear();
            let mut out = Vec::new();
            hash.query_point(Vec2::new(1.5, 1.5), &mut out);
            assert!(out.is_empty());
        }
    }
}
