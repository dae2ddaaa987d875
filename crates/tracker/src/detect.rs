use crate::point::Point;

/// Turns one grayscale frame into a set of candidate wand-tip locations.
///
/// Implementations must be deterministic in their return order; the
/// tracker's first-candidate rule depends on it.
pub trait PointDetector {
    fn detect(&mut self, luma: &[u8], width: u32, height: u32) -> Vec<Point>;
}

/// Connected-component detector for small bright spots (an IR-reflective
/// wand tip under an illuminator, or any bright point light).
///
/// Pixels at or above `threshold` are lit; 4-connected lit regions larger
/// than `max_area` are rejected as glare rather than a point source.
/// Centroids come back in raster scan order, top-left blob first, which
/// gives the tracker a deterministic tie-break.
pub struct BrightBlobDetector {
    pub threshold: u8,
    pub max_area: u32,
    visited: Vec<bool>,
    stack: Vec<usize>,
}

impl Default for BrightBlobDetector {
    fn default() -> Self {
        Self::new(150, 1000)
    }
}

impl BrightBlobDetector {
    pub fn new(threshold: u8, max_area: u32) -> Self {
        Self {
            threshold,
            max_area,
            visited: Vec::new(),
            stack: Vec::new(),
        }
    }
}

impl PointDetector for BrightBlobDetector {
    fn detect(&mut self, luma: &[u8], width: u32, height: u32) -> Vec<Point> {
        let width = width as usize;
        let height = height as usize;
        debug_assert_eq!(luma.len(), width * height);

        self.visited.clear();
        self.visited.resize(width * height, false);

        let mut points = Vec::new();

        for idx in 0..width * height {
            if self.visited[idx] || luma[idx] < self.threshold {
                continue;
            }

            let (area, sum_x, sum_y) = fill_component(
                luma,
                width,
                height,
                self.threshold,
                idx,
                &mut self.visited,
                &mut self.stack,
            );
            if area > self.max_area {
                continue;
            }

            points.push(Point::new(
                (sum_x as f64 / area as f64).round() as i32,
                (sum_y as f64 / area as f64).round() as i32,
            ));
        }

        points
    }
}

/// Flood-fill the lit 4-connected component containing `start`.
/// Returns (area, sum of x coordinates, sum of y coordinates).
fn fill_component(
    luma: &[u8],
    width: usize,
    height: usize,
    threshold: u8,
    start: usize,
    visited: &mut [bool],
    stack: &mut Vec<usize>,
) -> (u32, u64, u64) {
    stack.clear();
    stack.push(start);
    visited[start] = true;

    let mut area = 0u32;
    let mut sum_x = 0u64;
    let mut sum_y = 0u64;

    while let Some(idx) = stack.pop() {
        let x = idx % width;
        let y = idx / width;
        area += 1;
        sum_x += x as u64;
        sum_y += y as u64;

        let mut visit = |nidx: usize| {
            if !visited[nidx] && luma[nidx] >= threshold {
                visited[nidx] = true;
                stack.push(nidx);
            }
        };

        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < width {
            visit(idx + 1);
        }
        if y > 0 {
            visit(idx - width);
        }
        if y + 1 < height {
            visit(idx + width);
        }
    }

    (area, sum_x, sum_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: usize, height: usize, lit: &[(usize, usize)]) -> Vec<u8> {
        let mut luma = vec![0u8; width * height];
        for &(x, y) in lit {
            luma[y * width + x] = 255;
        }
        luma
    }

    #[test]
    fn empty_frame_yields_no_candidates() {
        let mut d = BrightBlobDetector::default();
        assert!(d.detect(&vec![0u8; 64], 8, 8).is_empty());
    }

    #[test]
    fn single_blob_centroid() {
        let mut d = BrightBlobDetector::default();
        // 2x2 block with top-left corner at (3, 4).
        let luma = frame(16, 16, &[(3, 4), (4, 4), (3, 5), (4, 5)]);
        let points = d.detect(&luma, 16, 16);
        assert_eq!(points, vec![Point::new(4, 5)]); // 3.5, 4.5 rounds up
    }

    #[test]
    fn pixels_below_threshold_are_dark() {
        let mut d = BrightBlobDetector::new(150, 1000);
        let mut luma = vec![0u8; 64];
        luma[10] = 149;
        assert!(d.detect(&luma, 8, 8).is_empty());
        luma[10] = 150;
        assert_eq!(d.detect(&luma, 8, 8).len(), 1);
    }

    #[test]
    fn oversized_blob_is_rejected_as_glare() {
        let mut d = BrightBlobDetector::new(150, 8);
        // A 3x3 region (area 9) exceeds max_area 8.
        let lit: Vec<(usize, usize)> =
            (0..3).flat_map(|y| (0..3).map(move |x| (x, y))).collect();
        let luma = frame(16, 16, &lit);
        assert!(d.detect(&luma, 16, 16).is_empty());
    }

    #[test]
    fn blobs_come_back_in_scan_order() {
        let mut d = BrightBlobDetector::default();
        let luma = frame(16, 16, &[(10, 8), (2, 3), (14, 1)]);
        let points = d.detect(&luma, 16, 16);
        // Raster order: lowest y first, then lowest x.
        assert_eq!(
            points,
            vec![Point::new(14, 1), Point::new(2, 3), Point::new(10, 8)]
        );
    }

    #[test]
    fn diagonal_pixels_are_separate_blobs() {
        let mut d = BrightBlobDetector::default();
        // 4-connectivity: diagonal neighbors do not merge.
        let luma = frame(8, 8, &[(2, 2), (3, 3)]);
        assert_eq!(d.detect(&luma, 8, 8).len(), 2);
    }

    #[test]
    fn scratch_buffers_reset_between_frames() {
        let mut d = BrightBlobDetector::default();
        let luma = frame(8, 8, &[(1, 1)]);
        assert_eq!(d.detect(&luma, 8, 8).len(), 1);
        // Second pass over the same frame must not be poisoned by the
        // previous visited state.
        assert_eq!(d.detect(&luma, 8, 8).len(), 1);
    }

    #[test]
    fn irregular_component_centroid_is_rounded_mean() {
        let mut d = BrightBlobDetector::default();
        // L-shape: (5,5), (6,5), (5,6). Mean = (5.33, 5.33) -> (5, 5).
        let luma = frame(16, 16, &[(5, 5), (6, 5), (5, 6)]);
        assert_eq!(d.detect(&luma, 16, 16), vec![Point::new(5, 5)]);
    }
}
