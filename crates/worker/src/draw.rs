//! Software path rendering shared by the visualizers and the gesture
//! rasterizer.

use tracker::Point;

/// Thickness taper: early (older) segments draw thicker than recent ones,
/// so the rendered trail fades toward the wand tip.
pub fn segment_thickness(path_len: usize, segment: usize) -> i32 {
    ((path_len as f64 / (segment + 1) as f64).sqrt() * 2.5) as i32
}

/// Walk the segment from `a` to `b`, stamping a filled square of side
/// `thickness` at every pixel. Plot receives coordinates that may be out of
/// bounds; callers clip.
pub fn draw_segment(a: Point, b: Point, thickness: i32, mut plot: impl FnMut(i32, i32)) {
    let r = (thickness / 2).max(0);
    let mut stamp = |cx: i32, cy: i32| {
        for dy in -r..=r {
            for dx in -r..=r {
                plot(cx + dx, cy + dy);
            }
        }
    };

    // Bresenham.
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (a.x, a.y);

    loop {
        stamp(x, y);
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw the whole path into a packed RGB frame.
pub fn draw_path_rgb(frame: &mut [u8], width: u32, height: u32, path: &[Point], color: [u8; 3]) {
    for i in 1..path.len() {
        let thickness = segment_thickness(path.len(), i);
        draw_segment(path[i - 1], path[i], thickness, |x, y| {
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                let idx = (y as u32 * width + x as u32) as usize * 3;
                frame[idx..idx + 3].copy_from_slice(&color);
            }
        });
    }
}

/// Draw the whole path into a single-channel frame.
pub fn draw_path_luma(frame: &mut [u8], width: u32, height: u32, path: &[Point], value: u8) {
    for i in 1..path.len() {
        let thickness = segment_thickness(path.len(), i);
        draw_segment(path[i - 1], path[i], thickness, |x, y| {
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                frame[(y as u32 * width + x as u32) as usize] = value;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thickness_tapers_toward_recent_segments() {
        let len = 60;
        assert!(segment_thickness(len, 1) > segment_thickness(len, 59));
        assert!(segment_thickness(len, 59) >= 2);
    }

    #[test]
    fn horizontal_segment_covers_every_column() {
        let mut hits = Vec::new();
        draw_segment(Point::new(0, 0), Point::new(4, 0), 1, |x, y| hits.push((x, y)));
        for x in 0..=4 {
            assert!(hits.contains(&(x, 0)), "missing column {x}");
        }
    }

    #[test]
    fn diagonal_segment_is_connected() {
        let mut hits = std::collections::HashSet::new();
        draw_segment(Point::new(0, 0), Point::new(5, 3), 1, |x, y| {
            hits.insert((x, y));
        });
        assert!(hits.contains(&(0, 0)));
        assert!(hits.contains(&(5, 3)));
        assert!(hits.len() >= 6);
    }

    #[test]
    fn single_point_path_draws_nothing() {
        let mut frame = vec![0u8; 8 * 8];
        draw_path_luma(&mut frame, 8, 8, &[Point::new(3, 3)], 255);
        assert!(frame.iter().all(|&b| b == 0), "paths need two points");
    }

    #[test]
    fn out_of_bounds_points_are_clipped() {
        let mut frame = vec![0u8; 8 * 8 * 3];
        let path = [Point::new(-10, -10), Point::new(20, 20)];
        draw_path_rgb(&mut frame, 8, 8, &path, [255, 0, 0]);
        // No panic, and the in-bounds diagonal got painted.
        assert!(frame.iter().any(|&b| b == 255));
    }
}
