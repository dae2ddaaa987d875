/// A tracked 2-D pixel location, x to the right, y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn dist(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0, 0);
        assert_eq!(a.dist(&Point::new(3, 4)), 5.0);
        assert_eq!(a.dist(&Point::new(0, 0)), 0.0);
        assert_eq!(a.dist(&Point::new(-3, -4)), 5.0);
    }
}
