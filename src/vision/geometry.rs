//! Bounding box geometry for OCR fragments

use std::fmt;

/// A pixel position on the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Quadrilateral around a detected text line.
///
/// Points are kept in the winding order the OCR backend produces them
/// (top-left, top-right, bottom-right, bottom-left). The derived ordering
/// compares the flattened `x0 y0 x1 y1 ... y3` sequence lexicographically,
/// which is the reading order used by every recognition stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BoundingBox {
    points: [Point; 4],
}

impl BoundingBox {
    /// Create a box from its four corners
    pub const fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Create a box from the flat `[x0, y0, x1, y1, x2, y2, x3, y3]` form
    pub const fn from_flat(c: [i32; 8]) -> Self {
        Self {
            points: [
                Point::new(c[0], c[1]),
                Point::new(c[2], c[3]),
                Point::new(c[4], c[5]),
                Point::new(c[6], c[7]),
            ],
        }
    }

    /// Axis-aligned rectangle with its origin at `(x, y)`
    pub const fn from_rect(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::from_flat([x, y, x + width, y, x + width, y + height, x, y + height])
    }

    /// Corner points in winding order
    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    /// First corner, used as the box position for distance computations
    pub fn origin(&self) -> Point {
        self.points[0]
    }

    /// Flat coordinate form, the inverse of [`BoundingBox::from_flat`]
    pub fn to_flat(&self) -> [i32; 8] {
        let [p, q, r, s] = self.points;
        [p.x, p.y, q.x, q.y, r.x, r.y, s.x, s.y]
    }
}

impl TryFrom<&[i32]> for BoundingBox {
    type Error = usize;

    /// Fails with the slice length when it does not hold exactly 8 coordinates
    fn try_from(coords: &[i32]) -> Result<Self, Self::Error> {
        let flat: [i32; 8] = coords.try_into().map_err(|_| coords.len())?;
        Ok(Self::from_flat(flat))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x0, y0, x1, y1, x2, y2, x3, y3] = self.to_flat();
        write!(f, "{x0} {y0} {x1} {y1} {x2} {y2} {x3} {y3}")
    }
}

/// Squared Euclidean distance between two box origins.
///
/// The reference box is an explicit argument so nearest-box searches can
/// pass it through a comparator without capturing loop state.
pub fn squared_distance(reference: &BoundingBox, candidate: &BoundingBox) -> i64 {
    let a = reference.origin();
    let b = candidate.origin();
    let dx = i64::from(a.x) - i64::from(b.x);
    let dy = i64::from(a.y) - i64::from(b.y);
    dx * dx + dy * dy
}
