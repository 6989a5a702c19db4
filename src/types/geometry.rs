use serde::{Deserialize, Serialize};

/// Rectangle in device-independent units, relative to the hosting window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A region with no visible area is never pushed to surfaces.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Whether `point` lies inside the region (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }
}

impl Default for Region {
    /// Content area of a 1280x800 window with a 260 wide sidebar and a 48 high toolbar.
    fn default() -> Self {
        Self {
            x: 260.0,
            y: 48.0,
            width: 1020.0,
            height: 752.0,
        }
    }
}

/// Pointer position in the same coordinate space as [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
