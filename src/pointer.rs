// pointer.rs — pointer samples and move events in viewer-local coordinates

/// Bounding box of the element receiving pointer events, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// Pointer position inside the viewer plus the viewer size.
///
/// `y` grows upward from the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for PointerSample {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl PointerSample {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Converts client coordinates (y down) into a sample relative to `bounds`.
    pub fn from_client(client_x: f64, client_y: f64, bounds: Bounds) -> Self {
        Self {
            x: client_x - bounds.left,
            y: bounds.height - client_y + bounds.top,
            width: bounds.width,
            height: bounds.height,
        }
    }

    /// `(last - self)` on both axes.
    pub fn delta_from(&self, last: &PointerSample) -> (f64, f64) {
        (last.x - self.x, last.y - self.y)
    }
}

/// One pointer-move event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMove {
    pub client_x: f64,
    pub client_y: f64,
    pub bounds: Bounds,
    pub primary_down: bool,
    pub shift: bool,
}

impl PointerMove {
    pub fn sample(&self) -> PointerSample {
        PointerSample::from_client(self.client_x, self.client_y, self.bounds)
    }
}
