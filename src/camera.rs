// camera.rs — trackball camera (orbit + roll) driven by pointer deltas

use glam::{DMat4, DVec3};
use std::f64::consts::TAU;

use crate::pointer::PointerSample;
use crate::state_token::{self, StateTokenError};

/// Camera direction before any interaction: looking down -Z from +Z.
pub const DEFAULT_POSITION: DVec3 = DVec3::Z;
pub const DEFAULT_VIEW_UP: DVec3 = DVec3::Y;

/// Re-orthonormalizes a (position, view up) pair.
///
/// `view_up` is projected onto the plane perpendicular to `position` through
/// two cross products, then both vectors are scaled to unit length. A
/// degenerate pair (zero or parallel vectors) comes back as zero vectors.
pub fn orthogonalize(position: DVec3, view_up: DVec3) -> (DVec3, DVec3) {
    let direction = position.cross(view_up);
    let view_up = direction.cross(position).normalize_or_zero();
    (position.normalize_or_zero(), view_up)
}

/// Unit camera frame on a sphere around the focal point.
///
/// `position` and `view_up` stay unit length and orthogonal after every
/// public mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    position: DVec3,
    view_up: DVec3,
    rotation_factor: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl OrbitCamera {
    pub fn new(rotation_factor: f64) -> Self {
        Self {
            position: DEFAULT_POSITION,
            view_up: DEFAULT_VIEW_UP,
            rotation_factor,
        }
    }

    /// Builds a camera from arbitrary vectors. Returns `None` when they cannot
    /// form a frame.
    pub fn from_vectors(position: DVec3, view_up: DVec3, rotation_factor: f64) -> Option<Self> {
        let (position, view_up) = orthogonalize(position, view_up);
        if position == DVec3::ZERO || view_up == DVec3::ZERO || !view_up.is_finite() {
            return None;
        }
        Some(Self {
            position,
            view_up,
            rotation_factor,
        })
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn view_up(&self) -> DVec3 {
        self.view_up
    }

    pub fn rotation_factor(&self) -> f64 {
        self.rotation_factor
    }

    pub fn set_rotation_factor(&mut self, rotation_factor: f64) {
        self.rotation_factor = rotation_factor;
    }

    pub fn reset(&mut self) {
        self.position = DEFAULT_POSITION;
        self.view_up = DEFAULT_VIEW_UP;
    }

    pub fn orthogonalize(&mut self) {
        let (position, view_up) = orthogonalize(self.position, self.view_up);
        self.position = position;
        self.view_up = view_up;
    }

    /// Orbit: azimuth about the view up axis, elevation about the camera's
    /// right axis. Returns `false` when the viewport is empty or the drag
    /// produced no usable frame.
    pub fn rotate(&mut self, dx: f64, dy: f64, width: f64, height: f64) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }

        let azimuth = self.rotation_factor * TAU * dx / width;
        let elevation = -self.rotation_factor * TAU * dy / height;
        let right = self.view_up.cross(self.position);

        let transform = axis_rotation(self.view_up, azimuth) * axis_rotation(right, elevation);
        self.apply(transform)
    }

    /// Roll about the view axis. The dominant drag axis picks the angle and
    /// the pointer's side of the viewport picks its sign.
    ///
    /// Returns `false`, leaving the camera untouched, when the angle is zero.
    pub fn roll(&mut self, dx: f64, dy: f64, at: &PointerSample) -> bool {
        if at.width <= 0.0 || at.height <= 0.0 {
            return false;
        }

        let mut angle = self.rotation_factor * TAU;
        if dx.abs() > dy.abs() {
            angle *= dx / at.width;
            if at.y < at.height * 0.5 {
                angle = -angle;
            }
        } else {
            angle *= dy / at.height;
            if at.x > at.width * 0.5 {
                angle = -angle;
            }
        }

        if angle == 0.0 {
            return false;
        }

        self.apply(axis_rotation(self.position, -angle))
    }

    /// 8-character token of the current frame.
    pub fn encode_state(&self) -> String {
        state_token::encode_state(self.position, self.view_up)
    }

    /// Restores the frame from a token produced by [`OrbitCamera::encode_state`].
    /// On error the camera keeps its current frame.
    pub fn restore_state(&mut self, token: &str) -> Result<(), StateTokenError> {
        let (position, view_up) = state_token::decode_state(token)?;
        let restored = Self::from_vectors(position, view_up, self.rotation_factor)
            .ok_or(StateTokenError::Degenerate)?;
        *self = restored;
        Ok(())
    }

    // Moves the camera point and the point one unit "above" it, then reads the
    // new up vector back off the pair. A transform that leaves no usable frame
    // (non-finite input) is dropped and the camera stays where it was.
    fn apply(&mut self, transform: DMat4) -> bool {
        let new_position = transform.transform_point3(self.position);
        let new_top = transform.transform_point3(self.position + self.view_up);
        let (position, view_up) = orthogonalize(new_position, new_top - new_position);
        if !position.is_finite()
            || !view_up.is_finite()
            || position == DVec3::ZERO
            || view_up == DVec3::ZERO
        {
            return false;
        }
        self.position = position;
        self.view_up = view_up;
        true
    }
}

// Zero axes leave the transform untouched.
fn axis_rotation(axis: DVec3, angle: f64) -> DMat4 {
    let axis = axis.normalize_or_zero();
    if axis == DVec3::ZERO || angle == 0.0 {
        return DMat4::IDENTITY;
    }
    DMat4::from_axis_angle(axis, angle)
}
