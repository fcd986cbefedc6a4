// selector.rs — continuous camera orientation -> discrete cinema image + roll

use glam::DVec3;

use crate::addressing::ImageKey;

pub const MIN_THETA: i32 = 1;
pub const MAX_THETA: i32 = 179;

/// Grid image picked for an orientation, with the in-plane rotation (degrees)
/// that makes the image's up match the camera's up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSelection {
    pub key: ImageKey,
    pub roll_degrees: i32,
}

/// Half a grid step of tolerance on the front/back hemisphere test.
pub fn hemisphere_epsilon(angle_step: u32) -> f64 {
    (f64::from(angle_step) / 360.0 * std::f64::consts::PI).sin()
}

// Math.round semantics: halves go toward +inf.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Quantizes `angle` onto multiples of `step`.
///
/// The remainder keeps the sign of `angle`; only a positive remainder larger
/// than half a step rounds up, everything else rounds toward zero.
pub fn snap(angle: f64, step: f64) -> f64 {
    let rest = angle % step;
    if rest > step * 0.5 {
        round_half_up(angle + step - rest)
    } else {
        round_half_up(angle - rest)
    }
}

/// Signed angle sign with `sign(0) == 0`.
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Camera direction the dataset was rendered from for `(theta, phi)`.
pub fn grid_position(theta: i32, phi: i32) -> DVec3 {
    let elevation = f64::from(theta - 90).to_radians();
    let azimuth = f64::from(phi).to_radians();
    DVec3::new(
        -elevation.cos() * azimuth.sin(),
        elevation.sin(),
        elevation.cos() * azimuth.cos(),
    )
}

// Projects `up` onto the plane perpendicular to `axis`.
fn up_against(axis: DVec3, up: DVec3) -> DVec3 {
    axis.cross(up.cross(axis)).normalize_or_zero()
}

/// Picks the cinema image closest to the camera and the roll that aligns it.
pub fn select_view(position: DVec3, view_up: DVec3, angle_step: u32, epsilon: f64) -> ViewSelection {
    let step = f64::from(angle_step.max(1));

    let theta_raw = position.y.clamp(-1.0, 1.0).asin().to_degrees() + 90.0;
    let theta = (snap(theta_raw, step) as i32).clamp(MIN_THETA, MAX_THETA);

    let horizontal = DVec3::new(position.x, 0.0, position.z).normalize_or_zero();
    let mut phi = snap((-horizontal.x).clamp(-1.0, 1.0).asin().to_degrees(), step) as i32;
    if horizontal.z > -epsilon {
        if phi < 0 {
            phi += 360;
        }
    } else {
        phi = 180 - phi;
    }

    let grid = grid_position(theta, phi);
    let grid_up = up_against(grid, DVec3::Y);
    let corrected_up = up_against(grid, view_up);

    let direction = sign(grid_up.cross(corrected_up).dot(grid));
    let cos_angle = grid_up.dot(corrected_up).clamp(-1.0, 1.0);
    let roll = direction * round_half_up(cos_angle.acos().to_degrees());

    ViewSelection {
        key: ImageKey { theta, phi },
        roll_degrees: roll as i32,
    }
}
