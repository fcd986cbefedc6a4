// state_token.rs — compact text token for persisting camera orientation
//
// Each unit vector packs into three bytes through the affine map
// [-1, 1] -> [0, 255], then into four base64 characters. A full state is
// position followed by view up: eight characters.

use base64::Engine as _;
use glam::DVec3;
use thiserror::Error;

pub const VEC3_TOKEN_LEN: usize = 4;
pub const STATE_TOKEN_LEN: usize = 2 * VEC3_TOKEN_LEN;

#[derive(Debug, Error)]
pub enum StateTokenError {
    #[error("state token must be {expected} characters, got {found}")]
    Length { expected: usize, found: usize },
    #[error("state token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("state token decodes to a degenerate camera frame")]
    Degenerate,
}

fn float_to_byte(value: f64) -> u8 {
    ((value + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

fn byte_to_float(byte: u8) -> f64 {
    f64::from(byte) / 255.0 * 2.0 - 1.0
}

pub fn encode_vec3(vector: DVec3) -> String {
    let bytes = vector.to_array().map(float_to_byte);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decodes a 4-character block back into a unit vector.
pub fn decode_vec3(token: &str) -> Result<DVec3, StateTokenError> {
    if token.len() != VEC3_TOKEN_LEN {
        return Err(StateTokenError::Length {
            expected: VEC3_TOKEN_LEN,
            found: token.len(),
        });
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(token)?;
    let [x, y, z] = <[u8; 3]>::try_from(bytes.as_slice()).map_err(|_| StateTokenError::Length {
        expected: VEC3_TOKEN_LEN,
        found: token.len(),
    })?;
    let vector = DVec3::new(byte_to_float(x), byte_to_float(y), byte_to_float(z));
    let unit = vector.normalize_or_zero();
    if unit == DVec3::ZERO {
        return Err(StateTokenError::Degenerate);
    }
    Ok(unit)
}

pub fn encode_state(position: DVec3, view_up: DVec3) -> String {
    let mut token = encode_vec3(position);
    token.push_str(&encode_vec3(view_up));
    token
}

/// Splits an 8-character token into (position, view up). The pair is not
/// orthogonalized here.
pub fn decode_state(token: &str) -> Result<(DVec3, DVec3), StateTokenError> {
    if token.len() != STATE_TOKEN_LEN || !token.is_ascii() {
        return Err(StateTokenError::Length {
            expected: STATE_TOKEN_LEN,
            found: token.len(),
        });
    }
    let (position, view_up) = token.split_at(VEC3_TOKEN_LEN);
    Ok((decode_vec3(position)?, decode_vec3(view_up)?))
}
