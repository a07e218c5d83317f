//! Range clamping for outbound numeric fractions
//!
//! Every fraction the client authors (brightness, volume, servo position)
//! is clamped before it reaches the wire, so a misbehaving UI slider can
//! never push an out-of-range value to the device.

/// Mechanical overshoot allowed below a servo's zero position
pub const SERVO_POS_MIN: f64 = -0.3;
/// Mechanical overshoot allowed above a servo's full position
pub const SERVO_POS_MAX: f64 = 1.3;

/// Clamp a fraction to `[0, 1]`
///
/// NaN maps to `0.0` rather than propagating.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp a servo position to the mechanical range `[-0.3, 1.3]`
///
/// The range is wider than `[0, 1]` because mount/unmount sequences drive
/// the arm past its calibrated travel to reach the release position.
pub fn clamp_servo_pos(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(SERVO_POS_MIN, SERVO_POS_MAX)
}
