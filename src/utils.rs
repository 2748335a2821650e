/// Raw angle value that maps to a full turn
pub const ANGLE_FULL_SCALE: u16 = u16::MAX;

/// Largest pulses-per-turn setting (10-bit stored value plus one)
pub const PPT_MAX: u16 = 1024;

/// Convert a raw 16-bit angle to degrees
#[must_use]
pub fn raw_to_degrees(raw: u16) -> f32 {
    f32::from(raw) / f32::from(ANGLE_FULL_SCALE) * 360.0
}

/// Split a zero position into its `(Z[15:8], Z[7:0])` register bytes
#[must_use]
pub const fn split_zero_position(angle: u16) -> (u8, u8) {
    let [high, low] = angle.to_be_bytes();
    (high, low)
}

/// Rebuild a zero position from its register bytes
#[must_use]
pub const fn join_zero_position(high: u8, low: u8) -> u16 {
    u16::from_be_bytes([high, low])
}

/// Encode a pulses-per-turn count into `(PPT[9:2], PPT[1:0])`
///
/// The sensor stores `count - 1`, so `count` must lie in `1..=1024`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn encode_pulses_per_turn(count: u16) -> Option<(u8, u8)> {
    if count == 0 || count > PPT_MAX {
        return None;
    }
    let stored = count - 1;
    Some(((stored >> 2) as u8, (stored & 0b11) as u8))
}

/// Decode `(PPT[9:2], PPT[1:0])` back into a pulses-per-turn count
#[must_use]
pub const fn decode_pulses_per_turn(high: u8, low: u8) -> u16 {
    (((high as u16) << 2) | (low as u16 & 0b11)) + 1
}
