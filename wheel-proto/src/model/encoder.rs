//! Rotary encoder state

use serde::{Deserialize, Serialize};

/// Live readout of the wheel's rotary encoder
///
/// Produced exclusively by the device; the client mirrors it but never
/// mutates it optimistically. There is no partial "In" shape for the
/// encoder because it cannot be written from the client side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderState {
    /// Sector currently under the pointer
    pub sector: u32,
    /// Current rotation speed in revolutions per minute
    pub rpm: f64,
    /// Revolutions counted since device boot
    pub total_revs: f64,
    /// Sector transitions counted since device boot
    pub total_sectors: u64,
    /// Sector transitions the encoder failed to register
    pub missed_sector_count: u64,
    /// Whether the wheel is currently at rest
    pub standstill: bool,
}

impl EncoderState {
    /// Check whether the wheel is spinning
    pub fn is_spinning(&self) -> bool {
        !self.standstill
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_shape() {
        let json = r#"{
            "sector": 3,
            "rpm": 12.5,
            "total_revs": 104.2,
            "total_sectors": 1250,
            "missed_sector_count": 2,
            "standstill": false
        }"#;

        let state: EncoderState = serde_json::from_str(json).unwrap();
        assert_eq!(state.sector, 3);
        assert!(state.is_spinning());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        // `standstill` absent
        let json = r#"{
            "sector": 3,
            "rpm": 12.5,
            "total_revs": 104.2,
            "total_sectors": 1250,
            "missed_sector_count": 2
        }"#;

        assert!(serde_json::from_str::<EncoderState>(json).is_err());
    }
}
