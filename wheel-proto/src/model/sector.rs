//! Wheel sector types

use serde::{Deserialize, Serialize};

/// One physical sector of the wheel
///
/// Sectors arrive as an ordered sequence whose length matches the wheel's
/// physical sector count; `index` always equals the sector's position in
/// that sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorState {
    /// Position on the wheel, counted clockwise from the pointer
    pub index: usize,
    /// Display name printed on the sector
    pub name: String,
    /// Effect played when the wheel stops on this sector
    ///
    /// References `DeviceInfo::effects`; an unknown id is rendered with a
    /// fallback by UI layers, never treated as an error here.
    pub effect_id: String,
}

/// Partial client-side write for a single sector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorIn {
    /// New display name, if changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New effect id, if changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<String>,
}

impl SectorIn {
    /// Rename the sector, leaving its effect untouched
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            effect_id: None,
        }
    }

    /// Assign an effect, leaving the name untouched
    pub fn with_effect(effect_id: impl Into<String>) -> Self {
        Self {
            name: None,
            effect_id: Some(effect_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_write_skips_absent_fields() {
        let json = serde_json::to_string(&SectorIn::rename("Jackpot")).unwrap();
        assert!(json.contains("name"));
        assert!(!json.contains("effect_id"));
    }
}
