//! Sequence and shot naming rules

use regex::Regex;

use crate::stats::Frame;

pub const DEFAULT_SEQUENCE_PATTERN: &str = r"^Seq\d{3}$";
pub const DEFAULT_SHOT_PATTERN: &str = r"^Shot\d{3}[A-Za-z]?$";

/// What a clicked x-axis value refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisValue {
    Sequence(String),
    Shot(String),
    Frame(Frame),
    Unknown(String),
}

/// Recognises sequence and shot names on the share and in the chart
#[derive(Debug, Clone)]
pub struct NamingRules {
    sequence: Regex,
    shot: Regex,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            sequence: Regex::new(DEFAULT_SEQUENCE_PATTERN).unwrap(),
            shot: Regex::new(DEFAULT_SHOT_PATTERN).unwrap(),
        }
    }
}

impl NamingRules {
    pub fn new(sequence_pattern: &str, shot_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            sequence: Regex::new(sequence_pattern)?,
            shot: Regex::new(shot_pattern)?,
        })
    }

    pub fn is_sequence(&self, name: &str) -> bool {
        self.sequence.is_match(name)
    }

    pub fn is_shot(&self, name: &str) -> bool {
        self.shot.is_match(name)
    }

    pub fn classify(&self, value: &str) -> AxisValue {
        let value = value.trim();
        if self.is_sequence(value) {
            AxisValue::Sequence(value.to_string())
        } else if self.is_shot(value) {
            AxisValue::Shot(value.to_string())
        } else if let Ok(frame) = value.parse::<Frame>() {
            AxisValue::Frame(frame)
        } else {
            AxisValue::Unknown(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_axis_values() {
        let rules = NamingRules::default();
        assert_eq!(rules.classify("Seq040"), AxisValue::Sequence("Seq040".into()));
        assert_eq!(rules.classify("Shot120"), AxisValue::Shot("Shot120".into()));
        assert_eq!(rules.classify("Shot120A"), AxisValue::Shot("Shot120A".into()));
        assert_eq!(rules.classify("1001"), AxisValue::Frame(1001));
        assert_eq!(rules.classify("banana"), AxisValue::Unknown("banana".into()));
        assert_eq!(rules.classify("-3"), AxisValue::Unknown("-3".into()));
    }

    #[test]
    fn test_custom_patterns() {
        let rules = NamingRules::new(r"^SeqA$", r"^Sh\d+$").unwrap();
        assert!(rules.is_sequence("SeqA"));
        assert!(rules.is_shot("Sh01"));
        assert!(!rules.is_shot("Shot010"));
        assert!(NamingRules::new("(", "x").is_err());
    }
}
