// Enumeration tables for categorical test case fields
// Unrecognized values land in an Unknown bucket instead of failing the run
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test case priority, most important first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Priority {
    /// All buckets in code order
    pub const ALL: [Priority; 5] = [
        Self::Critical,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::Unknown,
    ];

    /// Parse an exported priority value
    ///
    /// Accepts plain names ("High"), numbered names ("1 - Critical") and
    /// ticket-style ranks ("P2").
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return Self::Unknown;
        }

        let ranked = value.strip_prefix('p').unwrap_or(&value);
        if let Some(rank) = ranked.chars().next().and_then(|c| c.to_digit(10)) {
            return match rank {
                1 => Self::Critical,
                2 => Self::High,
                3 => Self::Medium,
                4 => Self::Low,
                _ => Self::Unknown,
            };
        }

        if ["critical", "blocker", "highest", "urgent"]
            .iter()
            .any(|word| value.contains(word))
        {
            Self::Critical
        } else if value.contains("high") {
            Self::High
        } else if ["medium", "normal", "moderate"]
            .iter()
            .any(|word| value.contains(word))
        {
            Self::Medium
        } else if ["low", "minor", "trivial"].iter().any(|word| value.contains(word)) {
            Self::Low
        } else {
            Self::Unknown
        }
    }

    /// Stable small integer used by the vectorizer
    pub fn code(self) -> usize {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
            Self::Unknown => 4,
        }
    }

    /// Ordinal importance; Unknown has none
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Critical => Some(4),
            Self::High => Some(3),
            Self::Medium => Some(2),
            Self::Low => Some(1),
            Self::Unknown => None,
        }
    }

    /// True when both priorities are known and `self` is strictly less important
    pub fn is_lower_than(self, other: Priority) -> bool {
        match (self.rank(), other.rank()) {
            (Some(mine), Some(theirs)) => mine < theirs,
            _ => false,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Scope category of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestingLevel {
    Unit,
    Integration,
    System,
    Acceptance,
    Regression,
    Smoke,
    EndToEnd,
    Unknown,
}

impl TestingLevel {
    /// All buckets in code order
    pub const ALL: [TestingLevel; 8] = [
        Self::Unit,
        Self::Integration,
        Self::System,
        Self::Acceptance,
        Self::Regression,
        Self::Smoke,
        Self::EndToEnd,
        Self::Unknown,
    ];

    /// Parse an exported testing level
    ///
    /// Exports may join several levels with commas; the first one decides.
    pub fn parse(raw: &str) -> Self {
        let value = raw
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if value.is_empty() || value == "n/a" {
            Self::Unknown
        } else if value.contains("e2e") || value.contains("end-to-end") || value.contains("end to end")
        {
            Self::EndToEnd
        } else if value.contains("unit") || value.contains("component") {
            Self::Unit
        } else if value.contains("integration") {
            Self::Integration
        } else if value.contains("system") {
            Self::System
        } else if value.contains("acceptance") || value == "uat" {
            Self::Acceptance
        } else if value.contains("regression") {
            Self::Regression
        } else if value.contains("smoke") || value.contains("sanity") {
            Self::Smoke
        } else {
            Self::Unknown
        }
    }

    /// Stable small integer used by the vectorizer
    pub fn code(self) -> usize {
        match self {
            Self::Unit => 0,
            Self::Integration => 1,
            Self::System => 2,
            Self::Acceptance => 3,
            Self::Regression => 4,
            Self::Smoke => 5,
            Self::EndToEnd => 6,
            Self::Unknown => 7,
        }
    }
}

impl fmt::Display for TestingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unit => "Unit",
            Self::Integration => "Integration",
            Self::System => "System",
            Self::Acceptance => "Acceptance",
            Self::Regression => "Regression",
            Self::Smoke => "Smoke",
            Self::EndToEnd => "End-to-End",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Parse an exported core dependency value; anything unrecognized is not core
pub fn parse_core_dependency(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "x" | "core" | "core dependent"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parsing() {
        assert_eq!(Priority::parse("Critical"), Priority::Critical);
        assert_eq!(Priority::parse("1 - Critical"), Priority::Critical);
        assert_eq!(Priority::parse("2 - High"), Priority::High);
        assert_eq!(Priority::parse("P3"), Priority::Medium);
        assert_eq!(Priority::parse("  low "), Priority::Low);
        assert_eq!(Priority::parse("Highest"), Priority::Critical);
        assert_eq!(Priority::parse("whenever"), Priority::Unknown);
        assert_eq!(Priority::parse(""), Priority::Unknown);
        assert_eq!(Priority::parse("9 - Someday"), Priority::Unknown);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low.is_lower_than(Priority::High));
        assert!(Priority::Medium.is_lower_than(Priority::Critical));
        assert!(!Priority::High.is_lower_than(Priority::High));
        assert!(!Priority::Critical.is_lower_than(Priority::Low));
        assert!(!Priority::Unknown.is_lower_than(Priority::Critical));
        assert!(!Priority::Low.is_lower_than(Priority::Unknown));
    }

    #[test]
    fn test_codes_are_dense() {
        for (i, priority) in Priority::ALL.iter().enumerate() {
            assert_eq!(priority.code(), i);
        }
        for (i, level) in TestingLevel::ALL.iter().enumerate() {
            assert_eq!(level.code(), i);
        }
    }

    #[test]
    fn test_testing_level_parsing() {
        assert_eq!(TestingLevel::parse("Unit"), TestingLevel::Unit);
        assert_eq!(TestingLevel::parse("Integration Test"), TestingLevel::Integration);
        assert_eq!(TestingLevel::parse("System, Regression"), TestingLevel::System);
        assert_eq!(TestingLevel::parse("UAT"), TestingLevel::Acceptance);
        assert_eq!(TestingLevel::parse("End-to-End"), TestingLevel::EndToEnd);
        assert_eq!(TestingLevel::parse("N/A"), TestingLevel::Unknown);
        assert_eq!(TestingLevel::parse("exploratory"), TestingLevel::Unknown);
    }

    #[test]
    fn test_core_dependency_parsing() {
        assert!(parse_core_dependency("Yes"));
        assert!(parse_core_dependency("TRUE"));
        assert!(!parse_core_dependency("No"));
        assert!(!parse_core_dependency(""));
        assert!(!parse_core_dependency("maybe"));
    }
}
