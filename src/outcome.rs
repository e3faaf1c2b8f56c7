//! Classification result types.

use serde::{Deserialize, Serialize};

/// Trust level assigned to a claimed crawler identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotStatus {
    /// Identity not recognized, or no verification method concluded
    #[default]
    Unknown,
    /// Identity recognized and its network origin verified
    Friendly,
    /// Identity recognized; the definition trusts the claim without
    /// a network check
    PotentiallyFriendly,
    /// Identity claims a trusted operator but the network check
    /// contradicts the claim
    PotentialImposter,
    /// Identity matches a known hostile pattern
    Unfriendly,
}

impl BotStatus {
    /// Returns true for any status other than `Unknown`.
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, BotStatus::Unknown)
    }

    /// Returns the status as a string token for output columns and headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            BotStatus::Unknown => "unknown",
            BotStatus::Friendly => "friendly",
            BotStatus::PotentiallyFriendly => "potentially_friendly",
            BotStatus::PotentialImposter => "potential_imposter",
            BotStatus::Unfriendly => "unfriendly",
        }
    }
}

/// Result of classifying one user agent / address pair.
///
/// `bot_name` is empty when the status is [`BotStatus::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub status: BotStatus,
    pub bot_name: String,
}

impl VerificationOutcome {
    /// Create an outcome for a recognized bot.
    pub fn new(status: BotStatus, bot_name: impl Into<String>) -> Self {
        Self {
            status,
            bot_name: bot_name.into(),
        }
    }

    /// The outcome for an unrecognized or unverifiable client.
    pub fn unknown() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(BotStatus::Unknown.as_str(), "unknown");
        assert_eq!(BotStatus::Friendly.as_str(), "friendly");
        assert_eq!(BotStatus::PotentiallyFriendly.as_str(), "potentially_friendly");
        assert_eq!(BotStatus::PotentialImposter.as_str(), "potential_imposter");
        assert_eq!(BotStatus::Unfriendly.as_str(), "unfriendly");
    }

    #[test]
    fn test_status_conclusiveness() {
        assert!(!BotStatus::Unknown.is_conclusive());
        assert!(BotStatus::Friendly.is_conclusive());
        assert!(BotStatus::PotentiallyFriendly.is_conclusive());
        assert!(BotStatus::PotentialImposter.is_conclusive());
        assert!(BotStatus::Unfriendly.is_conclusive());
    }

    #[test]
    fn test_unknown_outcome_has_empty_name() {
        let outcome = VerificationOutcome::unknown();
        assert_eq!(outcome.status, BotStatus::Unknown);
        assert!(outcome.bot_name.is_empty());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = VerificationOutcome::new(BotStatus::Friendly, "Googlebot");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"friendly\""));
        assert!(json.contains("Googlebot"));

        let parsed: VerificationOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }
}
