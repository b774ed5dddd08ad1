use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Position of a lead in its automated outreach sequence.
///
/// Stages advance one step per successful send; `LongTerm` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiStage {
    #[default]
    Initial,
    #[serde(rename = "follow_up_1")]
    FollowUp1,
    #[serde(rename = "follow_up_2")]
    FollowUp2,
    #[serde(rename = "follow_up_3")]
    FollowUp3,
    LongTerm,
}

impl AiStage {
    pub const ALL: [Self; 5] =
        [Self::Initial, Self::FollowUp1, Self::FollowUp2, Self::FollowUp3, Self::LongTerm];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Initial => "initial",
            Self::FollowUp1 => "follow_up_1",
            Self::FollowUp2 => "follow_up_2",
            Self::FollowUp3 => "follow_up_3",
            Self::LongTerm => "long_term",
        }
    }

    /// Stage the lead moves to once a message for this stage has been sent.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Initial => Self::FollowUp1,
            Self::FollowUp1 => Self::FollowUp2,
            Self::FollowUp2 => Self::FollowUp3,
            Self::FollowUp3 | Self::LongTerm => Self::LongTerm,
        }
    }

    /// Delay between sending this stage's message and the next scheduled send.
    #[must_use]
    pub fn delay_after(self) -> Duration {
        match self {
            Self::Initial => Duration::days(1),
            Self::FollowUp1 => Duration::days(3),
            Self::FollowUp2 => Duration::days(7),
            Self::FollowUp3 => Duration::days(14),
            Self::LongTerm => Duration::days(30),
        }
    }

    /// Short instruction used when prompting the generator for this stage.
    #[must_use]
    pub const fn prompt_hint(&self) -> &'static str {
        match *self {
            Self::Initial => "a warm first introduction",
            Self::FollowUp1 => "a friendly check-in a day after the introduction",
            Self::FollowUp2 => "a helpful follow-up offering a test drive or answers",
            Self::FollowUp3 => "a low-pressure follow-up mentioning current offers",
            Self::LongTerm => "a brief periodic touch-base keeping the conversation open",
        }
    }

    /// Parse a stored stage, falling back to `Initial` for unknown values.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(invalid_stage = %s, "unknown ai_stage in store, defaulting to initial");
            Self::Initial
        })
    }
}

impl fmt::Display for AiStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| DomainError::invalid("ai stage", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_and_long_term_is_absorbing() {
        assert_eq!(AiStage::Initial.next(), AiStage::FollowUp1);
        assert_eq!(AiStage::FollowUp3.next(), AiStage::LongTerm);
        assert_eq!(AiStage::LongTerm.next(), AiStage::LongTerm);
    }

    #[test]
    fn delays_grow_along_the_sequence() {
        let delays: Vec<Duration> = AiStage::ALL.iter().map(|s| s.delay_after()).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(AiStage::Initial.delay_after(), Duration::days(1));
    }

    #[test]
    fn parse_round_trips_storage_names() {
        for stage in AiStage::ALL {
            assert_eq!(stage.as_str().parse::<AiStage>().unwrap(), stage);
        }
        assert!("follow_up_9".parse::<AiStage>().is_err());
        assert_eq!(AiStage::parse_lenient("garbage"), AiStage::Initial);
    }

    #[test]
    fn serde_uses_storage_names() {
        let json = serde_json::to_string(&AiStage::FollowUp2).unwrap();
        assert_eq!(json, "\"follow_up_2\"");
        let stage: AiStage = serde_json::from_str("\"long_term\"").unwrap();
        assert_eq!(stage, AiStage::LongTerm);
    }
}
