use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::ParseEnumError;

/// The browser games a patient can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameKind {
    MemoryMatch,
    StroopTest,
    NBack,
    ReactionTime,
    TrailMakingTest,
    PatternRecognition,
    VerbalFluency,
}

impl GameKind {
    pub const ALL: [GameKind; 7] = [
        GameKind::MemoryMatch,
        GameKind::StroopTest,
        GameKind::NBack,
        GameKind::ReactionTime,
        GameKind::TrailMakingTest,
        GameKind::PatternRecognition,
        GameKind::VerbalFluency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::MemoryMatch => "memory_match",
            GameKind::StroopTest => "stroop_test",
            GameKind::NBack => "n_back",
            GameKind::ReactionTime => "reaction_time",
            GameKind::TrailMakingTest => "trail_making_test",
            GameKind::PatternRecognition => "pattern_recognition",
            GameKind::VerbalFluency => "verbal_fluency",
        }
    }

    /// Heading used in rendered reports, e.g. `MEMORY MATCH`.
    pub fn heading(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|game| game.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("game", s))
    }
}

/// Cognitive domains; each is exercised by one or more games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CognitiveDomain {
    Memory,
    Attention,
    WorkingMemory,
    ProcessingSpeed,
    ExecutiveFunction,
    Language,
}

impl CognitiveDomain {
    pub const ALL: [CognitiveDomain; 6] = [
        CognitiveDomain::Memory,
        CognitiveDomain::Attention,
        CognitiveDomain::WorkingMemory,
        CognitiveDomain::ProcessingSpeed,
        CognitiveDomain::ExecutiveFunction,
        CognitiveDomain::Language,
    ];

    pub fn games(&self) -> &'static [GameKind] {
        match self {
            CognitiveDomain::Memory => &[GameKind::MemoryMatch, GameKind::PatternRecognition],
            CognitiveDomain::Attention => &[GameKind::StroopTest, GameKind::PatternRecognition],
            CognitiveDomain::WorkingMemory => &[GameKind::NBack],
            CognitiveDomain::ProcessingSpeed => {
                &[GameKind::ReactionTime, GameKind::TrailMakingTest]
            }
            CognitiveDomain::ExecutiveFunction => &[
                GameKind::StroopTest,
                GameKind::TrailMakingTest,
                GameKind::VerbalFluency,
            ],
            CognitiveDomain::Language => &[GameKind::VerbalFluency],
        }
    }
}

/// Body of `POST /api/scores`. `patient_id` carries the patient code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScoreSubmission {
    pub patient_id: Option<String>,
    pub session_id: Option<String>,
    pub game: Option<GameKind>,
    pub level: Option<i32>,
    pub score: Option<f64>,
    pub metrics: Option<serde_json::Value>,
    pub timestamp_start: Option<String>,
    pub timestamp_end: Option<String>,
    pub device: Option<String>,
    pub attempt: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreSubmitted {
    pub message: String,
    pub id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameScore {
    pub id: i32,
    pub patient_code: String,
    pub session_id: Option<String>,
    pub game: GameKind,
    pub level: Option<i32>,
    pub attempt: i32,
    pub score: f64,
    pub metrics: Option<serde_json::Value>,
    pub timestamp_start: Option<String>,
    pub timestamp_end: Option<String>,
    pub device: Option<String>,
    pub created_at: String, // ISO 8601 string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_parses_wire_names() {
        for game in GameKind::ALL {
            assert_eq!(game.as_str().parse::<GameKind>().unwrap(), game);
            let json = serde_json::to_string(&game).unwrap();
            assert_eq!(json, format!("\"{}\"", game.as_str()));
        }
        assert!("tetris".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_heading() {
        assert_eq!(GameKind::TrailMakingTest.heading(), "TRAIL MAKING TEST");
        assert_eq!(GameKind::NBack.heading(), "N BACK");
    }

    #[test]
    fn test_every_game_belongs_to_a_domain() {
        for game in GameKind::ALL {
            assert!(
                CognitiveDomain::ALL
                    .iter()
                    .any(|domain| domain.games().contains(&game)),
                "{game} has no domain"
            );
        }
    }
}
