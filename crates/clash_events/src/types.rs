//! # Core Type Definitions
//!
//! Domain types shared by every part of the battle client: identifiers,
//! problems with their test cases, and per-player match state.
//!
//! ## Key Types
//!
//! - [`MatchId`], [`PlayerId`], [`ProblemId`] - string identifiers issued by the server
//! - [`Problem`] / [`TestCase`] - a judged exercise as delivered in `game_start`
//! - [`PlayerState`] - one player's progress inside a match
//! - [`MatchStatus`] - the monotonic match lifecycle
//!
//! Every type round-trips through JSON with camelCase keys, which is what the
//! battle service speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wraps a raw identifier issued by the server.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrows the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a match. Doubles as the room id used to scope socket events.
    MatchId
);
string_id!(
    /// Identifier of a user taking part in a match.
    PlayerId
);
string_id!(
    /// Identifier of a problem.
    ProblemId
);

/// Lifecycle of a match as seen by the client.
///
/// The derived ordering follows the lifecycle, so "never regresses" can be
/// checked with a plain comparison. `Idle` means no match is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    #[default]
    Idle,
    Waiting,
    InProgress,
    Completed,
}

impl MatchStatus {
    /// True while a match is attached and not yet finished.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Waiting | Self::InProgress)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Problem difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "EASY"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Hard => write!(f, "HARD"),
        }
    }
}

/// Languages the editor can submit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Cpp,
    C,
    Java,
    Python,
    Javascript,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Cpp,
        Language::C,
        Language::Java,
        Language::Python,
        Language::Javascript,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Java => "java",
            Self::Python => "python",
            Self::Javascript => "javascript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == lowered)
            .ok_or_else(|| format!("Unsupported language: {s}"))
    }
}

/// A single judged test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

/// A coding problem as pushed by the server at game start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub constraints: Option<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub rating: u32,
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl Problem {
    /// Get time limit in seconds
    pub fn time_limit_seconds(&self) -> f64 {
        f64::from(self.time_limit_ms) / 1000.0
    }

    /// Test cases the player is allowed to see.
    pub fn visible_test_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.test_cases.iter().filter(|case| !case.is_hidden)
    }
}

/// Metadata recorded when a player solves a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedProblem {
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub solved_at: Option<DateTime<Utc>>,
}

/// Minimal player identity carried by `match_found`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    #[serde(alias = "username")]
    pub display_name: String,
}

/// A player's full in-match state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: PlayerId,
    #[serde(alias = "username")]
    pub display_name: String,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub problems_solved: u32,
    #[serde(default)]
    pub solved: HashMap<ProblemId, SolvedProblem>,
}

impl PlayerState {
    /// Fresh state for a player announced in `match_found`.
    pub fn from_summary(summary: &PlayerSummary) -> Self {
        Self {
            id: summary.id.clone(),
            display_name: summary.display_name.clone(),
            is_ready: false,
            code: String::new(),
            language: Language::default(),
            output: None,
            error: None,
            score: 0,
            problems_solved: 0,
            solved: HashMap::new(),
        }
    }

    pub fn has_solved(&self, problem: &ProblemId) -> bool {
        self.solved.contains_key(problem)
    }
}

/// Authenticated user profile kept in the `auth` partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: PlayerId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
}
