use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoreboardError;

pub mod competition;
pub mod entry;
pub mod referee;
pub mod roster;
pub mod sub_event;

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy, Default, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    #[default]
    Junior,
    Senior,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Junior, Group::Senior];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Junior => "junior",
            Group::Senior => "senior",
        }
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = ScoreboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "junior" => Ok(Group::Junior),
            "senior" => Ok(Group::Senior),
            other => Err(ScoreboardError::invalid_value("group", other)),
        }
    }
}

/// One of the two attempts a participant gets.
///
/// Serialized as the strings `"1"` and `"2"`, stored as a small integer.
#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy, PartialOrd, Ord)]
pub enum Round {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
}

impl Round {
    pub const ALL: [Round; 2] = [Round::First, Round::Second];

    pub fn number(&self) -> i16 {
        match self {
            Round::First => 1,
            Round::Second => 2,
        }
    }
}

impl TryFrom<i16> for Round {
    type Error = ScoreboardError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Round::First),
            2 => Ok(Round::Second),
            other => Err(ScoreboardError::invalid_value("round", other)),
        }
    }
}

impl Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}
