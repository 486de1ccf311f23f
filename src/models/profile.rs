use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Gender {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "male" => Ok(Gender::Male),
            "other" => Ok(Gender::Other),
            other => Err(format!("unsupported gender: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Lose,
    Maintain,
    Gain,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Lose => "lose",
            GoalKind::Maintain => "maintain",
            GoalKind::Gain => "gain",
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for GoalKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "lose" => Ok(GoalKind::Lose),
            "maintain" => Ok(GoalKind::Maintain),
            "gain" => Ok(GoalKind::Gain),
            other => Err(format!("unsupported goal: {other}")),
        }
    }
}

/// User profile captured during onboarding. Weight is kilograms, height
/// centimeters; `activity` is the TDEE multiplier (sedentary 1.2 up to
/// athlete 1.9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub weight: f64,
    pub height: u32,
    pub gender: Gender,
    pub activity: f64,
    pub goal: GoalKind,
}
