use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroTargets {
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

/// Daily goals derived from the profile. Never edited directly; always
/// recomputed through the goal service when the profile or weight changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Targets {
    pub daily_calorie_goal: u32,
    /// Glasses of 250 ml.
    pub daily_water_goal: u32,
    pub macros: MacroTargets,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            daily_calorie_goal: 0,
            daily_water_goal: 8,
            macros: MacroTargets::default(),
        }
    }
}
