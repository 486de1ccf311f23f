use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ledger::DailyRecord;
use crate::models::profile::Profile;
use crate::models::settings::AppSettings;
use crate::models::targets::Targets;
use crate::models::weight::WeightEntry;

/// The whole persisted state: serialized as a single JSON blob under a fixed
/// key, read once at startup and written back after every mutating command.
/// Dates are ISO `YYYY-MM-DD` strings in the local time of creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerState {
    pub profile: Option<Profile>,
    pub targets: Targets,
    pub history: BTreeMap<String, DailyRecord>,
    pub weight_history: Vec<WeightEntry>,
    pub settings: AppSettings,
    pub selected_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Gender, GoalKind};

    #[test]
    fn state_round_trips_with_camel_case_keys() {
        let mut state = TrackerState::default();
        state.profile = Some(Profile {
            name: "Ana".to_string(),
            age: 25,
            weight: 70.0,
            height: 175,
            gender: Gender::Other,
            activity: 1.55,
            goal: GoalKind::Maintain,
        });
        state.selected_date = "2026-02-25".to_string();
        state.history.insert("2026-02-25".to_string(), DailyRecord::default());

        let raw = serde_json::to_value(&state).unwrap();
        assert!(raw.get("selectedDate").is_some());
        assert!(raw.get("weightHistory").is_some());
        assert!(raw
            .pointer("/targets/dailyCalorieGoal")
            .is_some());
        assert!(raw
            .pointer("/history/2026-02-25/burnedCalories")
            .is_some());

        let back: TrackerState = serde_json::from_value(raw).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let state: TrackerState = serde_json::from_str("{}").unwrap();
        assert!(state.profile.is_none());
        assert_eq!(state.targets.daily_water_goal, 8);
        assert!(state.history.is_empty());
    }
}
