use serde::{Deserialize, Serialize};

/// Running sums over the day's meals, maintained incrementally on every
/// insert and delete. Addition saturates at the numeric ceiling and
/// subtraction is floored at 0 per field, so drift from older payloads can
/// never wrap a total.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumedTotals {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

/// A logged meal. Immutable once created except for deletion. The id is the
/// creation timestamp in epoch milliseconds, bumped when necessary to keep
/// ids unique and insertion-ordered within a day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

/// A logged exercise session with its estimated calorie burn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub calories: f64,
}

/// One ledger entry per calendar date ever touched. Created lazily with
/// all-zero defaults, never deleted. Every field defaults so partially
/// upgraded records from older schema versions deserialize cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyRecord {
    pub consumed: ConsumedTotals,
    pub meals: Vec<Meal>,
    pub water: u32,
    pub burned_calories: f64,
    pub exercises: Vec<Exercise>,
}

/// Derived read view for a single date against the current targets.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatus {
    pub date: String,
    pub consumed: ConsumedTotals,
    pub burned_calories: f64,
    /// Consumed minus burned, floored at 0.
    pub net_calories: f64,
    /// Goal minus consumed plus burned; may be negative, display clamps.
    pub remaining_calories: f64,
    pub calorie_progress: f64,
    pub protein_progress: f64,
    pub carbs_progress: f64,
    pub fats_progress: f64,
    pub water: u32,
    pub water_goal: u32,
}
