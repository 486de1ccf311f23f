use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use crate::models::ledger::{DailyRecord, DailyStatus, Exercise, Meal};
use crate::models::targets::Targets;

/// Meal fields as entered or confirmed by the user; id assignment happens
/// here so insertion order and id order always agree.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MealInput {
    pub name: String,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

/// Fetches the record for a date, creating the all-zero default on first
/// access. Records are never deleted once created.
pub fn get_or_create<'a>(
    history: &'a mut BTreeMap<String, DailyRecord>,
    date: &str,
) -> &'a mut DailyRecord {
    if !history.contains_key(date) {
        debug!(target: "app::ledger", %date, "creating daily record");
    }
    history.entry(date.to_string()).or_default()
}

/// Appends a meal and folds its macros into the running totals. Totals
/// saturate at the numeric ceiling instead of wrapping.
pub fn add_meal(record: &mut DailyRecord, input: MealInput) -> Meal {
    let meal = Meal {
        id: next_entry_id(record.meals.iter().map(|m| m.id)),
        name: input.name,
        calories: input.calories,
        protein: input.protein,
        carbs: input.carbs,
        fats: input.fats,
    };

    record.consumed.calories = record.consumed.calories.saturating_add(meal.calories);
    record.consumed.protein = record.consumed.protein.saturating_add(meal.protein);
    record.consumed.carbs = record.consumed.carbs.saturating_add(meal.carbs);
    record.consumed.fats = record.consumed.fats.saturating_add(meal.fats);
    record.meals.push(meal.clone());

    meal
}

/// Removes a meal by id and subtracts its contribution, each field floored
/// at 0 to absorb drift from pre-migration payloads. Unknown ids are a
/// silent no-op; returns whether anything was removed.
pub fn remove_meal(record: &mut DailyRecord, meal_id: i64) -> bool {
    let Some(index) = record.meals.iter().position(|m| m.id == meal_id) else {
        return false;
    };
    let meal = record.meals.remove(index);

    record.consumed.calories = record.consumed.calories.saturating_sub(meal.calories);
    record.consumed.protein = record.consumed.protein.saturating_sub(meal.protein);
    record.consumed.carbs = record.consumed.carbs.saturating_sub(meal.carbs);
    record.consumed.fats = record.consumed.fats.saturating_sub(meal.fats);

    true
}

/// Appends an exercise and adds its burn to the running total.
pub fn add_exercise(record: &mut DailyRecord, name: String, calories: f64) -> Exercise {
    let exercise = Exercise {
        id: next_entry_id(record.exercises.iter().map(|e| e.id)),
        name,
        calories: calories.max(0.0),
    };

    record.burned_calories += exercise.calories;
    record.exercises.push(exercise.clone());

    exercise
}

/// Removes an exercise by id, flooring the burned total at 0. Unknown ids
/// are a silent no-op.
pub fn remove_exercise(record: &mut DailyRecord, exercise_id: i64) -> bool {
    let Some(index) = record.exercises.iter().position(|e| e.id == exercise_id) else {
        return false;
    };
    let exercise = record.exercises.remove(index);
    record.burned_calories = (record.burned_calories - exercise.calories).max(0.0);
    true
}

/// Adjusts the water glass count by a signed delta, floored at 0.
pub fn adjust_water(record: &mut DailyRecord, delta: i32) -> u32 {
    let current = i64::from(record.water);
    record.water = current.saturating_add(i64::from(delta)).max(0) as u32;
    record.water
}

/// Derived read view for one date. A zero calorie or macro goal makes the
/// corresponding progress fraction 0 rather than dividing by zero.
pub fn daily_status(date: &str, record: &DailyRecord, targets: &Targets) -> DailyStatus {
    let consumed_calories = f64::from(record.consumed.calories);
    let burned = record.burned_calories;
    let goal = f64::from(targets.daily_calorie_goal);

    let net_calories = (consumed_calories - burned).max(0.0);
    let remaining_calories = goal - consumed_calories + burned;

    DailyStatus {
        date: date.to_string(),
        consumed: record.consumed,
        burned_calories: burned,
        net_calories,
        remaining_calories,
        calorie_progress: capped_fraction(net_calories, goal),
        protein_progress: capped_fraction(
            f64::from(record.consumed.protein),
            f64::from(targets.macros.protein),
        ),
        carbs_progress: capped_fraction(
            f64::from(record.consumed.carbs),
            f64::from(targets.macros.carbs),
        ),
        fats_progress: capped_fraction(
            f64::from(record.consumed.fats),
            f64::from(targets.macros.fats),
        ),
        water: record.water,
        water_goal: targets.daily_water_goal,
    }
}

fn capped_fraction(value: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    (value / goal).min(1.0)
}

/// Epoch milliseconds at creation, bumped past the last entry so two inserts
/// within the same millisecond still get distinct, ordered ids.
fn next_entry_id(existing: impl Iterator<Item = i64>) -> i64 {
    let now = Utc::now().timestamp_millis();
    match existing.last() {
        Some(last) if now <= last => last + 1,
        _ => now,
    }
}
