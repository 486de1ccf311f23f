use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::info;

/// Upgrades persisted payloads of older shapes to the current one. Runs once
/// at load, before deserialization, and must be idempotent: a second run on
/// already-migrated data changes nothing.
///
/// Rules, in order:
/// 1. A legacy flat record (top-level `consumed`/`meals` instead of a dated
///    ledger) is wrapped into today's history entry, unless that entry
///    already exists. The flat keys are removed either way.
/// 2. Every history record backfills absent fields with zero/empty defaults.
/// 3. Legacy top-level goals (`dailyGoal`, `dailyWaterGoal`, `macros`) are
///    lifted into the nested `targets` object; water goal defaults to 8.
pub fn run(raw: &mut JsonValue, today: &str) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };

    wrap_legacy_flat_record(root, today);
    backfill_daily_records(root);
    lift_legacy_targets(root);

    if let Some(current) = root.remove("currentDate") {
        root.entry("selectedDate").or_insert(current);
    }
}

fn zero_consumed() -> JsonValue {
    json!({ "calories": 0, "protein": 0, "carbs": 0, "fats": 0 })
}

fn wrap_legacy_flat_record(root: &mut JsonMap<String, JsonValue>, today: &str) {
    let consumed = root.remove("consumed");
    let meals = root.remove("meals");
    if consumed.is_none() && meals.is_none() {
        return;
    }

    if !root.get("history").map(JsonValue::is_object).unwrap_or(false) {
        root.insert("history".to_string(), json!({}));
    }
    let history = root
        .get_mut("history")
        .and_then(JsonValue::as_object_mut)
        .expect("history ensured above");

    // Never overwrite an already dated entry for today.
    if history.contains_key(today) {
        info!(target: "app::storage", %today, "legacy flat record dropped, dated entry already exists");
        return;
    }

    info!(target: "app::storage", %today, "wrapping legacy flat record into dated ledger");
    history.insert(
        today.to_string(),
        json!({
            "consumed": consumed.unwrap_or_else(zero_consumed),
            "meals": meals.unwrap_or_else(|| json!([])),
            "water": 0,
            "burnedCalories": 0,
            "exercises": []
        }),
    );
}

fn backfill_daily_records(root: &mut JsonMap<String, JsonValue>) {
    let Some(history) = root.get_mut("history").and_then(JsonValue::as_object_mut) else {
        return;
    };

    for record in history.values_mut() {
        let Some(record) = record.as_object_mut() else {
            continue;
        };
        record
            .entry("consumed")
            .or_insert_with(zero_consumed);
        record.entry("meals").or_insert_with(|| json!([]));
        record.entry("water").or_insert(json!(0));
        record.entry("burnedCalories").or_insert(json!(0));
        record.entry("exercises").or_insert_with(|| json!([]));
    }
}

fn lift_legacy_targets(root: &mut JsonMap<String, JsonValue>) {
    let legacy_calories = root.remove("dailyGoal");
    let legacy_water = root.remove("dailyWaterGoal");
    let legacy_macros = root.remove("macros");

    if root.contains_key("targets") {
        return;
    }
    if legacy_calories.is_none() && legacy_water.is_none() && legacy_macros.is_none() {
        return;
    }

    info!(target: "app::storage", "lifting legacy top-level goals into targets");
    root.insert(
        "targets".to_string(),
        json!({
            "dailyCalorieGoal": legacy_calories.unwrap_or(json!(0)),
            "dailyWaterGoal": legacy_water.unwrap_or(json!(8)),
            "macros": legacy_macros
                .unwrap_or_else(|| json!({ "protein": 0, "carbs": 0, "fats": 0 })),
        }),
    );
}
