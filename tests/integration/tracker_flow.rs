use std::sync::Arc;

use tempfile::TempDir;

use macrotrack::commands::exercise::exercise_delete;
use macrotrack::commands::meals::{meal_add, meal_delete, meal_estimate_from_name};
use macrotrack::commands::profile::{profile_create, profile_get, ProfileInput};
use macrotrack::commands::settings::{settings_get, settings_update, SettingsUpdateInput};
use macrotrack::commands::tracking::{
    daily_status_get, date_select_next, date_select_prev, selected_date_get, water_adjust,
};
use macrotrack::commands::weight::{weight_history_get, weight_log};
use macrotrack::commands::AppState;
use macrotrack::services::ledger_service::MealInput;
use macrotrack::storage::{BlobStore, FileStore, STATE_KEY};

fn setup() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let app = app_for(&temp_dir);
    (app, temp_dir)
}

fn app_for(temp_dir: &TempDir) -> AppState {
    let store: Arc<dyn BlobStore> =
        Arc::new(FileStore::new(temp_dir.path().join("data")).unwrap());
    AppState::load(store).unwrap()
}

fn ana() -> ProfileInput {
    ProfileInput {
        name: "Ana".to_string(),
        age: 25,
        weight: 70.0,
        height: 175,
        gender: "male".to_string(),
        activity: 1.55,
        goal: "maintain".to_string(),
    }
}

fn meal(name: &str, calories: u32, protein: u32, carbs: u32, fats: u32) -> MealInput {
    MealInput {
        name: name.to_string(),
        calories,
        protein,
        carbs,
        fats,
    }
}

#[test]
fn onboarding_derives_targets_and_seeds_today() {
    let (app, _guard) = setup();

    let summary = profile_create(&app, ana(), false).unwrap();
    assert_eq!(summary.targets.daily_calorie_goal, 2594);
    assert_eq!(summary.targets.macros.protein, 140);
    assert_eq!(summary.targets.daily_water_goal, 10);

    let status = daily_status_get(&app).unwrap();
    assert_eq!(status.consumed.calories, 0);
    assert_eq!(status.water, 0);
    assert_eq!(status.water_goal, 10);
    assert_eq!(status.remaining_calories, 2594.0);

    assert_eq!(weight_history_get(&app).unwrap().len(), 1);
    assert!(profile_get(&app).unwrap().is_some());
}

#[test]
fn profile_create_rejects_malformed_input() {
    let (app, _guard) = setup();

    let error = profile_create(
        &app,
        ProfileInput {
            gender: "unknown".to_string(),
            ..ana()
        },
        false,
    )
    .unwrap_err();
    assert_eq!(error.code, "VALIDATION_ERROR");

    let error = profile_create(
        &app,
        ProfileInput {
            weight: -70.0,
            ..ana()
        },
        false,
    )
    .unwrap_err();
    assert_eq!(error.code, "VALIDATION_ERROR");

    assert!(profile_get(&app).unwrap().is_none());
}

#[test]
fn meal_add_and_delete_restore_the_day() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();

    meal_add(&app, meal("huevos", 200, 14, 2, 15)).unwrap();
    let before = daily_status_get(&app).unwrap();

    let added = meal_add(&app, meal("arepa", 640, 32, 70, 18)).unwrap();
    let status = daily_status_get(&app).unwrap();
    assert_eq!(status.consumed.calories, 840);
    assert_eq!(status.consumed.protein, 46);

    assert!(meal_delete(&app, added.id).unwrap());
    let after = daily_status_get(&app).unwrap();
    assert_eq!(after.consumed, before.consumed);

    // Unknown id stays a silent no-op.
    assert!(!meal_delete(&app, 123456789).unwrap());
    assert_eq!(daily_status_get(&app).unwrap().consumed, before.consumed);
}

#[test]
fn empty_meal_name_is_rejected_without_state_change() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();

    let error = meal_add(&app, meal("   ", 500, 0, 0, 0)).unwrap_err();
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(daily_status_get(&app).unwrap().consumed.calories, 0);
}

#[test]
fn water_count_floors_at_zero() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();

    assert_eq!(water_adjust(&app, -1).unwrap(), 0);
    assert_eq!(water_adjust(&app, 1).unwrap(), 1);
    assert_eq!(water_adjust(&app, 1).unwrap(), 2);
    assert_eq!(water_adjust(&app, -1).unwrap(), 1);
}

#[test]
fn next_day_navigation_clamps_at_today() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();

    let today = selected_date_get(&app).unwrap();
    assert_eq!(date_select_next(&app).unwrap(), today);

    let yesterday = date_select_prev(&app).unwrap();
    assert_ne!(yesterday, today);

    // A freshly visited past date starts zeroed.
    let status = daily_status_get(&app).unwrap();
    assert_eq!(status.date, yesterday);
    assert_eq!(status.consumed.calories, 0);
    assert_eq!(status.water, 0);

    assert_eq!(date_select_next(&app).unwrap(), today);
    assert_eq!(date_select_next(&app).unwrap(), today);
}

#[test]
fn mutations_follow_the_selected_date() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();

    let yesterday = date_select_prev(&app).unwrap();
    meal_add(&app, meal("cena tardía", 300, 10, 30, 12)).unwrap();
    water_adjust(&app, 1).unwrap();

    let status = daily_status_get(&app).unwrap();
    assert_eq!(status.date, yesterday);
    assert_eq!(status.consumed.calories, 300);
    assert_eq!(status.water, 1);

    date_select_next(&app).unwrap();
    let today_status = daily_status_get(&app).unwrap();
    assert_eq!(today_status.consumed.calories, 0);
    assert_eq!(today_status.water, 0);
}

#[test]
fn weight_log_overwrites_today_and_rederives_targets() {
    let (app, _guard) = setup();
    let initial = profile_create(&app, ana(), false).unwrap();

    let result = weight_log(&app, 68.0).unwrap();
    // Onboarding seeded today's entry; re-logging overwrites it.
    assert_eq!(result.weight_history.len(), 1);
    assert_eq!(result.weight_history[0].weight, 68.0);
    assert!(result.targets.daily_calorie_goal < initial.targets.daily_calorie_goal);
    assert_eq!(result.targets.macros.protein, 136);

    let error = weight_log(&app, 0.0).unwrap_err();
    assert_eq!(error.code, "VALIDATION_ERROR");
}

#[test]
fn weight_log_requires_a_profile() {
    let (app, _guard) = setup();
    let error = weight_log(&app, 70.0).unwrap_err();
    assert_eq!(error.code, "VALIDATION_ERROR");
}

#[test]
fn state_survives_a_reload() {
    let temp_dir = TempDir::new().unwrap();
    {
        let app = app_for(&temp_dir);
        profile_create(&app, ana(), false).unwrap();
        meal_add(&app, meal("arepa", 640, 32, 70, 18)).unwrap();
        water_adjust(&app, 2).unwrap();
    }

    let app = app_for(&temp_dir);
    let status = daily_status_get(&app).unwrap();
    assert_eq!(status.consumed.calories, 640);
    assert_eq!(status.water, 2);
    assert!(profile_get(&app).unwrap().is_some());
}

#[test]
fn reonboarding_keeps_history_unless_reset_is_requested() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();
    meal_add(&app, meal("arepa", 640, 32, 70, 18)).unwrap();

    profile_create(
        &app,
        ProfileInput {
            name: "Nueva Ana".to_string(),
            ..ana()
        },
        false,
    )
    .unwrap();
    assert_eq!(daily_status_get(&app).unwrap().consumed.calories, 640);

    profile_create(&app, ana(), true).unwrap();
    assert_eq!(daily_status_get(&app).unwrap().consumed.calories, 0);
    assert_eq!(weight_history_get(&app).unwrap().len(), 1);
}

#[test]
fn exercise_delete_on_unknown_id_is_a_noop() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();

    assert!(!exercise_delete(&app, 987654321).unwrap());
    assert_eq!(daily_status_get(&app).unwrap().burned_calories, 0.0);
}

#[tokio::test]
async fn estimation_without_a_key_fails_before_any_network_call() {
    let (app, _guard) = setup();
    profile_create(&app, ana(), false).unwrap();

    let error = meal_estimate_from_name(&app, "arepa con queso".to_string())
        .await
        .unwrap_err();
    assert_eq!(error.code, "MISSING_API_KEY");
}

#[test]
fn settings_store_the_raw_key_but_return_it_masked() {
    let (app, _guard) = setup();

    assert!(settings_get(&app).unwrap().gemini_api_key.is_none());

    let view = settings_update(
        &app,
        SettingsUpdateInput {
            gemini_api_key: Some(Some("sk-test-123456".to_string())),
        },
    )
    .unwrap();
    assert_eq!(view.gemini_api_key.as_deref(), Some("**********3456"));
    assert!(app.estimation().is_configured());

    let view = settings_update(
        &app,
        SettingsUpdateInput {
            gemini_api_key: Some(None),
        },
    )
    .unwrap();
    assert!(view.gemini_api_key.is_none());
    assert!(!app.estimation().is_configured());
}

#[test]
fn settings_update_without_a_key_field_changes_nothing() {
    let (app, _guard) = setup();
    settings_update(
        &app,
        SettingsUpdateInput {
            gemini_api_key: Some(Some("sk-test-123456".to_string())),
        },
    )
    .unwrap();

    let view = settings_update(&app, SettingsUpdateInput::default()).unwrap();
    assert_eq!(view.gemini_api_key.as_deref(), Some("**********3456"));
    assert!(app.estimation().is_configured());
}

#[test]
fn legacy_browser_blob_is_migrated_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("data")).unwrap();

    let legacy = serde_json::json!({
        "profile": { "name": "Ana", "age": 25, "weight": 70.0, "height": 175,
                     "gender": "male", "activity": 1.55, "goal": "maintain" },
        "dailyGoal": 2594,
        "dailyWaterGoal": 10,
        "macros": { "protein": 140, "carbs": 347, "fats": 72 },
        "consumed": { "calories": 640, "protein": 32, "carbs": 70, "fats": 18 },
        "meals": [ { "id": 1, "name": "arepa", "calories": 640,
                     "protein": 32, "carbs": 70, "fats": 18 } ],
        "weightHistory": [ { "date": "2026-02-20", "weight": 70.0 } ],
        "settings": { "geminiApiKey": "sk-legacy-9999" }
    });
    store
        .put(STATE_KEY, serde_json::to_vec(&legacy).unwrap().as_slice())
        .unwrap();

    let app = app_for(&temp_dir);

    // The flat record landed on today's date, which is also the cursor.
    let status = daily_status_get(&app).unwrap();
    assert_eq!(status.consumed.calories, 640);
    assert_eq!(status.burned_calories, 0.0);
    assert_eq!(status.water, 0);

    // Targets come back re-derived from the profile, and the stored key is
    // alive (masked on the way out).
    let summary = profile_get(&app).unwrap().unwrap();
    assert_eq!(summary.targets.daily_calorie_goal, 2594);
    assert_eq!(
        settings_get(&app).unwrap().gemini_api_key.as_deref(),
        Some("**********9999")
    );
    assert!(app.estimation().is_configured());
}

#[test]
fn corrupt_blob_loads_as_fresh_state() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("data")).unwrap();
    store.put(STATE_KEY, b"{\"profile\": <garbage>").unwrap();

    let app = app_for(&temp_dir);
    assert!(profile_get(&app).unwrap().is_none());
    assert_eq!(daily_status_get(&app).unwrap().consumed.calories, 0);
}
