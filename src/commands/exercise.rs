use serde::Serialize;

use crate::commands::{AppState, CommandError, CommandResult};
use crate::error::AppError;
use crate::models::ledger::Exercise;
use crate::services::ledger_service;

/// Outcome of an estimate-and-log request. `exercise` is `None` when the
/// estimate came back as zero and nothing was logged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseAddResult {
    pub burned_calories: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<Exercise>,
}

/// Estimates the calorie burn for a free-text activity through the gateway
/// and logs it. A zero estimate is surfaced to the caller without touching
/// the ledger. The target date is captured before the call goes out: a
/// slow estimate must land on the date that was selected when the user
/// submitted, not wherever they navigated to in the meantime.
pub async fn exercise_add_by_description(
    app: &AppState,
    description: String,
) -> CommandResult<ExerciseAddResult> {
    let trimmed = description.trim().to_string();
    if trimmed.is_empty() {
        return Err(AppError::validation("运动描述不能为空").into());
    }

    let (profile, target_date) = app.read(|state| {
        (state.profile.clone(), state.selected_date.clone())
    });
    let Some(profile) = profile else {
        return Err(AppError::validation("请先完成个人资料，才能估算运动消耗").into());
    };

    let estimate = app
        .estimation()
        .estimate_exercise_burn(&profile, &trimmed)
        .await?;

    if estimate.burned_calories <= 0.0 {
        return Ok(ExerciseAddResult {
            burned_calories: 0.0,
            exercise: None,
        });
    }

    app.mutate(|state| {
        let record = ledger_service::get_or_create(&mut state.history, &target_date);
        let exercise =
            ledger_service::add_exercise(record, trimmed.clone(), estimate.burned_calories);
        Ok(ExerciseAddResult {
            burned_calories: exercise.calories,
            exercise: Some(exercise),
        })
    })
    .map_err(CommandError::from)
}

/// Deletes an exercise from the selected date; unknown ids are a silent
/// no-op.
pub fn exercise_delete(app: &AppState, exercise_id: i64) -> CommandResult<bool> {
    app.mutate(|state| {
        let date = state.selected_date.clone();
        match state.history.get_mut(&date) {
            Some(record) => Ok(ledger_service::remove_exercise(record, exercise_id)),
            None => Ok(false),
        }
    })
    .map_err(CommandError::from)
}
