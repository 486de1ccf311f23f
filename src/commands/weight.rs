use serde::Serialize;

use crate::commands::{AppState, CommandError, CommandResult};
use crate::error::AppError;
use crate::models::targets::Targets;
use crate::models::weight::{self, WeightEntry};
use crate::services::goal_service;
use crate::utils::dates;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightLogResult {
    pub weight_history: Vec<WeightEntry>,
    pub targets: Targets,
}

/// Logs today's weight, overwriting an earlier entry for the same date.
/// The profile weight follows the measurement and the daily targets are
/// re-derived from it.
pub fn weight_log(app: &AppState, value: f64) -> CommandResult<WeightLogResult> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation("体重必须为正数").into());
    }

    app.mutate(|state| {
        let Some(profile) = state.profile.as_mut() else {
            return Err(AppError::validation("请先完成个人资料，才能记录体重"));
        };
        profile.weight = value;
        let targets = goal_service::compute_targets(profile);

        state.targets = targets;
        weight::upsert(&mut state.weight_history, &dates::today_string(), value);

        Ok(WeightLogResult {
            weight_history: state.weight_history.clone(),
            targets,
        })
    })
    .map_err(CommandError::from)
}

pub fn weight_history_get(app: &AppState) -> CommandResult<Vec<WeightEntry>> {
    Ok(app.read(|state| state.weight_history.clone()))
}
