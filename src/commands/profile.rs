use serde::{Deserialize, Serialize};

use crate::commands::{AppState, CommandError, CommandResult};
use crate::error::AppError;
use crate::models::profile::{Gender, GoalKind, Profile};
use crate::models::targets::Targets;
use crate::models::weight;
use crate::services::{goal_service, ledger_service};
use crate::utils::dates;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub name: String,
    pub age: u32,
    pub weight: f64,
    pub height: u32,
    pub gender: String,
    pub activity: f64,
    pub goal: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub profile: Profile,
    pub targets: Targets,
}

/// Onboarding (or re-onboarding). Wiping the ledger and weight history is a
/// deliberate, caller-controlled choice: pass `reset_history` only after the
/// user confirmed losing their data.
pub fn profile_create(
    app: &AppState,
    input: ProfileInput,
    reset_history: bool,
) -> CommandResult<ProfileSummary> {
    let profile = validate_profile(input)?;
    let targets = goal_service::compute_targets(&profile);
    let today = dates::today_string();

    app.mutate(|state| {
        if reset_history {
            state.history.clear();
            state.weight_history.clear();
        }

        state.profile = Some(profile.clone());
        state.targets = targets;
        state.selected_date = today.clone();
        weight::upsert(&mut state.weight_history, &today, profile.weight);
        ledger_service::get_or_create(&mut state.history, &today);

        Ok(ProfileSummary {
            profile: profile.clone(),
            targets,
        })
    })
    .map_err(CommandError::from)
}

pub fn profile_get(app: &AppState) -> CommandResult<Option<ProfileSummary>> {
    Ok(app.read(|state| {
        state.profile.clone().map(|profile| ProfileSummary {
            profile,
            targets: state.targets,
        })
    }))
}

fn validate_profile(input: ProfileInput) -> Result<Profile, CommandError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("姓名不能为空").into());
    }
    if input.age == 0 {
        return Err(AppError::validation("年龄必须为正整数").into());
    }
    if !input.weight.is_finite() || input.weight <= 0.0 {
        return Err(AppError::validation("体重必须为正数").into());
    }
    if input.height == 0 {
        return Err(AppError::validation("身高必须为正整数").into());
    }
    if !input.activity.is_finite() || input.activity <= 0.0 {
        return Err(AppError::validation("活动系数必须为正数").into());
    }

    let gender = Gender::try_from(input.gender.as_str()).map_err(AppError::validation)?;
    let goal = GoalKind::try_from(input.goal.as_str()).map_err(AppError::validation)?;

    Ok(Profile {
        name,
        age: input.age,
        weight: input.weight,
        height: input.height,
        gender,
        activity: input.activity,
        goal,
    })
}
