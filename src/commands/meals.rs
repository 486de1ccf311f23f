use crate::commands::{AppState, CommandError, CommandResult};
use crate::error::AppError;
use crate::models::estimate::MealEstimate;
use crate::models::ledger::Meal;
use crate::services::ledger_service::{self, MealInput};

/// Logs a meal against the currently selected date and folds it into that
/// day's running totals.
pub fn meal_add(app: &AppState, input: MealInput) -> CommandResult<Meal> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("食物名称不能为空").into());
    }

    app.mutate(|state| {
        let date = state.selected_date.clone();
        let record = ledger_service::get_or_create(&mut state.history, &date);
        Ok(ledger_service::add_meal(record, input))
    })
    .map_err(CommandError::from)
}

/// Deletes a meal from the selected date. An unknown id is a silent no-op;
/// the returned flag reports whether anything changed.
pub fn meal_delete(app: &AppState, meal_id: i64) -> CommandResult<bool> {
    app.mutate(|state| {
        let date = state.selected_date.clone();
        match state.history.get_mut(&date) {
            Some(record) => Ok(ledger_service::remove_meal(record, meal_id)),
            None => Ok(false),
        }
    })
    .map_err(CommandError::from)
}

/// Photo-based estimation. Returns the estimate for the user to review and
/// confirm; nothing is logged until `meal_add`.
pub async fn meal_estimate_from_image(
    app: &AppState,
    image: Vec<u8>,
    mime_type: String,
) -> CommandResult<MealEstimate> {
    app.estimation()
        .estimate_meal_from_image(&image, &mime_type)
        .await
        .map_err(CommandError::from)
}

/// Name-based nutrition lookup, same review-then-confirm flow.
pub async fn meal_estimate_from_name(
    app: &AppState,
    description: String,
) -> CommandResult<MealEstimate> {
    app.estimation()
        .estimate_meal_from_name(&description)
        .await
        .map_err(CommandError::from)
}
