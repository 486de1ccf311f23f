use chrono::Duration;

use crate::commands::{AppState, CommandError, CommandResult};
use crate::models::ledger::DailyStatus;
use crate::services::ledger_service;
use crate::utils::dates;

/// Moves the date cursor one day back. Any past date is reachable; its
/// record is created lazily on first access.
pub fn date_select_prev(app: &AppState) -> CommandResult<String> {
    shift_selected_date(app, -1)
}

/// Moves the date cursor one day forward, clamped at today: stepping beyond
/// today is a no-op that leaves the cursor where it is.
pub fn date_select_next(app: &AppState) -> CommandResult<String> {
    shift_selected_date(app, 1)
}

fn shift_selected_date(app: &AppState, days: i64) -> CommandResult<String> {
    Ok(app.update(|state| {
        let current = dates::parse_date(&state.selected_date).unwrap_or_else(|_| dates::today());
        let shifted = current + Duration::days(days);
        if shifted <= dates::today() {
            state.selected_date = dates::format_date(shifted);
        }
        state.selected_date.clone()
    }))
}

pub fn selected_date_get(app: &AppState) -> CommandResult<String> {
    Ok(app.read(|state| state.selected_date.clone()))
}

/// Adjusts the selected date's water count by a signed number of glasses,
/// floored at 0.
pub fn water_adjust(app: &AppState, delta: i32) -> CommandResult<u32> {
    app.mutate(|state| {
        let date = state.selected_date.clone();
        let record = ledger_service::get_or_create(&mut state.history, &date);
        Ok(ledger_service::adjust_water(record, delta))
    })
    .map_err(CommandError::from)
}

/// Derived view of the selected date against the current targets.
pub fn daily_status_get(app: &AppState) -> CommandResult<DailyStatus> {
    Ok(app.update(|state| {
        let date = state.selected_date.clone();
        let targets = state.targets;
        let record = ledger_service::get_or_create(&mut state.history, &date);
        ledger_service::daily_status(&date, record, &targets)
    }))
}
