use crate::commands::{AppState, CommandError, CommandResult};
use crate::models::settings::SettingsView;

#[derive(Debug, Default, Clone)]
pub struct SettingsUpdateInput {
    /// `Some(None)` clears the stored key; `None` leaves it untouched.
    pub gemini_api_key: Option<Option<String>>,
}

pub fn settings_get(app: &AppState) -> CommandResult<SettingsView> {
    Ok(app.read(|state| SettingsView {
        gemini_api_key: state.settings.gemini_api_key.as_deref().map(mask_api_key),
    }))
}

/// Stores the raw key for the gateway and rewires the estimation provider.
/// The provider is rebuilt before the key is persisted, so a configuration
/// failure leaves the stored settings unchanged. The view returned to the
/// caller only ever carries the masked form.
pub fn settings_update(app: &AppState, input: SettingsUpdateInput) -> CommandResult<SettingsView> {
    let Some(update) = input.gemini_api_key else {
        return settings_get(app);
    };
    let new_key = update
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());

    app.estimation()
        .configure(new_key.as_deref())
        .map_err(CommandError::from)?;

    app.mutate(|state| {
        state.settings.gemini_api_key = new_key;
        Ok(())
    })
    .map_err(CommandError::from)?;

    settings_get(app)
}

fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(10), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_keeps_only_the_last_four_characters() {
        assert_eq!(mask_api_key("sk-test-123456"), "**********3456");
        assert_eq!(mask_api_key("abc"), "****");
    }
}
