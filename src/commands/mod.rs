pub mod exercise;
pub mod meals;
pub mod profile;
pub mod settings;
pub mod tracking;
pub mod weight;

use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::models::state::TrackerState;
use crate::services::estimation_service::EstimationService;
use crate::services::goal_service;
use crate::storage::{self, BlobStore};
use crate::utils::dates;

/// Process-wide application state: the in-memory tracker state, the blob
/// store it is written through to, and the estimation gateway. Commands are
/// plain functions over this struct, invoked by the presentation layer.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn BlobStore>,
    state: Arc<RwLock<TrackerState>>,
    estimation: EstimationService,
}

impl AppState {
    /// Reads and migrates the persisted blob, resets the date cursor to
    /// today and re-derives targets from the profile so legacy payloads with
    /// stale goals come up consistent.
    pub fn load(store: Arc<dyn BlobStore>) -> AppResult<Self> {
        let mut state = storage::load_state(store.as_ref())?;

        state.selected_date = dates::today_string();
        if let Some(profile) = &state.profile {
            state.targets = goal_service::compute_targets(profile);
        }

        let estimation = EstimationService::new()?;
        estimation.configure(state.settings.gemini_api_key.as_deref())?;

        info!(
            target: "app::state",
            has_profile = state.profile.is_some(),
            tracked_days = state.history.len(),
            "application state loaded"
        );

        Ok(Self {
            store,
            state: Arc::new(RwLock::new(state)),
            estimation,
        })
    }

    pub fn estimation(&self) -> &EstimationService {
        &self.estimation
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&TrackerState) -> T) -> T {
        let guard = self.state.read().expect("state lock poisoned");
        f(&guard)
    }

    /// In-memory mutation without a write-back. Used for cursor navigation
    /// and lazy record creation, which the persisted blob picks up with the
    /// next real mutation.
    pub(crate) fn update<T>(&self, f: impl FnOnce(&mut TrackerState) -> T) -> T {
        let mut guard = self.state.write().expect("state lock poisoned");
        f(&mut guard)
    }

    /// Mutation with write-through persistence: the full state is serialized
    /// and written back after the closure succeeds.
    pub(crate) fn mutate<T>(
        &self,
        f: impl FnOnce(&mut TrackerState) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut guard = self.state.write().expect("state lock poisoned");
        let value = f(&mut guard)?;
        storage::save_state(self.store.as_ref(), &guard)?;
        Ok(value)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => CommandError::new("NOT_FOUND", "请求的资源不存在", None),
            AppError::Ai {
                code,
                message,
                correlation_id,
                details,
            } => {
                let mut merged = JsonMap::new();
                if let Some(existing) = details {
                    match existing {
                        JsonValue::Object(map) => {
                            for (key, value) in map {
                                merged.insert(key, value);
                            }
                        }
                        value => {
                            merged.insert("info".to_string(), value);
                        }
                    }
                }
                if let Some(id) = correlation_id {
                    merged.insert("correlationId".to_string(), JsonValue::String(id));
                }
                let detail_value = if merged.is_empty() {
                    None
                } else {
                    Some(JsonValue::Object(merged))
                };
                CommandError::new(code.as_str(), message, detail_value)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "序列化失败", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "文件系统读写失败", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}
