use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::config::codec::Format;
use crate::config::field::Snapshot;
use crate::config::manager::{Record, State as ManagerState};
use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub state: String,
    pub source: String,
    pub format: String,
}

/// Body returned by `POST /save`.
///
/// `success` is true only when the update was both applied and written.
/// `applied` tells a failed write apart from a rejected payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub applied: bool,
    pub msg: String,
    /// Paths whose value changed.
    #[serde(default)]
    pub changed: Vec<String>,
}

impl SaveResponse {
    fn failure(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            applied: false,
            msg: msg.into(),
            changed: Vec::new(),
        }
    }
}

fn status_for(error: &ConfigError) -> StatusCode {
    match error {
        ConfigError::Decode(_) => StatusCode::BAD_REQUEST,
        ConfigError::NotManaged => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn get_status<T: Record>(State(state): State<AdminState<T>>) -> Json<SystemStatus> {
    let manager = &state.manager;
    let lifecycle = match manager.state() {
        ManagerState::Unmanaged => "unmanaged",
        ManagerState::Bootstrapping => "bootstrapping",
        ManagerState::Active => "active",
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        state: lifecycle.to_string(),
        source: manager.source().describe(),
        format: format!("{:?}", manager.format()).to_lowercase(),
    })
}

pub async fn get_fields<T: Record>(
    State(state): State<AdminState<T>>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    state
        .manager
        .fields()
        .map(Json)
        .map_err(|e| (status_for(&e), e.to_string()))
}

/// Apply the submitted JSON and persist it.
///
/// The manager's codec decides how the file is written; the submitted body is
/// always JSON, so it is decoded as JSON regardless of the source format.
pub async fn post_save<T: Record>(
    State(state): State<AdminState<T>>,
    body: Bytes,
) -> (StatusCode, Json<SaveResponse>) {
    let manager = state.manager.clone();
    let result = tokio::task::spawn_blocking(move || manager.save_as(Format::Json, &body)).await;

    match result {
        Ok(Ok(changes)) => {
            let changed: Vec<String> = changes.paths().map(str::to_string).collect();
            tracing::info!(changed = changed.len(), "Configuration saved through admin API");
            (
                StatusCode::OK,
                Json(SaveResponse {
                    success: true,
                    applied: true,
                    msg: "Config successfully updated".to_string(),
                    changed,
                }),
            )
        }
        Ok(Err(ConfigError::Unpersisted { changes, error })) => {
            tracing::error!(error = %error, "Configuration applied through admin API but not saved");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveResponse {
                    success: false,
                    applied: true,
                    msg: format!("Config applied but not persisted: {}", error),
                    changed: changes.paths().map(str::to_string).collect(),
                }),
            )
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Rejected configuration save");
            (status_for(&e), Json(SaveResponse::failure(e.to_string())))
        }
        Err(e) => {
            tracing::error!(error = %e, "Save task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveResponse::failure("Failed to save config")),
            )
        }
    }
}
