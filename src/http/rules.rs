//! Rule file handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::coordinator::OperationResult;
use crate::error::{MutationError, MutationResult};
use crate::http::response::error_with_file;
use crate::http::server::AppState;
use crate::rules::{RuleFileInfo, CREATED_MESSAGE, REPLACED_MESSAGE};

pub async fn list_rules(State(state): State<AppState>) -> MutationResult<Json<Vec<RuleFileInfo>>> {
    Ok(Json(state.rules.list_rules()?))
}

pub async fn get_rule(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> MutationResult<Json<Value>> {
    Ok(Json(state.rules.read_rule(&file)?))
}

/// Create a rule file under a generated name.
pub async fn create_rule(State(state): State<AppState>, body: Bytes) -> Response {
    commit_rule(&state, None, &body).await
}

/// Write a rule file under the caller's name: 201 when new, 200 when replaced.
pub async fn replace_rule(
    State(state): State<AppState>,
    Path(file): Path<String>,
    body: Bytes,
) -> Response {
    commit_rule(&state, Some(file.as_str()), &body).await
}

/// Once a name is chosen, error bodies carry it too.
async fn commit_rule(state: &AppState, filename: Option<&str>, body: &[u8]) -> Response {
    let rule = match parse_rule(body) {
        Ok(rule) => rule,
        Err(e) => return e.into_response(),
    };
    let file = match state.rules.file_name(filename) {
        Ok(file) => file,
        Err(e) => return e.into_response(),
    };

    match state.rules.write_rule(&rule, file.clone()).await {
        Ok(commit) => {
            let (status, message) = if commit.created {
                (StatusCode::CREATED, CREATED_MESSAGE)
            } else {
                (StatusCode::OK, REPLACED_MESSAGE)
            };
            (status, Json(OperationResult::success(message).with_file(commit.file))).into_response()
        }
        Err(e) => error_with_file(e, file),
    }
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> MutationResult<StatusCode> {
    state.rules.delete_rule(&file).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_rule(body: &[u8]) -> MutationResult<Value> {
    serde_json::from_slice(body).map_err(|e| MutationError::Validation(format!("invalid JSON body: {e}")))
}
