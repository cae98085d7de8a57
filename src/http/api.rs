//! Configuration section handlers.
//!
//! List sections travel wrapped in an object keyed by the section name
//! (`{"rule_files": [...]}`); object sections use the bare object.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::coordinator::OperationResult;
use crate::error::{MutationError, MutationResult};
use crate::http::response::{json_to_yaml, yaml_to_json};
use crate::http::server::AppState;
use crate::prometheus::Section;

#[derive(Debug, Default, Deserialize)]
pub struct WriteParams {
    #[serde(default)]
    pub sort_keys: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub job_name: Option<String>,
    #[serde(default)]
    pub sort_keys: bool,
}

pub async fn get_document(State(state): State<AppState>) -> MutationResult<Json<Value>> {
    let document = state.coordinator.document().await?;
    let root = serde_yaml::Value::Mapping(document.into_mapping());
    Ok(Json(yaml_to_json(&root)?))
}

pub async fn put_document(
    State(state): State<AppState>,
    Query(params): Query<WriteParams>,
    body: Bytes,
) -> MutationResult<Json<OperationResult>> {
    let patch = match json_to_yaml(&parse_json(&body)?)? {
        serde_yaml::Value::Mapping(mapping) => mapping,
        _ => return Err(MutationError::Validation("request body must be an object".into())),
    };
    let result = state.coordinator.patch_document(patch, params.sort_keys).await?;
    Ok(Json(result))
}

pub async fn get_section(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> MutationResult<Json<Value>> {
    let section = parse_section(&name)?;
    let value = yaml_to_json(&state.coordinator.section(section).await?)?;
    Ok(Json(wrap(section, value)))
}

pub async fn patch_section(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<WriteParams>,
    body: Bytes,
) -> MutationResult<Json<OperationResult>> {
    let section = parse_section(&name)?;
    let payload = unwrap(section, parse_json(&body)?)?;
    let result = state
        .coordinator
        .patch_section(section, json_to_yaml(&payload)?, params.sort_keys)
        .await?;
    Ok(Json(result))
}

/// Set sections take a wrapped list of values; `scrape_configs` takes `?job_name=`.
pub async fn delete_section(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<DeleteParams>,
    body: Bytes,
) -> MutationResult<Json<OperationResult>> {
    let section = parse_section(&name)?;
    let result = match section {
        Section::ScrapeConfigs => {
            let job_name = params
                .job_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| MutationError::Validation("job_name query parameter is required".into()))?;
            state.coordinator.delete_scrape_config(job_name, params.sort_keys).await?
        }
        Section::RuleFiles | Section::ScrapeConfigFiles => {
            let values = unwrap(section, parse_json(&body)?)?;
            state
                .coordinator
                .remove_values(section, json_to_yaml(&values)?, params.sort_keys)
                .await?
        }
        _ => {
            return Err(MutationError::Unsupported {
                section,
                operation: "delete",
            })
        }
    };
    Ok(Json(result))
}

fn parse_section(name: &str) -> MutationResult<Section> {
    name.parse()
        .map_err(|e: crate::prometheus::UnknownSection| MutationError::NotFound(e.to_string()))
}

fn parse_json(body: &[u8]) -> MutationResult<Value> {
    serde_json::from_slice(body).map_err(|e| MutationError::Validation(format!("invalid JSON body: {e}")))
}

fn wrap(section: Section, value: Value) -> Value {
    if section.is_list() {
        let mut object = serde_json::Map::new();
        object.insert(section.as_str().to_string(), value);
        Value::Object(object)
    } else {
        value
    }
}

fn unwrap(section: Section, body: Value) -> MutationResult<Value> {
    if !section.is_list() {
        return Ok(body);
    }
    match body {
        Value::Object(mut object) => object.remove(section.as_str()).ok_or_else(|| {
            MutationError::Validation(format!("request body must contain '{section}'"))
        }),
        _ => Err(MutationError::Validation(format!(
            "request body must be an object with a '{section}' list"
        ))),
    }
}
