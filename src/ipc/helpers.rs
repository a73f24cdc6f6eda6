use crate::error::GradebookError;
use crate::ipc::error::{err, fail};
use crate::ipc::types::{AppState, Request};
use crate::model::Dataset;
use crate::store::Store;
use tracing::warn;

/// Handler outcome: both arms are complete response envelopes.
pub type Reply = Result<serde_json::Value, serde_json::Value>;

pub fn respond(reply: Reply) -> serde_json::Value {
    reply.unwrap_or_else(|e| e)
}

pub fn store<'a>(state: &'a AppState, req: &Request) -> Result<&'a Store, serde_json::Value> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Present string param, taken verbatim (group names are not trimmed).
pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Verbatim string param, empty when absent or not a string.
pub fn str_or_empty(req: &Request, key: &str) -> String {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Trimmed string param; absent, null and blank all read as `None`.
pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accepts `"3"` or `3` for id params.
pub fn required_id(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    match req.params.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
    }
}

pub fn gb_fail(req: &Request, e: GradebookError) -> serde_json::Value {
    warn!(method = %req.method, code = e.code(), "{e}");
    fail(&req.id, &e)
}

pub fn load(store: &Store, req: &Request) -> Result<Dataset, serde_json::Value> {
    store.load().map_err(|e| gb_fail(req, e))
}

pub fn save(store: &Store, req: &Request, dataset: &Dataset) -> Result<(), serde_json::Value> {
    store.save(dataset).map_err(|e| gb_fail(req, e))
}
