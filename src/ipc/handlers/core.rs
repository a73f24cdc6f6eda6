use crate::error::GradebookError;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::gb_fail;
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Opens (and if needed initializes) the dataset inside `path`. Returns the
/// number of groups found.
pub fn select_workspace(state: &mut AppState, path: PathBuf) -> Result<usize, GradebookError> {
    let store = Store::open_workspace(&path, &state.data_file)?;
    let dataset = store.load()?;
    info!(
        workspace = %path.display(),
        data_file = %store.path().display(),
        groups = dataset.groups.len(),
        "workspace selected"
    );
    state.workspace = Some(path);
    state.store = Some(store);
    Ok(dataset.groups.len())
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "dataFile": state.store.as_ref().map(|s| s.path().to_string_lossy().to_string()),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, path.clone()) {
        Ok(group_count) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "dataFile": state.store.as_ref().map(|s| s.path().to_string_lossy().to_string()),
                "groupCount": group_count,
            }),
        ),
        Err(e) => gb_fail(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
