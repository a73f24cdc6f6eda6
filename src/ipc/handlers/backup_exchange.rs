use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str, respond, store, Reply};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn required_path(req: &Request, key: &str) -> Result<PathBuf, serde_json::Value> {
    optional_str(req, key)
        .map(PathBuf::from)
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn backup_failed(req: &Request, e: anyhow::Error) -> serde_json::Value {
    warn!(method = %req.method, "{e:#}");
    err(&req.id, "backup_failed", format!("{e:#}"), None)
}

fn export_bundle(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let out_path = required_path(req, "outPath")?;
    // Materialize the data file so a fresh workspace still exports.
    store.load().map_err(|e| backup_failed(req, e.into()))?;

    let summary = backup::export_dataset_bundle(store.path(), &out_path)
        .map_err(|e| backup_failed(req, e))?;
    info!(out = %out_path.display(), sha256 = %summary.sha256, "dataset bundle exported");
    Ok(ok(
        &req.id,
        json!({
            "bundleFormat": summary.bundle_format,
            "entryCount": summary.entry_count,
            "sha256": summary.sha256,
        }),
    ))
}

fn import_bundle(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let in_path = required_path(req, "inPath")?;

    let summary = backup::import_dataset_bundle(&in_path, store.path())
        .map_err(|e| backup_failed(req, e))?;
    info!(
        source = %in_path.display(),
        format = %summary.bundle_format_detected,
        groups = summary.group_count,
        "dataset imported"
    );
    Ok(ok(
        &req.id,
        json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "groupCount": summary.group_count,
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let reply = match req.method.as_str() {
        "backup.exportBundle" => export_bundle(state, req),
        "backup.importBundle" => import_bundle(state, req),
        _ => return None,
    };
    Some(respond(reply))
}
