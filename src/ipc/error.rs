use crate::error::GradebookError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn fail(id: &str, e: &GradebookError) -> serde_json::Value {
    let details = match e {
        GradebookError::NotFound { entity, key } => Some(json!({ "entity": entity, "key": key })),
        GradebookError::CorruptData { path, .. } | GradebookError::Storage { path, .. } => {
            Some(json!({ "path": path.to_string_lossy() }))
        }
        GradebookError::DuplicateName(_) => None,
    };
    err(id, e.code(), e.to_string(), details)
}
