use crate::calc;
use crate::error::GradebookError;
use crate::groups;
use crate::ipc::error::ok;
use crate::ipc::helpers::{gb_fail, load, required_id, required_str, respond, store, Reply};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::debug;

fn student_history(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let student_id = required_id(req, "studentId")?;
    let dataset = load(store, req)?;
    let group = groups::group(&dataset, &name).map_err(|e| gb_fail(req, e))?;

    let Some((id, student)) = group.student(&student_id) else {
        return Err(gb_fail(
            req,
            GradebookError::NotFound {
                entity: "student",
                key: student_id,
            },
        ));
    };
    // Grade maps are keyed by the canonical id string.
    let history = calc::student_history(group, &id.to_string());
    let averages = calc::subject_averages(&history);
    Ok(ok(
        &req.id,
        json!({
            "studentId": id.to_string(),
            "student": student,
            "subjectsGrades": history,
            "averages": averages,
        }),
    ))
}

fn group_statistics(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let dataset = load(store, req)?;
    let group = groups::group(&dataset, &name).map_err(|e| gb_fail(req, e))?;

    let stats = calc::group_statistics(group);
    debug!(
        group = %name,
        graded = stats.tiers.total(),
        students = stats.students_count,
        "group statistics computed"
    );
    Ok(ok(&req.id, json!(stats)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let reply = match req.method.as_str() {
        "analytics.studentHistory" => student_history(state, req),
        "analytics.groupStatistics" => group_statistics(state, req),
        _ => return None,
    };
    Some(respond(reply))
}
