use crate::groups;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    gb_fail, load, optional_str, required_str, respond, save, store, Reply,
};
use crate::ipc::types::{AppState, Request};
use crate::lessons::{self, LessonInput};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

/// `params.grades` is `{ studentId: "5 4,5" }`. Bare numbers are accepted as
/// single tokens; other value types are skipped.
fn grade_inputs(req: &Request) -> Result<BTreeMap<String, String>, serde_json::Value> {
    let Some(raw) = req.params.get("grades") else {
        return Ok(BTreeMap::new());
    };
    if raw.is_null() {
        return Ok(BTreeMap::new());
    }
    let Some(obj) = raw.as_object() else {
        return Err(err(
            &req.id,
            "bad_params",
            "grades must be an object of studentId -> grade text",
            None,
        ));
    };
    Ok(obj
        .iter()
        .filter_map(|(student_id, v)| {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((student_id.clone(), text))
        })
        .collect())
}

fn lessons_record(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let input = LessonInput {
        subject: req.params.get("subject").and_then(|v| v.as_str()).map(str::to_string),
        date: optional_str(req, "date"),
        topic: req.params.get("topic").and_then(|v| v.as_str()).map(str::to_string),
        homework: req
            .params
            .get("homework")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        grades: grade_inputs(req)?,
    };

    let mut dataset = load(store, req)?;
    let group = groups::group_mut(&mut dataset, &name).map_err(|e| gb_fail(req, e))?;
    let lesson = lessons::record_lesson(group, input).clone();
    let lesson_index = group.lessons.len() - 1;
    save(store, req, &dataset)?;
    info!(
        group = %name,
        subject = lesson.subject.as_deref().unwrap_or(""),
        date = %lesson.date,
        graded = lesson.grades.len(),
        "lesson recorded"
    );
    Ok(ok(
        &req.id,
        json!({ "lessonIndex": lesson_index, "lesson": lesson }),
    ))
}

fn lessons_journal(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let dataset = load(store, req)?;
    let group = groups::group(&dataset, &name).map_err(|e| gb_fail(req, e))?;
    Ok(ok(
        &req.id,
        json!({
            "lessons": lessons::journal(group),
            "students": group.students,
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let reply = match req.method.as_str() {
        "lessons.record" => lessons_record(state, req),
        "lessons.journal" => lessons_journal(state, req),
        _ => return None,
    };
    Some(respond(reply))
}
