use crate::groups;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    gb_fail, load, required_id, required_str, respond, save, store, str_or_empty, Reply,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::{debug, info, warn};

fn students_list(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let dataset = load(store, req)?;
    let group = groups::group(&dataset, &name).map_err(|e| gb_fail(req, e))?;

    let students: Vec<serde_json::Value> = group
        .students
        .iter()
        .map(|(id, s)| {
            json!({
                "studentId": id.to_string(),
                "name": s.name,
                "dateAdded": s.date_added,
            })
        })
        .collect();
    Ok(ok(&req.id, json!({ "students": students })))
}

fn students_create(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let student_name = str_or_empty(req, "name");
    let mut dataset = load(store, req)?;
    let group = groups::group_mut(&mut dataset, &name).map_err(|e| gb_fail(req, e))?;

    let Some(student_id) = groups::add_student(group, &student_name) else {
        if student_name.is_empty() {
            debug!(group = %name, "empty student name ignored");
        } else {
            warn!(group = %name, "no student id left to assign");
        }
        return Ok(ok(&req.id, json!({ "studentId": null })));
    };
    save(store, req, &dataset)?;
    info!(group = %name, student_id = %student_id, "student added");
    Ok(ok(&req.id, json!({ "studentId": student_id.to_string() })))
}

fn students_delete(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let student_id = required_id(req, "studentId")?;
    let mut dataset = load(store, req)?;
    let group = groups::group_mut(&mut dataset, &name).map_err(|e| gb_fail(req, e))?;

    let removed = groups::remove_student(group, &student_id);
    if let Some(student) = &removed {
        save(store, req, &dataset)?;
        info!(group = %name, student_id = %student_id, student = %student.name, "student removed");
    } else {
        debug!(group = %name, student_id = %student_id, "student not enrolled");
    }
    Ok(ok(&req.id, json!({ "removed": removed.is_some() })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let reply = match req.method.as_str() {
        "students.list" => students_list(state, req),
        "students.create" => students_create(state, req),
        "students.delete" => students_delete(state, req),
        _ => return None,
    };
    Some(respond(reply))
}
