use crate::groups;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    gb_fail, load, required_str, respond, save, store, str_or_empty, Reply,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::{debug, info};

fn groups_list(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let dataset = load(store, req)?;
    Ok(ok(&req.id, json!({ "groups": groups::summaries(&dataset) })))
}

fn groups_create(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = str_or_empty(req, "name");

    let mut dataset = load(store, req)?;
    let created = match groups::create_group(&mut dataset, &name) {
        Ok(g) => g.created.clone(),
        Err(e) => return Err(gb_fail(req, e)),
    };
    save(store, req, &dataset)?;
    info!(group = %name, "group created");
    Ok(ok(&req.id, json!({ "name": name, "created": created })))
}

fn groups_get(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let dataset = load(store, req)?;
    let group = groups::group(&dataset, &name).map_err(|e| gb_fail(req, e))?;
    Ok(ok(&req.id, json!({ "name": name, "group": group })))
}

fn groups_delete(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let mut dataset = load(store, req)?;
    let removed = groups::delete_group(&mut dataset, &name).map_err(|e| gb_fail(req, e))?;
    save(store, req, &dataset)?;
    info!(
        group = %name,
        students = removed.students.len(),
        lessons = removed.lessons.len(),
        "group deleted"
    );
    Ok(ok(&req.id, json!({ "deleted": name })))
}

fn subjects_add(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let subject = str_or_empty(req, "subject");
    let mut dataset = load(store, req)?;
    let group = groups::group_mut(&mut dataset, &name).map_err(|e| gb_fail(req, e))?;

    let changed = groups::add_subject(group, &subject);
    let subjects = group.subjects.clone();
    if changed {
        save(store, req, &dataset)?;
        info!(group = %name, subject = %subject, "subject added");
    } else {
        debug!(group = %name, subject = %subject, "subject empty or already present");
    }
    Ok(ok(&req.id, json!({ "subjects": subjects, "changed": changed })))
}

fn subjects_remove(state: &mut AppState, req: &Request) -> Reply {
    let store = store(state, req)?;
    let name = required_str(req, "group")?;
    let subject = required_str(req, "subject")?;
    let mut dataset = load(store, req)?;
    let group = groups::group_mut(&mut dataset, &name).map_err(|e| gb_fail(req, e))?;

    let changed = groups::remove_subject(group, &subject);
    let subjects = group.subjects.clone();
    if changed {
        save(store, req, &dataset)?;
        info!(group = %name, subject = %subject, "subject removed");
    } else {
        debug!(group = %name, subject = %subject, "subject not registered");
    }
    Ok(ok(&req.id, json!({ "subjects": subjects, "changed": changed })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let reply = match req.method.as_str() {
        "groups.list" => groups_list(state, req),
        "groups.create" => groups_create(state, req),
        "groups.get" => groups_get(state, req),
        "groups.delete" => groups_delete(state, req),
        "subjects.add" => subjects_add(state, req),
        "subjects.remove" => subjects_remove(state, req),
        _ => return None,
    };
    Some(respond(reply))
}
