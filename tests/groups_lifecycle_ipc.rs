use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .env_remove("GRADEBOOKD_WORKSPACE")
        .env_remove("GRADEBOOKD_DATA_FILE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn group_subject_and_student_lifecycle() {
    let workspace = temp_dir("gradebook-groups-lifecycle");
    let data_file = workspace.join("groups.json");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected.get("groupCount").and_then(|v| v.as_u64()), Some(0));
    assert!(data_file.is_file(), "select initializes the data file");

    let _ = request_ok(&mut stdin, &mut reader, "2", "groups.create", json!({ "name": "10А" }));
    let before = std::fs::read_to_string(&data_file).expect("read data file");

    let dup = request(&mut stdin, &mut reader, "3", "groups.create", json!({ "name": "10А" }));
    assert_eq!(error_code(&dup), Some("duplicate_name"));
    let empty = request(&mut stdin, &mut reader, "4", "groups.create", json!({ "name": "" }));
    assert_eq!(error_code(&empty), Some("duplicate_name"));
    assert_eq!(
        std::fs::read_to_string(&data_file).expect("reread data file"),
        before,
        "failed create must not touch the file"
    );

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "subjects.add",
        json!({ "group": "10А", "subject": "Алгебра" }),
    );
    assert_eq!(added.get("changed"), Some(&json!(true)));
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "subjects.add",
        json!({ "group": "10А", "subject": "Алгебра" }),
    );
    assert_eq!(again.get("changed"), Some(&json!(false)));
    assert_eq!(again.get("subjects"), Some(&json!(["Алгебра"])));
    let missing_subject = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "subjects.remove",
        json!({ "group": "10А", "subject": "Химия" }),
    );
    assert_eq!(missing_subject.get("changed"), Some(&json!(false)));

    for (i, name) in ["Аня", "Борис", "Вера"].iter().enumerate() {
        let created = request_ok(
            &mut stdin,
            &mut reader,
            &format!("s{}", i),
            "students.create",
            json!({ "group": "10А", "name": name }),
        );
        assert_eq!(
            created.get("studentId").and_then(|v| v.as_str()),
            Some(format!("{}", i + 1).as_str())
        );
    }
    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.delete",
        json!({ "group": "10А", "studentId": "2" }),
    );
    assert_eq!(removed.get("removed"), Some(&json!(true)));
    let removed_again = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "students.delete",
        json!({ "group": "10А", "studentId": 2 }),
    );
    assert_eq!(removed_again.get("removed"), Some(&json!(false)));

    let next = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "students.create",
        json!({ "group": "10А", "name": "Глеб" }),
    );
    assert_eq!(next.get("studentId").and_then(|v| v.as_str()), Some("4"));
    let blank = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "students.create",
        json!({ "group": "10А", "name": "" }),
    );
    assert!(blank.get("studentId").map(|v| v.is_null()).unwrap_or(false));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "students.list",
        json!({ "group": "10А" }),
    );
    let ids: Vec<String> = listed
        .get("students")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| s.get("studentId").and_then(|v| v.as_str()).map(|s| s.to_string()))
        .collect();
    assert_eq!(ids, vec!["1", "3", "4"]);

    let groups = request_ok(&mut stdin, &mut reader, "13", "groups.list", json!({}));
    let first = groups
        .get("groups")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
        .cloned()
        .expect("one group");
    assert_eq!(first.get("studentCount").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(first.get("subjectCount").and_then(|v| v.as_u64()), Some(1));

    let _ = request_ok(&mut stdin, &mut reader, "14", "groups.delete", json!({ "group": "10А" }));
    let gone = request(&mut stdin, &mut reader, "15", "groups.delete", json!({ "group": "10А" }));
    assert_eq!(error_code(&gone), Some("not_found"));
    let gone_get = request(&mut stdin, &mut reader, "16", "groups.get", json!({ "group": "10А" }));
    assert_eq!(error_code(&gone_get), Some("not_found"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn corrupt_data_file_is_reported_not_overwritten() {
    let workspace = temp_dir("gradebook-corrupt");
    let data_file = workspace.join("groups.json");
    std::fs::write(&data_file, "[1, 2").expect("write corrupt file");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(error_code(&selected), Some("corrupt_data"));
    assert_eq!(
        std::fs::read_to_string(&data_file).expect("read back"),
        "[1, 2"
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
