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

#[test]
fn statistics_rank_tier_and_skip_ungraded_students() {
    let workspace = temp_dir("gradebook-statistics");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "g", "groups.create", json!({ "name": "11A" }));
    for (i, name) in ["Satisfactory", "Excellent", "Ungraded", "Good"].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("st{}", i),
            "students.create",
            json!({ "group": "11A", "name": name }),
        );
    }
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "l1",
        "lessons.record",
        json!({
            "group": "11A",
            "subject": "History",
            "date": "10.10.2024",
            "grades": { "1": "3", "2": "5 5", "3": "", "4": "4" }
        }),
    );

    let stats = request_ok(
        &mut stdin,
        &mut reader,
        "s",
        "analytics.groupStatistics",
        json!({ "group": "11A" }),
    );
    assert_eq!(stats.get("studentsCount").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(stats.get("gradedCount").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(stats.get("lessonsCount").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(
        stats.get("tiers"),
        Some(&json!({ "excellent": 1, "good": 1, "satisfactory": 1, "poor": 0 }))
    );

    let ranked: Vec<(String, f64, String)> = stats
        .get("rankedAverages")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|s| {
            (
                s["name"].as_str().unwrap_or("").to_string(),
                s["average"].as_f64().unwrap_or(-1.0),
                s["tier"].as_str().unwrap_or("").to_string(),
            )
        })
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Excellent".to_string(), 5.0, "excellent".to_string()),
            ("Good".to_string(), 4.0, "good".to_string()),
            ("Satisfactory".to_string(), 3.0, "satisfactory".to_string()),
        ]
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
