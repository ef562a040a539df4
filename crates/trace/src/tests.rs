use super::*;
use mockproc_common::InvocationRequest;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Barrier};
use tempfile::TempDir;

fn request(args: &[&str]) -> InvocationRequest {
    InvocationRequest::new(args.iter().copied(), "/repo")
}

#[test]
fn test_history_preserves_call_order() {
    let history = History::new();
    let first = history.begin(&request(&["git", "status"]));
    let second = history.begin(&request(&["git", "log"]));
    history.finish(
        second,
        EntryOutcome::Resolved {
            route: "log".into(),
            exit_code: 0,
        },
    );
    history.finish(first, EntryOutcome::NoRoute);

    let argvs: Vec<Vec<String>> = history.requests().into_iter().map(|r| r.argv).collect();
    assert_eq!(
        argvs,
        vec![
            vec!["git".to_string(), "status".to_string()],
            vec!["git".to_string(), "log".to_string()],
        ]
    );

    let entries = history.entries();
    assert_eq!(entries[0].outcome, EntryOutcome::NoRoute);
    assert_eq!(entries[1].outcome.as_str(), "resolved");
}

#[test]
fn test_clear_keeps_sequence_monotonic() {
    let history = History::new();
    history.begin(&request(&["a"]));
    history.begin(&request(&["b"]));
    history.clear();
    assert!(history.is_empty());

    let seq = history.begin(&request(&["c"]));
    assert_eq!(seq, 2);
    assert!(history.finish(0, EntryOutcome::NoRoute).is_none());
}

#[test]
fn test_concurrent_begin_never_drops_entries() {
    let history = Arc::new(History::new());
    let threads = 8;
    let per_thread = 50;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let history = Arc::clone(&history);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let seq = history.begin(&request(&["worker", &format!("{t}-{i}")]));
                    history.finish(seq, EntryOutcome::NoRoute);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = history.entries();
    assert_eq!(entries.len(), threads * per_thread);
    assert!(entries.windows(2).all(|w| w[0].seq < w[1].seq));
    assert!(entries.iter().all(|e| e.outcome == EntryOutcome::NoRoute));
}

#[test]
fn test_trace_sink_writes_jsonl() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("trace.jsonl");
    let sink = TraceSink::open(&path, "session-1").unwrap();

    let history = History::new();
    let seq = history.begin(&request(&["git", "push", "--token", "hunter2"]));
    let entry = history
        .finish(
            seq,
            EntryOutcome::Resolved {
                route: "push".into(),
                exit_code: 0,
            },
        )
        .unwrap();
    sink.record_with(&entry, Some(&serde_json::json!({"depth": 1})))
        .unwrap();

    let seq = history.begin(&request(&["git", "bogus"]));
    let entry = history.finish(seq, EntryOutcome::NoRoute).unwrap();
    sink.record(&entry).unwrap();

    let records = read_trace(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["session_id"], "session-1");
    assert_eq!(records[0]["component"], "dispatcher");
    assert_eq!(records[0]["route"], "push");
    assert_eq!(records[0]["exit_code"], 0);
    assert_eq!(records[0]["depth"], 1);
    assert_eq!(
        records[0]["argv"],
        serde_json::json!(["git", "push", "--token", "***"])
    );
    assert_eq!(records[1]["outcome"], "no_route");
    assert!(records[1].get("exit_code").is_none());
}

#[test]
fn test_ordinary_flags_survive_in_trace_records() {
    let history = History::new();
    for argv in [
        &["git", "log", "-p", "HEAD~3"][..],
        &["git", "config", "user.signingkey=ABC"][..],
    ] {
        let seq = history.begin(&request(argv));
        let entry = history.finish(seq, EntryOutcome::NoRoute).unwrap();
        let record = entry_to_json(&entry, "session-1", "dispatcher");
        assert_eq!(record["argv"], serde_json::json!(argv));
    }
}

#[test]
fn test_read_trace_reports_bad_line() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("trace.jsonl");
    std::fs::write(&path, "{\"seq\":0}\n\nnot json\n").unwrap();

    let err = read_trace(&path).unwrap_err();
    assert!(err.to_string().contains(":3"), "unexpected error: {err}");
}
