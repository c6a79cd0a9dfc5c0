use super::*;

use crate::app::adb::client::AdbClient;
use crate::app::adb::runner::scripted::{exit, ok, RecordedCall, ScriptedRunner};
use crate::app::config::{AdbSettings, AppConfig};
use crate::app::store::{LinkStore, MemoryBackend};

use std::cell::RefCell;
use std::rc::Rc;

struct Harness {
    state: AppState,
    backend: MemoryBackend,
    calls: Rc<RefCell<Vec<RecordedCall>>>,
}

fn harness(runner: ScriptedRunner) -> Harness {
    let backend = MemoryBackend::default();
    let calls = runner.calls.clone();
    let adb = AdbClient::new(
        Some("adb".to_string()),
        Box::new(runner),
        AdbSettings::default(),
    );
    let store = LinkStore::open(Box::new(backend.clone()));
    Harness {
        state: AppState::new(AppConfig::default(), adb, store),
        backend,
        calls,
    }
}

fn succeeding() -> Harness {
    harness(ScriptedRunner::new(|_| ok("Starting: Intent { act=android.intent.action.VIEW }\n")))
}

fn history(state: &AppState) -> Vec<&str> {
    state.store.history().iter().map(String::as_str).collect()
}

#[test]
fn launch_scenario_builds_history_most_recent_first() {
    let mut h = succeeding();

    launch_deeplink(&mut h.state, None, "app://open/page1".into(), None).expect("launch 1");
    assert_eq!(history(&h.state), vec!["app://open/page1"]);

    launch_deeplink(&mut h.state, None, "app://open/page2".into(), None).expect("launch 2");
    assert_eq!(history(&h.state), vec!["app://open/page2", "app://open/page1"]);

    let again = launch_deeplink(&mut h.state, None, "app://open/page1".into(), None)
        .expect("launch 3");
    assert!(!again.data.recorded);
    assert_eq!(history(&h.state), vec!["app://open/page2", "app://open/page1"]);

    assert_eq!(h.calls.borrow().len(), 3);
    assert_eq!(
        h.backend.saved().expect("saved").history,
        vec!["app://open/page2".to_string(), "app://open/page1".to_string()]
    );
}

#[test]
fn launch_passes_serial_and_trimmed_link() {
    let mut h = succeeding();
    let response = launch_deeplink(
        &mut h.state,
        Some(" emulator-5554 ".into()),
        "  myapp://product/42?ref=a&b=c  ".into(),
        Some("trace-launch".into()),
    )
    .expect("launch");

    assert_eq!(response.trace_id, "trace-launch");
    assert_eq!(response.data.serial.as_deref(), Some("emulator-5554"));
    assert!(response.data.recorded);
    let calls = h.calls.borrow();
    assert_eq!(
        calls[0].args,
        vec![
            "-s",
            "emulator-5554",
            "shell",
            "am",
            "start",
            "-a",
            "android.intent.action.VIEW",
            "-d",
            "myapp://product/42?ref=a&b=c",
        ]
    );
}

#[test]
fn blank_serial_launches_without_device_flag() {
    let mut h = succeeding();
    launch_deeplink(&mut h.state, Some("   ".into()), "app://home".into(), None).expect("launch");
    assert_eq!(h.calls.borrow()[0].args[0], "shell");
}

#[test]
fn launch_rejects_empty_link_without_running_adb() {
    let mut h = succeeding();
    let err = launch_deeplink(&mut h.state, None, "   ".into(), Some("trace-1".into()))
        .expect_err("expected validation error");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert_eq!(err.trace_id, "trace-1");
    assert!(h.calls.borrow().is_empty());
}

#[test]
fn failed_launch_is_not_recorded() {
    let mut h = harness(ScriptedRunner::new(|_| exit(1, "error: device 'X' not found")));
    let err = launch_deeplink(&mut h.state, Some("X".into()), "app://home".into(), None)
        .expect_err("expected failure");
    assert_eq!(err.code, "ERR_DEPENDENCY");
    assert!(h.state.store.history().is_empty());
    assert_eq!(h.backend.save_count(), 0);
}

#[test]
fn save_failure_after_launch_keeps_history_in_memory() {
    let mut h = succeeding();
    h.backend.set_fail_saves(true);
    let err = launch_deeplink(&mut h.state, None, "app://home".into(), Some("trace-io".into()))
        .expect_err("expected save failure");
    assert_eq!(err.code, "ERR_SYSTEM");
    assert_eq!(err.trace_id, "trace-io");
    assert_eq!(history(&h.state), vec!["app://home"]);
}

#[test]
fn launch_from_history_and_favorites_by_index() {
    let mut h = succeeding();
    add_favorite(&mut h.state, "Cart".into(), "app://cart".into(), None).expect("add");
    launch_favorite(&mut h.state, None, 0, None).expect("launch favorite");
    launch_deeplink(&mut h.state, None, "app://home".into(), None).expect("launch");
    launch_history_entry(&mut h.state, None, 1, None).expect("launch history");

    assert_eq!(history(&h.state), vec!["app://home", "app://cart"]);
    let calls = h.calls.borrow();
    assert_eq!(calls.last().expect("call").args.last().map(String::as_str), Some("app://cart"));
}

#[test]
fn launch_by_unknown_index_is_validation_error() {
    let mut h = succeeding();
    assert_eq!(
        launch_history_entry(&mut h.state, None, 0, None)
            .expect_err("no history")
            .code,
        "ERR_VALIDATION"
    );
    assert_eq!(
        launch_favorite(&mut h.state, None, 3, None)
            .expect_err("no favorite")
            .code,
        "ERR_VALIDATION"
    );
}

#[test]
fn add_then_rename_favorite() {
    let mut h = succeeding();
    add_favorite(&mut h.state, "Home".into(), "app://home".into(), None).expect("add");
    let renamed = rename_favorite(&mut h.state, 0, "Main".into(), None).expect("rename");
    assert!(renamed.data);
    assert_eq!(
        serde_json::to_value(h.state.store.favorites()).expect("json"),
        serde_json::json!([{"name": "Main", "deeplink": "app://home"}])
    );
}

#[test]
fn add_favorite_requires_name_and_link() {
    let mut h = succeeding();
    assert_eq!(
        add_favorite(&mut h.state, "".into(), "app://home".into(), None)
            .expect_err("name")
            .code,
        "ERR_VALIDATION"
    );
    assert_eq!(
        add_favorite(&mut h.state, "Home".into(), " ".into(), None)
            .expect_err("link")
            .code,
        "ERR_VALIDATION"
    );
    assert!(h.state.store.favorites().is_empty());
}

#[test]
fn delete_out_of_range_leaves_store_unchanged() {
    let mut h = succeeding();
    add_favorite(&mut h.state, "Home".into(), "app://home".into(), None).expect("add");
    let before = h.state.store.data().clone();
    let response = delete_favorite(&mut h.state, 7, None).expect("delete");
    assert_eq!(response.data, None);
    assert_eq!(h.state.store.data(), &before);
}

#[test]
fn clear_commands_report_removed_counts() {
    let mut h = succeeding();
    launch_deeplink(&mut h.state, None, "app://a".into(), None).expect("launch");
    add_favorite(&mut h.state, "A".into(), "app://a".into(), None).expect("add");
    add_favorite(&mut h.state, "B".into(), "app://b".into(), None).expect("add");

    assert_eq!(clear_history(&mut h.state, None).expect("clear").data, 1);
    assert_eq!(clear_favorites(&mut h.state, None).expect("clear").data, 2);
    assert_eq!(get_links(&h.state, None).data, StoreData::default());
}

#[test]
fn export_and_import_round_through_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("links.json");

    let mut source = succeeding();
    launch_deeplink(&mut source.state, None, "app://a".into(), None).expect("launch");
    add_favorite(&mut source.state, "A".into(), "app://a".into(), None).expect("add");
    let exported = export_links(&source.state, &path, None).expect("export");
    assert_eq!(exported.data.version, 1);

    let mut target = succeeding();
    let first = import_links(&mut target.state, &path, None).expect("import");
    assert_eq!(first.data.favorites_added, 1);
    assert_eq!(first.data.history_added, 1);
    let second = import_links(&mut target.state, &path, None).expect("import again");
    assert_eq!(second.data.total(), 0);
}

#[test]
fn import_rejects_document_without_favorites() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("links.json");
    std::fs::write(&path, r#"{"version": 1, "history": ["app://a"]}"#).expect("write");

    let mut h = succeeding();
    let err = import_links(&mut h.state, &path, Some("trace-imp".into())).expect_err("format");
    assert_eq!(err.code, "ERR_FORMAT");
    assert_eq!(err.trace_id, "trace-imp");
    assert!(h.state.store.history().is_empty());
}

#[test]
fn list_devices_returns_empty_when_adb_fails() {
    let h = harness(ScriptedRunner::new(|_| exit(1, "adb: command failed")));
    let response = list_devices(&h.state, Some("trace-dev".into()));
    assert_eq!(response.trace_id, "trace-dev");
    assert!(response.data.is_empty());
}

#[test]
fn generated_trace_ids_are_unique() {
    let first = resolve_trace_id(None);
    let second = resolve_trace_id(Some("  ".into()));
    assert_ne!(first, second);
    assert_eq!(resolve_trace_id(Some("given".into())), "given");
}
