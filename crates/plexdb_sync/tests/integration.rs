//! Integration tests for the sync engine against an in-memory remote.

use plexdb_core::{CoreError, Session, SessionConfig};
use plexdb_model::{ItemQuery, ItemType, PropertyKind, Record, Value};
use plexdb_sync::{
    Downloader, MemoryRemote, RemoteLayout, RemoteStore, SyncConfig, SyncEngine, Uploader,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn open_session(root: &std::path::Path) -> Arc<Session> {
    let config = SessionConfig::new(root, "acme", "rocket");
    Arc::new(Session::open(config).unwrap())
}

fn register_part(session: &Session) -> Arc<ItemType> {
    session.register_item_type(
        ItemType::item("Part").with_property("Name", PropertyKind::String),
    )
}

fn commit_part(session: &Session, part: &Arc<ItemType>, name: &str) -> i64 {
    let mut txn = session.begin_transaction().unwrap();
    let mut record = Record::item(Arc::clone(part), 1, 1).unwrap();
    record
        .set_property("Name", Some(Value::String(name.into())))
        .unwrap();
    session.create(record, &mut txn).unwrap();
    txn.commit().unwrap()
}

fn uploader(session: &Arc<Session>, remote: &Arc<MemoryRemote>) -> Uploader {
    Uploader::new(
        Arc::clone(session),
        Arc::clone(remote) as Arc<dyn RemoteStore>,
        SyncConfig::default(),
        Arc::new(AtomicBool::new(false)),
    )
}

fn downloader(session: &Arc<Session>, remote: &Arc<MemoryRemote>) -> Downloader {
    Downloader::new(
        Arc::clone(session),
        Arc::clone(remote) as Arc<dyn RemoteStore>,
        SyncConfig::default(),
        Arc::new(AtomicBool::new(false)),
    )
}

#[test]
fn committed_transactions_replicate_between_sessions() {
    let remote = Arc::new(MemoryRemote::new());
    let tmp_a = tempfile::tempdir().unwrap();
    let tmp_b = tempfile::tempdir().unwrap();

    let site_a = open_session(tmp_a.path());
    site_a.progress().mark_initialised();
    let part_a = register_part(&site_a);
    commit_part(&site_a, &part_a, "Widget");

    assert_eq!(uploader(&site_a, &remote).drain().unwrap(), 1);

    let site_b = open_session(tmp_b.path());
    let part_b = register_part(&site_b);
    assert_eq!(downloader(&site_b, &remote).pass().unwrap(), 1);

    let matched = site_b.query_items(&ItemQuery::new(part_b)).unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(
        matched[0].property("Name").unwrap(),
        Some(&Value::String("Widget".into()))
    );
}

#[test]
fn file_payloads_travel_with_their_transaction() {
    use std::io::{Read, Write};

    let remote = Arc::new(MemoryRemote::new());
    let tmp_a = tempfile::tempdir().unwrap();
    let tmp_b = tempfile::tempdir().unwrap();

    let site_a = open_session(tmp_a.path());
    site_a.progress().mark_initialised();
    let drawing = site_a.register_item_type(ItemType::file("Drawing"));

    let mut txn = site_a.begin_transaction().unwrap();
    let file = site_a
        .create(Record::file(drawing, 1, 1).unwrap(), &mut txn)
        .unwrap();
    site_a
        .write_vault(&file)
        .unwrap()
        .write_all(b"drawing bytes")
        .unwrap();
    txn.commit().unwrap();

    uploader(&site_a, &remote).drain().unwrap();

    let site_b = open_session(tmp_b.path());
    let drawing_b = site_b.register_item_type(ItemType::file("Drawing"));
    downloader(&site_b, &remote).pass().unwrap();

    let matched = site_b.query_items(&ItemQuery::new(drawing_b)).unwrap();
    assert_eq!(matched.len(), 1);
    let mut payload = String::new();
    site_b
        .read_vault(&matched[0])
        .unwrap()
        .read_to_string(&mut payload)
        .unwrap();
    assert_eq!(payload, "drawing bytes");
}

#[test]
fn upload_skips_transactions_already_remote() {
    let remote = Arc::new(MemoryRemote::new());
    let tmp = tempfile::tempdir().unwrap();

    let session = open_session(tmp.path());
    session.progress().mark_initialised();
    let part = register_part(&session);
    let commit_time = commit_part(&session, &part, "Widget");

    // Another replica got there first: archive and marker exist.
    let layout = RemoteLayout::new("acme", "rocket");
    remote.upload(&layout.archive_path(commit_time), b"bundle").unwrap();
    remote.upload(&layout.marker_path(commit_time), &[]).unwrap();
    let before = remote.upload_count();

    assert_eq!(uploader(&session, &remote).drain().unwrap(), 0);
    assert_eq!(remote.upload_count(), before);
    assert!(session.upload_queue().is_empty());
}

#[test]
fn failed_upload_leaves_queue_head_for_retry() {
    let remote = Arc::new(MemoryRemote::new());
    let tmp = tempfile::tempdir().unwrap();

    let session = open_session(tmp.path());
    session.progress().mark_initialised();
    let part = register_part(&session);
    let commit_time = commit_part(&session, &part, "Widget");

    let layout = RemoteLayout::new("acme", "rocket");
    remote.set_fail_uploads(true);
    assert!(uploader(&session, &remote).drain().is_err());
    assert_eq!(session.upload_queue().front(), Some(commit_time));
    assert!(!remote.contains(&layout.marker_path(commit_time)));

    remote.set_fail_uploads(false);
    assert_eq!(uploader(&session, &remote).drain().unwrap(), 1);
    assert!(remote.contains(&layout.archive_path(commit_time)));
    assert!(remote.contains(&layout.marker_path(commit_time)));
    assert!(session.upload_queue().is_empty());
}

#[test]
fn uploader_skips_queued_id_without_local_marker() {
    let remote = Arc::new(MemoryRemote::new());
    let tmp = tempfile::tempdir().unwrap();

    let session = open_session(tmp.path());
    session.progress().mark_initialised();
    let part = register_part(&session);
    let commit_time = commit_part(&session, &part, "Widget");

    // The transaction directory vanishes out from under the queue.
    std::fs::remove_dir_all(session.store().transaction_path(commit_time)).unwrap();

    assert_eq!(uploader(&session, &remote).drain().unwrap(), 0);
    assert!(session.upload_queue().is_empty());
    assert_eq!(remote.upload_count(), 0);
}

#[test]
fn downloader_counts_local_transactions_without_fetching() {
    let remote = Arc::new(MemoryRemote::new());
    let tmp = tempfile::tempdir().unwrap();

    let session = open_session(tmp.path());
    session.progress().mark_initialised();
    let part = register_part(&session);
    commit_part(&session, &part, "Widget");
    uploader(&session, &remote).drain().unwrap();

    // The remote marker now names a transaction already committed
    // locally; the pass must not download it.
    remote.set_fail_downloads(true);
    assert_eq!(downloader(&session, &remote).pass().unwrap(), 0);
}

#[test]
fn download_pass_survives_remote_errors() {
    let remote = Arc::new(MemoryRemote::new());
    let tmp = tempfile::tempdir().unwrap();
    let session = open_session(tmp.path());
    register_part(&session);

    remote.set_fail_lists(true);
    assert!(downloader(&session, &remote).pass().is_err());

    remote.set_fail_lists(false);
    assert_eq!(downloader(&session, &remote).pass().unwrap(), 0);
}

#[test]
fn engine_initialises_session_and_gates_local_commits() {
    let remote = Arc::new(MemoryRemote::new());
    let tmp = tempfile::tempdir().unwrap();
    let session = open_session(tmp.path());
    register_part(&session);

    assert!(matches!(
        session.begin_transaction().unwrap_err(),
        CoreError::NotInitialised
    ));

    let engine = SyncEngine::start(
        Arc::clone(&session),
        Arc::clone(&remote) as Arc<dyn RemoteStore>,
        SyncConfig::default(),
    )
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !session.progress().is_initialised() {
        assert!(Instant::now() < deadline, "downloader never initialised");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(session.begin_transaction().is_ok());

    engine.shutdown();
}
