//! Migration Engine Behavior Tests
//!
//! End-to-end checks of the engine through the public API:
//! - Repeated migration is a no-op
//! - Output keeps the caller's shape and order
//! - Each revision sees only documents at its own version
//! - Batch updaters get one call per level with the eligible group
//! - Absent inputs pass through untouched
//! - Revisions that forget to bump the version are caught
//! - The persistence adapter runs once, only after full success

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docmigrate::migration::{Absence, MigrationError, Payload, Revision, Schema};
use docmigrate::persistence::adapter_fn;
use docmigrate::BoxError;
use serde_json::{json, Value};

// =============================================================================
// Test Utilities
// =============================================================================

/// Per-document revision that bumps `_v` and appends `level` to `trail`
fn tracing_revision(level: u64) -> Revision {
    Revision::map(move |mut doc| {
        let mut trail = doc["trail"].as_array().cloned().unwrap_or_default();
        trail.push(json!(level));
        doc["trail"] = Value::Array(trail);
        doc["_v"] = json!(level + 1);
        Ok(doc)
    })
}

/// Batch revision that records each call's input and bumps `_v`
fn recording_batch(level: u64, calls: Arc<Mutex<Vec<(u64, Vec<Value>)>>>) -> Revision {
    Revision::batch(move |docs: Vec<Value>| {
        let calls = Arc::clone(&calls);
        async move {
            calls.lock().unwrap().push((level, docs.clone()));
            Ok::<_, BoxError>(
                docs.into_iter()
                    .map(|mut doc| {
                        doc["_v"] = json!(level + 1);
                        doc
                    })
                    .collect(),
            )
        }
    })
}

fn tracing_schema(levels: u64) -> Schema {
    Schema::new((0..levels).map(tracing_revision).collect()).unwrap()
}

fn counting_adapter(
    count: Arc<AtomicUsize>,
) -> impl docmigrate::PersistenceAdapter {
    adapter_fn(move |_payload: Payload| {
        let count = Arc::clone(&count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(())
        }
    })
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn test_migrating_twice_changes_nothing() {
    let schema = tracing_schema(3);

    let once = schema
        .migrate(json!([{"_v": 0}, {"_v": 2}, {"_v": 3}]))
        .await
        .unwrap();
    let twice = schema.migrate(once.clone()).await.unwrap();

    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_current_documents_are_not_touched() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let schema = Schema::new(vec![Revision::per_document(move |mut doc: Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            doc["_v"] = json!(1);
            Ok::<_, BoxError>(doc)
        }
    })])
    .unwrap();

    let doc = json!({"_v": 1, "payload": "kept"});
    let out = schema.migrate_one(doc.clone()).await.unwrap();

    assert_eq!(out, doc);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Shape and Order
// =============================================================================

#[tokio::test]
async fn test_list_order_preserved_across_versions() {
    let schema = tracing_schema(3);
    let input = vec![
        json!({"_v": 2, "id": "a"}),
        json!({"_v": 0, "id": "b"}),
        json!({"_v": 3, "id": "c"}),
        json!({"_v": 1, "id": "d"}),
    ];

    let out = schema.migrate_many(input).await.unwrap();

    let ids: Vec<_> = out.iter().map(|doc| doc["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["a", "b", "c", "d"]);
    assert!(out.iter().all(|doc| doc["_v"] == 3));
}

#[tokio::test]
async fn test_single_in_single_out() {
    let out = tracing_schema(1).migrate(json!({"_v": 0})).await.unwrap();
    assert!(matches!(out, Payload::Single(_)));

    let out = tracing_schema(1).migrate(json!([{"_v": 0}])).await.unwrap();
    assert!(matches!(out, Payload::Many(ref docs) if docs.len() == 1));
}

// =============================================================================
// Selective Application
// =============================================================================

#[tokio::test]
async fn test_each_document_gets_only_the_revisions_it_needs() {
    let schema = tracing_schema(4);

    let out = schema
        .migrate_many(vec![json!({"_v": 0}), json!({"_v": 2}), json!({"_v": 4})])
        .await
        .unwrap();

    assert_eq!(out[0]["trail"], json!([0, 1, 2, 3]));
    assert_eq!(out[1]["trail"], json!([2, 3]));
    assert_eq!(out[2].get("trail"), None);
}

// =============================================================================
// Batch Grouping
// =============================================================================

#[tokio::test]
async fn test_batch_called_once_per_level_with_eligible_documents() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let schema = Schema::new(vec![
        recording_batch(0, Arc::clone(&calls)),
        recording_batch(1, Arc::clone(&calls)),
        recording_batch(2, Arc::clone(&calls)),
    ])
    .unwrap();

    let out = schema
        .migrate_many(vec![
            json!({"_v": 0, "n": 0}),
            json!({"_v": 1, "n": 1}),
            json!({"_v": 0, "n": 2}),
            json!({"_v": 2, "n": 3}),
        ])
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    let seen: Vec<(u64, Vec<i64>)> = calls
        .iter()
        .map(|(level, docs)| (*level, docs.iter().map(|d| d["n"].as_i64().unwrap()).collect()))
        .collect();

    assert_eq!(
        seen,
        vec![(0, vec![0, 2]), (1, vec![0, 1, 2]), (2, vec![0, 1, 2, 3])]
    );
    assert_eq!(calls[1].1[0]["_v"], 1);
    assert!(out.iter().all(|doc| doc["_v"] == 3));
}

#[tokio::test]
async fn test_batch_skipped_when_no_document_is_eligible() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let schema = Schema::new(vec![
        recording_batch(0, Arc::clone(&calls)),
        recording_batch(1, Arc::clone(&calls)),
    ])
    .unwrap();

    schema.migrate_one(json!({"_v": 1})).await.unwrap();

    let levels: Vec<u64> = calls.lock().unwrap().iter().map(|(level, _)| *level).collect();
    assert_eq!(levels, vec![1]);
}

#[tokio::test]
async fn test_mixed_updater_kinds() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let schema = Schema::new(vec![
        tracing_revision(0),
        recording_batch(1, Arc::clone(&calls)),
        tracing_revision(2),
    ])
    .unwrap();

    let out = schema
        .migrate_many(vec![json!({"_v": 0}), json!({"_v": 2})])
        .await
        .unwrap();

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(calls.lock().unwrap()[0].1.len(), 1);
    assert_eq!(out[0]["trail"], json!([0, 2]));
    assert_eq!(out[1]["trail"], json!([2]));
}

#[tokio::test]
async fn test_batch_level_after_per_document_level_sees_upgraded_and_original() {
    let per_document_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&per_document_calls);
    let batch_calls = Arc::new(Mutex::new(Vec::new()));
    let schema = Schema::new(vec![
        Revision::per_document(move |mut doc: Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                doc["upgraded"] = json!(true);
                doc["_v"] = json!(1);
                Ok::<_, BoxError>(doc)
            }
        }),
        recording_batch(1, Arc::clone(&batch_calls)),
    ])
    .unwrap();

    let out = schema
        .migrate_many(vec![
            json!({"_v": 0, "n": 0}),
            json!({"_v": 2, "n": 1}),
            json!({"_v": 1, "n": 2}),
            json!({"_v": 1, "n": 3}),
        ])
        .await
        .unwrap();

    assert_eq!(per_document_calls.load(Ordering::SeqCst), 1);

    let batch_calls = batch_calls.lock().unwrap();
    assert_eq!(batch_calls.len(), 1);
    let group = &batch_calls[0].1;
    let ns: Vec<i64> = group.iter().map(|doc| doc["n"].as_i64().unwrap()).collect();
    assert_eq!(ns, vec![0, 2, 3]);
    assert_eq!(group[0]["upgraded"], true);
    assert_eq!(group[1].get("upgraded"), None);

    assert!(out.iter().all(|doc| doc["_v"] == 2));
    assert_eq!(out[1], json!({"_v": 2, "n": 1}));
}

#[tokio::test]
async fn test_batch_returning_wrong_count_fails() {
    let schema = Schema::new(vec![Revision::batch(|mut docs: Vec<Value>| async move {
        docs.pop();
        Ok::<_, BoxError>(docs)
    })])
    .unwrap();

    let err = schema
        .migrate_many(vec![json!({"_v": 0}), json!({"_v": 0})])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::Cardinality { level: 0, expected: 2, actual: 1 }
    ));
}

// =============================================================================
// Absence Passthrough
// =============================================================================

#[tokio::test]
async fn test_absent_inputs_pass_through() {
    let count = Arc::new(AtomicUsize::new(0));
    let adapter = counting_adapter(Arc::clone(&count));
    let schema = tracing_schema(2);

    for absence in [Absence::Undefined, Absence::Null, Absence::False] {
        let out = schema.migrate_with(absence, &adapter).await.unwrap();
        assert_eq!(out, Payload::Absent(absence));
    }

    assert_eq!(schema.migrate(Value::Null).await.unwrap().into_value(), Value::Null);
    assert_eq!(schema.migrate(json!(false)).await.unwrap().into_value(), json!(false));
    assert_eq!(schema.migrate(None::<Value>).await.unwrap(), Payload::Absent(Absence::Undefined));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Version Validation
// =============================================================================

#[tokio::test]
async fn test_identity_revision_is_a_version_mismatch() {
    let schema = Schema::new(vec![Revision::map(Ok)]).unwrap();

    let err = schema.migrate_one(json!({"_v": 0})).await.unwrap_err();

    match err {
        MigrationError::VersionMismatch { level, position, expected, found } => {
            assert_eq!(level, Some(0));
            assert_eq!(position, 0);
            assert_eq!(expected, 1);
            assert_eq!(found, "0");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_overshooting_revision_is_a_version_mismatch() {
    let schema = Schema::new(vec![Revision::map(|mut doc| {
        doc["_v"] = json!(2);
        Ok(doc)
    })])
    .unwrap();

    let err = schema.migrate_one(json!({"_v": 0})).await.unwrap_err();
    assert_eq!(err.code(), "VERSION_MISMATCH");
}

#[tokio::test]
async fn test_updater_error_propagates() {
    let schema = Schema::new(vec![
        tracing_revision(0),
        Revision::map(|_| Err("lookup failed".into())),
    ])
    .unwrap();

    let err = schema.migrate_one(json!({"_v": 0})).await.unwrap_err();

    assert_eq!(err.code(), "UPDATER_ERROR");
    assert_eq!(err.level(), Some(1));
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "lookup failed");
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_revision_declaring_no_updater_is_rejected() {
    let err = Schema::new(vec![tracing_revision(0), Revision::new()]).err().unwrap();
    assert!(matches!(
        err,
        MigrationError::Configuration { revision: Some(1), .. }
    ));
}

#[test]
fn test_revision_declaring_both_updaters_is_rejected() {
    let both = Revision::map(Ok).with_batch_update(|docs: Vec<Value>| async move {
        Ok::<_, BoxError>(docs)
    });

    let err = Schema::new(vec![both]).err().unwrap();
    assert!(matches!(
        err,
        MigrationError::Configuration { revision: Some(0), .. }
    ));
}

// =============================================================================
// Adapter Timing
// =============================================================================

#[tokio::test]
async fn test_adapter_called_once_after_success() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let adapter = adapter_fn(move |payload: Payload| {
        let recorder = Arc::clone(&recorder);
        async move {
            recorder.lock().unwrap().push(payload);
            Ok::<_, BoxError>(())
        }
    });

    let out = tracing_schema(2)
        .migrate_with(json!([{"_v": 1}, {"_v": 0}]), &adapter)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], out);
    assert!(seen[0].documents().all(|doc| doc["_v"] == 2));
}

#[tokio::test]
async fn test_adapter_not_called_when_migration_fails() {
    let count = Arc::new(AtomicUsize::new(0));
    let adapter = counting_adapter(Arc::clone(&count));
    let schema = Schema::new(vec![tracing_revision(0), Revision::map(Ok)]).unwrap();

    let result = schema
        .migrate_with(json!([{"_v": 1}, {"_v": 0}]), &adapter)
        .await;

    assert!(result.is_err());
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_adapter_not_called_for_document_ahead_of_target() {
    let count = Arc::new(AtomicUsize::new(0));
    let adapter = counting_adapter(Arc::clone(&count));

    let err = tracing_schema(1)
        .migrate_with(json!([{"_v": 0}, {"_v": 9}]), &adapter)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MigrationError::VersionMismatch { level: None, position: 1, .. }
    ));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Concurrent Calls
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_are_independent() {
    let schema = tracing_schema(3);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let schema = schema.clone();
            tokio::spawn(async move {
                schema
                    .migrate_one(json!({"_v": i % 3, "call": i}))
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let doc = handle.await.unwrap().unwrap();
        assert_eq!(doc["call"], i);
        assert_eq!(doc["_v"], 3);
        assert_eq!(doc["trail"].as_array().unwrap().len(), 3 - i % 3);
    }

    let snapshot = schema.metrics().snapshot();
    assert_eq!(snapshot.calls, 16);
    assert_eq!(snapshot.failures, 0);
}
