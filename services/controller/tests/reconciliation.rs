//! Integration tests for reconcile passes.
//!
//! Each test drives the reconciler against a `MemoryStore` and checks the
//! store afterwards:
//! 1. Scale up from drift, then settle
//! 2. Scale down an over-provisioned record
//! 3. Reject unsupported kinds without touching items
//! 4. Stop at the first failed action and resume on the next pass

use std::sync::Arc;

use rgb_controller::api::{
    Color, ItemKind, OwnerSelector, OwnershipLabels, Readiness, RgbResource, RgbResourceSpec,
    COLOR_LABEL, DEFAULT_MANAGER_TAG,
};
use rgb_controller::factory::ItemFactory;
use rgb_controller::store::StoreOp;
use rgb_controller::{
    MemoryStore, Outcome, ReconcileError, Reconciler, ReconcilerConfig, StoreError,
};
use rgb_id::ObjectKey;
use rstest::rstest;

fn key(name: &str) -> ObjectKey {
    ObjectKey::in_default(name).unwrap()
}

async fn setup(
    name: &str,
    kind: ItemKind,
    color: Color,
    count: u32,
) -> (Arc<MemoryStore>, Reconciler, RgbResource) {
    let store = Arc::new(MemoryStore::new());
    let record = store
        .insert_record(RgbResource::new(
            &key(name),
            RgbResourceSpec::new(kind, color, count),
        ))
        .await;
    let reconciler = Reconciler::new(store.clone(), ReconcilerConfig::default());
    (store, reconciler, record)
}

fn selector(record: &RgbResource) -> OwnerSelector {
    OwnerSelector::for_record(DEFAULT_MANAGER_TAG, record)
}

/// Place `n` items owned by `record` directly in the store.
async fn seed_items(store: &MemoryStore, record: &RgbResource, kind: ItemKind, n: usize) {
    let labels = OwnershipLabels::new(selector(record), record.spec.color);
    let factory = ItemFactory::default();
    for _ in 0..n {
        let item = factory.build(
            kind,
            &record.metadata.namespace,
            &labels,
            record.owner_reference(),
        );
        store.insert_item(item).await;
    }
}

async fn owned_count(store: &MemoryStore, record: &RgbResource) -> usize {
    store.items_matching(&selector(record)).await.len()
}

async fn readiness(store: &MemoryStore, record: &RgbResource) -> Readiness {
    store.record(&record.key()).await.unwrap().status.result
}

#[rstest]
#[case::pods(ItemKind::Pod)]
#[case::deployments(ItemKind::Deployment)]
#[tokio::test]
async fn test_converges_from_drift(#[case] kind: ItemKind) {
    let (store, reconciler, record) = setup("rgb-sample", kind, Color::Green, 3).await;
    seed_items(&store, &record, kind, 1).await;

    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.observed, 1);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.deleted, 0);
    assert!(summary.marked_ready);

    let items = store.items_matching(&selector(&record)).await;
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.kind() == kind));
    assert!(items.iter().all(|i| i.label(COLOR_LABEL) == Some("Green")));
    assert!(items
        .iter()
        .all(|i| i.controller_uid() == Some(record.metadata.uid)));
    assert_eq!(readiness(&store, &record).await, Readiness::Ready);

    // Settled: the next pass plans nothing.
    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.observed, 3);
    assert_eq!(summary.created + summary.deleted, 0);
}

#[tokio::test]
async fn test_second_pass_at_target_issues_no_mutations() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 2).await;

    assert_eq!(reconciler.reconcile(&record.key()).await, Outcome::Done);
    assert_eq!(owned_count(&store, &record).await, 2);

    store.clear_operations().await;
    assert_eq!(reconciler.reconcile(&record.key()).await, Outcome::Done);

    assert_eq!(store.mutation_count().await, 0);
    assert_eq!(
        store.operations().await,
        vec![
            StoreOp::GetRecord(record.key()),
            StoreOp::ListItems {
                namespace: "default".to_string(),
                kind: ItemKind::Pod,
            },
        ]
    );
}

#[tokio::test]
async fn test_record_already_at_target_is_marked_ready_without_item_changes() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Blue, 2).await;
    seed_items(&store, &record, ItemKind::Pod, 2).await;

    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.created + summary.deleted, 0);
    assert!(summary.marked_ready);
    assert_eq!(
        store.operations().await.last(),
        Some(&StoreOp::UpdateStatus(record.key()))
    );
}

#[tokio::test]
async fn test_over_provision_is_trimmed_to_desired() {
    let (store, reconciler, record) =
        setup("rgb-sample", ItemKind::Deployment, Color::Red, 2).await;
    seed_items(&store, &record, ItemKind::Deployment, 5).await;

    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.observed, 5);
    assert_eq!(summary.deleted, 3);
    assert_eq!(summary.created, 0);

    assert_eq!(owned_count(&store, &record).await, 2);
    assert_eq!(readiness(&store, &record).await, Readiness::Ready);
}

#[tokio::test]
async fn test_unsupported_kind_is_rejected_before_any_item_call() {
    let store = Arc::new(MemoryStore::new());
    let mut spec = RgbResourceSpec::new(ItemKind::Pod, Color::Red, 3);
    spec.kind = "Service".to_string();
    let record = store
        .insert_record(RgbResource::new(&key("rgb-service"), spec))
        .await;
    let reconciler = Reconciler::new(store.clone(), ReconcilerConfig::default());

    let outcome = reconciler.reconcile(&record.key()).await;
    let Outcome::Requeue(err) = outcome else {
        panic!("expected requeue, got {outcome:?}");
    };
    assert!(matches!(err, ReconcileError::UnsupportedKind(_)));
    assert!(!err.is_retryable());

    assert_eq!(
        store.operations().await,
        vec![StoreOp::GetRecord(record.key())]
    );
    assert!(store.items().await.is_empty());
    assert_eq!(readiness(&store, &record).await, Readiness::Initial);
}

#[tokio::test]
async fn test_partial_create_failure_keeps_prefix_and_resumes() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Green, 3).await;
    store.fail_nth_create(2).await;

    let err = reconciler.run_pass(&record.key()).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Store(StoreError::Unavailable(_))
    ));
    assert!(err.is_retryable());

    // First create landed, the failing second aborted the third.
    assert_eq!(owned_count(&store, &record).await, 1);
    let creates = store
        .operations()
        .await
        .into_iter()
        .filter(|op| matches!(op, StoreOp::CreateItem(_)))
        .count();
    assert_eq!(creates, 2);
    assert_eq!(readiness(&store, &record).await, Readiness::Initial);

    // The next pass picks up from the observed state.
    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.observed, 1);
    assert_eq!(summary.created, 2);
    assert_eq!(owned_count(&store, &record).await, 3);
    assert_eq!(readiness(&store, &record).await, Readiness::Ready);
}

#[tokio::test]
async fn test_partial_delete_failure_aborts_remaining_deletes() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 2).await;
    seed_items(&store, &record, ItemKind::Pod, 5).await;
    store.fail_nth_delete(2).await;

    let outcome = reconciler.reconcile(&record.key()).await;
    assert!(!outcome.is_done());
    assert_eq!(owned_count(&store, &record).await, 4);
    assert_eq!(readiness(&store, &record).await, Readiness::Initial);
}

#[tokio::test]
async fn test_list_failure_is_retryable_and_mutates_nothing() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 2).await;
    store.set_fail_lists(true).await;

    let outcome = reconciler.reconcile(&record.key()).await;
    let Outcome::Requeue(err) = outcome else {
        panic!("expected requeue, got {outcome:?}");
    };
    assert!(err.is_retryable());
    assert_eq!(store.mutation_count().await, 0);
}

#[tokio::test]
async fn test_status_conflict_requeues_and_next_pass_marks_ready() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 2).await;
    store.conflict_next_status_update().await;

    let err = reconciler.run_pass(&record.key()).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(err.is_retryable());
    assert_eq!(owned_count(&store, &record).await, 2);
    assert_eq!(readiness(&store, &record).await, Readiness::Initial);

    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.created, 0);
    assert!(summary.marked_ready);
}

#[tokio::test]
async fn test_ready_is_not_reset_when_drift_appears() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 3).await;
    reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(readiness(&store, &record).await, Readiness::Ready);

    // An item disappears outside the controller.
    let victim = store.items_matching(&selector(&record)).await.remove(0);
    assert!(store.remove_item("default", ItemKind::Pod, victim.name()).await);

    store.fail_nth_create(1).await;
    assert!(reconciler.run_pass(&record.key()).await.is_err());
    // Still Ready from the last completed pass while convergence is pending.
    assert_eq!(readiness(&store, &record).await, Readiness::Ready);

    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.created, 1);
    assert!(!summary.marked_ready);
    assert_eq!(owned_count(&store, &record).await, 3);
}

#[tokio::test]
async fn test_count_change_is_followed() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 2).await;
    reconciler.run_pass(&record.key()).await.unwrap();

    store
        .update_spec(&record.key(), |spec| spec.count = 5)
        .await
        .unwrap();
    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.created, 3);
    assert_eq!(owned_count(&store, &record).await, 5);

    store
        .update_spec(&record.key(), |spec| spec.count = 3)
        .await
        .unwrap();
    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.deleted, 2);
    assert_eq!(owned_count(&store, &record).await, 3);
}

#[tokio::test]
async fn test_records_do_not_count_each_others_items() {
    let store = Arc::new(MemoryStore::new());
    let red = store
        .insert_record(RgbResource::new(
            &key("red"),
            RgbResourceSpec::new(ItemKind::Pod, Color::Red, 2),
        ))
        .await;
    let blue = store
        .insert_record(RgbResource::new(
            &key("blue"),
            RgbResourceSpec::new(ItemKind::Pod, Color::Blue, 4),
        ))
        .await;
    let reconciler = Reconciler::new(store.clone(), ReconcilerConfig::default());

    reconciler.run_pass(&red.key()).await.unwrap();
    reconciler.run_pass(&blue.key()).await.unwrap();

    assert_eq!(owned_count(&store, &red).await, 2);
    assert_eq!(owned_count(&store, &blue).await, 4);
    assert_eq!(store.items().await.len(), 6);
}

#[tokio::test]
async fn test_relabelled_item_is_orphaned() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 2).await;
    reconciler.run_pass(&record.key()).await.unwrap();

    // Strip the owner label from one item behind the controller's back.
    let mut item = store.items_matching(&selector(&record)).await.remove(0);
    assert!(store.remove_item("default", ItemKind::Pod, item.name()).await);
    item.metadata
        .labels
        .remove(rgb_controller::api::OWNER_LABEL);
    store.insert_item(item).await;

    let summary = reconciler.run_pass(&record.key()).await.unwrap();
    assert_eq!(summary.observed, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(store.items().await.len(), 3);
}

#[tokio::test]
async fn test_deleted_record_is_done_and_items_are_collected() {
    let (store, reconciler, record) = setup("rgb-sample", ItemKind::Pod, Color::Red, 3).await;
    reconciler.run_pass(&record.key()).await.unwrap();

    assert_eq!(store.delete_record(&record.key()).await.unwrap(), 3);
    store.clear_operations().await;

    assert_eq!(reconciler.reconcile(&record.key()).await, Outcome::Done);
    assert_eq!(store.mutation_count().await, 0);
    assert!(store.items().await.is_empty());
}

#[tokio::test]
async fn test_custom_manager_tag_and_image() {
    let store = Arc::new(MemoryStore::new());
    let record = store
        .insert_record(RgbResource::new(
            &key("rgb-sample"),
            RgbResourceSpec::new(ItemKind::Pod, Color::Red, 2),
        ))
        .await;
    let config = ReconcilerConfig {
        manager_tag: "colors".to_string(),
        template: rgb_controller::factory::ItemTemplate {
            image: "nginx:1.25".to_string(),
            ..Default::default()
        },
    };
    let reconciler = Reconciler::new(store.clone(), config);

    reconciler.run_pass(&record.key()).await.unwrap();

    let selector = OwnerSelector::for_record("colors", &record);
    let items = store.items_matching(&selector).await;
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.containers()[0].image == "nginx:1.25"));
    assert_eq!(owned_count(&store, &record).await, 0);
}
