//! Scenario tests for sharing, propagation, expiry, and revocation.

mod helpers;

use chrono::Duration;

use archivehub_core::error::ErrorKind;
use archivehub_database::{ArchiveStore, WriteBatch};
use archivehub_entity::entry::Entry;
use archivehub_entity::permission::{AllowedOperations, EntryOperation};
use archivehub_service::share::ShareRequest;

use helpers::{TestArchive, assert_kind, start_time};

#[tokio::test]
async fn test_share_then_revoke_on_directory() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    let report = t.upload(&t.alice, "/docs", "report.pdf", 1024).await;

    t.services
        .shares
        .share(&t.alice, docs.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap();
    assert!(t.can(&report, &t.bob, EntryOperation::View).await);
    assert!(!t.can(&report, &t.bob, EntryOperation::Edit).await);

    let revoked = t
        .services
        .shares
        .share(&t.alice, docs.id, ShareRequest::revoke(t.bob.employee_id))
        .await
        .unwrap();
    assert!(revoked.is_none());
    assert!(!t.can(&report, &t.bob, EntryOperation::View).await);
    assert!(!t.can(&docs, &t.bob, EntryOperation::View).await);
    assert_eq!(t.store.permission_count().await, 0);
}

#[tokio::test]
async fn test_propagation_is_limited_to_the_owners_entries() {
    let t = TestArchive::new().await;
    let team = t.mkdir(&t.alice, "/", "team").await;
    t.mkdir(&t.alice, "/team", "plans").await;
    let plan = t.upload(&t.alice, "/team/plans", "q3.pdf", 10).await;

    let foreign = Entry::directory(
        "/team",
        "carols",
        t.carol.employee_id,
        t.carol.employee_id,
        start_time(),
    );
    let mut batch = WriteBatch::new();
    batch.insert_entry(foreign.clone());
    t.store.commit(batch).await.unwrap();

    let root = t
        .services
        .shares
        .share(&t.alice, team.id, ShareRequest::view_edit(t.bob.employee_id))
        .await
        .unwrap()
        .expect("grant returns the root permission");
    assert!(root.is_shared_root);
    assert_eq!(root.allowed_operations, AllowedOperations::view_edit());

    assert!(t.can(&plan, &t.bob, EntryOperation::View).await);
    assert!(t.can(&plan, &t.bob, EntryOperation::Edit).await);
    assert!(!t.can(&foreign, &t.bob, EntryOperation::View).await);

    let descendant_row = t
        .store
        .find_permission(plan.id, t.bob.employee_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!descendant_row.is_shared_root);
    assert_eq!(descendant_row.granted_by, t.alice.employee_id);
}

#[tokio::test]
async fn test_shared_root_tracking() {
    let t = TestArchive::new().await;
    let team = t.mkdir(&t.alice, "/", "team").await;
    let plans = t.mkdir(&t.alice, "/team", "plans").await;

    t.services
        .shares
        .share(&t.alice, team.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap();

    // Updating an inherited row keeps it a non-root.
    let updated = t
        .services
        .shares
        .share(&t.alice, plans.id, ShareRequest::view_edit(t.bob.employee_id))
        .await
        .unwrap()
        .unwrap();
    assert!(!updated.is_shared_root);
    assert_eq!(updated.allowed_operations, AllowedOperations::view_edit());

    // Recreating it while an ancestor row exists is still not a root.
    t.services
        .shares
        .share(&t.alice, plans.id, ShareRequest::revoke(t.bob.employee_id))
        .await
        .unwrap();
    let regranted = t
        .services
        .shares
        .share(&t.alice, plans.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap()
        .unwrap();
    assert!(!regranted.is_shared_root);

    // Without any ancestor row, a grant deep in the tree is a root.
    let carol_grant = t
        .services
        .shares
        .share(&t.alice, plans.id, ShareRequest::view(t.carol.employee_id))
        .await
        .unwrap()
        .unwrap();
    assert!(carol_grant.is_shared_root);

    let shared = t.services.shares.shared_with_me(&t.bob).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].entry.id, team.id);
    let shared = t.services.shares.shared_with_me(&t.carol).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].entry.id, plans.id);
}

#[tokio::test]
async fn test_expired_grants_deny_access() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    let report = t.upload(&t.alice, "/docs", "report.pdf", 1).await;

    t.services
        .shares
        .share(
            &t.alice,
            docs.id,
            ShareRequest::view_edit(t.bob.employee_id).expiring_at(start_time() + Duration::hours(1)),
        )
        .await
        .unwrap();
    assert!(t.can(&report, &t.bob, EntryOperation::View).await);
    assert_eq!(t.services.shares.shared_with_me(&t.bob).await.unwrap().len(), 1);

    t.clock.advance(Duration::hours(1));
    assert!(!t.can(&report, &t.bob, EntryOperation::View).await);
    assert!(!t.can(&docs, &t.bob, EntryOperation::Edit).await);
    assert!(t.services.shares.shared_with_me(&t.bob).await.unwrap().is_empty());

    // An expired Edit grant cannot be used to share onward.
    assert_kind(
        t.services
            .shares
            .share(&t.bob, docs.id, ShareRequest::view(t.carol.employee_id))
            .await,
        ErrorKind::Authorization,
    );
}

#[tokio::test]
async fn test_expiry_must_be_in_the_future() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;

    for expiry in [start_time() - Duration::minutes(1), start_time()] {
        assert_kind(
            t.services
                .shares
                .share(
                    &t.alice,
                    docs.id,
                    ShareRequest::view(t.bob.employee_id).expiring_at(expiry),
                )
                .await,
            ErrorKind::Conflict,
        );
    }
    assert_eq!(t.store.permission_count().await, 0);
}

#[tokio::test]
async fn test_revoke_ignores_a_past_expiry() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    t.services
        .shares
        .share(&t.alice, docs.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap();

    let revoked = t
        .services
        .shares
        .share(
            &t.alice,
            docs.id,
            ShareRequest::revoke(t.bob.employee_id).expiring_at(start_time() - Duration::days(1)),
        )
        .await
        .unwrap();
    assert!(revoked.is_none());
    assert_eq!(t.store.permission_count().await, 0);
}

#[tokio::test]
async fn test_share_preconditions() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    let shares = &t.services.shares;

    assert_kind(
        shares
            .share(&t.alice, docs.id, ShareRequest::view(t.alice.employee_id))
            .await,
        ErrorKind::Conflict,
    );
    assert_kind(
        shares
            .share(&t.alice, docs.id, ShareRequest::view(uuid::Uuid::new_v4()))
            .await,
        ErrorKind::NotFound,
    );
    assert_kind(
        shares
            .share(&t.alice, uuid::Uuid::new_v4(), ShareRequest::view(t.bob.employee_id))
            .await,
        ErrorKind::NotFound,
    );
    assert_kind(
        shares
            .share(&t.bob, docs.id, ShareRequest::view(t.carol.employee_id))
            .await,
        ErrorKind::Authorization,
    );

    // View alone does not allow sharing onward.
    shares
        .share(&t.alice, docs.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap();
    assert_kind(
        shares
            .share(&t.bob, docs.id, ShareRequest::view(t.carol.employee_id))
            .await,
        ErrorKind::Authorization,
    );

    // Edit does, but not on one's own row or the owner's.
    shares
        .share(&t.alice, docs.id, ShareRequest::view_edit(t.bob.employee_id))
        .await
        .unwrap();
    shares
        .share(&t.bob, docs.id, ShareRequest::view(t.carol.employee_id))
        .await
        .unwrap();
    assert!(t.can(&docs, &t.carol, EntryOperation::View).await);
    assert_kind(
        shares
            .share(&t.bob, docs.id, ShareRequest::view_edit(t.bob.employee_id))
            .await,
        ErrorKind::Conflict,
    );
    assert_kind(
        shares
            .share(&t.bob, docs.id, ShareRequest::revoke(t.alice.employee_id))
            .await,
        ErrorKind::Conflict,
    );
}

#[tokio::test]
async fn test_revoking_nothing_is_not_changed() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;

    assert_kind(
        t.services
            .shares
            .share(&t.alice, docs.id, ShareRequest::revoke(t.bob.employee_id))
            .await,
        ErrorKind::NotChanged,
    );
}

#[tokio::test]
async fn test_binned_entries_cannot_be_shared() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    t.services.bin.move_to_bin(&t.alice, docs.id).await.unwrap();

    assert_kind(
        t.services
            .shares
            .share(&t.alice, docs.id, ShareRequest::view(t.bob.employee_id))
            .await,
        ErrorKind::Conflict,
    );
}

#[tokio::test]
async fn test_list_permissions_visibility() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    let shares = &t.services.shares;

    shares
        .share(&t.alice, docs.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap();

    let rows = shares.list_permissions(&t.alice, docs.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].employee_id, t.bob.employee_id);
    assert_eq!(rows[0].allowed_operations.to_string(), "View");

    assert_kind(
        shares.list_permissions(&t.bob, docs.id).await,
        ErrorKind::Authorization,
    );
    assert_kind(
        shares.list_permissions(&t.carol, docs.id).await,
        ErrorKind::Authorization,
    );

    shares
        .share(&t.alice, docs.id, ShareRequest::view_edit(t.bob.employee_id))
        .await
        .unwrap();
    assert_eq!(shares.list_permissions(&t.bob, docs.id).await.unwrap().len(), 1);
}
