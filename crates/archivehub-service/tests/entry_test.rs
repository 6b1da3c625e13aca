//! Scenario tests for entry creation, shared creation, rename, and listing.

mod helpers;

use chrono::Duration;

use archivehub_core::config::ArchiveConfig;
use archivehub_core::error::ErrorKind;
use archivehub_database::ArchiveStore;
use archivehub_entity::permission::{AllowedOperations, EntryOperation};
use archivehub_service::entry::{
    CreateEntryRequest, CreateSharedEntryRequest, FileUpload, RenameEntryRequest,
    UploadSharedEntryRequest,
};
use archivehub_service::share::ShareRequest;

use helpers::{TestArchive, assert_kind, start_time};

fn rename_to(name: &str) -> RenameEntryRequest {
    RenameEntryRequest {
        new_name: name.to_string(),
    }
}

#[tokio::test]
async fn test_create_directory_and_file() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    assert_eq!(docs.path, "/");
    assert!(docs.is_directory());
    assert_eq!(docs.owner_id, t.alice.employee_id);

    let report = t.upload(&t.alice, "/docs", "report.pdf", 1024).await;
    assert_eq!(report.path, "/docs");
    assert_eq!(report.canonical_path(), "/docs/report.pdf");
    assert_eq!(report.size_in_bytes, Some(1024));
    assert_eq!(report.created_by, t.alice.employee_id);

    let file = t
        .store
        .find_file(report.file_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.file_type, "application/pdf");
    assert_eq!(file.file_extension, "pdf");
    assert_eq!(file.size(), 1024);
}

#[tokio::test]
async fn test_duplicate_name_conflicts_regardless_of_kind() {
    let t = TestArchive::new().await;
    t.mkdir(&t.alice, "/", "docs").await;

    let again = t
        .services
        .entries
        .create(&t.alice, CreateEntryRequest::directory("/", "docs"))
        .await;
    assert_kind(again, ErrorKind::Conflict);

    let as_file = t
        .services
        .entries
        .create(
            &t.alice,
            CreateEntryRequest::file("/", "docs", FileUpload::new(b"x".to_vec())),
        )
        .await;
    assert_kind(as_file, ErrorKind::Conflict);

    // Another employee cannot take the name either; names are unique per path.
    let other = t
        .services
        .entries
        .create(&t.bob, CreateEntryRequest::directory("/", "docs"))
        .await;
    assert_kind(other, ErrorKind::Conflict);

    assert_eq!(t.store.entry_count().await, 1);
    t.assert_paths_unique().await;
}

#[tokio::test]
async fn test_parent_directory_must_exist() {
    let t = TestArchive::new().await;

    let missing = t
        .services
        .entries
        .create(&t.alice, CreateEntryRequest::directory("/nope", "x"))
        .await;
    assert_kind(missing, ErrorKind::Conflict);

    t.mkdir(&t.alice, "/", "docs").await;
    t.upload(&t.alice, "/docs", "report.pdf", 10).await;
    let under_file = t
        .services
        .entries
        .create(&t.alice, CreateEntryRequest::directory("/docs/report.pdf", "x"))
        .await;
    assert_kind(under_file, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_size_ceiling() {
    let config = ArchiveConfig {
        max_file_size_bytes: 1024,
        ..ArchiveConfig::default()
    };
    let t = TestArchive::with_config(config).await;

    t.upload(&t.alice, "/", "exact.bin", 1024).await;
    let too_big = t
        .services
        .entries
        .create(
            &t.alice,
            CreateEntryRequest::file("/", "big.bin", FileUpload::new(vec![0u8; 1025])),
        )
        .await;
    assert_kind(too_big, ErrorKind::Conflict);
    assert_eq!(t.store.file_count().await, 1);
}

#[tokio::test]
async fn test_malformed_requests_are_validation_errors() {
    let t = TestArchive::new().await;
    let entries = &t.services.entries;

    let dir_with_payload = CreateEntryRequest {
        file: Some(FileUpload::new(b"x".to_vec())),
        ..CreateEntryRequest::directory("/", "docs")
    };
    assert_kind(entries.create(&t.alice, dir_with_payload).await, ErrorKind::Validation);

    let file_without_payload = CreateEntryRequest {
        is_directory: false,
        ..CreateEntryRequest::directory("/", "a.txt")
    };
    assert_kind(
        entries.create(&t.alice, file_without_payload).await,
        ErrorKind::Validation,
    );

    assert_kind(
        entries
            .create(&t.alice, CreateEntryRequest::directory("/", "a/b"))
            .await,
        ErrorKind::Validation,
    );
    assert_kind(
        entries
            .create(&t.alice, CreateEntryRequest::directory("/", ""))
            .await,
        ErrorKind::Validation,
    );
    assert_kind(
        entries
            .create(&t.alice, CreateEntryRequest::directory("alice_bin", "x"))
            .await,
        ErrorKind::Validation,
    );
    assert_kind(
        entries
            .create(&t.alice, CreateEntryRequest::directory("/", &"n".repeat(257)))
            .await,
        ErrorKind::Validation,
    );
}

#[tokio::test]
async fn test_plain_create_requires_owning_the_parent() {
    let t = TestArchive::new().await;
    t.mkdir(&t.alice, "/", "docs").await;

    let result = t
        .services
        .entries
        .create(&t.bob, CreateEntryRequest::directory("/docs", "mine"))
        .await;
    assert_kind(result, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_rename_cascades_to_descendants() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    let year = t.mkdir(&t.alice, "/docs", "2024").await;
    let q1 = t.upload(&t.alice, "/docs/2024", "q1.pdf", 64).await;
    let sibling = t.mkdir(&t.alice, "/", "docsx").await;

    t.clock.advance(Duration::minutes(5));
    let renamed = t
        .services
        .entries
        .rename(&t.alice, docs.id, rename_to("papers"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "papers");
    assert_eq!(renamed.path, "/");
    assert_eq!(renamed.last_modified_at, start_time() + Duration::minutes(5));

    assert_eq!(t.reload(&year).await.path, "/papers");
    assert_eq!(t.reload(&q1).await.path, "/papers/2024");
    assert_eq!(t.reload(&sibling).await.path, "/");

    let listing = t
        .services
        .entries
        .list_directory(&t.alice, "/papers/2024")
        .await
        .unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, q1.id);

    assert_kind(
        t.services.entries.list_directory(&t.alice, "/docs").await,
        ErrorKind::NotFound,
    );
    t.assert_paths_unique().await;
}

#[tokio::test]
async fn test_rename_edge_cases() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    t.mkdir(&t.alice, "/", "photos").await;

    assert_kind(
        t.services
            .entries
            .rename(&t.alice, docs.id, rename_to("docs"))
            .await,
        ErrorKind::NotChanged,
    );
    assert_kind(
        t.services
            .entries
            .rename(&t.alice, docs.id, rename_to("photos"))
            .await,
        ErrorKind::Conflict,
    );
    assert_kind(
        t.services
            .entries
            .rename(&t.bob, docs.id, rename_to("bobs"))
            .await,
        ErrorKind::Authorization,
    );
    assert_kind(
        t.services
            .entries
            .rename(&t.alice, uuid::Uuid::new_v4(), rename_to("x"))
            .await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_same_name_rename_by_stranger_is_unauthorized() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;

    // A stranger learns nothing about the current name.
    assert_kind(
        t.services
            .entries
            .rename(&t.carol, docs.id, rename_to("docs"))
            .await,
        ErrorKind::Authorization,
    );
    assert_kind(
        t.services
            .entries
            .rename(&t.alice, docs.id, rename_to("docs"))
            .await,
        ErrorKind::NotChanged,
    );
}

#[tokio::test]
async fn test_rename_requires_upload_right_for_non_owner() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;

    t.services
        .shares
        .share(&t.alice, docs.id, ShareRequest::view_edit(t.bob.employee_id))
        .await
        .unwrap();
    assert_kind(
        t.services
            .entries
            .rename(&t.bob, docs.id, rename_to("bobs"))
            .await,
        ErrorKind::Authorization,
    );
}

#[tokio::test]
async fn test_rename_rederives_file_type() {
    let t = TestArchive::new().await;
    let notes = t.upload(&t.alice, "/", "notes.txt", 5).await;

    t.services
        .entries
        .rename(&t.alice, notes.id, rename_to("notes.pdf"))
        .await
        .unwrap();

    let file = t
        .store
        .find_file(notes.file_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.file_extension, "pdf");
    assert_eq!(file.file_type, "application/pdf");
}

#[tokio::test]
async fn test_replace_content_drops_previous_payload() {
    let t = TestArchive::new().await;
    let a = t.upload(&t.alice, "/", "a.txt", 10).await;
    let old_file = a.file_id.unwrap();

    let replaced = t
        .services
        .entries
        .replace_content(&t.alice, a.id, FileUpload::new(vec![b'y'; 20]))
        .await
        .unwrap();
    assert_eq!(replaced.size_in_bytes, Some(20));
    assert_ne!(replaced.file_id, Some(old_file));
    assert!(t.store.find_file(old_file).await.unwrap().is_none());
    assert_eq!(t.store.file_count().await, 1);

    let dir = t.mkdir(&t.alice, "/", "docs").await;
    assert_kind(
        t.services
            .entries
            .replace_content(&t.alice, dir.id, FileUpload::new(b"x".to_vec()))
            .await,
        ErrorKind::Conflict,
    );
    assert_kind(
        t.services
            .entries
            .replace_content(&t.bob, a.id, FileUpload::new(b"x".to_vec()))
            .await,
        ErrorKind::Authorization,
    );
}

#[tokio::test]
async fn test_listing_and_get_respect_view_right() {
    let t = TestArchive::new().await;
    let docs = t.mkdir(&t.alice, "/", "docs").await;
    t.upload(&t.alice, "/docs", "b.txt", 1).await;
    let a = t.upload(&t.alice, "/docs", "a.txt", 1).await;
    t.mkdir(&t.alice, "/docs", "zeta").await;

    let all = t
        .services
        .entries
        .list_directory(&t.alice, "/docs")
        .await
        .unwrap();
    let names: Vec<&str> = all.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "a.txt", "b.txt"]);

    assert!(
        t.services
            .entries
            .list_directory(&t.bob, "/docs")
            .await
            .unwrap()
            .is_empty()
    );
    assert_kind(t.services.entries.get(&t.bob, docs.id).await, ErrorKind::Authorization);

    t.services
        .shares
        .share(&t.alice, a.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap();
    let visible = t
        .services
        .entries
        .list_directory(&t.bob, "/docs")
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, a.id);
    assert_eq!(t.services.entries.get(&t.bob, a.id).await.unwrap().id, a.id);
}

#[tokio::test]
async fn test_shared_creation_inherits_owner_and_grants_creator() {
    let t = TestArchive::new().await;
    let team = t.mkdir(&t.alice, "/", "team").await;
    let expiry = start_time() + Duration::days(7);
    t.services
        .shares
        .share(
            &t.alice,
            team.id,
            ShareRequest::view_edit(t.bob.employee_id).expiring_at(expiry),
        )
        .await
        .unwrap();

    let drafts = t
        .services
        .entries
        .create_shared(
            &t.bob,
            team.id,
            CreateSharedEntryRequest {
                name: "drafts".to_string(),
                is_directory: true,
                file: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(drafts.path, "/team");
    assert_eq!(drafts.owner_id, t.alice.employee_id);
    assert_eq!(drafts.created_by, t.bob.employee_id);

    let grant = t
        .store
        .find_permission(drafts.id, t.bob.employee_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(grant.allowed_operations, AllowedOperations::view_edit());
    assert_eq!(grant.expiry_date_time, Some(expiry));
    assert!(!grant.is_shared_root);

    // View+Edit does not include Upload.
    assert_kind(
        t.services
            .entries
            .upload_shared(
                &t.bob,
                team.id,
                UploadSharedEntryRequest {
                    name: "a.txt".to_string(),
                    file: FileUpload::new(b"a".to_vec()),
                },
            )
            .await,
        ErrorKind::Authorization,
    );

    // Strangers need Edit.
    assert_kind(
        t.services
            .entries
            .create_shared(
                &t.carol,
                team.id,
                CreateSharedEntryRequest {
                    name: "carols".to_string(),
                    is_directory: true,
                    file: None,
                },
            )
            .await,
        ErrorKind::Authorization,
    );

    // The owner passes without a grant and gets no extra row.
    let upload = t
        .services
        .entries
        .upload_shared(
            &t.alice,
            team.id,
            UploadSharedEntryRequest {
                name: "plan.pdf".to_string(),
                file: FileUpload::new(b"%PDF".to_vec()),
            },
        )
        .await
        .unwrap();
    assert!(
        t.store
            .find_permission(upload.id, t.alice.employee_id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_shared_creation_parent_checks() {
    let t = TestArchive::new().await;
    let file = t.upload(&t.alice, "/", "a.txt", 1).await;

    let req = CreateSharedEntryRequest {
        name: "x".to_string(),
        is_directory: true,
        file: None,
    };
    assert_kind(
        t.services
            .entries
            .create_shared(&t.alice, file.id, req.clone())
            .await,
        ErrorKind::Conflict,
    );
    assert_kind(
        t.services
            .entries
            .create_shared(&t.alice, uuid::Uuid::new_v4(), req)
            .await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_new_children_inherit_existing_shares() {
    let t = TestArchive::new().await;
    let team = t.mkdir(&t.alice, "/", "team").await;
    t.services
        .shares
        .share(&t.alice, team.id, ShareRequest::view(t.bob.employee_id))
        .await
        .unwrap();

    let later = t.upload(&t.alice, "/team", "later.txt", 3).await;
    assert!(t.can(&later, &t.bob, EntryOperation::View).await);
    assert!(!t.can(&later, &t.bob, EntryOperation::Edit).await);
    assert!(!t.can(&later, &t.carol, EntryOperation::View).await);

    let row = t
        .store
        .find_permission(later.id, t.bob.employee_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!row.is_shared_root);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_keep_names_unique() {
    let t = TestArchive::new().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let entries = t.services.entries.clone();
        let ctx = t.alice.clone();
        handles.push(tokio::spawn(async move {
            entries
                .create(&ctx, CreateEntryRequest::directory("/", "race"))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::Conflict),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(t.store.entry_count().await, 1);
}
