// Integration tests for seed parsing, import, export and digests

use arborist_core::errors::ExErrorKind;
use arborist_core::model::EntityReference;
use arborist_store::seed::{
    compute_seed_digest, compute_state_digest, export_seed, load_seed_file, parse_seed_file,
    write_seed_file,
};
use arborist_store::MemoryStore;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn path(s: &str) -> EntityReference {
    s.parse().unwrap()
}

#[test]
fn test_load_fixture_seed() {
    // Given: The organizations fixture
    let seed_path = fixtures_dir().join("seed_orgs.yaml");

    // When: We load it into a store
    let store = load_seed_file(&seed_path).unwrap();

    // Then: Every document is addressable by path
    assert_eq!(store.len(), 11);
    assert!(store.contains(&path("organizations/platform/users/root")));
    assert!(store.contains(&path("organizations/acme-corp/projects/p1/tasks/t2")));
}

#[test]
fn test_duplicate_ids_rejected() {
    let err = parse_seed_file(&fixtures_dir().join("seed_duplicate_ids.yaml")).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert!(err.to_string().contains("Duplicate id 'acme'"));
}

#[test]
fn test_unsupported_version_rejected() {
    let err = parse_seed_file(&fixtures_dir().join("seed_bad_version.yaml")).unwrap_err();
    assert!(err.to_string().contains("schema_version"));
}

#[test]
fn test_missing_file_is_reported() {
    let err = load_seed_file(&fixtures_dir().join("does_not_exist.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read seed file"));
}

#[test]
fn test_export_then_reload_preserves_digest() {
    // Given: A store loaded from the fixture
    let store = load_seed_file(&fixtures_dir().join("seed_orgs.yaml")).unwrap();
    let before = compute_state_digest(&store).unwrap();

    // When: We export to disk and load it again
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("state.yaml");
    write_seed_file(&out, &export_seed(&store)).unwrap();
    let reloaded = load_seed_file(&out).unwrap();

    // Then: The digests match and no temp file is left behind
    assert_eq!(compute_state_digest(&reloaded).unwrap(), before);
    assert!(!dir.path().join("state.tmp").exists());
}

#[tokio::test]
async fn test_export_after_delete_keeps_orphans() {
    use arborist_core::store_client::DocumentStore;

    // Given: A store where a parent is deleted but its children are not
    let store = load_seed_file(&fixtures_dir().join("seed_orgs.yaml")).unwrap();
    store
        .delete_batch(&[path("organizations/test-org-7")])
        .await
        .unwrap();

    // When: We export and reload
    let seed = export_seed(&store);
    let digest = compute_seed_digest(&seed).unwrap();

    // Then: The children survive the round trip and the parent stays gone
    assert_eq!(digest, compute_state_digest(&store).unwrap());
    let reloaded = MemoryStore::new();
    arborist_store::import_seed(&reloaded, &seed).unwrap();
    assert!(!reloaded.contains(&path("organizations/test-org-7")));
    assert!(reloaded.contains(&path("organizations/test-org-7/users/u1")));
}
