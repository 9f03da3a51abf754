use arborist_core::config::RunConfig;
use arborist_core::model::{Attributes, EntityReference};
use arborist_store::MemoryStore;

/// KEEP exact {platform}, DELETE prefix test-org-, default-deny
pub const SCENARIO_A_TOML: &str = r#"
root_collection = "organizations"
default_policy = "delete"
settle_delay_ms = 0

[retry]
call_timeout_ms = 1000
initial_backoff_ms = 1
max_backoff_ms = 4

[[rules]]
name = "platform"
verdict = "keep"
reason = "core tenant"
predicate = { kind = "exact_id", ids = ["platform"] }

[[rules]]
name = "test-orgs"
verdict = "delete"
reason = "integration test tenant"
predicate = { kind = "id_prefix", prefix = "test-org-" }
"#;

/// Only `test-org-*` entities are deleted; everything else is kept
pub const TEST_ORGS_ONLY_TOML: &str = r#"
root_collection = "organizations"
default_policy = "keep"
settle_delay_ms = 0

[retry]
call_timeout_ms = 1000
initial_backoff_ms = 1
max_backoff_ms = 4

[[rules]]
name = "test-orgs"
verdict = "delete"
predicate = { kind = "id_prefix", prefix = "test-org-" }
"#;

#[allow(dead_code)]
pub fn path(s: &str) -> EntityReference {
    s.parse().unwrap()
}

#[allow(dead_code)]
pub fn scenario_a_config() -> RunConfig {
    RunConfig::from_toml_str(SCENARIO_A_TOML).unwrap()
}

#[allow(dead_code)]
pub fn test_orgs_config() -> RunConfig {
    RunConfig::from_toml_str(TEST_ORGS_ONLY_TOML).unwrap()
}

/// Insert every path with empty attributes
#[allow(dead_code)]
pub fn store_with(paths: &[&str]) -> MemoryStore {
    let store = MemoryStore::new();
    for p in paths {
        store.insert(path(p), Attributes::new());
    }
    store
}

/// Scenario A tree:
///
/// ```text
/// organizations/platform            users/root
/// organizations/test-org-7          users/u1 u2 u3
/// organizations/acme-corp           projects/p1/tasks/t1 t2, users/admin
/// ```
#[allow(dead_code)]
pub fn orgs_store() -> MemoryStore {
    let store = store_with(&[
        "organizations/platform/users/root",
        "organizations/test-org-7/users/u1",
        "organizations/test-org-7/users/u2",
        "organizations/test-org-7/users/u3",
        "organizations/acme-corp/projects/p1",
        "organizations/acme-corp/projects/p1/tasks/t1",
        "organizations/acme-corp/projects/p1/tasks/t2",
        "organizations/acme-corp/users/admin",
    ]);
    store.insert(
        path("organizations/platform"),
        Attributes::new().with("name", "Platform"),
    );
    store.insert(
        path("organizations/test-org-7"),
        Attributes::new().with("name", "Test Org 7"),
    );
    store.insert(
        path("organizations/acme-corp"),
        Attributes::new().with("name", "Acme Corp"),
    );
    store
}

/// Flattened paths of every `delete_batch` call, in call order
#[allow(dead_code)]
pub fn deleted_in_order(store: &MemoryStore) -> Vec<EntityReference> {
    store.delete_calls().into_iter().flatten().collect()
}
