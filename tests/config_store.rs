use pairship::project::{self, ProjectUpdate};
use pairship::ErrorCode;

// One test per binary: the store location comes from the environment.
#[test]
fn project_store_round_trip() {
    let config = tempfile::tempdir().unwrap();
    std::env::set_var("PAIRSHIP_CONFIG_DIR", config.path());

    let client = tempfile::tempdir().unwrap();
    let server = tempfile::tempdir().unwrap();
    let client_path = client.path().to_string_lossy().to_string();
    let server_path = server.path().to_string_lossy().to_string();

    // Both paths exist but are the same checkout.
    let err = project::apply_update(
        "demo",
        ProjectUpdate {
            client: Some(client_path.clone()),
            server: Some(client_path.clone()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidConfig);
    assert!(!project::exists("demo"));

    let saved = project::apply_update(
        "demo",
        ProjectUpdate {
            client: Some(client_path.clone()),
            server: Some(server_path.clone()),
            protected_branches: Some(vec!["main".to_string()]),
            drift_reference: Some("development".to_string()),
        },
    )
    .unwrap();
    assert_eq!(saved.server.as_deref(), Some(server_path.as_str()));

    let raw = std::fs::read_to_string(config.path().join("projects").join("demo.json")).unwrap();
    assert!(raw.contains("\"driftReference\""));
    assert!(raw.contains("\"protectedBranches\""));

    let loaded = project::load("demo").unwrap();
    assert_eq!(loaded.id, "demo");
    assert_eq!(loaded.client.as_deref(), Some(client_path.as_str()));
    assert_eq!(loaded.repository_pair().unwrap().server, server.path());

    let missing = project::load("dmeo").unwrap_err();
    assert_eq!(missing.code, ErrorCode::ProjectNotFound);
    assert_eq!(project::find_similar("dem"), vec!["demo".to_string()]);

    assert_eq!(project::list().unwrap().len(), 1);
}
