//! Batch document loading tests

use planforge::{load_areas, load_config};
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("planforge-input-tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_wrapped_json_batch() {
    let path = write_temp(
        "batch.json",
        r#"{"areas": [{"name": "caching", "objective": "add a read cache", "depends_on": ["storage"]}]}"#,
    );
    let areas = load_areas(&path).unwrap();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].name, "caching");
    assert_eq!(areas[0].depends_on, vec!["storage"]);
}

#[test]
fn loads_bare_yaml_batch() {
    let path = write_temp(
        "batch.yaml",
        "- name: caching\n  objective: add a read cache\n- name: storage\n  objective: split the blob store\n",
    );
    let areas = load_areas(&path).unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[1].name, "storage");
}

#[test]
fn rejects_unknown_area_fields() {
    let path = write_temp(
        "bad-field.json",
        r#"[{"name": "a", "objective": "b", "sprint": 4}]"#,
    );
    assert!(load_areas(&path).is_err());
}

#[test]
fn rejects_empty_batch() {
    let path = write_temp("empty.json", r#"{"areas": []}"#);
    let err = load_areas(&path).unwrap_err();
    assert!(err.to_string().contains("no enhancement areas"));
}

#[test]
fn rejects_unsupported_extension() {
    let path = write_temp("batch.toml", "name = \"nope\"");
    let err = load_areas(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported document extension"));
}

#[test]
fn loads_partial_config_with_defaults() {
    let path = write_temp(
        "config.yaml",
        "max_concurrent_generations: 2\npolicy:\n  min_confidence: 0.4\n",
    );
    let config = load_config(&path).unwrap();
    assert_eq!(config.max_concurrent_generations, 2);
    assert_eq!(config.policy.min_confidence, 0.4);
    assert_eq!(config.dedup.similarity_threshold, 0.85);
}
