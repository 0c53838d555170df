use std::path::PathBuf;

use navweb_builder::build::merge::{check, merge_documents, write_document};
use navweb_builder::build::summary::summarize;
use navweb_core::graph::{EdgeType, GraphDocument};
use tempfile::TempDir;

const BASE: &str = r#"{
    "version": "1.0",
    "nodes": [
        {"id": "lumbridge", "name": "Lumbridge", "x": 3222, "y": 3218, "type": "generic"},
        {"id": "draynor", "name": "Draynor", "x": 3093, "y": 3244, "type": "generic"}
    ],
    "edges": [
        {"from": "lumbridge", "to": "draynor", "type": "walk", "cost_ticks": 130, "bidirectional": true}
    ]
}"#;

const TRANSPORT: &str = r#"{
    "version": "1.1",
    "nodes": [
        {"id": "draynor", "name": "Draynor Village", "x": 3093, "y": 3244, "type": "generic"},
        {"id": "port_sarim", "x": 3029, "y": 3217, "type": "transport"}
    ],
    "edges": [
        {"from": "draynor", "to": "port_sarim", "type": "walk", "cost_ticks": 60},
        {"from": "any_location", "to": "lumbridge", "type": "free_teleport", "cost_ticks": 20,
         "metadata": {"teleport_type": "home"}}
    ],
    "regions": [{"id": "misthalin", "nodes": ["lumbridge", "draynor"]}]
}"#;

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let p = dir.path().join(name);
    std::fs::write(&p, body).unwrap();
    p
}

#[test]
fn later_documents_replace_nodes_and_append_edges() {
    let dir = TempDir::new().unwrap();
    let inputs = vec![write(&dir, "base.json", BASE), write(&dir, "transport.json", TRANSPORT)];

    let doc = merge_documents(&inputs, None).unwrap();
    assert_eq!(doc.version(), "1.1");
    assert_eq!(doc.nodes.len(), 3);
    assert_eq!(doc.nodes[1].name, "Draynor Village");
    assert_eq!(doc.edges.len(), 3);

    let graph = check(&doc).unwrap();
    let summary = summarize(&graph);
    assert_eq!(summary.nodes, 3);
    assert_eq!(summary.edges, 4);
    assert_eq!(summary.regions, 1);
    assert_eq!(summary.edges_by_type.get(&EdgeType::Walk), Some(&3));
    assert_eq!(summary.edges_by_type.get(&EdgeType::FreeTeleport), Some(&1));
}

#[test]
fn version_flag_wins_and_output_reloads() {
    let dir = TempDir::new().unwrap();
    let inputs = vec![write(&dir, "base.json", BASE)];
    let doc = merge_documents(&inputs, Some("2024.06")).unwrap();

    let out = dir.path().join("graph.json");
    write_document(&doc, &out).unwrap();
    let back = GraphDocument::load(&out).unwrap();
    assert_eq!(back, doc);
    assert_eq!(back.version(), "2024.06");
}

#[test]
fn duplicate_ids_inside_one_document_are_rejected() {
    let dir = TempDir::new().unwrap();
    let dup = r#"{"nodes": [
        {"id": "a", "x": 1, "y": 1, "type": "generic"},
        {"id": "a", "x": 2, "y": 2, "type": "generic"}
    ]}"#;
    let err = merge_documents(&[write(&dir, "dup.json", dup)], None).unwrap_err();
    assert!(format!("{err:#}").contains("dup.json"));
}

#[test]
fn dangling_edge_across_documents_fails_the_check() {
    let dir = TempDir::new().unwrap();
    let orphan = r#"{
        "nodes": [{"id": "a", "x": 1, "y": 1, "type": "generic"}],
        "edges": [{"from": "a", "to": "b", "type": "walk", "cost_ticks": 1}]
    }"#;
    assert!(merge_documents(&[write(&dir, "orphan.json", orphan)], None).is_err());

    let typo = r#"{
        "nodes": [
            {"id": "a", "x": 1, "y": 1, "type": "generic"},
            {"id": "b", "x": 2, "y": 1, "type": "generic"}
        ],
        "edges": [{"from": "a", "to": "b", "type": "teleportish", "cost_ticks": 1}]
    }"#;
    let doc = merge_documents(&[write(&dir, "typo.json", typo)], None).unwrap();
    assert!(check(&doc).is_err());
}
