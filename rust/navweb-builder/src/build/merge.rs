use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use navweb_core::graph::GraphDocument;
use navweb_core::WorldGraph;
use tracing::info;

/// Load `inputs` in order and fold them into one document. Later nodes and
/// regions with a repeated id replace earlier ones; edges accumulate.
pub fn merge_documents(inputs: &[PathBuf], version: Option<&str>) -> Result<GraphDocument> {
    let mut merged = GraphDocument::default();
    for path in inputs {
        let doc = GraphDocument::load(path).with_context(|| format!("reading {}", path.display()))?;
        // Duplicates are only an error inside a single document.
        doc.validate().with_context(|| format!("validating {}", path.display()))?;
        info!(path = %path.display(), nodes = doc.nodes.len(), edges = doc.edges.len(), regions = doc.regions.len(), "input loaded");
        merged.merge(doc);
    }
    if let Some(v) = version {
        merged.version = Some(v.to_string());
    }
    Ok(merged)
}

/// Full check of a merged document: structure plus every node type, edge
/// type and requirement it names.
pub fn check(doc: &GraphDocument) -> Result<WorldGraph> {
    WorldGraph::from_document(doc.clone()).context("merged graph failed validation")
}

pub fn write_document(doc: &GraphDocument, out: &Path) -> Result<()> {
    let f = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, doc).context("serializing graph")?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}
