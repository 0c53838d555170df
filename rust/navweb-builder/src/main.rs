use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use navweb_builder::build::merge::{check, merge_documents, write_document};
use navweb_builder::build::summary::summarize;

#[derive(Parser, Debug)]
#[command(name = "navweb-builder", about = "Merge navigation graph documents into one validated graph", disable_version_flag = true)]
struct Args {
    /// Graph documents, merged in the order given
    #[arg(long = "input", value_name = "PATH", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output graph document
    #[arg(long = "out", value_name = "PATH")]
    out: PathBuf,

    /// Version stamped on the output; defaults to the last input's version
    #[arg(long = "version", value_name = "VERSION")]
    graph_version: Option<String>,
}

fn run(args: &Args) -> Result<()> {
    let doc = merge_documents(&args.inputs, args.graph_version.as_deref())?;
    let graph = check(&doc)?;
    let summary = summarize(&graph);
    info!(?summary, "graph validated");
    write_document(&doc, &args.out)?;
    info!(out = %args.out.display(), "graph written");
    Ok(())
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_ansi(false).json().finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    info!(?args, "starting builder");
    if let Err(e) = run(&args) {
        error!(error = %format!("{e:#}"), "build failed");
        return Err(e);
    }
    Ok(())
}
