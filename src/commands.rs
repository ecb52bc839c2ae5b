//! CLI command implementations

use anyhow::Context;
use ilgraph_core::{MethodDump, load_dump};
use ilgraph_writer::{ExportConfig, ExportFormat, ExporterFactory};
use std::path::{Path, PathBuf};

/// Config file values, with command-line flags taking precedence.
pub fn load_config(
    path: Option<&Path>,
    format: Option<&str>,
    out_dir: Option<PathBuf>,
) -> anyhow::Result<ExportConfig> {
    let mut config = match path {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };
    if let Some(format) = format {
        config.format = format.parse::<ExportFormat>()?;
    }
    if let Some(dir) = out_dir {
        config.output_dir = dir;
    }
    Ok(config)
}

pub fn export(dump_path: &Path, config: ExportConfig) -> anyhow::Result<()> {
    let dump = load_dump(dump_path)?;
    tracing::info!(
        "Exporting {} ({} snapshots) as {}",
        dump.method.qualified_signature(),
        dump.snapshots.len(),
        config.format
    );

    let factory = ExporterFactory::new(config);
    let mut exporter = factory.create(Some(dump.method.clone()));
    for snapshot in &dump.snapshots {
        let graph = snapshot.build(Some(&dump.method))?;
        exporter
            .write_graph(&snapshot.title, &graph)
            .with_context(|| format!("exporting snapshot '{}'", snapshot.title))?;
    }
    exporter.complete()?;

    match exporter.destination() {
        Some(name) => {
            let path = factory.config().output_dir.join(name);
            tracing::info!("Wrote {}", path.display());
            println!("{}", path.display());
        }
        None => tracing::info!("Nothing written"),
    }
    Ok(())
}

pub fn inspect(dump_path: &Path) -> anyhow::Result<()> {
    let dump = load_dump(dump_path)?;
    print_summary(&dump)
}

fn print_summary(dump: &MethodDump) -> anyhow::Result<()> {
    let method = &dump.method;
    println!(
        "{} [{}] flags={:#x} bytecode={} bytes",
        method.qualified_signature(),
        method.hotness.name(),
        method.flags,
        method.bytecode.len()
    );
    for snapshot in &dump.snapshots {
        let graph = snapshot.build(Some(method))?;
        println!(
            "  {}: {} statements, {} nodes, {} blocks",
            snapshot.title,
            graph.statement_count(),
            graph.statement_count() + graph.data_nodes().len(),
            graph.blocks().len()
        );
    }
    Ok(())
}
