//! Exporter selection

use crate::config::{ExportConfig, ExportFormat};
use crate::error::Result;
use crate::naming::CompilationIds;
use crate::session::BinaryGraphWriter;
use crate::sink::{DirectorySinks, NullSinks, SinkProvider};
use crate::xml::XmlGraphWriter;
use ilgraph_core::{IlGraph, MethodInfo};
use std::sync::Arc;

/// The exporter one compilation writes its snapshots through.
#[derive(Debug)]
pub enum GraphExporter {
    Binary(BinaryGraphWriter),
    Xml(XmlGraphWriter),
    Disabled,
}

impl GraphExporter {
    pub fn write_graph(&mut self, title: &str, graph: &IlGraph) -> Result<()> {
        match self {
            GraphExporter::Binary(writer) => writer.write_graph(title, graph),
            GraphExporter::Xml(writer) => writer.write_graph(title, graph),
            GraphExporter::Disabled => Ok(()),
        }
    }

    pub fn complete(&mut self) -> Result<()> {
        match self {
            GraphExporter::Binary(writer) => writer.complete(),
            GraphExporter::Xml(writer) => writer.complete(),
            GraphExporter::Disabled => Ok(()),
        }
    }

    pub fn format(&self) -> ExportFormat {
        match self {
            GraphExporter::Binary(_) => ExportFormat::Binary,
            GraphExporter::Xml(_) => ExportFormat::Xml,
            GraphExporter::Disabled => ExportFormat::None,
        }
    }

    /// Destination name, once the first snapshot has opened it.
    pub fn destination(&self) -> Option<&str> {
        match self {
            GraphExporter::Binary(writer) => writer.destination(),
            GraphExporter::Xml(writer) => writer.destination(),
            GraphExporter::Disabled => None,
        }
    }
}

/// Creates one exporter per compilation, all of the configured kind, with
/// unique compilation ids. Shareable across compilation threads.
pub struct ExporterFactory {
    config: ExportConfig,
    ids: CompilationIds,
    sinks: Arc<dyn SinkProvider>,
}

impl ExporterFactory {
    /// Destinations go to files under `config.output_dir`.
    pub fn new(config: ExportConfig) -> Self {
        let sinks: Arc<dyn SinkProvider> = match config.format {
            ExportFormat::None => Arc::new(NullSinks),
            _ => Arc::new(DirectorySinks::new(config.output_dir.clone())),
        };
        Self::with_sinks(config, sinks)
    }

    pub fn with_sinks(config: ExportConfig, sinks: Arc<dyn SinkProvider>) -> Self {
        tracing::debug!("Graph export format: {}", config.format);
        ExporterFactory {
            config,
            ids: CompilationIds::new(),
            sinks,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exporter for a new compilation. `method` is the default descriptor for
    /// snapshots that carry none.
    pub fn create(&self, method: Option<MethodInfo>) -> GraphExporter {
        match self.config.format {
            ExportFormat::Binary => GraphExporter::Binary(BinaryGraphWriter::new(
                self.ids.next_id(),
                method,
                Arc::clone(&self.sinks),
                &self.config,
            )),
            ExportFormat::Xml => GraphExporter::Xml(XmlGraphWriter::new(
                self.ids.next_id(),
                method,
                Arc::clone(&self.sinks),
                &self.config,
            )),
            ExportFormat::None => GraphExporter::Disabled,
        }
    }
}

impl std::fmt::Debug for ExporterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterFactory")
            .field("config", &self.config)
            .field("ids", &self.ids)
            .finish()
    }
}
