//! Binary graph session: one destination per compilation

use crate::config::ExportConfig;
use crate::encoder::ScalarEncoder;
use crate::error::{ExportError, Result};
use crate::naming::{destination_name, sanitize_signature};
use crate::properties::Property;
use crate::protocol::PoolProtocol;
use crate::serializer::GraphSerializer;
use crate::sink::SinkProvider;
use crate::wire::*;
use ilgraph_core::{IlGraph, MethodInfo};
use std::sync::Arc;

enum SessionState {
    Unopened,
    Initialized(PoolProtocol),
    Closed,
}

/// Writes every snapshot of one compilation into a single BIGV group.
///
/// The destination is opened by the first `write_graph` call and closed by
/// `complete` (or on drop). Any failure closes the session for good; later
/// calls return `ExportError::Closed`.
pub struct BinaryGraphWriter {
    compilation_id: u32,
    method: Option<MethodInfo>,
    sinks: Arc<dyn SinkProvider>,
    file_prefix: String,
    flush_threshold: usize,
    destination: Option<String>,
    next_graph_id: u32,
    state: SessionState,
}

impl BinaryGraphWriter {
    /// `method` is used for snapshots that do not carry their own method
    /// descriptor.
    pub fn new(
        compilation_id: u32,
        method: Option<MethodInfo>,
        sinks: Arc<dyn SinkProvider>,
        config: &ExportConfig,
    ) -> Self {
        BinaryGraphWriter {
            compilation_id,
            method,
            sinks,
            file_prefix: config.file_prefix.clone(),
            flush_threshold: config.flush_threshold,
            destination: None,
            next_graph_id: 0,
            state: SessionState::Unopened,
        }
    }

    pub fn compilation_id(&self) -> u32 {
        self.compilation_id
    }

    /// Name of the destination, once opened.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Initialized(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// Snapshots written so far.
    pub fn graph_count(&self) -> u32 {
        self.next_graph_id
    }

    /// Append one snapshot to the group, opening the destination first if
    /// needed.
    pub fn write_graph(&mut self, title: &str, graph: &IlGraph) -> Result<()> {
        if self.is_closed() {
            return Err(ExportError::Closed);
        }
        let result = self.try_write_graph(title, graph);
        if let Err(err) = &result {
            tracing::error!(
                "Graph session {} aborted while writing '{}': {}",
                self.compilation_id,
                title,
                err
            );
            self.state = SessionState::Closed;
        }
        result
    }

    /// Close the group and flush everything to the destination. A session
    /// that never opened writes nothing.
    pub fn complete(&mut self) -> Result<()> {
        let SessionState::Initialized(mut protocol) =
            std::mem::replace(&mut self.state, SessionState::Closed)
        else {
            return Ok(());
        };

        let encoder = protocol.encoder();
        let result = encoder
            .write_byte(CLOSE_GROUP)
            .and_then(|_| encoder.flush(true));
        match &result {
            Ok(()) => tracing::debug!(
                "Closed graph session {}: {} graphs, {} pool entries",
                self.compilation_id,
                self.next_graph_id,
                protocol.handles_issued()
            ),
            Err(err) => tracing::error!(
                "Graph session {} failed to close: {}",
                self.compilation_id,
                err
            ),
        }
        result
    }

    fn try_write_graph(&mut self, title: &str, graph: &IlGraph) -> Result<()> {
        if matches!(self.state, SessionState::Unopened) {
            self.open(graph)?;
        }
        let SessionState::Initialized(protocol) = &mut self.state else {
            return Err(ExportError::Closed);
        };

        GraphSerializer::new(protocol, graph).write(self.next_graph_id, title)?;
        self.next_graph_id += 1;
        Ok(())
    }

    fn open(&mut self, graph: &IlGraph) -> Result<()> {
        let method = graph
            .method()
            .or(self.method.as_ref())
            .cloned()
            .ok_or_else(|| {
                ExportError::Precondition("no method descriptor for graph session".to_string())
            })?;

        let name = destination_name(&self.file_prefix, self.compilation_id, &method, "bgv");
        let sink = self
            .sinks
            .open(&name)
            .map_err(|source| ExportError::DestinationOpen {
                name: name.clone(),
                source,
            })?;
        tracing::debug!("Opened graph session {} -> {}", self.compilation_id, name);
        self.destination = Some(name);

        let mut protocol = PoolProtocol::new(ScalarEncoder::with_threshold(sink, self.flush_threshold));
        write_group_header(&mut protocol, self.compilation_id, &method, &self.file_prefix)?;
        self.state = SessionState::Initialized(protocol);
        Ok(())
    }
}

impl Drop for BinaryGraphWriter {
    fn drop(&mut self) {
        if let Err(err) = self.complete() {
            tracing::warn!(
                "Graph session {} was not closed cleanly: {}",
                self.compilation_id,
                err
            );
        }
    }
}

impl std::fmt::Debug for BinaryGraphWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            SessionState::Unopened => "unopened",
            SessionState::Initialized(_) => "initialized",
            SessionState::Closed => "closed",
        };
        f.debug_struct("BinaryGraphWriter")
            .field("compilation_id", &self.compilation_id)
            .field("destination", &self.destination)
            .field("graphs", &self.next_graph_id)
            .field("state", &state)
            .finish()
    }
}

/// File header followed by the opening of the method's group.
fn write_group_header(
    protocol: &mut PoolProtocol,
    id: u32,
    method: &MethodInfo,
    prefix: &str,
) -> Result<()> {
    let signature = sanitize_signature(&method.qualified_signature());

    let encoder = protocol.encoder();
    encoder.write_raw(&MAGIC)?;
    encoder.write_byte(MAJOR_VERSION)?;
    encoder.write_byte(MINOR_VERSION)?;
    encoder.write_byte(BEGIN_GROUP)?;

    protocol.write_string(&format!("{}:{}", id, signature))?;
    protocol.write_string(&method.name)?;
    protocol.write_method(method)?;
    // bytecode index of the group's method
    protocol.encoder().write_u32(0)?;

    let graph_type = format!("StructuredGraph:{}{{{}<{}>}}", id, prefix, signature);
    protocol.write_properties(&[Property::new("graph", graph_type)])
}
