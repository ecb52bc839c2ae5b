//! Textual exporter writing `graphDocument` XML

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::naming::{destination_name, sanitize_signature};
use crate::sink::{DataSink, SinkProvider};
use crate::properties::{UNRESOLVED_SYMBOL, literal};
use ilgraph_core::{IlGraph, MethodInfo, NodeId};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

enum XmlState {
    Unopened,
    Open(Box<dyn DataSink>),
    Closed,
}

/// Writes every snapshot of one compilation into a single XML
/// `graphDocument`. No pooling: each graph is self-contained text.
pub struct XmlGraphWriter {
    compilation_id: u32,
    method: Option<MethodInfo>,
    sinks: Arc<dyn SinkProvider>,
    file_prefix: String,
    destination: Option<String>,
    graph_count: u32,
    state: XmlState,
}

impl XmlGraphWriter {
    pub fn new(
        compilation_id: u32,
        method: Option<MethodInfo>,
        sinks: Arc<dyn SinkProvider>,
        config: &ExportConfig,
    ) -> Self {
        XmlGraphWriter {
            compilation_id,
            method,
            sinks,
            file_prefix: config.file_prefix.clone(),
            destination: None,
            graph_count: 0,
            state: XmlState::Unopened,
        }
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn graph_count(&self) -> u32 {
        self.graph_count
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, XmlState::Closed)
    }

    pub fn write_graph(&mut self, title: &str, graph: &IlGraph) -> Result<()> {
        if self.is_closed() {
            return Err(ExportError::Closed);
        }
        let result = self.try_write_graph(title, graph);
        if let Err(err) = &result {
            tracing::error!(
                "XML graph session {} aborted while writing '{}': {}",
                self.compilation_id,
                title,
                err
            );
            self.state = XmlState::Closed;
        }
        result
    }

    /// Close the group and document.
    pub fn complete(&mut self) -> Result<()> {
        let XmlState::Open(mut sink) = std::mem::replace(&mut self.state, XmlState::Closed) else {
            return Ok(());
        };
        sink.write_text("</group>\n</graphDocument>\n")?;
        sink.flush()?;
        tracing::debug!(
            "Closed XML graph session {}: {} graphs",
            self.compilation_id,
            self.graph_count
        );
        Ok(())
    }

    fn try_write_graph(&mut self, title: &str, graph: &IlGraph) -> Result<()> {
        if matches!(self.state, XmlState::Unopened) {
            self.open(graph)?;
        }
        let XmlState::Open(sink) = &mut self.state else {
            return Err(ExportError::Closed);
        };

        let text = render_graph(title, graph)?;
        sink.write_text(&text)?;
        self.graph_count += 1;
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

        let name = destination_name(&self.file_prefix, self.compilation_id, &method, "xml");
        let mut sink = self
            .sinks
            .open(&name)
            .map_err(|source| ExportError::DestinationOpen {
                name: name.clone(),
                source,
            })?;
        tracing::debug!("Opened XML graph session {} -> {}", self.compilation_id, name);
        self.destination = Some(name);

        let signature = sanitize_signature(&method.qualified_signature());
        let mut header = String::from("<graphDocument>\n<group>\n<properties>\n");
        push_property(&mut header, "name", &signature);
        push_property(&mut header, "compilationId", &self.compilation_id.to_string());
        header.push_str("</properties>\n");
        sink.write_text(&header)?;

        self.state = XmlState::Open(sink);
        Ok(())
    }
}

impl Drop for XmlGraphWriter {
    fn drop(&mut self) {
        if let Err(err) = self.complete() {
            tracing::warn!(
                "XML graph session {} was not closed cleanly: {}",
                self.compilation_id,
                err
            );
        }
    }
}

impl std::fmt::Debug for XmlGraphWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlGraphWriter")
            .field("compilation_id", &self.compilation_id)
            .field("destination", &self.destination)
            .field("graphs", &self.graph_count)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// One `<graph>` element: nodes, edges and control flow.
pub fn render_graph(title: &str, graph: &IlGraph) -> Result<String> {
    let mut out = String::new();
    let statements: Vec<NodeId> = graph.statements().map(|s| s.node_id()).collect();
    let data_nodes = graph.data_nodes();

    let _ = writeln!(out, "<graph name='{}'>", escape(title));
    out.push_str("<properties>\n</properties>\n");

    out.push_str("<nodes>\n");
    for &id in statements.iter().chain(&data_nodes) {
        push_node(&mut out, graph, id)?;
    }
    out.push_str("</nodes>\n");

    out.push_str("<edges>\n");
    for statement in graph.statements() {
        let id = statement.node_id();
        if let Some(next) = statement.next() {
            push_edge(&mut out, id, next, "next", 0);
        }
        if statement.node().is_some_and(|node| node.opcode.is_branch()) {
            let target = statement.branch_target().ok_or_else(|| {
                ExportError::Precondition(format!(
                    "branch at statement {} has no destination",
                    statement.position()
                ))
            })?;
            push_edge(&mut out, id, target, "branchTrue", 1);
        }
        push_child_edges(&mut out, graph, id);
    }
    for &id in &data_nodes {
        push_child_edges(&mut out, graph, id);
    }
    out.push_str("</edges>\n");

    out.push_str("<controlFlow>\n");
    let mut listed = HashSet::new();
    for block in graph.blocks() {
        let _ = writeln!(out, "<block name='{}'>", block.number);
        out.push_str("<nodes>\n");
        for id in graph.preorder_range(block.entry, block.exit + 1) {
            if listed.insert(id) {
                let _ = writeln!(out, "<node id='{}'/>", id.0);
            }
        }
        out.push_str("</nodes>\n<successors>\n");
        // Block 1 is the method exit.
        for successor in block.successors.iter().filter(|&&number| number != 1) {
            let _ = writeln!(out, "<successor name='{}'/>", successor);
        }
        out.push_str("</successors>\n</block>\n");
    }
    out.push_str("</controlFlow>\n</graph>\n");

    Ok(out)
}

/// Opcode name, followed by the literal of integral constants or the symbol
/// of loads and stores.
pub fn node_label(graph: &IlGraph, id: NodeId) -> Result<String> {
    let Some(node) = graph.node(id) else {
        return Ok(String::new());
    };
    let op = node.opcode;
    let label = if op.has_literal() {
        format!("{} {}", op, literal(id, node)?)
    } else if op.has_symbol_reference() && !op.is_call() {
        let symbol = graph.symbol_name(id).unwrap_or(UNRESOLVED_SYMBOL);
        format!("{} {}", op, symbol)
    } else {
        op.name().to_string()
    };
    Ok(label)
}

fn push_node(out: &mut String, graph: &IlGraph, id: NodeId) -> Result<()> {
    let category = match graph.node(id) {
        Some(node) if node.opcode.is_treetop() => "control",
        _ => "data",
    };
    let _ = writeln!(out, "<node id='{}'>", id.0);
    out.push_str("<properties>\n");
    push_property(out, "name", &node_label(graph, id)?);
    push_property(out, "category", category);
    push_property(out, "idx", &id.0.to_string());
    out.push_str("</properties>\n</node>\n");
    Ok(())
}

fn push_child_edges(out: &mut String, graph: &IlGraph, id: NodeId) {
    for (index, child) in graph.children(id).into_iter().enumerate() {
        push_edge(out, id, child, "child", index);
    }
}

fn push_edge(out: &mut String, from: NodeId, to: NodeId, kind: &str, index: usize) {
    let _ = writeln!(
        out,
        "<edge from='{}' to='{}' type='{}' index='{}'/>",
        from.0, to.0, kind, index
    );
}

fn push_property(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "<p name='{}'>{}</p>", name, escape(value));
}

/// Escape XML markup characters.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '\'', '"']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
