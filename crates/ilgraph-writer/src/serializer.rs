//! Graph body encoding: one record per statement and per data node

use crate::error::{ExportError, Result, count_u32};
use crate::properties::{Property, name_template, node_properties};
use crate::protocol::{InputEdgeInfo, NodeClassShape, OutputEdgeInfo, PoolProtocol};
use crate::wire::BEGIN_GRAPH;
use ilgraph_core::{IlGraph, IlNode, NodeId, Statement};

/// Writes IL snapshots through a session's pool protocol.
pub struct GraphSerializer<'a> {
    protocol: &'a mut PoolProtocol,
    graph: &'a IlGraph,
}

impl<'a> GraphSerializer<'a> {
    pub fn new(protocol: &'a mut PoolProtocol, graph: &'a IlGraph) -> Self {
        GraphSerializer { protocol, graph }
    }

    /// Emit one complete graph: header, label, node records and the (empty)
    /// block list.
    pub fn write(&mut self, graph_id: u32, title: &str) -> Result<()> {
        let encoder = self.protocol.encoder();
        encoder.write_byte(BEGIN_GRAPH)?;
        encoder.write_u32(graph_id)?;
        encoder.write_length_prefixed(title.as_bytes())?;
        // argument count
        encoder.write_u32(0)?;

        self.protocol
            .write_properties(&[Property::new("label", title)])?;

        let data_nodes = self.graph.data_nodes();
        let node_count = self.graph.statement_count() + data_nodes.len();
        self.protocol
            .encoder()
            .write_u32(count_u32("node", node_count)?)?;

        for statement in self.graph.statements() {
            self.write_statement(statement)?;
        }
        for id in data_nodes {
            self.write_data_node(id)?;
        }

        // block count
        self.protocol.encoder().write_u32(0)?;

        tracing::debug!(
            "Wrote graph #{} '{}': {} nodes",
            graph_id,
            title,
            node_count
        );
        Ok(())
    }

    fn write_statement(&mut self, statement: Statement<'_>) -> Result<()> {
        let id = statement.node_id();
        let node = self.require_node(id)?;

        let outputs = output_edges(node, statement.next().is_some());
        self.write_record_head(id, node, outputs, statement.has_predecessor())?;

        if node.opcode.is_branch() {
            let target = statement.branch_target().ok_or_else(|| {
                ExportError::Precondition(format!(
                    "branch {} at statement {} has no destination",
                    node.opcode,
                    statement.position()
                ))
            })?;
            self.write_direct_edge(target)?;
        }
        if let Some(next) = statement.next() {
            self.write_direct_edge(next)?;
        }
        Ok(())
    }

    fn write_data_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.require_node(id)?;
        self.write_record_head(id, node, Vec::new(), false)
    }

    /// Index, node class, predecessor flag, properties and child edges.
    fn write_record_head(
        &mut self,
        id: NodeId,
        node: &IlNode,
        outputs: Vec<OutputEdgeInfo>,
        has_predecessor: bool,
    ) -> Result<()> {
        let children = self.graph.children(id);
        tracing::trace!(
            "Record {} {}: {} children, {} outputs",
            id,
            node.opcode,
            children.len(),
            outputs.len()
        );

        self.protocol
            .encoder()
            .write_u32(count_u32("global index", id.index())?)?;

        let shape = NodeClassShape {
            name: node.opcode.name(),
            template: name_template(node.opcode),
            inputs: input_edges(children.len()),
            outputs,
        };
        self.protocol.write_node_class(&shape)?;

        self.protocol
            .encoder()
            .write_byte(u8::from(has_predecessor))?;
        self.protocol
            .write_properties(&node_properties(self.graph, id)?)?;

        for child in children {
            self.write_direct_edge(child)?;
        }
        Ok(())
    }

    fn write_direct_edge(&mut self, to: NodeId) -> Result<()> {
        self.protocol
            .encoder()
            .write_u32(count_u32("global index", to.index())?)
    }

    fn require_node(&self, id: NodeId) -> Result<&'a IlNode> {
        self.graph
            .node(id)
            .ok_or_else(|| ExportError::Precondition(format!("node {} is not in the graph", id)))
    }
}

/// One direct `value[i]` input per child.
pub fn input_edges(child_count: usize) -> Vec<InputEdgeInfo> {
    (0..child_count)
        .map(|i| InputEdgeInfo {
            indirect: false,
            name: format!("value[{}]", i),
            kind: 0,
        })
        .collect()
}

/// Successor edges of a statement. Branches always have both outcomes;
/// other statements link to the next one when there is one.
pub fn output_edges(node: &IlNode, has_next: bool) -> Vec<OutputEdgeInfo> {
    let edge = |name: &str| OutputEdgeInfo {
        indirect: false,
        name: name.to_string(),
    };
    if node.opcode.is_branch() {
        vec![edge("falseBranch"), edge("trueBranch")]
    } else if has_next {
        vec![edge("nextTreeTop")]
    } else {
        Vec::new()
    }
}
