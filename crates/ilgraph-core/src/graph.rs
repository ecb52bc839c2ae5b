//! IL graph wrapper using petgraph::StableDiGraph with global node indices

use crate::model::*;
use crate::symbols::SymbolTable;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashSet;
use thiserror::Error;

/// A node already holds as many children as a 16-bit operand slot can
/// number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node {parent} cannot take another child: it already has {count}")]
pub struct ChildLimitExceeded {
    pub parent: NodeId,
    pub count: usize,
}

/// One method's IL snapshot: nodes with ordered child edges, threaded by an
/// ordered list of statements.
///
/// Nodes are never removed, so a `NodeId` handed out by `add_node` stays
/// valid and unique for the lifetime of the graph.
pub struct IlGraph {
    inner: StableDiGraph<IlNode, ChildEdge>,
    treetops: Vec<NodeId>,
    statement_set: HashSet<NodeId>,
    blocks: Vec<Block>,
    symbols: SymbolTable,
    method: Option<MethodInfo>,
}

impl std::fmt::Debug for IlGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IlGraph")
            .field("node_count", &self.inner.node_count())
            .field("statement_count", &self.treetops.len())
            .field("block_count", &self.blocks.len())
            .finish()
    }
}

impl IlGraph {
    pub fn new() -> Self {
        IlGraph {
            inner: StableDiGraph::new(),
            treetops: Vec::new(),
            statement_set: HashSet::new(),
            blocks: Vec::new(),
            symbols: SymbolTable::new(),
            method: None,
        }
    }

    pub fn for_method(method: MethodInfo) -> Self {
        let mut graph = IlGraph::new();
        graph.method = Some(method);
        graph
    }

    /// Add a node to the graph. Returns its global index.
    pub fn add_node(&mut self, node: IlNode) -> NodeId {
        let idx = self.inner.add_node(node);
        NodeId(idx.index() as u32)
    }

    /// Append `child` as the next operand of `parent`.
    ///
    /// Panics if either node does not exist.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ChildLimitExceeded> {
        let slot = child_slot(parent, self.child_count(parent))?;
        self.inner
            .add_edge(index(parent), index(child), ChildEdge { slot });
        Ok(())
    }

    /// Append a statement rooted at `node` to the statement list.
    pub fn append_treetop(&mut self, node: NodeId) {
        self.treetops.push(node);
        self.statement_set.insert(node);
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn set_method(&mut self, method: MethodInfo) {
        self.method = Some(method);
    }

    pub fn method(&self) -> Option<&MethodInfo> {
        self.method.as_ref()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Get a node by global index.
    pub fn node(&self, id: NodeId) -> Option<&IlNode> {
        self.inner.node_weight(index(id))
    }

    /// Children of a node, in operand order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut edges: Vec<(u16, NodeId)> = self
            .inner
            .edges_directed(index(id), Direction::Outgoing)
            .map(|edge| (edge.weight().slot, NodeId(edge.target().index() as u32)))
            .collect();
        edges.sort_by_key(|(slot, _)| *slot);
        edges.into_iter().map(|(_, child)| child).collect()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.inner
            .edges_directed(index(id), Direction::Outgoing)
            .count()
    }

    /// Resolved symbol name of a load, store or call.
    pub fn symbol_name(&self, id: NodeId) -> Option<&str> {
        let symbol = self.node(id)?.symbol?;
        self.symbols.name(symbol)
    }

    /// Total number of nodes, reachable or not.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn statement_count(&self) -> usize {
        self.treetops.len()
    }

    pub fn is_statement(&self, id: NodeId) -> bool {
        self.statement_set.contains(&id)
    }

    /// Iterate over statements in evaluation order.
    pub fn statements(&self) -> impl Iterator<Item = Statement<'_>> {
        (0..self.treetops.len()).map(move |position| Statement {
            graph: self,
            position,
        })
    }

    pub fn statement(&self, position: usize) -> Option<Statement<'_>> {
        (position < self.treetops.len()).then_some(Statement {
            graph: self,
            position,
        })
    }

    /// Every node reachable from the statement list, in pre-order: statements
    /// in order, each followed by its operand subtree. Commoned nodes are
    /// visited once, at their first occurrence.
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_range(0, self.treetops.len())
    }

    /// Pre-order over the statements in `start..end`.
    pub fn preorder_range(&self, start: usize, end: usize) -> Vec<NodeId> {
        let end = end.min(self.treetops.len());
        let mut visited = HashSet::new();
        let mut order = Vec::new();

        for &root in self.treetops.get(start..end).unwrap_or_default() {
            let mut to_visit = vec![root];
            while let Some(current) = to_visit.pop() {
                if !visited.insert(current) {
                    continue;
                }
                order.push(current);
                to_visit.extend(self.children(current).into_iter().rev());
            }
        }

        order
    }

    /// Reachable nodes that are not statement roots, in pre-order.
    pub fn data_nodes(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| !self.is_statement(*id))
            .collect()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl Default for IlGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn index(id: NodeId) -> NodeIndex {
    NodeIndex::new(id.index())
}

/// A statement (tree top): a node with its position in the statement list.
#[derive(Clone, Copy)]
pub struct Statement<'g> {
    graph: &'g IlGraph,
    position: usize,
}

impl<'g> Statement<'g> {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn node_id(&self) -> NodeId {
        self.graph.treetops[self.position]
    }

    pub fn node(&self) -> Option<&'g IlNode> {
        self.graph.node(self.node_id())
    }

    pub fn has_predecessor(&self) -> bool {
        self.position > 0
    }

    /// Root of the following statement.
    pub fn next(&self) -> Option<NodeId> {
        self.graph.treetops.get(self.position + 1).copied()
    }

    pub fn branch_target(&self) -> Option<NodeId> {
        self.node()?.branch_target
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("position", &self.position)
            .field("node", &self.node_id())
            .finish()
    }
}

/// Operand slot for the child appended after `count` existing ones.
pub(crate) fn child_slot(parent: NodeId, count: usize) -> Result<u16, ChildLimitExceeded> {
    u16::try_from(count).map_err(|_| ChildLimitExceeded { parent, count })
}
