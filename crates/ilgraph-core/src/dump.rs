//! Method dumps: IL snapshots stored as JSON, for driving the exporters
//! outside a running compiler.

use crate::graph::{ChildLimitExceeded, IlGraph};
use crate::model::{Block, IlNode, MethodInfo, NodeId, Opcode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("I/O error on method dump {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed method dump: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot '{snapshot}': node {node} names missing child {child}")]
    DanglingChild { snapshot: String, node: usize, child: u32 },

    #[error("snapshot '{snapshot}': node {node} branches to missing node {target}")]
    DanglingBranch { snapshot: String, node: usize, target: u32 },

    #[error("snapshot '{snapshot}': node {node} branches to node {target}, which is not a statement")]
    BranchToNonStatement { snapshot: String, node: usize, target: u32 },

    #[error("snapshot '{snapshot}': {opcode} node {node} has no value")]
    MissingConstant {
        snapshot: String,
        node: usize,
        opcode: Opcode,
    },

    #[error("snapshot '{snapshot}': {count} nodes do not fit 32-bit node indices")]
    TooManyNodes { snapshot: String, count: usize },

    #[error("snapshot '{snapshot}': {source}")]
    TooManyChildren {
        snapshot: String,
        #[source]
        source: ChildLimitExceeded,
    },

    #[error("snapshot '{snapshot}': treetop refers to missing node {node}")]
    DanglingTreetop { snapshot: String, node: u32 },

    #[error("snapshot '{snapshot}': block {block} spans statements {entry}..={exit}, past the {count} statements")]
    BlockOutOfRange {
        snapshot: String,
        block: u32,
        entry: usize,
        exit: usize,
        count: usize,
    },
}

/// All snapshots recorded for one compiled method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDump {
    pub method: MethodInfo,
    #[serde(default)]
    pub snapshots: Vec<SnapshotDump>,
}

/// The IL after one optimization phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDump {
    pub title: String,
    pub nodes: Vec<NodeDump>,
    /// Statement roots, as positions in `nodes`.
    pub treetops: Vec<u32>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDump {
    pub opcode: Opcode,
    #[serde(default)]
    pub children: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_target: Option<u32>,
}

impl SnapshotDump {
    /// Build the IL graph. Global indices equal positions in `nodes`.
    pub fn build(&self, method: Option<&MethodInfo>) -> Result<IlGraph, DumpError> {
        let count = u32::try_from(self.nodes.len()).map_err(|_| DumpError::TooManyNodes {
            snapshot: self.title.clone(),
            count: self.nodes.len(),
        })?;
        let mut graph = IlGraph::new();
        if let Some(method) = method {
            graph.set_method(method.clone());
        }

        for (position, dump) in self.nodes.iter().enumerate() {
            if dump.opcode.has_literal() && dump.value.is_none() {
                return Err(DumpError::MissingConstant {
                    snapshot: self.title.clone(),
                    node: position,
                    opcode: dump.opcode,
                });
            }
            let mut node = IlNode::new(dump.opcode);
            node.constant = dump.value;
            if let Some(target) = dump.branch_target {
                if target >= count {
                    return Err(DumpError::DanglingBranch {
                        snapshot: self.title.clone(),
                        node: position,
                        target,
                    });
                }
                node.branch_target = Some(NodeId(target));
            }
            if let Some(name) = &dump.symbol {
                node.symbol = Some(graph.symbols_mut().intern(name));
            }
            graph.add_node(node);
        }

        for (position, dump) in self.nodes.iter().enumerate() {
            for &child in &dump.children {
                if child >= count {
                    return Err(DumpError::DanglingChild {
                        snapshot: self.title.clone(),
                        node: position,
                        child,
                    });
                }
                graph
                    .add_child(NodeId(position as u32), NodeId(child))
                    .map_err(|source| DumpError::TooManyChildren {
                        snapshot: self.title.clone(),
                        source,
                    })?;
            }
        }

        for &root in &self.treetops {
            if root >= count {
                return Err(DumpError::DanglingTreetop {
                    snapshot: self.title.clone(),
                    node: root,
                });
            }
            graph.append_treetop(NodeId(root));
        }

        // Branch destinations must have records of their own.
        let branches = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(position, dump)| dump.branch_target.map(|target| (position, target)));
        for (position, target) in branches {
            if !graph.is_statement(NodeId(target)) {
                return Err(DumpError::BranchToNonStatement {
                    snapshot: self.title.clone(),
                    node: position,
                    target,
                });
            }
        }

        for block in &self.blocks {
            if block.entry > block.exit || block.exit >= self.treetops.len() {
                return Err(DumpError::BlockOutOfRange {
                    snapshot: self.title.clone(),
                    block: block.number,
                    entry: block.entry,
                    exit: block.exit,
                    count: self.treetops.len(),
                });
            }
            graph.add_block(block.clone());
        }

        tracing::debug!(
            "Built snapshot '{}': {} nodes, {} statements",
            self.title,
            graph.node_count(),
            graph.statement_count()
        );
        Ok(graph)
    }
}

/// Parse a method dump from JSON text.
pub fn parse_dump(json: &str) -> Result<MethodDump, DumpError> {
    Ok(serde_json::from_str(json)?)
}

/// Load a method dump from disk.
pub fn load_dump(path: &Path) -> Result<MethodDump, DumpError> {
    let json = std::fs::read_to_string(path).map_err(|source| DumpError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let dump = parse_dump(&json)?;
    tracing::debug!(
        "Method dump loaded from {}: {} snapshots",
        path.display(),
        dump.snapshots.len()
    );
    Ok(dump)
}

/// Write a method dump to disk as pretty-printed JSON.
pub fn save_dump(dump: &MethodDump, path: &Path) -> Result<(), DumpError> {
    let json = serde_json::to_string_pretty(dump)?;
    std::fs::write(path, json).map_err(|source| DumpError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}
