//! ilgraph core: IL data model, statement traversal and method dumps

pub mod dump;
pub mod graph;
pub mod model;
pub mod symbols;


#[cfg(test)]
pub mod test_utils;

pub use dump::{DumpError, MethodDump, NodeDump, SnapshotDump, load_dump, parse_dump, save_dump};
pub use graph::{ChildLimitExceeded, IlGraph, Statement};
pub use model::{
    Block, ChildEdge, CompareType, Condition, DataType, Hotness, IlNode, MethodInfo, NodeId,
    Opcode, ParseOpcodeError, SymbolRef,
};
pub use symbols::SymbolTable;
