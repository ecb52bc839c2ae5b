//! Test utilities for ilgraph-core

use crate::graph::IlGraph;
use crate::model::*;

/// `static int answer()` on class `demo/Sample`.
pub fn sample_method() -> MethodInfo {
    MethodInfo {
        class_name: "demo/Sample".to_string(),
        name: "answer".to_string(),
        signature: "()I".to_string(),
        parameter_types: vec![],
        return_type: DataType::Int32,
        flags: 0x0008,
        bytecode: vec![0x04, 0x05, 0x60, 0xac],
        hotness: Hotness::Warm,
    }
}

/// `x = 1 + 2`: one istore statement over an iadd of two constants.
/// Nodes are created top-down, so global indices follow pre-order.
pub fn store_of_add() -> IlGraph {
    let mut graph = IlGraph::for_method(sample_method());
    let x = graph.symbols_mut().intern("x");

    let store = graph.add_node(IlNode::with_symbol(Opcode::Istore, x));
    let add = graph.add_node(IlNode::new(Opcode::Iadd));
    let one = graph.add_node(IlNode::constant(Opcode::Iconst, 1));
    let two = graph.add_node(IlNode::constant(Opcode::Iconst, 2));

    graph.add_child(store, add).unwrap();
    graph.add_child(add, one).unwrap();
    graph.add_child(add, two).unwrap();
    graph.append_treetop(store);
    graph
}

/// BBStart; `if (i < 10) goto BBStart`; BBEnd. Three statements and two
/// data nodes.
pub fn branching_loop() -> IlGraph {
    let mut graph = IlGraph::for_method(sample_method());
    let i = graph.symbols_mut().intern("i");

    let start = graph.add_node(IlNode::new(Opcode::BBStart));
    let branch = graph.add_node(IlNode::branch(
        Opcode::IfCmp(CompareType::Int32, Condition::Lt),
        start,
    ));
    let load = graph.add_node(IlNode::with_symbol(Opcode::Iload, i));
    let limit = graph.add_node(IlNode::constant(Opcode::Iconst, 10));
    let end = graph.add_node(IlNode::new(Opcode::BBEnd));

    graph.add_child(branch, load).unwrap();
    graph.add_child(branch, limit).unwrap();
    graph.append_treetop(start);
    graph.append_treetop(branch);
    graph.append_treetop(end);
    graph.add_block(Block {
        number: 2,
        entry: 0,
        exit: 2,
        successors: vec![2, 1],
    });
    graph
}

pub const SAMPLE_DUMP: &str = r#"{
  "method": {
    "class_name": "demo/Sample",
    "name": "answer",
    "signature": "()I",
    "return_type": "Int32",
    "hotness": "scorching"
  },
  "snapshots": [
    {
      "title": "after localCSE",
      "nodes": [
        { "opcode": "istore", "symbol": "x", "children": [1] },
        { "opcode": "iadd", "children": [2, 3] },
        { "opcode": "iconst", "value": 1 },
        { "opcode": "iconst", "value": 2 },
        { "opcode": "ireturn", "children": [5] },
        { "opcode": "iload", "symbol": "x" }
      ],
      "treetops": [0, 4]
    }
  ]
}"#;
