//! Test utilities for ilgraph-writer: sample graphs, failing sinks and a
//! decoder for the binary stream.

use crate::sink::{DataSink, SinkProvider};
use crate::wire::*;
use ilgraph_core::*;
use std::collections::HashMap;
use std::io;

pub fn sample_method() -> MethodInfo {
    MethodInfo {
        class_name: "demo/Sample".to_string(),
        name: "answer".to_string(),
        signature: "(I)I".to_string(),
        parameter_types: vec![DataType::Int32],
        return_type: DataType::Int32,
        flags: 0x0009,
        bytecode: vec![0x1a, 0x04, 0x60, 0xac],
        hotness: Hotness::Hot,
    }
}

/// `x = 1 + 2`, numbered in pre-order.
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

/// BBStart; `if (i < 10) goto BBStart`; BBEnd, as block 2 falling through
/// to block 1.
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
        successors: vec![3, 1],
    });
    graph
}

/// Sink that accepts at most `limit` bytes per write.
pub struct ShortSink {
    pub limit: usize,
}

impl DataSink for ShortSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize> {
        Ok(bytes.len().min(self.limit))
    }
}

/// Provider whose destinations can never be opened.
pub struct UnopenableSinks;

impl SinkProvider for UnopenableSinks {
    fn open(&self, _name: &str) -> io::Result<Box<dyn DataSink>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}

/// Provider handing out `ShortSink`s.
pub struct ShortSinks {
    pub limit: usize,
}

impl SinkProvider for ShortSinks {
    fn open(&self, _name: &str) -> io::Result<Box<dyn DataSink>> {
        Ok(Box::new(ShortSink { limit: self.limit }))
    }
}

// ── Stream decoding ─────────────────────────────────────────

/// A pool operation seen while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolEvent {
    pub tag: u8,
    pub handle: u16,
    pub defined: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMethod {
    pub class_name: String,
    pub name: String,
    pub parameter_types: Vec<String>,
    pub return_type: String,
    pub flags: i32,
    pub bytecode: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNodeClass {
    pub name: String,
    pub template: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoolValue {
    String(String),
    Class { name: String, enumerators: Option<Vec<String>> },
    EnumValue { class: String, ordinal: u32 },
    Method(DecodedMethod),
    Signature { parameters: Vec<String>, returns: String },
    NodeClass(DecodedNodeClass),
    Null,
}

impl PoolValue {
    pub fn as_str(&self) -> &str {
        match self {
            PoolValue::String(s) => s,
            PoolValue::Class { name, .. } => name,
            other => panic!("expected a string entry, found {:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub index: u32,
    pub class: DecodedNodeClass,
    pub has_predecessor: bool,
    pub properties: Vec<(String, String)>,
    pub edges: Vec<u32>,
}

impl DecodedRecord {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGraph {
    pub id: u32,
    pub title: String,
    pub properties: Vec<(String, String)>,
    pub node_count: u32,
    pub records: Vec<DecodedRecord>,
    pub block_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStream {
    pub major: u8,
    pub minor: u8,
    pub group_name: String,
    pub short_name: String,
    pub method: DecodedMethod,
    pub group_properties: Vec<(String, String)>,
    pub graphs: Vec<DecodedGraph>,
    pub closed: bool,
    pub events: Vec<PoolEvent>,
}

/// Reads back what the pool protocol and session write. Panics on anything
/// malformed.
pub struct StreamReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    pool: HashMap<u16, PoolValue>,
    pub events: Vec<PoolEvent>,
}

impl<'a> StreamReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        StreamReader {
            bytes,
            pos: 0,
            pool: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    pub fn u8(&mut self) -> u8 {
        let byte = self.bytes[self.pos];
        self.pos += 1;
        byte
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_be_bytes([self.u8(), self.u8()])
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_be_bytes([self.u8(), self.u8(), self.u8(), self.u8()])
    }

    pub fn i32(&mut self) -> i32 {
        self.u32() as i32
    }

    pub fn raw(&mut self, len: usize) -> Vec<u8> {
        let bytes = self.bytes[self.pos..self.pos + len].to_vec();
        self.pos += len;
        bytes
    }

    pub fn string(&mut self) -> String {
        let len = self.u32() as usize;
        String::from_utf8(self.raw(len)).unwrap()
    }

    pub fn pool_object(&mut self) -> PoolValue {
        let tag = self.u8();
        match tag {
            POOL_NULL => PoolValue::Null,
            POOL_NEW => {
                let handle = self.u16();
                let kind = self.u8();
                self.events.push(PoolEvent { tag: kind, handle, defined: true });
                let value = self.pool_payload(kind);
                assert!(
                    self.pool.insert(handle, value.clone()).is_none(),
                    "handle {} defined twice",
                    handle
                );
                value
            }
            kind => {
                let handle = self.u16();
                self.events.push(PoolEvent { tag: kind, handle, defined: false });
                self.pool
                    .get(&handle)
                    .cloned()
                    .unwrap_or_else(|| panic!("reference to undefined handle {}", handle))
            }
        }
    }

    fn pool_payload(&mut self, kind: u8) -> PoolValue {
        match kind {
            POOL_STRING => PoolValue::String(self.string()),
            POOL_CLASS => {
                let name = self.string();
                let enumerators = match self.u8() {
                    KLASS => None,
                    ENUM_KLASS => {
                        let count = self.u32();
                        Some(
                            (0..count)
                                .map(|_| self.pool_object().as_str().to_string())
                                .collect(),
                        )
                    }
                    other => panic!("bad class discriminator {}", other),
                };
                PoolValue::Class { name, enumerators }
            }
            POOL_ENUM => {
                let class = self.pool_object().as_str().to_string();
                let ordinal = self.u32();
                PoolValue::EnumValue { class, ordinal }
            }
            POOL_METHOD => {
                let class_name = self.pool_object().as_str().to_string();
                let name = self.pool_object().as_str().to_string();
                let PoolValue::Signature { parameters, returns } = self.pool_object() else {
                    panic!("method without signature");
                };
                let flags = self.i32();
                let len = self.u32() as usize;
                PoolValue::Method(DecodedMethod {
                    class_name,
                    name,
                    parameter_types: parameters,
                    return_type: returns,
                    flags,
                    bytecode: self.raw(len),
                })
            }
            POOL_SIGNATURE => {
                let count = self.u16();
                let parameters = (0..count)
                    .map(|_| self.pool_object().as_str().to_string())
                    .collect();
                let returns = self.pool_object().as_str().to_string();
                PoolValue::Signature { parameters, returns }
            }
            POOL_NODE_CLASS => {
                let name = self.pool_object().as_str().to_string();
                let template = self.string();
                let input_count = self.u16();
                let mut inputs = Vec::new();
                for _ in 0..input_count {
                    assert_eq!(self.u8(), 0, "input edges are direct");
                    inputs.push(self.pool_object().as_str().to_string());
                    let kind = self.pool_object();
                    assert!(matches!(kind, PoolValue::EnumValue { .. }));
                }
                let output_count = self.u16();
                let mut outputs = Vec::new();
                for _ in 0..output_count {
                    assert_eq!(self.u8(), 0, "output edges are direct");
                    outputs.push(self.pool_object().as_str().to_string());
                }
                PoolValue::NodeClass(DecodedNodeClass {
                    name,
                    template,
                    inputs,
                    outputs,
                })
            }
            other => panic!("unknown pool kind {}", other),
        }
    }

    pub fn properties(&mut self) -> Vec<(String, String)> {
        let count = self.u16();
        (0..count)
            .map(|_| {
                let key = self.pool_object().as_str().to_string();
                assert_eq!(self.u8(), PROPERTY_POOL);
                let value = self.pool_object().as_str().to_string();
                (key, value)
            })
            .collect()
    }

    /// One graph, starting at its begin-graph marker.
    pub fn graph(&mut self) -> DecodedGraph {
        assert_eq!(self.u8(), BEGIN_GRAPH);
        let id = self.u32();
        let title = self.string();
        assert_eq!(self.u32(), 0, "argument count");
        let properties = self.properties();
        let node_count = self.u32();

        let mut records = Vec::new();
        for _ in 0..node_count {
            let index = self.u32();
            let PoolValue::NodeClass(class) = self.pool_object() else {
                panic!("record {} has no node class", index);
            };
            let has_predecessor = self.u8() == 1;
            let properties = self.properties();
            let edge_count = class.inputs.len() + class.outputs.len();
            let edges = (0..edge_count).map(|_| self.u32()).collect();
            records.push(DecodedRecord {
                index,
                class,
                has_predecessor,
                properties,
                edges,
            });
        }
        let block_count = self.u32();

        DecodedGraph {
            id,
            title,
            properties,
            node_count,
            records,
            block_count,
        }
    }
}

/// Decode a complete session stream.
pub fn decode_stream(bytes: &[u8]) -> DecodedStream {
    let mut reader = StreamReader::new(bytes);
    assert_eq!(reader.raw(4), MAGIC.to_vec());
    let major = reader.u8();
    let minor = reader.u8();
    assert_eq!(reader.u8(), BEGIN_GROUP);

    let group_name = reader.pool_object().as_str().to_string();
    let short_name = reader.pool_object().as_str().to_string();
    let PoolValue::Method(method) = reader.pool_object() else {
        panic!("group without method");
    };
    assert_eq!(reader.u32(), 0);
    let group_properties = reader.properties();

    let mut graphs = Vec::new();
    let mut closed = false;
    while !reader.at_end() {
        if reader.bytes[reader.pos] == CLOSE_GROUP {
            reader.u8();
            closed = true;
            break;
        }
        graphs.push(reader.graph());
    }
    assert!(reader.at_end(), "trailing bytes after close-group");

    DecodedStream {
        major,
        minor,
        group_name,
        short_name,
        method,
        group_properties,
        graphs,
        closed,
        events: reader.events,
    }
}
