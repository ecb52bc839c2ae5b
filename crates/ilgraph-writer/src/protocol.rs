//! Define-or-reference pool protocol
//!
//! Every metadata entry (strings, classes, enum values, methods, signatures,
//! node classes) is written in full the first time it appears in a session,
//! as `NEW handle tag payload`, and afterwards only as `tag handle`. All
//! pools share one handle counter, so handles form a single increasing
//! sequence per session and the stream can be decoded without a schema.

use crate::encoder::ScalarEncoder;
use crate::error::{Result, count_u16, count_u32};
use crate::pool::{Handle, HandleCounter, IdentityPool};
use crate::properties::Property;
use crate::wire::*;
use ilgraph_core::MethodInfo;

/// An enum class: name plus its enumerator names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumClass<'a> {
    pub name: &'a str,
    pub values: &'a [&'a str],
}

/// Enum class describing the kind of a node input edge.
pub const INPUT_EDGE_TYPE: EnumClass<'static> = EnumClass {
    name: "InputEdgeType",
    values: &["values"],
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEdgeInfo {
    pub indirect: bool,
    pub name: String,
    /// Ordinal in `INPUT_EDGE_TYPE`.
    pub kind: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEdgeInfo {
    pub indirect: bool,
    pub name: String,
}

/// Everything needed to define a node class.
#[derive(Debug, Clone)]
pub struct NodeClassShape<'a> {
    /// Opcode display name.
    pub name: &'a str,
    pub template: &'a str,
    pub inputs: Vec<InputEdgeInfo>,
    pub outputs: Vec<OutputEdgeInfo>,
}

impl NodeClassShape<'_> {
    pub fn key(&self) -> NodeClassKey {
        NodeClassKey {
            name: self.name.to_string(),
            inputs: self.inputs.len(),
            outputs: self.outputs.len(),
        }
    }
}

/// Node classes are identified by name and edge arity only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeClassKey {
    pub name: String,
    pub inputs: usize,
    pub outputs: usize,
}

/// Session-wide pools layered over the scalar encoder.
#[derive(Debug)]
pub struct PoolProtocol {
    encoder: ScalarEncoder,
    counter: HandleCounter,
    strings: IdentityPool<String>,
    // Plain and enum classes share one key space.
    classes: IdentityPool<String>,
    enum_values: IdentityPool<(String, u32)>,
    methods: IdentityPool<String>,
    signatures: IdentityPool<String>,
    node_classes: IdentityPool<NodeClassKey>,
}

impl PoolProtocol {
    pub fn new(encoder: ScalarEncoder) -> Self {
        PoolProtocol {
            encoder,
            counter: HandleCounter::new(),
            strings: IdentityPool::new(),
            classes: IdentityPool::new(),
            enum_values: IdentityPool::new(),
            methods: IdentityPool::new(),
            signatures: IdentityPool::new(),
            node_classes: IdentityPool::new(),
        }
    }

    pub fn encoder(&mut self) -> &mut ScalarEncoder {
        &mut self.encoder
    }

    pub fn handles_issued(&self) -> u32 {
        self.counter.issued()
    }

    pub fn write_string(&mut self, value: &str) -> Result<Handle> {
        if let Some(handle) = self.strings.lookup(value) {
            return self.write_reference(POOL_STRING, handle);
        }
        let handle = self.begin_definition(POOL_STRING)?;
        self.encoder.write_length_prefixed(value.as_bytes())?;
        Ok(self.strings.insert(value.to_string(), handle))
    }

    pub fn write_class(&mut self, name: &str) -> Result<Handle> {
        if let Some(handle) = self.classes.lookup(name) {
            return self.write_reference(POOL_CLASS, handle);
        }
        let handle = self.begin_definition(POOL_CLASS)?;
        self.encoder.write_length_prefixed(name.as_bytes())?;
        self.encoder.write_byte(KLASS)?;
        Ok(self.classes.insert(name.to_string(), handle))
    }

    pub fn write_enum_class(&mut self, class: EnumClass<'_>) -> Result<Handle> {
        if let Some(handle) = self.classes.lookup(class.name) {
            return self.write_reference(POOL_CLASS, handle);
        }
        let handle = self.begin_definition(POOL_CLASS)?;
        self.encoder.write_length_prefixed(class.name.as_bytes())?;
        self.encoder.write_byte(ENUM_KLASS)?;
        self.encoder
            .write_u32(count_u32("enumerator", class.values.len())?)?;
        for value in class.values {
            self.write_string(value)?;
        }
        Ok(self.classes.insert(class.name.to_string(), handle))
    }

    pub fn write_enum_value(&mut self, class: EnumClass<'_>, ordinal: u32) -> Result<Handle> {
        let key = (class.name.to_string(), ordinal);
        if let Some(handle) = self.enum_values.lookup(&key) {
            return self.write_reference(POOL_ENUM, handle);
        }
        let handle = self.begin_definition(POOL_ENUM)?;
        self.write_enum_class(class)?;
        self.encoder.write_u32(ordinal)?;
        Ok(self.enum_values.insert(key, handle))
    }

    /// Parameter and return type names of `method`, keyed by its raw
    /// signature string.
    pub fn write_signature(&mut self, method: &MethodInfo) -> Result<Handle> {
        if let Some(handle) = self.signatures.lookup(method.signature.as_str()) {
            return self.write_reference(POOL_SIGNATURE, handle);
        }
        let handle = self.begin_definition(POOL_SIGNATURE)?;
        self.encoder
            .write_u16(count_u16("parameter", method.parameter_types.len())?)?;
        for ty in &method.parameter_types {
            self.write_string(ty.name())?;
        }
        self.write_string(method.return_type.name())?;
        Ok(self.signatures.insert(method.signature.clone(), handle))
    }

    /// Keyed by the qualified signature. The payload carries the declaring
    /// class, name, signature, flags and the bytecode verbatim.
    pub fn write_method(&mut self, method: &MethodInfo) -> Result<Handle> {
        let key = method.qualified_signature();
        if let Some(handle) = self.methods.lookup(&key) {
            return self.write_reference(POOL_METHOD, handle);
        }
        let handle = self.begin_definition(POOL_METHOD)?;
        self.write_class(&method.class_name)?;
        self.write_string(&method.name)?;
        self.write_signature(method)?;
        self.encoder.write_i32(method.flags)?;
        self.encoder
            .write_u32(count_u32("bytecode length", method.bytecode.len())?)?;
        self.encoder.write_raw(&method.bytecode)?;
        Ok(self.methods.insert(key, handle))
    }

    pub fn write_node_class(&mut self, shape: &NodeClassShape<'_>) -> Result<Handle> {
        let key = shape.key();
        if let Some(handle) = self.node_classes.lookup(&key) {
            return self.write_reference(POOL_NODE_CLASS, handle);
        }
        let handle = self.begin_definition(POOL_NODE_CLASS)?;
        self.write_class(shape.name)?;
        self.encoder.write_length_prefixed(shape.template.as_bytes())?;

        self.encoder
            .write_u16(count_u16("input edge", shape.inputs.len())?)?;
        for edge in &shape.inputs {
            self.encoder.write_byte(u8::from(edge.indirect))?;
            self.write_string(&edge.name)?;
            self.write_enum_value(INPUT_EDGE_TYPE, edge.kind)?;
        }

        self.encoder
            .write_u16(count_u16("output edge", shape.outputs.len())?)?;
        for edge in &shape.outputs {
            self.encoder.write_byte(u8::from(edge.indirect))?;
            self.write_string(&edge.name)?;
        }

        tracing::trace!(
            "Defined node class {} ({} in, {} out) as #{}",
            shape.name,
            shape.inputs.len(),
            shape.outputs.len(),
            handle
        );
        Ok(self.node_classes.insert(key, handle))
    }

    /// The bare null tag. Null carries no handle.
    pub fn write_null(&mut self) -> Result<()> {
        self.encoder.write_byte(POOL_NULL)
    }

    /// 2-byte count, then per property: key string, property tag, value
    /// string.
    pub fn write_properties(&mut self, properties: &[Property]) -> Result<()> {
        self.encoder
            .write_u16(count_u16("property", properties.len())?)?;
        for property in properties {
            self.write_string(&property.key)?;
            self.encoder.write_byte(PROPERTY_POOL)?;
            self.write_string(&property.value)?;
        }
        Ok(())
    }

    fn write_reference(&mut self, tag: u8, handle: Handle) -> Result<Handle> {
        self.encoder.write_byte(tag)?;
        self.encoder.write_u16(handle)?;
        Ok(handle)
    }

    fn begin_definition(&mut self, tag: u8) -> Result<Handle> {
        let handle = self.counter.allocate()?;
        self.encoder.write_byte(POOL_NEW)?;
        self.encoder.write_u16(handle)?;
        self.encoder.write_byte(tag)?;
        Ok(handle)
    }
}
