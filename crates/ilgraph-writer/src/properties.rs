//! Node properties and display templates, derived from the opcode family

use crate::error::{ExportError, Result};
use ilgraph_core::{Condition, IlGraph, IlNode, NodeId, Opcode};

/// Rendered in place of a symbol the table cannot resolve.
pub const UNRESOLVED_SYMBOL: &str = "<unresolved>";

/// One key/value pair attached to a node or graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Property {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Opcode groups that share a property layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyFamily {
    BlockStart,
    BlockEnd,
    Return,
    Call,
    Store,
    Load,
    Constant,
    Branch,
    Fixed,
    Floating,
}

impl PropertyFamily {
    pub fn of(opcode: Opcode) -> Self {
        use Opcode::*;
        match opcode {
            BBStart => PropertyFamily::BlockStart,
            BBEnd => PropertyFamily::BlockEnd,
            Return | Areturn | Ireturn | Freturn | Lreturn | Dreturn => PropertyFamily::Return,
            Acall | Icall | Lcall | Dcall | Fcall | Call => PropertyFamily::Call,
            Astore | Istore | Fstore | Lstore | Dstore => PropertyFamily::Store,
            Aload | Iload | Fload | Lload | Dload => PropertyFamily::Load,
            Iconst | Lconst | Sconst | Bconst => PropertyFamily::Constant,
            op if op.is_branch() => PropertyFamily::Branch,
            op if op.is_treetop() => PropertyFamily::Fixed,
            _ => PropertyFamily::Floating,
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            PropertyFamily::BlockStart => "begin",
            PropertyFamily::BlockEnd => "end",
            PropertyFamily::Return => "controlSink",
            PropertyFamily::Store | PropertyFamily::Fixed => "fixed",
            PropertyFamily::Branch => "controlSplit",
            PropertyFamily::Call
            | PropertyFamily::Load
            | PropertyFamily::Constant
            | PropertyFamily::Floating => "floating",
        }
    }
}

/// Properties of one node: its category, plus the symbol name for calls,
/// loads and stores, or the literal and its type for constants.
pub fn node_properties(graph: &IlGraph, id: NodeId) -> Result<Vec<Property>> {
    let Some(node) = graph.node(id) else {
        return Ok(Vec::new());
    };
    let family = PropertyFamily::of(node.opcode);
    let mut properties = vec![Property::new("category", family.category())];

    let symbol = || graph.symbol_name(id).unwrap_or(UNRESOLVED_SYMBOL);
    match family {
        PropertyFamily::Call => properties.push(Property::new("target", symbol())),
        PropertyFamily::Store | PropertyFamily::Load => {
            properties.push(Property::new("destination", symbol()))
        }
        PropertyFamily::Constant => {
            let value = literal(id, node)?;
            properties.push(Property::new("rawvalue", value.to_string()));
            properties.push(Property::new("datatype", node.opcode.data_type().name()));
        }
        _ => {}
    }
    Ok(properties)
}

/// Literal of an integral constant node.
pub(crate) fn literal(id: NodeId, node: &IlNode) -> Result<i64> {
    node.constant.ok_or_else(|| {
        ExportError::Precondition(format!("{} node {} has no value", node.opcode, id))
    })
}

/// Display template for a node class. `{p#key}` placeholders name node
/// properties.
pub fn name_template(opcode: Opcode) -> &'static str {
    use Opcode::*;
    match opcode {
        Iadd | Dadd | Ladd | Sadd | Badd => "+",
        Ishl | Lshl | Sshl | Bshl => "<<",
        IfCmp(_, condition) => match condition {
            Condition::Eq => "If ==",
            Condition::Ne => "If !=",
            Condition::Lt => "If <",
            Condition::Le => "If <=",
            Condition::Gt => "If >",
            Condition::Ge => "If >=",
        },
        Acall | Icall | Lcall | Dcall | Fcall | Call => "Call {p#target}",
        Return | Areturn | Ireturn | Freturn | Lreturn | Dreturn => "Return",
        Astore | Istore | Fstore | Lstore | Dstore => "Store {p#destination}",
        Aload | Iload | Fload | Lload | Dload => "Load {p#destination}",
        Iconst | Lconst | Bconst | Sconst => "C({p#rawvalue}) {p#datatype}",
        other => other.name(),
    }
}
