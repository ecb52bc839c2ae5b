//! Core data structures for the method IL

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Global index of a node. Stable for the lifetime of one IL snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Symbol reference number, resolved through the `SymbolTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef(pub u32);

/// Primitive data types carried by IL values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DataType {
    #[default]
    NoType,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Address,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::NoType => "NoType",
            DataType::Int8 => "Int8",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::Address => "Address",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operand type of a compare-and-branch opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareType {
    Address,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    UnsignedInt32,
    UnsignedInt64,
}

impl CompareType {
    pub const ALL: [CompareType; 9] = [
        CompareType::Address,
        CompareType::Int8,
        CompareType::Int16,
        CompareType::Int32,
        CompareType::Int64,
        CompareType::Float,
        CompareType::Double,
        CompareType::UnsignedInt32,
        CompareType::UnsignedInt64,
    ];
}

/// Condition tested by a compare-and-branch opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Condition {
    pub const ALL: [Condition; 6] = [
        Condition::Eq,
        Condition::Ne,
        Condition::Lt,
        Condition::Le,
        Condition::Gt,
        Condition::Ge,
    ];
}

// Indexed by [CompareType as usize][Condition as usize].
const IF_CMP_NAMES: [[&str; 6]; 9] = [
    ["ifacmpeq", "ifacmpne", "ifacmplt", "ifacmple", "ifacmpgt", "ifacmpge"],
    ["ifbcmpeq", "ifbcmpne", "ifbcmplt", "ifbcmple", "ifbcmpgt", "ifbcmpge"],
    ["ifscmpeq", "ifscmpne", "ifscmplt", "ifscmple", "ifscmpgt", "ifscmpge"],
    ["ificmpeq", "ificmpne", "ificmplt", "ificmple", "ificmpgt", "ificmpge"],
    ["iflcmpeq", "iflcmpne", "iflcmplt", "iflcmple", "iflcmpgt", "iflcmpge"],
    ["iffcmpeq", "iffcmpne", "iffcmplt", "iffcmple", "iffcmpgt", "iffcmpge"],
    ["ifdcmpeq", "ifdcmpne", "ifdcmplt", "ifdcmple", "ifdcmpgt", "ifdcmpge"],
    ["ifiucmpeq", "ifiucmpne", "ifiucmplt", "ifiucmple", "ifiucmpgt", "ifiucmpge"],
    ["iflucmpeq", "iflucmpne", "iflucmplt", "iflucmple", "iflucmpgt", "iflucmpge"],
];

/// The fixed IL opcode set understood by the exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Opcode {
    // ── Control ─────────────────────────────────────────────
    BBStart,
    BBEnd,
    Treetop,
    Goto,
    NullCheck,
    Return,
    Areturn,
    Ireturn,
    Lreturn,
    Freturn,
    Dreturn,
    IfCmp(CompareType, Condition),

    // ── Calls ───────────────────────────────────────────────
    Acall,
    Icall,
    Lcall,
    Fcall,
    Dcall,
    Call,

    // ── Memory ──────────────────────────────────────────────
    Aload,
    Bload,
    Sload,
    Iload,
    Lload,
    Fload,
    Dload,
    Astore,
    Bstore,
    Sstore,
    Istore,
    Lstore,
    Fstore,
    Dstore,

    // ── Constants ───────────────────────────────────────────
    Aconst,
    Bconst,
    Sconst,
    Iconst,
    Lconst,
    Fconst,
    Dconst,

    // ── Arithmetic ──────────────────────────────────────────
    Badd,
    Sadd,
    Iadd,
    Ladd,
    Fadd,
    Dadd,
    Isub,
    Lsub,
    Imul,
    Lmul,
    Idiv,
    Ldiv,
    Ineg,
    Lneg,
    Bshl,
    Sshl,
    Ishl,
    Lshl,
    Ishr,
    Lshr,

    // ── Conversions ─────────────────────────────────────────
    I2l,
    L2i,
}

const SIMPLE_OPCODES: &[Opcode] = &[
    Opcode::BBStart,
    Opcode::BBEnd,
    Opcode::Treetop,
    Opcode::Goto,
    Opcode::NullCheck,
    Opcode::Return,
    Opcode::Areturn,
    Opcode::Ireturn,
    Opcode::Lreturn,
    Opcode::Freturn,
    Opcode::Dreturn,
    Opcode::Acall,
    Opcode::Icall,
    Opcode::Lcall,
    Opcode::Fcall,
    Opcode::Dcall,
    Opcode::Call,
    Opcode::Aload,
    Opcode::Bload,
    Opcode::Sload,
    Opcode::Iload,
    Opcode::Lload,
    Opcode::Fload,
    Opcode::Dload,
    Opcode::Astore,
    Opcode::Bstore,
    Opcode::Sstore,
    Opcode::Istore,
    Opcode::Lstore,
    Opcode::Fstore,
    Opcode::Dstore,
    Opcode::Aconst,
    Opcode::Bconst,
    Opcode::Sconst,
    Opcode::Iconst,
    Opcode::Lconst,
    Opcode::Fconst,
    Opcode::Dconst,
    Opcode::Badd,
    Opcode::Sadd,
    Opcode::Iadd,
    Opcode::Ladd,
    Opcode::Fadd,
    Opcode::Dadd,
    Opcode::Isub,
    Opcode::Lsub,
    Opcode::Imul,
    Opcode::Lmul,
    Opcode::Idiv,
    Opcode::Ldiv,
    Opcode::Ineg,
    Opcode::Lneg,
    Opcode::Bshl,
    Opcode::Sshl,
    Opcode::Ishl,
    Opcode::Lshl,
    Opcode::Ishr,
    Opcode::Lshr,
    Opcode::I2l,
    Opcode::L2i,
];

impl Opcode {
    /// Every opcode, compare-and-branch variants included.
    pub fn all() -> impl Iterator<Item = Opcode> {
        let compares = CompareType::ALL.into_iter().flat_map(|ty| {
            Condition::ALL
                .into_iter()
                .map(move |cond| Opcode::IfCmp(ty, cond))
        });
        SIMPLE_OPCODES.iter().copied().chain(compares)
    }

    /// Display name, as printed in compiler logs.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::BBStart => "BBStart",
            Opcode::BBEnd => "BBEnd",
            Opcode::Treetop => "treetop",
            Opcode::Goto => "goto",
            Opcode::NullCheck => "NULLCHK",
            Opcode::Return => "Return",
            Opcode::Areturn => "areturn",
            Opcode::Ireturn => "ireturn",
            Opcode::Lreturn => "lreturn",
            Opcode::Freturn => "freturn",
            Opcode::Dreturn => "dreturn",
            Opcode::IfCmp(ty, cond) => IF_CMP_NAMES[ty as usize][cond as usize],
            Opcode::Acall => "acall",
            Opcode::Icall => "icall",
            Opcode::Lcall => "lcall",
            Opcode::Fcall => "fcall",
            Opcode::Dcall => "dcall",
            Opcode::Call => "call",
            Opcode::Aload => "aload",
            Opcode::Bload => "bload",
            Opcode::Sload => "sload",
            Opcode::Iload => "iload",
            Opcode::Lload => "lload",
            Opcode::Fload => "fload",
            Opcode::Dload => "dload",
            Opcode::Astore => "astore",
            Opcode::Bstore => "bstore",
            Opcode::Sstore => "sstore",
            Opcode::Istore => "istore",
            Opcode::Lstore => "lstore",
            Opcode::Fstore => "fstore",
            Opcode::Dstore => "dstore",
            Opcode::Aconst => "aconst",
            Opcode::Bconst => "bconst",
            Opcode::Sconst => "sconst",
            Opcode::Iconst => "iconst",
            Opcode::Lconst => "lconst",
            Opcode::Fconst => "fconst",
            Opcode::Dconst => "dconst",
            Opcode::Badd => "badd",
            Opcode::Sadd => "sadd",
            Opcode::Iadd => "iadd",
            Opcode::Ladd => "ladd",
            Opcode::Fadd => "fadd",
            Opcode::Dadd => "dadd",
            Opcode::Isub => "isub",
            Opcode::Lsub => "lsub",
            Opcode::Imul => "imul",
            Opcode::Lmul => "lmul",
            Opcode::Idiv => "idiv",
            Opcode::Ldiv => "ldiv",
            Opcode::Ineg => "ineg",
            Opcode::Lneg => "lneg",
            Opcode::Bshl => "bshl",
            Opcode::Sshl => "sshl",
            Opcode::Ishl => "ishl",
            Opcode::Lshl => "lshl",
            Opcode::Ishr => "ishr",
            Opcode::Lshr => "lshr",
            Opcode::I2l => "i2l",
            Opcode::L2i => "l2i",
        }
    }

    /// Type of the value this opcode produces (or stores, for stores).
    pub fn data_type(self) -> DataType {
        use Opcode::*;
        match self {
            Areturn | Acall | Aload | Astore | Aconst => DataType::Address,
            Bload | Bstore | Bconst | Badd | Bshl => DataType::Int8,
            Sload | Sstore | Sconst | Sadd | Sshl => DataType::Int16,
            Ireturn | Icall | Iload | Istore | Iconst | Iadd | Isub | Imul | Idiv | Ineg
            | Ishl | Ishr | L2i => DataType::Int32,
            Lreturn | Lcall | Lload | Lstore | Lconst | Ladd | Lsub | Lmul | Ldiv | Lneg
            | Lshl | Lshr | I2l => DataType::Int64,
            Freturn | Fcall | Fload | Fstore | Fconst | Fadd => DataType::Float,
            Dreturn | Dcall | Dload | Dstore | Dconst | Dadd => DataType::Double,
            BBStart | BBEnd | Treetop | Goto | NullCheck | Return | IfCmp(..) | Call => {
                DataType::NoType
            }
        }
    }

    /// Whether this opcode may root a statement.
    pub fn is_treetop(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            BBStart
                | BBEnd
                | Treetop
                | Goto
                | NullCheck
                | Return
                | Areturn
                | Ireturn
                | Lreturn
                | Freturn
                | Dreturn
                | IfCmp(..)
                | Call
                | Astore
                | Bstore
                | Sstore
                | Istore
                | Lstore
                | Fstore
                | Dstore
        )
    }

    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::Goto | Opcode::IfCmp(..))
    }

    pub fn is_call(self) -> bool {
        use Opcode::*;
        matches!(self, Acall | Icall | Lcall | Fcall | Dcall | Call)
    }

    /// Loads, stores and calls name a symbol.
    pub fn has_symbol_reference(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Acall | Icall | Lcall | Fcall | Dcall | Call | Aload | Bload | Sload | Iload | Lload
                | Fload | Dload | Astore | Bstore | Sstore | Istore | Lstore | Fstore | Dstore
        )
    }

    pub fn is_load_const(self) -> bool {
        use Opcode::*;
        matches!(self, Aconst | Bconst | Sconst | Iconst | Lconst | Fconst | Dconst)
    }

    /// Integral constants, whose literal value is part of the node.
    pub fn has_literal(self) -> bool {
        use Opcode::*;
        matches!(self, Bconst | Sconst | Iconst | Lconst)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown opcode '{0}'")]
pub struct ParseOpcodeError(pub String);

impl FromStr for Opcode {
    type Err = ParseOpcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::all()
            .find(|op| op.name() == s)
            .ok_or_else(|| ParseOpcodeError(s.to_string()))
    }
}

impl TryFrom<String> for Opcode {
    type Error = ParseOpcodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Opcode> for String {
    fn from(op: Opcode) -> Self {
        op.name().to_string()
    }
}

/// A single IL node.
#[derive(Debug, Clone, PartialEq)]
pub struct IlNode {
    pub opcode: Opcode,
    pub symbol: Option<SymbolRef>,
    /// Integral literal carried by constant opcodes.
    pub constant: Option<i64>,
    /// Destination statement of a branch.
    pub branch_target: Option<NodeId>,
}

impl IlNode {
    pub fn new(opcode: Opcode) -> Self {
        IlNode {
            opcode,
            symbol: None,
            constant: None,
            branch_target: None,
        }
    }

    pub fn constant(opcode: Opcode, value: i64) -> Self {
        IlNode {
            constant: Some(value),
            ..IlNode::new(opcode)
        }
    }

    pub fn with_symbol(opcode: Opcode, symbol: SymbolRef) -> Self {
        IlNode {
            symbol: Some(symbol),
            ..IlNode::new(opcode)
        }
    }

    pub fn branch(opcode: Opcode, target: NodeId) -> Self {
        IlNode {
            branch_target: Some(target),
            ..IlNode::new(opcode)
        }
    }
}

/// Ordered data edge from a parent to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEdge {
    pub slot: u16,
}

/// Optimization level the method is being compiled at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Hotness {
    NoOpt,
    Cold,
    #[default]
    Warm,
    Hot,
    VeryHot,
    Scorching,
    ReducedWarm,
    Unknown,
}

impl Hotness {
    pub fn name(self) -> &'static str {
        match self {
            Hotness::NoOpt => "noOpt",
            Hotness::Cold => "cold",
            Hotness::Warm => "warm",
            Hotness::Hot => "hot",
            Hotness::VeryHot => "veryHot",
            Hotness::Scorching => "scorching",
            Hotness::ReducedWarm => "reducedWarm",
            Hotness::Unknown => "unknown",
        }
    }
}

/// Descriptor of the method being compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Declaring class, in internal form (`java/lang/String`).
    pub class_name: String,
    pub name: String,
    /// Raw descriptor, e.g. `(II)I`.
    pub signature: String,
    #[serde(default)]
    pub parameter_types: Vec<DataType>,
    #[serde(default)]
    pub return_type: DataType,
    #[serde(default)]
    pub flags: i32,
    #[serde(default)]
    pub bytecode: Vec<u8>,
    #[serde(default)]
    pub hotness: Hotness,
}

impl MethodInfo {
    /// `class.name(descriptor)`, the key compilers print methods by.
    pub fn qualified_signature(&self) -> String {
        format!("{}.{}{}", self.class_name, self.name, self.signature)
    }
}

/// A basic block, as a range of statement positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u32,
    /// Position of the block's BBStart statement.
    pub entry: usize,
    /// Position of the block's BBEnd statement.
    pub exit: usize,
    #[serde(default)]
    pub successors: Vec<u32>,
}
