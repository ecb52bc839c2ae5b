//! Constants of the BIGV binary graph format.

/// File magic.
pub const MAGIC: [u8; 4] = *b"BIGV";
pub const MAJOR_VERSION: u8 = 7;
pub const MINOR_VERSION: u8 = 0;

// ── Stream structure ────────────────────────────────────────
pub const BEGIN_GROUP: u8 = 0x00;
pub const BEGIN_GRAPH: u8 = 0x01;
pub const CLOSE_GROUP: u8 = 0x02;

/// Precedes each property value.
pub const PROPERTY_POOL: u8 = 0x00;

// ── Pool tags ───────────────────────────────────────────────
pub const POOL_NEW: u8 = 0x00;
pub const POOL_STRING: u8 = 0x01;
pub const POOL_ENUM: u8 = 0x02;
pub const POOL_CLASS: u8 = 0x03;
pub const POOL_METHOD: u8 = 0x04;
pub const POOL_NULL: u8 = 0x05;
pub const POOL_NODE_CLASS: u8 = 0x06;
// 0x07 is reserved by the format.
pub const POOL_SIGNATURE: u8 = 0x08;

// ── Class discriminators ────────────────────────────────────
pub const KLASS: u8 = 0x00;
pub const ENUM_KLASS: u8 = 0x01;
