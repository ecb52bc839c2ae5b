//! Compilation ids and destination file names

use ilgraph_core::MethodInfo;
use std::sync::atomic::{AtomicU32, Ordering};

/// Process-wide source of unique compilation ids.
#[derive(Debug, Default)]
pub struct CompilationIds {
    next: AtomicU32,
}

impl CompilationIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: u32) -> Self {
        CompilationIds {
            next: AtomicU32::new(first),
        }
    }

    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Method signature with package separators turned into dots, so it can be
/// part of a file name.
pub fn sanitize_signature(signature: &str) -> String {
    signature.replace('/', ".")
}

/// `<prefix>-<id>[<signature>][<hotness>].<extension>`
pub fn destination_name(prefix: &str, id: u32, method: &MethodInfo, extension: &str) -> String {
    format!(
        "{}-{}[{}][{}].{}",
        prefix,
        id,
        sanitize_signature(&method.qualified_signature()),
        method.hotness.name(),
        extension
    )
}
