//! ilgraph writer: BIGV binary and XML exporters for IL snapshots

pub mod config;
pub mod encoder;
pub mod error;
pub mod exporter;
pub mod naming;
pub mod pool;
pub mod properties;
pub mod protocol;
pub mod serializer;
pub mod session;
pub mod sink;
pub mod wire;
pub mod xml;


#[cfg(test)]
pub mod test_utils;

pub use config::{ConfigError, ExportConfig, ExportFormat};
pub use encoder::{DEFAULT_FLUSH_THRESHOLD, ScalarEncoder};
pub use error::{ExportError, Result};
pub use exporter::{ExporterFactory, GraphExporter};
pub use naming::{CompilationIds, destination_name, sanitize_signature};
pub use pool::{Handle, HandleCounter, IdentityPool};
pub use properties::{Property, PropertyFamily, name_template, node_properties};
pub use protocol::{EnumClass, InputEdgeInfo, NodeClassKey, NodeClassShape, OutputEdgeInfo, PoolProtocol};
pub use serializer::GraphSerializer;
pub use session::BinaryGraphWriter;
pub use sink::{DataSink, DirectorySinks, FileSink, MemorySink, MemorySinks, NullSink, NullSinks, SinkProvider};
pub use xml::XmlGraphWriter;
