mod binary;
mod class;
mod collections;
mod context;
mod encoder;
mod error;
mod node;
mod value;
mod xml;

/// Binary property list writer.
pub use binary::write_binary;
/// Class descriptor, serializer contract, and registry.
pub use class::{ClassDescriptor, ClassRegistry, Serializer};
/// Built-in generic container classes and their serializers.
pub use collections::{ArrayObject, DictObject, register_builtin_classes, serialize_array, serialize_dictionary};
/// Keyed archiver entry points, options, and envelope constants.
pub use encoder::{
	ARCHIVE_VERSION, ARCHIVER_NAME, ArchiveOptions, KeyedArchiver, NULL_SENTINEL, OutputFormat, PrimitiveDedup, ROOT_KEY,
	archive_value, archive_value_with_options,
};
/// Error and result aliases.
pub use error::{ArchiveError, Result};
/// Output tree node and object table reference types.
pub use node::{Node, Uid};
/// Input value model and container object contract.
pub use value::{ArchiveObject, ObjectHandle, Value};
/// XML property list writer.
pub use xml::write_xml;
