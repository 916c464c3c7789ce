use std::collections::HashMap;

use crate::archive::class::{ClassDescriptor, ClassRegistry, Serializer};
use crate::archive::context::{EncodingContext, escape_key};
use crate::archive::error::{ArchiveError, Result};
use crate::archive::node::{Node, Uid};
use crate::archive::value::Value;
use crate::archive::{binary, xml};

/// Fixed `$version` value of the produced envelope.
pub const ARCHIVE_VERSION: u64 = 100_000;
/// Fixed `$archiver` name of the produced envelope.
pub const ARCHIVER_NAME: &str = "NSKeyedArchiver";
/// String node stored in the reserved null sentinel slot.
pub const NULL_SENTINEL: &str = "$null";
/// Key under which the root value is stored in `$top`.
pub const ROOT_KEY: &str = "root";

const CLASS_KEY: &str = "$class";

/// Byte format selected for the final envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
	/// XML property list.
	Xml,
	/// Binary property list (`bplist00`).
	Binary,
}

/// Deduplication policy for primitive (non-object) values.
///
/// Object values always deduplicate by allocation identity regardless of
/// this option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveDedup {
	/// Equal primitive values from any call site share one object table
	/// slot.
	#[default]
	ByValue,
	/// Every primitive occurrence gets its own slot.
	Never,
}

/// Behavior switches for one archiver run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveOptions {
	/// Deduplication policy for primitive values.
	pub primitive_dedup: PrimitiveDedup,
}

/// Value-equality key for primitive deduplication.
#[derive(Debug, PartialEq, Eq, Hash)]
enum PrimitiveKey {
	Bool(bool),
	Integer(i64),
	Unsigned(u64),
	DoubleBits(u64),
	String(Box<str>),
	Raw(Vec<u8>),
}

impl PrimitiveKey {
	fn for_value(value: &Value) -> Option<Self> {
		match value {
			Value::Bool(v) => Some(Self::Bool(*v)),
			Value::Integer(v) => Some(Self::Integer(*v)),
			Value::Unsigned(v) => Some(Self::Unsigned(*v)),
			Value::Double(v) => Some(Self::DoubleBits(v.to_bits())),
			Value::String(v) => Some(Self::String(v.clone())),
			Value::Raw(v) => Some(Self::Raw(v.clone())),
			Value::Null | Value::Object(_) => None,
		}
	}
}

/// Keyed object-graph encoder.
///
/// One archiver encodes exactly one graph: construct, call
/// [`KeyedArchiver::encode_root`], then [`KeyedArchiver::finish`]. The
/// object table, reference index, and class index are owned by the run and
/// discarded with it; only the borrowed [`ClassRegistry`] is shared, and it
/// must stay read-only while any encode borrows it.
pub struct KeyedArchiver<'a> {
	registry: &'a ClassRegistry,
	options: ArchiveOptions,
	objects: Vec<Node>,
	object_uids: HashMap<usize, Uid>,
	primitive_uids: HashMap<PrimitiveKey, Uid>,
	class_uids: HashMap<Box<str>, Uid>,
	contexts: Vec<EncodingContext>,
	error: Option<ArchiveError>,
}

impl<'a> KeyedArchiver<'a> {
	/// Create an archiver with default options.
	pub fn new(registry: &'a ClassRegistry) -> Self {
		Self::with_options(registry, ArchiveOptions::default())
	}

	/// Create an archiver with explicit options.
	pub fn with_options(registry: &'a ClassRegistry, options: ArchiveOptions) -> Self {
		Self {
			registry,
			options,
			objects: vec![Node::String(NULL_SENTINEL.into())],
			object_uids: HashMap::new(),
			primitive_uids: HashMap::new(),
			class_uids: HashMap::new(),
			contexts: vec![EncodingContext::new()],
			error: None,
		}
	}

	/// Encode the whole graph reachable from `value` under the fixed root
	/// key.
	///
	/// Surfaces the first fatal error recorded during the run; recoverable
	/// conditions (missing serializers) are absorbed with a log line and do
	/// not fail the run. The error stays recorded on the archiver, so a
	/// later [`KeyedArchiver::finish`] on a failed run also fails instead of
	/// assembling a partial envelope.
	pub fn encode_root(&mut self, value: &Value) -> Result<()> {
		tracing::debug!(kind = value.kind_name(), "encode root");
		self.encode_object(value, ROOT_KEY);
		match &self.error {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}

	/// Encode `value` and store its reference in the current context under
	/// `key` (a generic key is synthesized when `key` is empty).
	pub fn encode_object(&mut self, value: &Value, key: &str) {
		let uid = self.encode_value(value);
		if self.error.is_none() {
			self.set_field(Node::Uid(uid), key, !key.is_empty());
		}
	}

	/// Encode a scalar value inline (no object table slot) under `key`.
	///
	/// Passing a container value here is a programming error in the caller
	/// and fails the run with [`ArchiveError::UnsupportedType`].
	pub fn encode_primitive(&mut self, value: &Value, key: &str) {
		if value.is_container() {
			self.fail(ArchiveError::UnsupportedType { kind: value.kind_name() });
			return;
		}
		match primitive_node(value) {
			Ok(node) => self.set_field(node, key, !key.is_empty()),
			Err(err) => self.fail(err),
		}
	}

	/// Encode each element of `values` and store an array of their
	/// references under `key`.
	pub fn encode_array(&mut self, values: &[Value], key: &str) {
		let mut refs = Vec::with_capacity(values.len());
		for value in values {
			refs.push(Node::Uid(self.encode_value(value)));
		}
		if self.error.is_none() {
			self.set_field(Node::Array(refs), key, !key.is_empty());
		}
	}

	/// Encode one value into the object table and return its uid.
	///
	/// First visits reserve the uid and a placeholder slot before any
	/// recursive descent, so re-reaching the same value from its own fields
	/// resolves to the already-assigned uid instead of re-entering encoding.
	/// Repeat visits return the assigned uid without re-encoding.
	pub fn encode_value(&mut self, value: &Value) -> Uid {
		if self.error.is_some() {
			return Uid::NULL;
		}
		if value.is_null() {
			return Uid::NULL;
		}

		if let Some(uid) = self.lookup_reference(value) {
			tracing::debug!(kind = value.kind_name(), uid = uid.value(), "already referenced");
			return uid;
		}
		let uid = self.reserve_reference(value);

		let node = if let Value::Object(object) = value {
			let descriptor = ClassDescriptor::for_object(object);
			let serializer = self.find_serializer(&descriptor);

			self.contexts.push(EncodingContext::new());
			serializer(self, &descriptor, object);

			let class_uid = self.intern_class(&descriptor);
			self.set_field(Node::Uid(class_uid), CLASS_KEY, false);

			match self.pop_context() {
				Some(ctx) => Node::Dict(ctx.into_fields()),
				None => return Uid::NULL,
			}
		} else {
			match primitive_node(value) {
				Ok(node) => node,
				Err(err) => {
					self.fail(err);
					return Uid::NULL;
				}
			}
		};

		// overwrite the placeholder reserved for this uid, exactly once
		self.objects[uid.value() as usize] = node;
		uid
	}

	/// Intern the class descriptor and return the uid of its encoded node.
	///
	/// A descriptor is encoded at most once per class name per run; repeat
	/// calls return the stored uid.
	pub fn intern_class(&mut self, descriptor: &ClassDescriptor) -> Uid {
		if let Some(uid) = self.class_uids.get(descriptor.class_name.as_ref()) {
			return *uid;
		}

		let uid = Uid::new(self.objects.len() as u64);
		self.objects.push(class_node(descriptor));
		self.class_uids.insert(descriptor.class_name.clone(), uid);
		uid
	}

	/// Insert a finished node into the current context.
	///
	/// An empty `key` synthesizes a generic key from the current context's
	/// counter. When `escape` is set, keys starting with the reserved `$`
	/// marker are stored with a doubled marker so they cannot collide with
	/// structural metadata keys.
	pub fn set_field(&mut self, node: Node, key: &str, escape: bool) {
		if self.error.is_some() {
			return;
		}
		if self.contexts.is_empty() {
			self.fail(ArchiveError::StackImbalance { depth: 0 });
			return;
		}

		if let Some(ctx) = self.contexts.last_mut() {
			let encoding_key = if key.is_empty() {
				ctx.next_generic_key()
			} else if escape {
				escape_key(key)
			} else {
				key.into()
			};
			ctx.set(encoding_key, node);
		}
	}

	/// Assemble the final envelope.
	///
	/// Requires encoding to be fully unwound (exactly the root context
	/// remains); anything else is a fatal stack imbalance.
	pub fn finish(mut self) -> Result<Node> {
		if let Some(err) = self.error.take() {
			return Err(err);
		}
		if self.contexts.len() != 1 {
			return Err(ArchiveError::StackImbalance {
				depth: self.contexts.len(),
			});
		}

		let root = self.contexts.pop().unwrap_or_default();
		Ok(Node::Dict(vec![
			("$version".into(), Node::Unsigned(ARCHIVE_VERSION)),
			("$archiver".into(), Node::String(ARCHIVER_NAME.into())),
			("$top".into(), Node::Dict(root.into_fields())),
			("$objects".into(), Node::Array(self.objects)),
		]))
	}

	fn lookup_reference(&self, value: &Value) -> Option<Uid> {
		match value {
			Value::Object(object) => self.object_uids.get(&object.identity()).copied(),
			_ => match self.options.primitive_dedup {
				PrimitiveDedup::ByValue => PrimitiveKey::for_value(value).and_then(|key| self.primitive_uids.get(&key).copied()),
				PrimitiveDedup::Never => None,
			},
		}
	}

	fn reserve_reference(&mut self, value: &Value) -> Uid {
		let uid = Uid::new(self.objects.len() as u64);
		self.objects.push(Node::Null);

		match value {
			Value::Object(object) => {
				self.object_uids.insert(object.identity(), uid);
			}
			_ => {
				if self.options.primitive_dedup == PrimitiveDedup::ByValue {
					if let Some(key) = PrimitiveKey::for_value(value) {
						self.primitive_uids.insert(key, uid);
					}
				}
			}
		}
		uid
	}

	fn find_serializer(&self, descriptor: &ClassDescriptor) -> Serializer {
		if !descriptor.class_name.is_empty() {
			if let Some(serializer) = self.registry.get_serializer(&descriptor.class_name) {
				return serializer;
			}
		}
		tracing::warn!(class = %descriptor.class_name, "no serializer registered, using default");
		self.registry.get_default_serializer()
	}

	fn pop_context(&mut self) -> Option<EncodingContext> {
		if self.contexts.len() <= 1 {
			self.fail(ArchiveError::StackImbalance {
				depth: self.contexts.len(),
			});
			return None;
		}
		self.contexts.pop()
	}

	fn fail(&mut self, err: ArchiveError) {
		// keep the first fatal error; later ones are consequences
		if self.error.is_none() {
			tracing::debug!(error = %err, "archiver run failed");
			self.error = Some(err);
		}
	}
}

/// Archive `root` with default options and return the serialized bytes.
pub fn archive_value(registry: &ClassRegistry, root: &Value, format: OutputFormat) -> Result<Vec<u8>> {
	archive_value_with_options(registry, root, format, ArchiveOptions::default())
}

/// Archive `root` with explicit options and return the serialized bytes.
pub fn archive_value_with_options(
	registry: &ClassRegistry,
	root: &Value,
	format: OutputFormat,
	options: ArchiveOptions,
) -> Result<Vec<u8>> {
	let mut archiver = KeyedArchiver::with_options(registry, options);
	archiver.encode_root(root)?;
	let envelope = archiver.finish()?;

	Ok(match format {
		OutputFormat::Xml => xml::write_xml(&envelope),
		OutputFormat::Binary => binary::write_binary(&envelope),
	})
}

fn primitive_node(value: &Value) -> Result<Node> {
	match value {
		Value::Null => Ok(Node::String(NULL_SENTINEL.into())),
		Value::Bool(v) => Ok(Node::Bool(*v)),
		Value::Integer(v) => Ok(Node::Integer(*v)),
		Value::Unsigned(v) => Ok(Node::Unsigned(*v)),
		Value::Double(v) => Ok(Node::Real(*v)),
		Value::String(v) => Ok(Node::String(v.clone())),
		Value::Raw(v) => Ok(Node::Data(v.clone())),
		Value::Object(_) => Err(ArchiveError::UnsupportedType { kind: value.kind_name() }),
	}
}

fn class_node(descriptor: &ClassDescriptor) -> Node {
	let classes = descriptor.ancestor_names.iter().map(|name| Node::String(name.clone())).collect();

	let mut pairs = vec![
		("$classname".into(), Node::String(descriptor.class_name.clone())),
		("$classes".into(), Node::Array(classes)),
	];
	if !descriptor.class_hints.is_empty() {
		let hints = descriptor.class_hints.iter().map(|name| Node::String(name.clone())).collect();
		pairs.push(("$classhints".into(), Node::Array(hints)));
	}
	Node::Dict(pairs)
}
