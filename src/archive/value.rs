use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// One encodable datum in the input object graph.
///
/// Every variant except [`Value::Object`] is a leaf primitive. `Object` is
/// the only variant that recurses: encoding it expands the object's named
/// fields through its registered class serializer.
#[derive(Debug, Clone)]
pub enum Value {
	/// The shared null sentinel.
	Null,
	/// Boolean scalar.
	Bool(bool),
	/// 64-bit signed integer scalar.
	Integer(i64),
	/// 64-bit unsigned integer scalar.
	Unsigned(u64),
	/// 64-bit float scalar.
	Double(f64),
	/// Owned UTF-8 text.
	String(Box<str>),
	/// Owned raw byte buffer.
	Raw(Vec<u8>),
	/// Class-tagged container requiring recursive field expansion.
	Object(ObjectHandle),
}

impl Value {
	/// Wrap a shared object as a container value.
	pub fn object<T: ArchiveObject>(object: Rc<T>) -> Self {
		Self::Object(ObjectHandle::new(object))
	}

	/// Wrap owned text as a string value.
	pub fn string(text: impl Into<Box<str>>) -> Self {
		Self::String(text.into())
	}

	/// Return whether this value requires recursive field expansion.
	pub fn is_container(&self) -> bool {
		matches!(self, Self::Object(_))
	}

	/// Return whether this value is the null sentinel.
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Logical kind name used in diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Integer(_) => "integer",
			Self::Unsigned(_) => "unsigned",
			Self::Double(_) => "double",
			Self::String(_) => "string",
			Self::Raw(_) => "raw",
			Self::Object(_) => "object",
		}
	}
}

/// Capability contract for class-tagged container objects.
///
/// Implementors expose class identity for `$class` metadata and `Any`-based
/// downcasting so a registered serializer can reach the concrete type.
pub trait ArchiveObject: Any {
	/// Class name recorded in the interned class descriptor.
	fn class_name(&self) -> &str;

	/// Ordered ancestor class names, most derived first.
	fn ancestor_class_names(&self) -> Vec<Box<str>>;

	/// Downcast access for serializers.
	fn as_any(&self) -> &dyn Any;
}

/// Shared-ownership handle to a container object.
///
/// Cloning the handle preserves identity: clones compare equal for
/// deduplication purposes, while separately allocated objects are always
/// distinct even when structurally equal.
#[derive(Clone)]
pub struct ObjectHandle {
	object: Rc<dyn ArchiveObject>,
}

impl ObjectHandle {
	/// Wrap a shared object.
	pub fn new<T: ArchiveObject>(object: Rc<T>) -> Self {
		Self { object }
	}

	/// Stable identity key for this allocation.
	pub fn identity(&self) -> usize {
		Rc::as_ptr(&self.object) as *const () as usize
	}

	/// Class name of the wrapped object.
	pub fn class_name(&self) -> &str {
		self.object.class_name()
	}

	/// Ordered ancestor class names of the wrapped object.
	pub fn ancestor_class_names(&self) -> Vec<Box<str>> {
		self.object.ancestor_class_names()
	}

	/// Downcast the wrapped object to its concrete type.
	pub fn downcast_ref<T: ArchiveObject>(&self) -> Option<&T> {
		self.object.as_any().downcast_ref::<T>()
	}
}

impl fmt::Debug for ObjectHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectHandle")
			.field("class_name", &self.object.class_name())
			.field("identity", &self.identity())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::{ArchiveObject, ObjectHandle, Value};

	struct Marker;

	impl ArchiveObject for Marker {
		fn class_name(&self) -> &str {
			"Marker"
		}

		fn ancestor_class_names(&self) -> Vec<Box<str>> {
			vec!["Marker".into()]
		}

		fn as_any(&self) -> &dyn std::any::Any {
			self
		}
	}

	#[test]
	fn clones_share_identity_and_fresh_allocations_do_not() {
		let first = Rc::new(Marker);
		let handle = ObjectHandle::new(first.clone());
		let clone = handle.clone();
		assert_eq!(handle.identity(), clone.identity());

		let other = ObjectHandle::new(Rc::new(Marker));
		assert_ne!(handle.identity(), other.identity());
	}

	#[test]
	fn downcast_reaches_the_concrete_type() {
		let handle = ObjectHandle::new(Rc::new(Marker));
		assert!(handle.downcast_ref::<Marker>().is_some());
	}

	#[test]
	fn kind_names_cover_all_variants() {
		assert_eq!(Value::Null.kind_name(), "null");
		assert_eq!(Value::Bool(true).kind_name(), "bool");
		assert_eq!(Value::Integer(-1).kind_name(), "integer");
		assert_eq!(Value::Unsigned(1).kind_name(), "unsigned");
		assert_eq!(Value::Double(0.5).kind_name(), "double");
		assert_eq!(Value::string("x").kind_name(), "string");
		assert_eq!(Value::Raw(vec![0]).kind_name(), "raw");
		assert_eq!(Value::object(Rc::new(Marker)).kind_name(), "object");
	}
}
