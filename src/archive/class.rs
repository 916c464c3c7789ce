use std::collections::HashMap;

use crate::archive::encoder::KeyedArchiver;
use crate::archive::value::ObjectHandle;

/// Interned metadata record shared by all instances of one class.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
	/// Class name. This alone defines descriptor identity.
	pub class_name: Box<str>,
	/// Ordered ancestor class names, most derived first.
	pub ancestor_names: Vec<Box<str>>,
	/// Optional substitute class names recorded as `$classhints`.
	pub class_hints: Vec<Box<str>>,
}

impl ClassDescriptor {
	/// Build the descriptor for a container object.
	pub fn for_object(object: &ObjectHandle) -> Self {
		Self {
			class_name: object.class_name().into(),
			ancestor_names: object.ancestor_class_names(),
			class_hints: Vec::new(),
		}
	}
}

/// Two descriptors are equal iff their class names match; ancestor and hint
/// lists are informational payload, not identity.
impl PartialEq for ClassDescriptor {
	fn eq(&self, other: &Self) -> bool {
		self.class_name == other.class_name
	}
}

impl Eq for ClassDescriptor {}

/// Field serializer for one registered class.
///
/// The function decomposes the object into key/value pairs by calling back
/// into the archiver's `encode_*` methods; the archiver attaches `$class`
/// metadata itself after the serializer returns.
pub type Serializer = fn(&mut KeyedArchiver<'_>, &ClassDescriptor, &ObjectHandle);

/// Mapping from class name to registered serializer, with a default
/// fallback.
///
/// The registry is populated by application startup code and must be
/// read-only for the duration of any encode that borrows it.
pub struct ClassRegistry {
	serializers: HashMap<Box<str>, Serializer>,
	default_serializer: Serializer,
}

impl ClassRegistry {
	/// Create an empty registry whose fallback emits no fields.
	pub fn new() -> Self {
		Self {
			serializers: HashMap::new(),
			default_serializer: empty_serializer,
		}
	}

	/// Register `serializer` for `class_name`, replacing any previous entry.
	pub fn register(&mut self, class_name: impl Into<Box<str>>, serializer: Serializer) {
		self.serializers.insert(class_name.into(), serializer);
	}

	/// Replace the fallback used for classes with no registered serializer.
	pub fn set_default_serializer(&mut self, serializer: Serializer) {
		self.default_serializer = serializer;
	}

	/// Return whether a serializer is registered for `class_name`.
	pub fn has_serializer(&self, class_name: &str) -> bool {
		self.serializers.contains_key(class_name)
	}

	/// Return the serializer registered for `class_name`.
	pub fn get_serializer(&self, class_name: &str) -> Option<Serializer> {
		self.serializers.get(class_name).copied()
	}

	/// Return the fallback serializer.
	pub fn get_default_serializer(&self) -> Serializer {
		self.default_serializer
	}
}

impl Default for ClassRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Default fallback: emits no fields, leaving a structurally valid empty
/// container that still receives `$class` metadata.
fn empty_serializer(_archiver: &mut KeyedArchiver<'_>, _class: &ClassDescriptor, _object: &ObjectHandle) {}

#[cfg(test)]
mod tests {
	use super::{ClassDescriptor, ClassRegistry};
	use crate::archive::encoder::KeyedArchiver;
	use crate::archive::value::ObjectHandle;

	fn noop(_archiver: &mut KeyedArchiver<'_>, _class: &ClassDescriptor, _object: &ObjectHandle) {}

	#[test]
	fn descriptor_identity_ignores_ancestry_payload() {
		let left = ClassDescriptor {
			class_name: "NSDictionary".into(),
			ancestor_names: vec!["NSDictionary".into(), "NSObject".into()],
			class_hints: Vec::new(),
		};
		let right = ClassDescriptor {
			class_name: "NSDictionary".into(),
			ancestor_names: Vec::new(),
			class_hints: vec!["NSMutableDictionary".into()],
		};

		assert_eq!(left, right);
	}

	#[test]
	fn registry_lookup_and_fallback() {
		let mut registry = ClassRegistry::new();
		assert!(!registry.has_serializer("Device"));
		assert!(registry.get_serializer("Device").is_none());

		registry.register("Device", noop);
		assert!(registry.has_serializer("Device"));
		assert!(registry.get_serializer("Device").is_some());
	}
}
