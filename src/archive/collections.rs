use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::archive::class::{ClassDescriptor, ClassRegistry};
use crate::archive::encoder::KeyedArchiver;
use crate::archive::value::{ArchiveObject, ObjectHandle, Value};

/// Generic keyed container, archived as `NSDictionary`.
///
/// Entries are interior-mutable so a dictionary can hold a reference to
/// itself (or to a sibling that refers back) before being encoded.
pub struct DictObject {
	entries: RefCell<Vec<(Box<str>, Value)>>,
}

impl DictObject {
	/// Create an empty shared dictionary.
	pub fn new() -> Rc<Self> {
		Rc::new(Self {
			entries: RefCell::new(Vec::new()),
		})
	}

	/// Insert `value` under `key`, replacing any previous value for the key.
	pub fn insert(&self, key: impl Into<Box<str>>, value: Value) {
		let key = key.into();
		let mut entries = self.entries.borrow_mut();
		if let Some(slot) = entries.iter_mut().find(|(name, _)| *name == key) {
			slot.1 = value;
		} else {
			entries.push((key, value));
		}
	}

	/// Snapshot the entries in insertion order.
	pub fn entries(&self) -> Vec<(Box<str>, Value)> {
		self.entries.borrow().clone()
	}
}

impl ArchiveObject for DictObject {
	fn class_name(&self) -> &str {
		"NSDictionary"
	}

	fn ancestor_class_names(&self) -> Vec<Box<str>> {
		vec!["NSDictionary".into(), "NSObject".into()]
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Generic ordered container, archived as `NSArray`.
pub struct ArrayObject {
	items: RefCell<Vec<Value>>,
}

impl ArrayObject {
	/// Create an empty shared array.
	pub fn new() -> Rc<Self> {
		Rc::new(Self {
			items: RefCell::new(Vec::new()),
		})
	}

	/// Append `value`.
	pub fn push(&self, value: Value) {
		self.items.borrow_mut().push(value);
	}

	/// Snapshot the items in order.
	pub fn items(&self) -> Vec<Value> {
		self.items.borrow().clone()
	}
}

impl ArchiveObject for ArrayObject {
	fn class_name(&self) -> &str {
		"NSArray"
	}

	fn ancestor_class_names(&self) -> Vec<Box<str>> {
		vec!["NSArray".into(), "NSObject".into()]
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Field serializer for [`DictObject`]: parallel `NS.keys` / `NS.objects`
/// reference arrays.
pub fn serialize_dictionary(archiver: &mut KeyedArchiver<'_>, _class: &ClassDescriptor, object: &ObjectHandle) {
	let Some(dict) = object.downcast_ref::<DictObject>() else {
		tracing::warn!(class = object.class_name(), "dictionary serializer invoked on a non-dictionary object");
		return;
	};

	let entries = dict.entries();
	let keys: Vec<Value> = entries.iter().map(|(key, _)| Value::String(key.clone())).collect();
	let values: Vec<Value> = entries.into_iter().map(|(_, value)| value).collect();

	archiver.encode_array(&keys, "NS.keys");
	archiver.encode_array(&values, "NS.objects");
}

/// Field serializer for [`ArrayObject`]: one `NS.objects` reference array.
pub fn serialize_array(archiver: &mut KeyedArchiver<'_>, _class: &ClassDescriptor, object: &ObjectHandle) {
	let Some(array) = object.downcast_ref::<ArrayObject>() else {
		tracing::warn!(class = object.class_name(), "array serializer invoked on a non-array object");
		return;
	};

	archiver.encode_array(&array.items(), "NS.objects");
}

/// Register the built-in container serializers.
pub fn register_builtin_classes(registry: &mut ClassRegistry) {
	registry.register("NSDictionary", serialize_dictionary);
	registry.register("NSArray", serialize_array);
}

#[cfg(test)]
mod tests {
	use super::{ArrayObject, DictObject};
	use crate::archive::value::Value;

	#[test]
	fn dictionary_insert_replaces_by_key() {
		let dict = DictObject::new();
		dict.insert("a", Value::Integer(1));
		dict.insert("b", Value::Integer(2));
		dict.insert("a", Value::Integer(3));

		let entries = dict.entries();
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].0.as_ref(), "a");
		assert!(matches!(entries[0].1, Value::Integer(3)));
	}

	#[test]
	fn array_preserves_push_order() {
		let array = ArrayObject::new();
		array.push(Value::string("first"));
		array.push(Value::string("second"));

		let items = array.items();
		assert_eq!(items.len(), 2);
		assert!(matches!(&items[1], Value::String(text) if text.as_ref() == "second"));
	}
}
