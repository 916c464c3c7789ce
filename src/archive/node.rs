/// Index of one slot in the archive's object table.
///
/// Slot 0 is permanently reserved for the null sentinel. A `Uid` is a plain
/// value: every use site in the output tree gets its own [`Node::Uid`]
/// wrapper, so the emitted tree never aliases one reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uid(u64);

impl Uid {
	/// The reserved null sentinel slot.
	pub const NULL: Uid = Uid(0);

	/// Wrap an object table index.
	pub fn new(index: u64) -> Self {
		Self(index)
	}

	/// Return the wrapped object table index.
	pub fn value(self) -> u64 {
		self.0
	}
}

/// Language-agnostic output tree produced by the encoder.
///
/// A finished envelope is a pure tree of these nodes: containers never share
/// children, and graph edges are expressed as [`Node::Uid`] indices into the
/// `$objects` table, so tree-only byte writers can consume it without cycle
/// detection.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	/// Placeholder for a reserved, not-yet-encoded slot. Never survives in a
	/// finished envelope.
	Null,
	/// Boolean scalar node.
	Bool(bool),
	/// Signed integer scalar node.
	Integer(i64),
	/// Unsigned integer scalar node.
	Unsigned(u64),
	/// Float scalar node.
	Real(f64),
	/// Text node.
	String(Box<str>),
	/// Raw data node.
	Data(Vec<u8>),
	/// Reference into the object table.
	Uid(Uid),
	/// Ordered array of child nodes.
	Array(Vec<Node>),
	/// Insertion-ordered mapping of string keys to child nodes.
	Dict(Vec<(Box<str>, Node)>),
}

impl Node {
	/// Look up a key in a dict node.
	pub fn dict_get(&self, key: &str) -> Option<&Node> {
		match self {
			Self::Dict(pairs) => pairs.iter().find(|(name, _)| name.as_ref() == key).map(|(_, node)| node),
			_ => None,
		}
	}

	/// Return the wrapped uid when this is a reference node.
	pub fn as_uid(&self) -> Option<Uid> {
		match self {
			Self::Uid(uid) => Some(*uid),
			_ => None,
		}
	}

	/// Return array elements when this is an array node.
	pub fn as_array(&self) -> Option<&[Node]> {
		match self {
			Self::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Return text when this is a string node.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(text) => Some(text),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{Node, Uid};

	#[test]
	fn dict_get_finds_keys_in_insertion_order() {
		let node = Node::Dict(vec![
			("first".into(), Node::Integer(1)),
			("second".into(), Node::Uid(Uid::new(3))),
		]);

		assert_eq!(node.dict_get("first"), Some(&Node::Integer(1)));
		assert_eq!(node.dict_get("second").and_then(Node::as_uid), Some(Uid::new(3)));
		assert_eq!(node.dict_get("missing"), None);
	}

	#[test]
	fn accessors_reject_mismatched_variants() {
		assert_eq!(Node::Integer(1).as_uid(), None);
		assert_eq!(Node::Bool(true).as_array(), None);
		assert_eq!(Node::Null.as_str(), None);
	}
}
