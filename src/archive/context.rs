use crate::archive::node::Node;

/// Reserved marker prefixing structural metadata keys and generic keys.
pub const RESERVED_KEY_MARKER: char = '$';

/// In-progress field mapping for one container nesting level.
///
/// One context is pushed when a container's field encoding begins and popped
/// immediately after; its generic-key counter is private to the context, so
/// sibling containers never share or leak counters.
#[derive(Debug, Default)]
pub struct EncodingContext {
	fields: Vec<(Box<str>, Node)>,
	next_generic_key: u32,
}

impl EncodingContext {
	/// Create an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert `node` under `key`, replacing any previous value for the key.
	pub fn set(&mut self, key: Box<str>, node: Node) {
		if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == key) {
			slot.1 = node;
		} else {
			self.fields.push((key, node));
		}
	}

	/// Synthesize the next generic key (`"$0"`, `"$1"`, ...) for this
	/// context.
	pub fn next_generic_key(&mut self) -> Box<str> {
		let key = format!("{RESERVED_KEY_MARKER}{}", self.next_generic_key);
		self.next_generic_key += 1;
		key.into_boxed_str()
	}

	/// Consume the context, returning its accumulated field mapping.
	pub fn into_fields(self) -> Vec<(Box<str>, Node)> {
		self.fields
	}
}

/// Escape a caller-supplied key that would collide with structural metadata
/// keys (`$class`, `$classname`, ...) by doubling the reserved marker.
pub fn escape_key(key: &str) -> Box<str> {
	if key.starts_with(RESERVED_KEY_MARKER) {
		format!("{RESERVED_KEY_MARKER}{key}").into_boxed_str()
	} else {
		key.into()
	}
}

#[cfg(test)]
mod tests {
	use super::{EncodingContext, escape_key};
	use crate::archive::node::Node;

	#[test]
	fn generic_keys_count_up_per_context() {
		let mut ctx = EncodingContext::new();
		assert_eq!(ctx.next_generic_key().as_ref(), "$0");
		assert_eq!(ctx.next_generic_key().as_ref(), "$1");

		let mut sibling = EncodingContext::new();
		assert_eq!(sibling.next_generic_key().as_ref(), "$0");
	}

	#[test]
	fn set_replaces_existing_keys_in_place() {
		let mut ctx = EncodingContext::new();
		ctx.set("name".into(), Node::Integer(1));
		ctx.set("other".into(), Node::Integer(2));
		ctx.set("name".into(), Node::Integer(3));

		let fields = ctx.into_fields();
		assert_eq!(fields.len(), 2);
		assert_eq!(fields[0], ("name".into(), Node::Integer(3)));
		assert_eq!(fields[1], ("other".into(), Node::Integer(2)));
	}

	#[test]
	fn escape_only_touches_reserved_marker_keys() {
		assert_eq!(escape_key("$foo").as_ref(), "$$foo");
		assert_eq!(escape_key("plain").as_ref(), "plain");
		assert_eq!(escape_key("").as_ref(), "");
	}
}
