use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use keyarchive::archive::{ArchiveError, ClassRegistry, Node, Result, Value, register_builtin_classes};

/// Load a JSON document as a value graph plus a registry covering its
/// container classes.
///
/// JSON objects become dictionary containers, JSON arrays become array
/// containers; scalars map onto the matching primitive variants.
pub(crate) fn load_graph(path: &Path) -> Result<(ClassRegistry, Value)> {
	let text = fs::read_to_string(path)?;
	let json: serde_json::Value = serde_json::from_str(&text).map_err(|err| ArchiveError::InvalidInput { reason: err.to_string() })?;

	let mut registry = ClassRegistry::new();
	register_builtin_classes(&mut registry);
	Ok((registry, json_to_value(&json)))
}

fn json_to_value(json: &serde_json::Value) -> Value {
	use keyarchive::archive::{ArrayObject, DictObject};

	match json {
		serde_json::Value::Null => Value::Null,
		serde_json::Value::Bool(v) => Value::Bool(*v),
		serde_json::Value::Number(number) => {
			if let Some(v) = number.as_i64() {
				Value::Integer(v)
			} else if let Some(v) = number.as_u64() {
				Value::Unsigned(v)
			} else {
				Value::Double(number.as_f64().unwrap_or(f64::NAN))
			}
		}
		serde_json::Value::String(text) => Value::string(text.as_str()),
		serde_json::Value::Array(items) => {
			let array = ArrayObject::new();
			for item in items {
				array.push(json_to_value(item));
			}
			Value::object(array)
		}
		serde_json::Value::Object(map) => {
			let dict = DictObject::new();
			for (key, value) in map {
				dict.insert(key.as_str(), json_to_value(value));
			}
			Value::object(dict)
		}
	}
}

/// Render an envelope node as JSON for inspection output.
///
/// References render as `{"$uid": n}` and data as `{"$data": base64}`; both
/// are display conventions of this tool, not part of the archive format.
pub(crate) fn node_to_json(node: &Node) -> serde_json::Value {
	use serde_json::{Map, Value as JsonValue};

	match node {
		Node::Null => JsonValue::Null,
		Node::Bool(v) => serde_json::json!(v),
		Node::Integer(v) => serde_json::json!(v),
		Node::Unsigned(v) => serde_json::json!(v),
		Node::Real(v) => serde_json::json!(v),
		Node::String(v) => serde_json::json!(v.as_ref()),
		Node::Data(bytes) => serde_json::json!({ "$data": BASE64.encode(bytes) }),
		Node::Uid(uid) => serde_json::json!({ "$uid": uid.value() }),
		Node::Array(items) => {
			let values: Vec<JsonValue> = items.iter().map(node_to_json).collect();
			JsonValue::Array(values)
		}
		Node::Dict(pairs) => {
			let map: Map<String, JsonValue> = pairs.iter().map(|(key, value)| (key.to_string(), node_to_json(value))).collect();
			JsonValue::Object(map)
		}
	}
}

/// Pretty-print a serializable payload to stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) {
	match serde_json::to_string_pretty(payload) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: json output failed: {err}"),
	}
}

#[cfg(test)]
mod tests {
	use super::node_to_json;
	use keyarchive::archive::{Node, Uid};

	#[test]
	fn uids_and_data_use_dollar_wrappers() {
		let node = Node::Dict(vec![
			("ref".into(), Node::Uid(Uid::new(4))),
			("blob".into(), Node::Data(vec![1, 2, 3])),
		]);

		let json = node_to_json(&node);
		assert_eq!(json["ref"]["$uid"], 4);
		assert_eq!(json["blob"]["$data"], "AQID");
	}
}
