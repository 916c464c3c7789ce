use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::archive::node::Node;

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
	<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
	<plist version=\"1.0\">\n";
const FOOTER: &str = "</plist>\n";

/// Serialize a finished envelope as an XML property list.
///
/// `Uid` nodes use the conventional `CF$UID` dict representation. The input
/// must be the pure tree the encoder guarantees; no cycle detection is
/// performed.
pub fn write_xml(envelope: &Node) -> Vec<u8> {
	let mut out = String::from(HEADER);
	write_node(&mut out, envelope, 0);
	out.push_str(FOOTER);
	out.into_bytes()
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
	match node {
		// placeholders never survive a finished envelope; keep the output
		// well-formed if one slips through
		Node::Null => write_line(out, depth, "<string>$null</string>"),
		Node::Bool(true) => write_line(out, depth, "<true/>"),
		Node::Bool(false) => write_line(out, depth, "<false/>"),
		Node::Integer(v) => write_line(out, depth, &format!("<integer>{v}</integer>")),
		Node::Unsigned(v) => write_line(out, depth, &format!("<integer>{v}</integer>")),
		Node::Real(v) => write_line(out, depth, &format!("<real>{}</real>", real_text(*v))),
		Node::String(text) => write_line(out, depth, &format!("<string>{}</string>", escape_text(text))),
		Node::Data(bytes) => write_line(out, depth, &format!("<data>{}</data>", BASE64.encode(bytes))),
		Node::Uid(uid) => {
			write_line(out, depth, "<dict>");
			write_line(out, depth + 1, "<key>CF$UID</key>");
			write_line(out, depth + 1, &format!("<integer>{}</integer>", uid.value()));
			write_line(out, depth, "</dict>");
		}
		Node::Array(items) => {
			if items.is_empty() {
				write_line(out, depth, "<array/>");
				return;
			}
			write_line(out, depth, "<array>");
			for item in items {
				write_node(out, item, depth + 1);
			}
			write_line(out, depth, "</array>");
		}
		Node::Dict(pairs) => {
			if pairs.is_empty() {
				write_line(out, depth, "<dict/>");
				return;
			}
			write_line(out, depth, "<dict>");
			for (key, value) in pairs {
				write_line(out, depth + 1, &format!("<key>{}</key>", escape_text(key)));
				write_node(out, value, depth + 1);
			}
			write_line(out, depth, "</dict>");
		}
	}
}

fn write_line(out: &mut String, depth: usize, text: &str) {
	for _ in 0..depth {
		out.push('\t');
	}
	out.push_str(text);
	out.push('\n');
}

// non-finite spellings follow libplist; `{:?}` keeps a fractional digit on
// whole values
fn real_text(v: f64) -> String {
	if v.is_nan() {
		"nan".to_owned()
	} else if v.is_infinite() {
		if v.is_sign_positive() { "+infinity" } else { "-infinity" }.to_owned()
	} else {
		format!("{v:?}")
	}
}

fn escape_text(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(ch),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::write_xml;
	use crate::archive::node::{Node, Uid};

	fn xml_text(node: &Node) -> String {
		String::from_utf8(write_xml(node)).expect("xml output is utf-8")
	}

	#[test]
	fn scalars_and_structure_render_as_plist_tags() {
		let node = Node::Dict(vec![
			("flag".into(), Node::Bool(true)),
			("count".into(), Node::Integer(-3)),
			("ratio".into(), Node::Real(0.5)),
			("items".into(), Node::Array(vec![Node::String("a&b".into())])),
		]);

		let text = xml_text(&node);
		assert!(text.starts_with("<?xml version=\"1.0\""));
		assert!(text.contains("<key>flag</key>"));
		assert!(text.contains("<true/>"));
		assert!(text.contains("<integer>-3</integer>"));
		assert!(text.contains("<real>0.5</real>"));
		assert!(text.contains("<string>a&amp;b</string>"));
		assert!(text.trim_end().ends_with("</plist>"));
	}

	#[test]
	fn uid_nodes_render_as_cf_uid_dicts() {
		let text = xml_text(&Node::Uid(Uid::new(7)));
		assert!(text.contains("<key>CF$UID</key>"));
		assert!(text.contains("<integer>7</integer>"));
	}

	#[test]
	fn whole_reals_keep_a_fractional_digit() {
		let text = xml_text(&Node::Real(2.0));
		assert!(text.contains("<real>2.0</real>"));
	}

	#[test]
	fn non_finite_reals_use_plist_spellings() {
		assert!(xml_text(&Node::Real(f64::NAN)).contains("<real>nan</real>"));
		assert!(xml_text(&Node::Real(f64::INFINITY)).contains("<real>+infinity</real>"));
		assert!(xml_text(&Node::Real(f64::NEG_INFINITY)).contains("<real>-infinity</real>"));
	}

	#[test]
	fn data_nodes_are_base64_encoded() {
		let text = xml_text(&Node::Data(vec![0x00, 0xff, 0x10]));
		assert!(text.contains("<data>AP8Q</data>"));
	}

	#[test]
	fn empty_containers_self_close() {
		let text = xml_text(&Node::Dict(vec![("empty".into(), Node::Array(Vec::new()))]));
		assert!(text.contains("<array/>"));
	}
}
