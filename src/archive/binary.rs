use crate::archive::node::Node;

const MAGIC: &[u8; 8] = b"bplist00";

/// One entry in the flattened object list.
///
/// The binary format stores every object (dict keys included) in one flat
/// table addressed by index; containers hold child indices. Flattening is a
/// plain pre-order walk because the encoder guarantees the envelope is a
/// pure tree.
enum Flat<'a> {
	Scalar(&'a Node),
	Key(&'a str),
	Array(Vec<usize>),
	Dict { keys: Vec<usize>, values: Vec<usize> },
}

/// Serialize a finished envelope as a binary property list (`bplist00`).
pub fn write_binary(envelope: &Node) -> Vec<u8> {
	let mut flats = Vec::new();
	flatten(envelope, &mut flats);

	let ref_size = byte_width(flats.len() as u64);
	let mut out = Vec::from(*MAGIC);
	let mut offsets = Vec::with_capacity(flats.len());

	for flat in &flats {
		offsets.push(out.len() as u64);
		match flat {
			Flat::Scalar(node) => write_scalar(&mut out, node),
			Flat::Key(text) => write_string(&mut out, text),
			Flat::Array(items) => {
				write_count_marker(&mut out, 0xA0, items.len());
				for item in items {
					write_be(&mut out, *item as u64, ref_size);
				}
			}
			Flat::Dict { keys, values } => {
				write_count_marker(&mut out, 0xD0, keys.len());
				for key in keys {
					write_be(&mut out, *key as u64, ref_size);
				}
				for value in values {
					write_be(&mut out, *value as u64, ref_size);
				}
			}
		}
	}

	let table_offset = out.len() as u64;
	let offset_size = byte_width(table_offset);
	for offset in &offsets {
		write_be(&mut out, *offset, offset_size);
	}

	// trailer: 6 pad bytes, sizes, object count, top object, table offset
	out.extend_from_slice(&[0; 6]);
	out.push(offset_size);
	out.push(ref_size);
	out.extend_from_slice(&(flats.len() as u64).to_be_bytes());
	out.extend_from_slice(&0_u64.to_be_bytes());
	out.extend_from_slice(&table_offset.to_be_bytes());
	out
}

fn flatten<'a>(node: &'a Node, flats: &mut Vec<Flat<'a>>) -> usize {
	match node {
		Node::Array(items) => {
			let slot = flats.len();
			flats.push(Flat::Array(Vec::new()));
			let refs = items.iter().map(|item| flatten(item, flats)).collect();
			flats[slot] = Flat::Array(refs);
			slot
		}
		Node::Dict(pairs) => {
			let slot = flats.len();
			flats.push(Flat::Dict {
				keys: Vec::new(),
				values: Vec::new(),
			});
			let keys = pairs
				.iter()
				.map(|(key, _)| {
					let index = flats.len();
					flats.push(Flat::Key(key));
					index
				})
				.collect();
			let values = pairs.iter().map(|(_, value)| flatten(value, flats)).collect();
			flats[slot] = Flat::Dict { keys, values };
			slot
		}
		_ => {
			let index = flats.len();
			flats.push(Flat::Scalar(node));
			index
		}
	}
}

fn write_scalar(out: &mut Vec<u8>, node: &Node) {
	match node {
		Node::Null => out.push(0x00),
		Node::Bool(false) => out.push(0x08),
		Node::Bool(true) => out.push(0x09),
		Node::Integer(v) => write_integer(out, *v),
		Node::Unsigned(v) => write_unsigned(out, *v),
		Node::Real(v) => {
			out.push(0x23);
			out.extend_from_slice(&v.to_bits().to_be_bytes());
		}
		Node::String(text) => write_string(out, text),
		Node::Data(bytes) => {
			write_count_marker(out, 0x40, bytes.len());
			out.extend_from_slice(bytes);
		}
		Node::Uid(uid) => {
			let width = byte_width(uid.value());
			out.push(0x80 | (width - 1));
			write_be(out, uid.value(), width);
		}
		// containers are handled by the flattened entries
		Node::Array(_) | Node::Dict(_) => {}
	}
}

fn write_integer(out: &mut Vec<u8>, value: i64) {
	if value < 0 {
		out.push(0x13);
		out.extend_from_slice(&value.to_be_bytes());
	} else {
		write_unsigned(out, value as u64);
	}
}

fn write_unsigned(out: &mut Vec<u8>, value: u64) {
	if value > i64::MAX as u64 {
		// values above the signed range take the 16-byte form
		out.push(0x14);
		out.extend_from_slice(&0_u64.to_be_bytes());
		out.extend_from_slice(&value.to_be_bytes());
		return;
	}

	let width = byte_width(value);
	out.push(0x10 | width.trailing_zeros() as u8);
	write_be(out, value, width);
}

fn write_string(out: &mut Vec<u8>, text: &str) {
	if text.is_ascii() {
		write_count_marker(out, 0x50, text.len());
		out.extend_from_slice(text.as_bytes());
	} else {
		let units: Vec<u16> = text.encode_utf16().collect();
		write_count_marker(out, 0x60, units.len());
		for unit in units {
			out.extend_from_slice(&unit.to_be_bytes());
		}
	}
}

fn write_count_marker(out: &mut Vec<u8>, marker: u8, count: usize) {
	if count < 0x0F {
		out.push(marker | count as u8);
	} else {
		out.push(marker | 0x0F);
		write_unsigned(out, count as u64);
	}
}

fn write_be(out: &mut Vec<u8>, value: u64, width: u8) {
	let bytes = value.to_be_bytes();
	out.extend_from_slice(&bytes[8 - width as usize..]);
}

fn byte_width(value: u64) -> u8 {
	if value <= u64::from(u8::MAX) {
		1
	} else if value <= u64::from(u16::MAX) {
		2
	} else if value <= u64::from(u32::MAX) {
		4
	} else {
		8
	}
}

#[cfg(test)]
mod tests {
	use super::write_binary;
	use crate::archive::node::{Node, Uid};

	fn trailer_of(bytes: &[u8]) -> (u8, u8, u64, u64, u64) {
		let trailer = &bytes[bytes.len() - 32..];
		let read_u64 = |slice: &[u8]| {
			let mut buf = [0_u8; 8];
			buf.copy_from_slice(slice);
			u64::from_be_bytes(buf)
		};
		(trailer[6], trailer[7], read_u64(&trailer[8..16]), read_u64(&trailer[16..24]), read_u64(&trailer[24..32]))
	}

	#[test]
	fn single_integer_layout_is_exact() {
		let bytes = write_binary(&Node::Integer(1));

		assert_eq!(&bytes[0..8], b"bplist00");
		assert_eq!(&bytes[8..10], &[0x10, 0x01]);
		assert_eq!(bytes[10], 8, "offset table points at the object");

		let (offset_size, ref_size, count, top, table) = trailer_of(&bytes);
		assert_eq!(offset_size, 1);
		assert_eq!(ref_size, 1);
		assert_eq!(count, 1);
		assert_eq!(top, 0);
		assert_eq!(table, 10);
	}

	#[test]
	fn dict_stores_key_then_value_refs() {
		let bytes = write_binary(&Node::Dict(vec![("a".into(), Node::Bool(true))]));

		// object 0: dict with one entry, keyref 1, valref 2
		assert_eq!(&bytes[8..11], &[0xD1, 0x01, 0x02]);
		// object 1: ascii string "a"
		assert_eq!(&bytes[11..13], &[0x51, b'a']);
		// object 2: true
		assert_eq!(bytes[13], 0x09);

		let (_, _, count, top, _) = trailer_of(&bytes);
		assert_eq!(count, 3);
		assert_eq!(top, 0);
	}

	#[test]
	fn negative_integers_take_the_signed_eight_byte_form() {
		let bytes = write_binary(&Node::Integer(-1));
		assert_eq!(bytes[8], 0x13);
		assert_eq!(&bytes[9..17], &[0xFF; 8]);
	}

	#[test]
	fn large_unsigned_takes_the_sixteen_byte_form() {
		let bytes = write_binary(&Node::Unsigned(u64::MAX));
		assert_eq!(bytes[8], 0x14);
		assert_eq!(&bytes[9..17], &[0x00; 8]);
		assert_eq!(&bytes[17..25], &[0xFF; 8]);
	}

	#[test]
	fn uid_marker_encodes_minimal_width() {
		let bytes = write_binary(&Node::Uid(Uid::new(0x1234)));
		assert_eq!(&bytes[8..11], &[0x81, 0x12, 0x34]);
	}

	#[test]
	fn non_ascii_strings_use_utf16_code_units() {
		let bytes = write_binary(&Node::String("é".into()));
		assert_eq!(&bytes[8..11], &[0x61, 0x00, 0xE9]);
	}
}
