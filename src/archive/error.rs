use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors produced while encoding an object graph into a keyed archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
	/// A non-scalar value reached primitive encoding.
	#[error("unsupported primitive value kind: {kind}")]
	UnsupportedType {
		/// Logical kind of the offending value.
		kind: &'static str,
	},
	/// Encoding context stack was popped past the root or left unbalanced.
	#[error("encoding context stack imbalance (depth={depth})")]
	StackImbalance {
		/// Stack depth observed at the violation.
		depth: usize,
	},
	/// Filesystem or stream IO failure while emitting archive bytes.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Input value graph document could not be parsed.
	#[error("invalid input document: {reason}")]
	InvalidInput {
		/// Parser diagnostic for the malformed document.
		reason: String,
	},
}

impl Clone for ArchiveError {
	fn clone(&self) -> Self {
		match self {
			Self::UnsupportedType { kind } => Self::UnsupportedType { kind: *kind },
			Self::StackImbalance { depth } => Self::StackImbalance { depth: *depth },
			// an io error duplicates as its kind and rendered message; the
			// source chain is dropped
			Self::Io(err) => Self::Io(std::io::Error::new(err.kind(), err.to_string())),
			Self::InvalidInput { reason } => Self::InvalidInput { reason: reason.clone() },
		}
	}
}
