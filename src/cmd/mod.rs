/// Archive-to-bytes command.
pub mod archive;
/// Envelope inspection command.
pub mod envelope;
/// Shared JSON graph loading and output helpers.
pub mod util;
