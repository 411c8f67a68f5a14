// Template document mutation: pure string patches plus the file-level mutator
// that applies a recommendation to the header, sidebar and main documents.

pub mod flags;
pub mod mutator;
pub mod patch;

pub use mutator::DocumentMutator;
pub use patch::PatchError;
