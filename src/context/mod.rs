/// Renders the resolved set and publishes the document.
pub mod assembler;

/// Formatter collaborators run on the generated file.
pub mod formatter;

mod imports;

pub use assembler::{render_document, Assembler, Document, Published, FILE_SEPARATOR};
pub use formatter::{Formatter, NoopFormatter, PrettierFormatter};
pub use imports::consolidate_imports;
