//! Bracketed inventory text format.
//!
//! Task inventories and notecard item encodings describe items and folders
//! in a line-oriented, brace-delimited text format:
//!
//! ```text
//! 	inv_object	0
//! 	{
//! 		obj_id	8d4e2a1c-0000-0000-0000-000000000001
//! 		parent_id	00000000-0000-0000-0000-000000000000
//! 		type	category
//! 		name	Contents|
//! 	}
//! ```
//!
//! Parsing is lenient: unknown top-level tags are logged and skipped, and
//! unparseable field values fall back to defaults. Only structural damage
//! (a record without its opening brace, or input ending inside a block)
//! is an error. Serialization reproduces the canonical layout exactly.

pub mod error;
pub mod line;
pub mod parser;
pub mod writer;

pub use error::{TextError, TextResult};
pub use line::{normalize, split, Line};
pub use parser::{parse, try_parse, Block};
pub use writer::{serialize, to_text, TextRecord};
