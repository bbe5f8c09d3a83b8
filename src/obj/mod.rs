//! Wavefront OBJ subset parser
//!
//! Turns OBJ text into named objects with flat, triangulated vertex buffers.
//! Supported directives: `v`, `vn`, `vt`, `f`, `o`, `usemtl`; `g`, `mtllib`
//! and `s` are accepted and ignored. Anything else is skipped.

pub mod error;
pub mod lexer;
pub mod loader;
pub mod model;
pub mod parser;

pub use error::ObjError;
pub use loader::{load_obj, LoadError};
pub use model::{Bounds, Geometry, ModelSummary, ParsedObject};
pub use parser::{parse, parse_with, ParseOptions, PolygonMode};
