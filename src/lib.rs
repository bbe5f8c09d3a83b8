//! # arena_models
//!
//! Model pipeline for the browser arena shooter:
//!
//! - `obj`: Wavefront OBJ subset parser producing flat, triangulated
//!   per-object vertex buffers
//! - `assets`: asset directory store with a parse cache
//! - `http`: axum routes serving parsed models and raw assets
//! - `config`, `util`, `app`: environment configuration and server wiring

pub mod app;
pub mod assets;
pub mod config;
pub mod http;
pub mod obj;
pub mod util;

pub use obj::{parse, parse_with, ObjError, ParseOptions, ParsedObject, PolygonMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
