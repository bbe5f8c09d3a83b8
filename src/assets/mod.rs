//! Model assets served to the game client

pub mod store;

pub use store::{ModelEntry, ModelStore, StoreError};
