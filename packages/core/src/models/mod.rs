//! Data Models
//!
//! This module contains the data structures used throughout Arbor:
//!
//! - `Node` - a persisted row of the `nodes` table
//! - `NewNode` / `DeleteAndMoveInput` - inputs bound from admin forms
//! - `NodeArena` / `TreeNode` - in-memory tree assembly for rendering

mod node;
mod tree;

pub use node::{
    deserialize_optional_id, validate_name, DeleteAndMoveInput, NewNode, Node, ValidationError,
    MAX_NAME_LENGTH,
};
pub use tree::{NodeArena, TreeNode};
