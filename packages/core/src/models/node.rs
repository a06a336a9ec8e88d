//! Node Data Structures
//!
//! This module defines the `Node` row model, the `NewNode` input used for
//! creation (also bound directly from admin forms), and the name validation
//! rules shared by every write path.
//!
//! # Validation
//!
//! A node name is required, at most [`MAX_NAME_LENGTH`] characters long, and
//! may only contain ASCII letters, the Polish diacritics
//! `ąćęłńóśźżĄĆĘŁŃÓŚŹŻ`, digits and whitespace.
//!
//! # Examples
//!
//! ```rust
//! use arbor_core::models::NewNode;
//!
//! let root = NewNode::root("Animals");
//! assert!(root.validate().is_ok());
//!
//! let bad = NewNode::root("a!b");
//! assert!(bad.validate().is_err());
//! ```

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum number of characters allowed in a node name
pub const MAX_NAME_LENGTH: usize = 50;

const NAME_PATTERN: &str = r"^[a-zA-ZąćęłńóśźżĄĆĘŁŃÓŚŹŻ0-9\s]*$";

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(NAME_PATTERN).expect("node name pattern is valid"))
}

/// Validation errors for Node operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Name must be at most {max} characters, got {actual}")]
    NameTooLong { max: usize, actual: usize },

    #[error("Characters are not allowed. (letter, number, whitespace)")]
    InvalidCharacters,

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),
}

impl ValidationError {
    /// Name of the form field the error belongs to
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField(field) => field.as_str(),
            ValidationError::NameTooLong { .. } | ValidationError::InvalidCharacters => "name",
            ValidationError::InvalidParent(_) => "parent_id",
        }
    }
}

/// Validate a node name against the required/length/character rules.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingField("name".to_string()));
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong {
            max: MAX_NAME_LENGTH,
            actual: length,
        });
    }

    if !name_regex().is_match(name) {
        return Err(ValidationError::InvalidCharacters);
    }

    Ok(())
}

/// Deserialize an optional identifier, treating an empty form value as `None`.
///
/// HTML forms submit an unselected `<select>` as `parent_id=`, and JSON
/// clients may send either `null` or a number.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed
                    .parse::<i64>()
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }
}

/// A persisted tree node.
///
/// # Fields
///
/// - `id`: Store-assigned identifier, stable for the node's lifetime
/// - `name`: Display name (validated, see [`validate_name`])
/// - `parent_id`: Parent node reference; `None` marks a root
///
/// Children are never stored on the node. They are derived by filtering on
/// `parent_id` (see [`crate::models::NodeArena`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub parent_id: Option<i64>,
}

impl Node {
    pub fn new(id: i64, name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }

    /// Validate name rules and the trivial self-parent case.
    ///
    /// Deeper cycles (parent is one of the node's descendants) need the store
    /// and are checked by `TreeService::update_node`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;

        if self.parent_id == Some(self.id) {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        Ok(())
    }
}

/// Input for creating a node.
///
/// `id` is normally left empty so the store assigns one; the seed dataset
/// supplies explicit identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNode {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub parent_id: Option<i64>,
}

impl NewNode {
    /// Create input for a root node
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            parent_id: None,
        }
    }

    /// Create input for a child of `parent_id`
    pub fn child(name: impl Into<String>, parent_id: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            parent_id: Some(parent_id),
        }
    }

    /// Attach an explicit identifier
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;

        if let (Some(id), Some(parent_id)) = (self.id, self.parent_id) {
            if id == parent_id {
                return Err(ValidationError::InvalidParent(
                    "Node cannot be its own parent".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Input for the delete-and-move flow: move the children of `node_id` under
/// `target_id`, then delete `node_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAndMoveInput {
    pub node_id: i64,

    /// New parent for the children ("New parent" in the form)
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub target_id: Option<i64>,
}

impl DeleteAndMoveInput {
    /// Returns the target id, or a validation error when none was chosen
    pub fn require_target(&self) -> Result<i64, ValidationError> {
        self.target_id
            .ok_or_else(|| ValidationError::MissingField("target_id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("Animals").is_ok());
        assert!(validate_name("Ssaki łąkowe 2").is_ok());
        assert!(validate_name("ŻÓŁW").is_ok());
        assert!(validate_name("a\tb").is_ok());
    }

    #[test]
    fn test_disallowed_characters() {
        assert_eq!(
            validate_name("a!b"),
            Err(ValidationError::InvalidCharacters)
        );
        assert_eq!(
            validate_name("dogs.cats"),
            Err(ValidationError::InvalidCharacters)
        );
        assert_eq!(
            validate_name("<script>"),
            Err(ValidationError::InvalidCharacters)
        );
    }

    #[test]
    fn test_name_required() {
        assert_eq!(
            validate_name(""),
            Err(ValidationError::MissingField("name".to_string()))
        );
        assert_eq!(
            validate_name("   "),
            Err(ValidationError::MissingField("name".to_string()))
        );
    }

    #[test]
    fn test_name_length_counts_characters() {
        let fifty = "ą".repeat(50);
        assert!(validate_name(&fifty).is_ok());

        let fifty_one = "a".repeat(51);
        assert_eq!(
            validate_name(&fifty_one),
            Err(ValidationError::NameTooLong {
                max: 50,
                actual: 51
            })
        );
    }

    #[test]
    fn test_self_parent_rejected() {
        let node = Node::new(4, "Fish", Some(4));
        assert!(matches!(
            node.validate(),
            Err(ValidationError::InvalidParent(_))
        ));

        let input = NewNode::child("Fish", 4).with_id(4);
        assert!(matches!(
            input.validate(),
            Err(ValidationError::InvalidParent(_))
        ));
    }

    #[test]
    fn test_empty_form_parent_is_none() {
        let input: NewNode =
            serde_json::from_str(r#"{"name":"Animals","parent_id":""}"#).unwrap();
        assert_eq!(input.parent_id, None);

        let input: NewNode =
            serde_json::from_str(r#"{"name":"Mammals","parent_id":"1"}"#).unwrap();
        assert_eq!(input.parent_id, Some(1));

        let input: NewNode = serde_json::from_str(r#"{"name":"Birds","parent_id":1}"#).unwrap();
        assert_eq!(input.parent_id, Some(1));

        let input: NewNode = serde_json::from_str(r#"{"name":"Fish"}"#).unwrap();
        assert_eq!(input.parent_id, None);
    }

    #[test]
    fn test_delete_and_move_requires_target() {
        let input: DeleteAndMoveInput =
            serde_json::from_str(r#"{"node_id":2,"target_id":""}"#).unwrap();
        assert_eq!(
            input.require_target(),
            Err(ValidationError::MissingField("target_id".to_string()))
        );

        let input: DeleteAndMoveInput =
            serde_json::from_str(r#"{"node_id":2,"target_id":"3"}"#).unwrap();
        assert_eq!(input.require_target(), Ok(3));
    }
}
