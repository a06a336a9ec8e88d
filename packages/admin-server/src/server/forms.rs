//! Form models returned by the management endpoints
//!
//! GET actions return the data a form needs (the node being edited, parent
//! choice lists); a rejected POST returns the field errors together with the
//! same model so the form can be shown again.

use arbor_core::{NewNode, Node, ValidationError};
use serde::{Deserialize, Serialize};

/// One entry of a `<select>` choice list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: i64,
    pub text: String,
    pub selected: bool,
}

/// Build a choice list from nodes already ordered by name
pub fn select_options(nodes: &[Node], selected: Option<i64>) -> Vec<SelectOption> {
    nodes
        .iter()
        .map(|node| SelectOption {
            value: node.id,
            text: node.name.clone(),
            selected: Some(node.id) == selected,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        Self {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// A rejected submission: what went wrong plus the form to show again
#[derive(Debug, Serialize, Deserialize)]
pub struct FormRejection<T> {
    pub errors: Vec<FieldError>,
    pub form: T,
}

impl<T> FormRejection<T> {
    pub fn new(err: &ValidationError, form: T) -> Self {
        Self {
            errors: vec![err.into()],
            form,
        }
    }
}

/// Model for the create form
///
/// The parent list is only offered once the tree has a root.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFormModel {
    pub node: NewNode,
    pub has_root: bool,
    pub parent_options: Vec<SelectOption>,
}

/// Model for the edit form
#[derive(Debug, Serialize, Deserialize)]
pub struct EditFormModel {
    pub node: Node,
    pub parent_options: Vec<SelectOption>,
    pub has_children: bool,
}

/// Model for the delete confirmation
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteFormModel {
    pub node: Node,
    pub descendants: Vec<Node>,
}

/// Model for the delete-and-move form
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAndMoveFormModel {
    pub node_id: i64,
    pub name: String,
    pub parent_name: Option<String>,
    pub children: Vec<Node>,
    pub target_options: Vec<SelectOption>,
}
