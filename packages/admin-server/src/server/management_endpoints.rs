//! Management endpoints
//!
//! Every route here sits behind the administrator role gate.
//!
//! # Endpoints
//!
//! - `GET|POST /management` - Tree page (`sortby=name`, `expand=true|1|on`, `open=1,2`)
//! - `GET|POST /management/create` - Create form model / submit
//! - `GET|POST /management/edit/:id` - Edit form model / submit
//! - `GET|POST /management/delete/:id` - Delete confirmation / cascading delete
//! - `GET|POST /management/delete-and-move/:id` - Reparent children, then delete
//! - `GET /management/clear` - Remove every node
//! - `GET /management/load` - Replace the tree with the demo taxonomy
//!
//! Successful submissions redirect to the tree page. A submission failing
//! validation answers `422` with the field errors and the form model.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;

use arbor_core::{DeleteAndMoveInput, NewNode, Node, TreeServiceError, ValidationError};

use crate::config::flag_value;
use crate::constants::INDEX_PATH;
use crate::server::forms::{
    select_options, CreateFormModel, DeleteAndMoveFormModel, DeleteFormModel, EditFormModel,
    FormRejection,
};
use crate::server::{AppState, HttpError};
use crate::tree_view::{render_index_page, TreeViewState};

/// Query parameters of the tree page
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    sortby: Option<String>,
    expand: Option<String>,
    open: Option<String>,
}

impl IndexQuery {
    fn view_state(&self) -> TreeViewState {
        let mut state = TreeViewState::new()
            .with_sort_by_name(is_name_sort(self.sortby.as_deref()))
            .with_expand_all(
                self.expand
                    .as_deref()
                    .and_then(flag_value)
                    .unwrap_or(false),
            );
        if let Some(open) = &self.open {
            state = state.with_open_list(open);
        }
        state
    }
}

/// Form body of the tree page's sort button
#[derive(Debug, Default, Deserialize)]
pub struct IndexForm {
    sortby: Option<String>,
}

fn is_name_sort(sortby: Option<&str>) -> bool {
    sortby.is_some_and(|value| value.eq_ignore_ascii_case("name"))
}

/// Negative identifiers never name a node
fn check_id(id: i64) -> Result<i64, HttpError> {
    if id < 0 {
        return Err(HttpError::not_found(id));
    }
    Ok(id)
}

fn to_index() -> Response {
    Redirect::to(INDEX_PATH).into_response()
}

fn reject<T: serde::Serialize>(err: &ValidationError, form: T) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(FormRejection::new(err, form)),
    )
        .into_response()
}

/// Map a concurrency conflict to NotFound when any of `ids` is gone.
///
/// A conflict while every involved node still exists is a genuine fault and
/// stays fatal.
async fn resolve_conflict(state: &AppState, err: TreeServiceError, ids: &[i64]) -> HttpError {
    if let TreeServiceError::ConcurrencyConflict { id } = err {
        for &candidate in ids {
            match state.tree_service.exists(candidate).await {
                Ok(false) => return HttpError::not_found(candidate),
                Ok(true) => {}
                Err(lookup_err) => return lookup_err.into(),
            }
        }
        return TreeServiceError::ConcurrencyConflict { id }.into();
    }
    err.into()
}

// =========================================================================
// Tree page
// =========================================================================

async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, HttpError> {
    let roots = state.tree_service.list_roots().await?;
    Ok(Html(render_index_page(&roots, &query.view_state())))
}

async fn index_sorted(
    State(state): State<AppState>,
    Form(form): Form<IndexForm>,
) -> Result<Html<String>, HttpError> {
    let roots = state.tree_service.list_roots().await?;
    let view_state = TreeViewState::new().with_sort_by_name(is_name_sort(form.sortby.as_deref()));
    Ok(Html(render_index_page(&roots, &view_state)))
}

// =========================================================================
// Create
// =========================================================================

async fn create_form_model(state: &AppState, node: NewNode) -> Result<CreateFormModel, HttpError> {
    let has_root = state.tree_service.has_root().await?;
    let parent_options = if has_root {
        let nodes = state.tree_service.list_nodes().await?;
        select_options(&nodes, node.parent_id)
    } else {
        Vec::new()
    };

    Ok(CreateFormModel {
        node,
        has_root,
        parent_options,
    })
}

async fn create_form(State(state): State<AppState>) -> Result<Json<CreateFormModel>, HttpError> {
    Ok(Json(create_form_model(&state, NewNode::default()).await?))
}

async fn create_submit(
    State(state): State<AppState>,
    Form(mut input): Form<NewNode>,
) -> Result<Response, HttpError> {
    // Identifiers are always assigned by the store for new nodes
    input.id = None;

    match state.tree_service.create_node(input.clone()).await {
        Ok(_) => Ok(to_index()),
        Err(TreeServiceError::ValidationFailed(err)) => {
            let model = create_form_model(&state, input).await?;
            Ok(reject(&err, model))
        }
        Err(err) => Err(err.into()),
    }
}

// =========================================================================
// Edit
// =========================================================================

async fn edit_form_model(state: &AppState, node: Node) -> Result<EditFormModel, HttpError> {
    let targets = state.tree_service.movable_targets(node.id).await?;
    let has_children = state.tree_service.has_children(node.id).await?;

    Ok(EditFormModel {
        parent_options: select_options(&targets, node.parent_id),
        has_children,
        node,
    })
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EditFormModel>, HttpError> {
    let id = check_id(id)?;
    let node = state.tree_service.require_node(id).await?;
    Ok(Json(edit_form_model(&state, node).await?))
}

async fn edit_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(node): Form<Node>,
) -> Result<Response, HttpError> {
    let id = check_id(id)?;
    if node.id != id {
        return Err(HttpError::not_found(id));
    }

    match state.tree_service.update_node(node.clone()).await {
        Ok(_) => Ok(to_index()),
        Err(TreeServiceError::ValidationFailed(err)) => {
            let model = edit_form_model(&state, node).await?;
            Ok(reject(&err, model))
        }
        Err(err) => Err(resolve_conflict(&state, err, &[id]).await),
    }
}

// =========================================================================
// Delete
// =========================================================================

async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteFormModel>, HttpError> {
    let id = check_id(id)?;
    let node = state.tree_service.require_node(id).await?;
    let descendants = state.tree_service.collect_descendants(id).await?;
    Ok(Json(DeleteFormModel { node, descendants }))
}

async fn delete_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    let id = check_id(id)?;
    match state.tree_service.delete_cascade(id).await {
        Ok(_) => Ok(to_index()),
        Err(err) => Err(resolve_conflict(&state, err, &[id]).await),
    }
}

// =========================================================================
// Delete and move
// =========================================================================

async fn delete_and_move_model(
    state: &AppState,
    id: i64,
    target_id: Option<i64>,
) -> Result<DeleteAndMoveFormModel, HttpError> {
    let node = state.tree_service.require_node(id).await?;
    let parent_name = match node.parent_id {
        Some(parent_id) => state
            .tree_service
            .get_node(parent_id)
            .await?
            .map(|parent| parent.name),
        None => None,
    };
    let children = state.tree_service.get_children(id).await?;
    let targets = state.tree_service.movable_targets(id).await?;

    Ok(DeleteAndMoveFormModel {
        node_id: node.id,
        name: node.name,
        parent_name,
        children,
        target_options: select_options(&targets, target_id),
    })
}

async fn delete_and_move_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteAndMoveFormModel>, HttpError> {
    let id = check_id(id)?;
    Ok(Json(delete_and_move_model(&state, id, None).await?))
}

async fn delete_and_move_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(input): Form<DeleteAndMoveInput>,
) -> Result<Response, HttpError> {
    let id = check_id(id)?;
    if input.node_id != id {
        return Err(HttpError::not_found(id));
    }

    let target_id = match input.require_target() {
        Ok(target_id) => target_id,
        Err(err) => {
            let model = delete_and_move_model(&state, id, None).await?;
            return Ok(reject(&err, model));
        }
    };

    match state
        .tree_service
        .reparent_children_and_remove(id, target_id)
        .await
    {
        Ok(_) => Ok(to_index()),
        Err(TreeServiceError::ValidationFailed(err)) => {
            let model = delete_and_move_model(&state, id, Some(target_id)).await?;
            Ok(reject(&err, model))
        }
        Err(err) => Err(resolve_conflict(&state, err, &[target_id, id]).await),
    }
}

// =========================================================================
// Demo data
// =========================================================================

async fn clear(State(state): State<AppState>) -> Result<Response, HttpError> {
    state.tree_service.clear().await?;
    Ok(to_index())
}

async fn load(State(state): State<AppState>) -> Result<Response, HttpError> {
    state.tree_service.seed().await?;
    Ok(to_index())
}

/// Create management routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to(INDEX_PATH) }))
        .route("/management", get(index).post(index_sorted))
        .route("/management/create", get(create_form).post(create_submit))
        .route("/management/edit/:id", get(edit_form).post(edit_submit))
        .route("/management/delete/:id", get(delete_form).post(delete_submit))
        .route(
            "/management/delete-and-move/:id",
            get(delete_and_move_form).post(delete_and_move_submit),
        )
        .route("/management/clear", get(clear))
        .route("/management/load", get(load))
        .with_state(state)
}
