//! Generic CRUD handlers
//!
//! Every handler follows the same sequence: load or bind the resource, notify
//! listeners before the change, strip bindings, persist, notify listeners after
//! the change, then serialize the result.
//!
//! ```text
//! POST   /books        bind ─▶ pre_create ─▶ strip ─▶ create ─▶ post_create ─▶ 201
//! GET    /books/{id}   find ─▶ resolve ─▶ post_read ─▶ 200
//! GET    /books        filters ─▶ find_by_filter ─▶ post_read (each) ─▶ 200
//! PATCH  /books/{id}   find ─▶ merge ─▶ pre_update ─▶ strip ─▶ update ─▶ post_update ─▶ 200
//! DELETE /books/{id}   find ─▶ resolve ─▶ pre_delete ─▶ delete ─▶ 204
//! ```

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::middleware::RequestScope;
use crate::binding::{resolve_bindings, strip_bindings};
use crate::config::CrudConfig;
use crate::core::error::{Operation, ScaffoldError};
use crate::core::events::{
    POST_CREATE, POST_READ, POST_UPDATE, PRE_CREATE, PRE_DELETE, PRE_UPDATE, ResourceActionEvent,
};
use crate::core::query::{CollectionItem, PaginationConfig, compose_filters, query_pairs};
use crate::core::resource::Resource;
use crate::core::serializer::{LIST, ONE, SerializeGroups, serialize_resource};
use crate::core::service::{DataAccess, DataAccessRegistry};
use crate::core::validation::{ValidationError, decode_error};

/// State shared by the CRUD handlers
#[derive(Clone)]
pub struct CrudState {
    pub registry: Arc<DataAccessRegistry>,
    pub config: Arc<CrudConfig>,
}

impl CrudState {
    pub fn new(registry: DataAccessRegistry, config: CrudConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }

    fn max_depth(&self) -> usize {
        self.config.binder.max_depth
    }

    /// Pagination of a resource type: its own, or the configured default
    fn pagination_for<T: Resource>(&self) -> Option<PaginationConfig> {
        T::pagination_config().or_else(|| {
            let settings = &self.config.pagination;
            settings.enabled.then(|| PaginationConfig::from(settings))
        })
    }
}

/// Mount the handlers selected by `methods` under `path`
///
/// Letters: `C` create, `R` read, `U` update, `D` delete, `L` list. An
/// empty string mounts all five.
pub fn crudl<T: Resource>(path: &str, methods: &str) -> Router<CrudState> {
    let methods = if methods.is_empty() { "CRUDL" } else { methods };
    let base = path.trim_end_matches('/');
    let base = if base.is_empty() { "/" } else { base };
    let item_path = format!("{}/{{id}}", base.trim_end_matches('/'));

    let mut collection: Option<MethodRouter<CrudState>> = None;
    let mut item: Option<MethodRouter<CrudState>> = None;

    if methods.contains('C') {
        collection = Some(collection.unwrap_or_else(MethodRouter::new).post(handle_post::<T>));
    }
    if methods.contains('L') {
        collection = Some(collection.unwrap_or_else(MethodRouter::new).get(handle_list::<T>));
    }
    if methods.contains('R') {
        item = Some(item.unwrap_or_else(MethodRouter::new).get(handle_get::<T>));
    }
    if methods.contains('U') {
        item = Some(item.unwrap_or_else(MethodRouter::new).patch(handle_patch::<T>));
    }
    if methods.contains('D') {
        item = Some(item.unwrap_or_else(MethodRouter::new).delete(handle_delete::<T>));
    }

    let mut router = Router::new();
    if let Some(collection) = collection {
        router = router.route(base, collection);
    }
    if let Some(item) = item {
        router = router.route(&item_path, item);
    }
    router
}

/// POST: create a resource
pub async fn handle_post<T: Resource>(
    State(state): State<CrudState>,
    mut scope: RequestScope,
    body: Bytes,
) -> Result<Response, ScaffoldError> {
    let data_access = state.registry.get::<T>()?;
    let item: T = bind_and_validate(&body, &state).await?;

    let mut item = scope.dispatch_action(PRE_CREATE, item).await?;
    strip_resource(&mut item);

    let created = data_access
        .create(item)
        .await
        .map_err(|e| ScaffoldError::operation(Operation::Create, e))?;
    tracing::debug!(resource = T::resource_name(), id = %created.id(), "resource created");

    let created = scope.dispatch_action(POST_CREATE, created).await?;
    respond(StatusCode::CREATED, &created, ONE)
}

/// GET by id: read a resource with its bindings resolved
pub async fn handle_get<T: Resource>(
    State(state): State<CrudState>,
    Path(id): Path<String>,
    mut scope: RequestScope,
) -> Result<Response, ScaffoldError> {
    let data_access = state.registry.get::<T>()?;
    let mut item = find_existing(data_access.as_ref(), &id).await?;
    resolve_resource(&mut item, &state).await?;

    let item = scope.dispatch_action(POST_READ, item).await?;
    respond(StatusCode::OK, &item, ONE)
}

/// GET collection: filtered, optionally paginated listing
pub async fn handle_list<T: Resource>(
    State(state): State<CrudState>,
    mut scope: RequestScope,
) -> Result<Response, ScaffoldError> {
    let data_access = state.registry.get::<T>()?;
    let query = query_pairs(&scope.ctx.uri);

    let pagination = state.pagination_for::<T>();
    let page_filter = pagination
        .as_ref()
        .map(|p| p.filter_for_page(p.page_from_query(&query)));

    let filters = match T::query_filters() {
        Some(set) => {
            let reserved: Vec<&str> = pagination
                .as_ref()
                .map(|p| p.query_param_name.as_str())
                .into_iter()
                .collect();
            compose_filters(&set, &query, &reserved)?
        }
        None => Vec::new(),
    };

    let results = data_access
        .find_by_filter(&filters, page_filter.as_ref())
        .await
        .map_err(|e| ScaffoldError::operation(Operation::List, e))?;

    let groups = SerializeGroups::of(LIST);
    let mut items = Vec::with_capacity(results.items.len());
    for item in results.items {
        let item = scope.dispatch_action(POST_READ, item).await?;
        items.push(serialize_resource(&item, &groups)?);
    }

    let collection = CollectionItem {
        count: items.len(),
        total: results.total,
        links: pagination.map(|p| p.links(&scope.ctx.uri, results.total)),
        items,
    };
    Ok((StatusCode::OK, Json(collection)).into_response())
}

/// PATCH: merge the body over a stored resource
pub async fn handle_patch<T: Resource>(
    State(state): State<CrudState>,
    Path(id): Path<String>,
    mut scope: RequestScope,
    body: Bytes,
) -> Result<Response, ScaffoldError> {
    let data_access = state.registry.get::<T>()?;
    let previous = find_existing(data_access.as_ref(), &id).await?;

    let item: T = merge_and_validate(&previous, &body, &state).await?;

    let mut item = scope.dispatch_action(PRE_UPDATE, item).await?;
    strip_resource(&mut item);

    let updated = data_access
        .update_from_previous(&previous, item)
        .await
        .map_err(|e| ScaffoldError::operation(Operation::Update, e))?;
    tracing::debug!(resource = T::resource_name(), id = %updated.id(), "resource updated");

    let updated = scope.dispatch_action(POST_UPDATE, updated).await?;
    respond(StatusCode::OK, &updated, ONE)
}

/// DELETE: remove a resource
pub async fn handle_delete<T: Resource>(
    State(state): State<CrudState>,
    Path(id): Path<String>,
    mut scope: RequestScope,
) -> Result<Response, ScaffoldError> {
    let data_access = state.registry.get::<T>()?;
    let mut item = find_existing(data_access.as_ref(), &id).await?;
    resolve_resource(&mut item, &state).await?;

    let item = scope.dispatch_action(PRE_DELETE, item).await?;

    data_access
        .delete_by_id(&item.id())
        .await
        .map_err(|e| ScaffoldError::operation(Operation::Delete, e))?;
    tracing::debug!(resource = T::resource_name(), id = %item.id(), "resource deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Decode a request body, run validation and resolve bindings
pub async fn bind_and_validate<T: Resource>(
    body: &[u8],
    state: &CrudState,
) -> Result<T, ScaffoldError> {
    let mut item: T = serde_json::from_slice(body)
        .map_err(|e| ScaffoldError::ValidationFailed(vec![decode_error(&e.to_string())]))?;

    validate_resource(&item)?;
    resolve_resource(&mut item, state).await?;
    Ok(item)
}

async fn merge_and_validate<T: Resource>(
    previous: &T,
    body: &[u8],
    state: &CrudState,
) -> Result<T, ScaffoldError> {
    let changes: Value = serde_json::from_slice(body)
        .map_err(|e| ScaffoldError::ValidationFailed(vec![decode_error(&e.to_string())]))?;
    let Value::Object(changes) = changes else {
        return Err(ScaffoldError::ValidationFailed(vec![decode_error(
            "request body must be a JSON object",
        )]));
    };

    let mut merged = serde_json::to_value(previous)?;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in changes {
            if key != "id" {
                fields.insert(key, value);
            }
        }
    }

    let mut item: T = serde_json::from_value(merged)
        .map_err(|e| ScaffoldError::ValidationFailed(vec![decode_error(&e.to_string())]))?;
    item.set_id(previous.id());

    validate_resource(&item)?;
    resolve_resource(&mut item, state).await?;
    Ok(item)
}

fn validate_resource<T: Resource>(item: &T) -> Result<(), ScaffoldError> {
    let errors: Vec<ValidationError> = item
        .as_validation_aware()
        .map(|aware| aware.validate())
        .unwrap_or_default();

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(resource = T::resource_name(), errors = errors.len(), "validation failed");
        Err(ScaffoldError::ValidationFailed(errors))
    }
}

async fn resolve_resource<T: Resource>(item: &mut T, state: &CrudState) -> Result<(), ScaffoldError> {
    match item.as_binder() {
        Some(binder) => resolve_bindings(binder, &state.registry, state.max_depth()).await,
        None => Ok(()),
    }
}

fn strip_resource<T: Resource>(item: &mut T) {
    if let Some(binder) = item.as_binder() {
        strip_bindings(binder);
    }
}

async fn find_existing<T: Resource>(
    data_access: &dyn DataAccess<T>,
    id: &str,
) -> Result<T, ScaffoldError> {
    let not_found = || ScaffoldError::NotFound {
        resource: T::resource_name().to_string(),
        id: id.to_string(),
    };

    let uuid = Uuid::parse_str(id).map_err(|_| not_found())?;
    data_access
        .find_by_id(&uuid)
        .await
        .map_err(|e| ScaffoldError::operation(Operation::Read, e))?
        .ok_or_else(not_found)
}

fn respond<T: Resource>(status: StatusCode, item: &T, group: &str) -> Result<Response, ScaffoldError> {
    let body = serialize_resource(item, &SerializeGroups::of(group))?;
    Ok((status, Json(body)).into_response())
}

impl RequestScope {
    /// Dispatch a resource action and hand back the (possibly modified) resource
    pub async fn dispatch_action<T: Resource>(
        &mut self,
        action: &'static str,
        resource: T,
    ) -> Result<T, ScaffoldError> {
        let mut event = ResourceActionEvent::new(action, resource);
        self.dispatcher
            .dispatch(&mut self.ctx, action, &mut event)
            .await?;
        Ok(event.into_resource())
    }
}
