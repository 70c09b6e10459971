//! Generic resource-handler factory
//!
//! Produces the five canonical CRUD operations for any entity type, generic
//! over the [`Model`] descriptor and the [`DocumentStore`] collaborator, so
//! every concrete resource shares one implementation of response shaping,
//! existence checks, and error propagation.
//!
//! Each operation performs exactly one storage round trip (get-one with
//! configured expansions joins its relations within that logical trip), and
//! none of them retries: a failed store call fails the request.
//!
//! # Example
//!
//! ```rust,ignore
//! use natours_api::handlers::factory;
//! use natours_api::models::Tour;
//!
//! let envelope = factory::get_all::<Tour, _>(&store, Vec::new(), params).await?;
//! ```

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{Expansion, Model};
use crate::store::{Document, DocumentStore, FilterCondition, ID_FIELD};

use super::envelope::Envelope;
use super::features::{QueryFeatures, QueryParams};

/// Persist the request body as a new entity
///
/// Applies the model's attribute defaults, validates, inserts, and responds
/// 201 with the created entity under the model's singular name. No
/// existence check applies.
pub async fn create_one<M: Model, S: DocumentStore>(store: &S, body: Value) -> Result<Envelope> {
    let mut doc = into_document(body)?;
    for (field, value) in M::defaults() {
        doc.entry(field.to_string()).or_insert(value);
    }
    M::validate(&doc)?;
    let created = store.insert(M::COLLECTION, doc).await?;
    Ok(Envelope::created(M::SINGULAR, strip_hidden::<M>(created)))
}

/// Fetch a single entity by identifier
///
/// Relations configured on the model are eagerly embedded. Responds 404
/// with `No <type> found with ID: <id>` when nothing matches.
pub async fn get_one<M: Model, S: DocumentStore>(store: &S, id: &str) -> Result<Envelope> {
    let Some(mut doc) = store.find_by_id(M::COLLECTION, id).await? else {
        return Err(Error::no_document(M::SINGULAR, id));
    };
    for expansion in M::expansions() {
        expand(store, &mut doc, expansion).await?;
    }
    Ok(Envelope::item(M::SINGULAR, strip_hidden::<M>(doc)))
}

/// List entities through the query-feature pipeline
///
/// `scope` carries ancestor-resource conditions (e.g. reviews of one tour)
/// that apply before anything the envelope asks for. An empty match set is
/// a success with `results: 0`, never a 404.
pub async fn get_all<M: Model, S: DocumentStore>(
    store: &S,
    scope: Vec<FilterCondition>,
    params: QueryParams,
) -> Result<Envelope> {
    let query = QueryFeatures::scoped(params, scope)
        .filter()
        .sort()
        .limit_fields()
        .paginate()
        .into_query();
    let docs = store.find(M::COLLECTION, &query).await?;
    let docs = docs.into_iter().map(strip_hidden::<M>).collect();
    Ok(Envelope::list(M::COLLECTION, docs))
}

/// Apply a partial patch to an entity by identifier
///
/// The model's validation re-runs against the merged document inside the
/// store's single round trip, so the patch is atomic from the caller's
/// perspective. Responds with the post-update entity, or 404 with the
/// shared message shape.
pub async fn update_one<M: Model, S: DocumentStore>(
    store: &S,
    id: &str,
    body: Value,
) -> Result<Envelope> {
    let patch = into_document(body)?;
    let updated = store
        .update(M::COLLECTION, id, patch, |merged| {
            M::validate(merged).map_err(Into::into)
        })
        .await?;
    match updated {
        Some(doc) => Ok(Envelope::item(M::SINGULAR, strip_hidden::<M>(doc))),
        None => Err(Error::no_document(M::SINGULAR, id)),
    }
}

/// Remove an entity by identifier
///
/// Responds 204 with no body, or 404 with the shared message shape.
pub async fn delete_one<M: Model, S: DocumentStore>(store: &S, id: &str) -> Result<Envelope> {
    if store.delete(M::COLLECTION, id).await? {
        Ok(Envelope::no_content())
    } else {
        Err(Error::no_document(M::SINGULAR, id))
    }
}

fn into_document(body: Value) -> Result<Document> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(Error::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Drop a model's hidden fields from a document before it leaves the API
pub fn strip_hidden<M: Model>(mut doc: Document) -> Document {
    for field in M::hidden_fields() {
        doc.remove(*field);
    }
    doc
}

/// Embed one related entity in place of its stored identifier
async fn expand<S: DocumentStore>(
    store: &S,
    doc: &mut Document,
    expansion: &Expansion,
) -> Result<()> {
    let Some(related_id) = doc
        .get(expansion.field)
        .and_then(Value::as_str)
        .map(String::from)
    else {
        return Ok(());
    };
    let Some(related) = store.find_by_id(expansion.collection, &related_id).await? else {
        return Ok(());
    };

    let mut embedded = Document::new();
    if let Some(id) = related.get(ID_FIELD) {
        embedded.insert(ID_FIELD.to_string(), id.clone());
    }
    for field in expansion.select {
        if let Some(value) = related.get(*field) {
            embedded.insert((*field).to_string(), value.clone());
        }
    }
    doc.insert(expansion.field.to_string(), Value::Object(embedded));
    Ok(())
}
