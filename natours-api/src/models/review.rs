//! Review entity
//!
//! A review always belongs to one tour and one user; the pair is unique
//! (one review per user per tour). Writing a review feeds back into the
//! tour's rating aggregates, recomputed here.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::store::{Document, DocumentStore, FilterCondition, ListQuery};

use super::tour::{Tour, DEFAULT_RATINGS_AVERAGE};
use super::{ConstraintChecker, Expansion, Model, ValidationError};

/// A review as stored
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub review: String,
    #[serde(default)]
    pub rating: Option<f64>,
    pub tour: String,
    pub user: String,
}

impl Model for Review {
    const COLLECTION: &'static str = "reviews";
    const SINGULAR: &'static str = "review";

    fn validate(doc: &Document) -> Result<(), ValidationError> {
        let mut checker = ConstraintChecker::new();
        checker.require_string(doc, "review", "Review cannot be empty!");
        checker.check_range(doc, "rating", 1.0, 5.0, "Rating must be between 1 and 5");
        checker.require_string(doc, "tour", "Review must belong to a tour");
        checker.require_string(doc, "user", "Review must belong to a user");
        checker.finish()
    }

    fn expansions() -> &'static [Expansion] {
        &[Expansion {
            field: "user",
            collection: "users",
            select: &["name", "photo"],
        }]
    }
}

/// Recompute a tour's rating aggregates from its current reviews
///
/// Called after every review write. A tour with no reviews left falls back
/// to zero ratings at the default average; a tour that no longer exists is
/// skipped.
pub async fn recalculate_tour_ratings<S: DocumentStore>(
    store: &S,
    tour_id: &str,
) -> Result<(), Error> {
    let query = ListQuery {
        filter: vec![FilterCondition::eq("tour", tour_id)],
        ..ListQuery::default()
    };
    let reviews = store.find(Review::COLLECTION, &query).await?;

    let ratings: Vec<f64> = reviews
        .iter()
        .filter_map(|doc| doc.get("rating").and_then(Value::as_f64))
        .collect();
    let (quantity, average) = if ratings.is_empty() {
        (0, DEFAULT_RATINGS_AVERAGE)
    } else {
        (
            ratings.len(),
            ratings.iter().sum::<f64>() / ratings.len() as f64,
        )
    };

    let mut patch = Document::new();
    patch.insert("ratingsQuantity".to_string(), quantity.into());
    patch.insert("ratingsAverage".to_string(), average.into());
    store
        .update(Tour::COLLECTION, tour_id, patch, |merged| {
            Tour::validate(merged).map_err(Into::into)
        })
        .await?;
    Ok(())
}
