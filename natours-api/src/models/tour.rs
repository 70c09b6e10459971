//! Tour entity
//!
//! Schema constraints mirror what the booking site sells: a named, priced
//! tour with a duration, group size, and difficulty. Also holds the
//! aggregate computations the tour routes expose (stats by difficulty,
//! monthly plan).

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::Document;

use super::{ConstraintChecker, Model, ValidationError};

/// Difficulty grades a tour may carry
pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "difficult"];

/// Rating average assigned to a tour nobody has reviewed yet
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

/// A tour as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: String,
    pub name: String,
    pub duration: f64,
    pub max_group_size: f64,
    pub difficulty: String,
    #[serde(default = "default_ratings_average")]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_ratings_average() -> f64 {
    DEFAULT_RATINGS_AVERAGE
}

impl Tour {
    /// Deserialize a stored document into the typed entity
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc.clone()))
    }
}

impl Model for Tour {
    const COLLECTION: &'static str = "tours";
    const SINGULAR: &'static str = "tour";

    fn validate(doc: &Document) -> Result<(), ValidationError> {
        let mut checker = ConstraintChecker::new();
        checker.require_string(doc, "name", "A tour must have a name");
        checker.require_positive_number(doc, "duration", "A tour must have a duration");
        checker.require_positive_number(doc, "maxGroupSize", "A tour must have a group size");
        checker.require_string(doc, "difficulty", "A tour must have a difficulty");
        checker.check_one_of(
            doc,
            "difficulty",
            &DIFFICULTIES,
            "Difficulty is either: easy, medium, difficult",
        );
        checker.require_positive_number(doc, "price", "A tour must have a price");
        checker.check_range(
            doc,
            "ratingsAverage",
            1.0,
            5.0,
            "Rating must be between 1.0 and 5.0",
        );
        if let (Some(discount), Some(price)) = (
            doc.get("priceDiscount").and_then(Value::as_f64),
            doc.get("price").and_then(Value::as_f64),
        ) {
            if discount >= price {
                checker.fail("Discount price should be below regular price");
            }
        }
        checker.require_string(doc, "summary", "A tour must have a summary");
        checker.require_string(doc, "imageCover", "A tour must have a cover image");
        checker.finish()
    }

    fn defaults() -> Vec<(&'static str, Value)> {
        vec![
            ("ratingsAverage", json!(DEFAULT_RATINGS_AVERAGE)),
            ("ratingsQuantity", json!(0)),
        ]
    }
}

/// Aggregate figures for one difficulty grade
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    pub difficulty: String,
    pub num_tours: usize,
    pub num_ratings: f64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Group all tours by difficulty and fold price/rating aggregates
///
/// Returned cheapest group first.
pub fn stats_by_difficulty(docs: &[Document]) -> Vec<DifficultyStats> {
    let mut groups: std::collections::BTreeMap<String, Vec<&Document>> = Default::default();
    for doc in docs {
        let Some(difficulty) = doc.get("difficulty").and_then(Value::as_str) else {
            continue;
        };
        groups.entry(difficulty.to_string()).or_default().push(doc);
    }

    let mut stats: Vec<DifficultyStats> = groups
        .into_iter()
        .map(|(difficulty, tours)| {
            let num_tours = tours.len();
            let field_sum = |field: &str| -> f64 {
                tours
                    .iter()
                    .filter_map(|d| d.get(field).and_then(Value::as_f64))
                    .sum()
            };
            let prices: Vec<f64> = tours
                .iter()
                .filter_map(|d| d.get("price").and_then(Value::as_f64))
                .collect();
            DifficultyStats {
                difficulty,
                num_tours,
                num_ratings: field_sum("ratingsQuantity"),
                avg_rating: field_sum("ratingsAverage") / num_tours as f64,
                avg_price: field_sum("price") / num_tours as f64,
                min_price: prices.iter().copied().fold(f64::INFINITY, f64::min),
                max_price: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect();
    stats.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));
    stats
}

/// How many tours start in each month of a year, busiest month first
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlanEntry {
    pub month: u32,
    pub num_tour_starts: usize,
    pub tours: Vec<String>,
}

/// Bucket tour start dates of one calendar year by month
pub fn monthly_plan(docs: &[Document], year: i32) -> Vec<MonthlyPlanEntry> {
    let mut months: std::collections::BTreeMap<u32, Vec<String>> = Default::default();
    for doc in docs {
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(dates) = doc.get("startDates").and_then(Value::as_array) else {
            continue;
        };
        for date in dates {
            let Some(parsed) = date
                .as_str()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            else {
                continue;
            };
            if parsed.year() == year {
                months.entry(parsed.month()).or_default().push(name.clone());
            }
        }
    }

    let mut plan: Vec<MonthlyPlanEntry> = months
        .into_iter()
        .map(|(month, tours)| MonthlyPlanEntry {
            month,
            num_tour_starts: tours.len(),
            tours,
        })
        .collect();
    plan.sort_by(|a, b| b.num_tour_starts.cmp(&a.num_tour_starts));
    plan
}
