use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::metadata::Metadata;

/// Well-known collection name used when none is configured
pub const DEFAULT_COLLECTION_NAME: &str = "my_documents";

/// Description tag attached to the collection on creation
pub const COLLECTION_DESCRIPTION: &str = "My document collection";

/// Result count used when the caller gives none or an unusable one
pub const DEFAULT_QUERY_LIMIT: usize = 5;

/// One editable row: document text plus free-form metadata text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub document: String,
    pub metadata: String,
}

impl DocumentEntry {
    pub fn new(document: impl Into<String>, metadata: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            metadata: metadata.into(),
        }
    }
}

/// Distance function a collection ranks with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    #[serde(rename = "ip")]
    InnerProduct,
}

impl DistanceMetric {
    /// Value of the `hnsw:space` collection setting
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2 => "l2",
            DistanceMetric::InnerProduct => "ip",
        }
    }

    /// Parse an `hnsw:space` value. Stores default to `l2` when unset.
    pub fn from_space(space: Option<&str>) -> Self {
        match space {
            Some("cosine") => DistanceMetric::Cosine,
            Some("ip") => DistanceMetric::InnerProduct,
            _ => DistanceMetric::L2,
        }
    }

    /// Distance between two embeddings of equal length.
    ///
    /// Cosine is `1 - cos(a, b)` (zero vectors are maximally dissimilar), L2 is
    /// the squared euclidean distance and inner product is `1 - a·b`.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => {
                let dot = dot(a, b);
                let norm = (dot_self(a) * dot_self(b)).sqrt();
                if norm == 0.0 {
                    1.0
                } else {
                    1.0 - dot / norm
                }
            }
            DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            DistanceMetric::InnerProduct => 1.0 - dot(a, b),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn dot_self(a: &[f32]) -> f32 {
    dot(a, a)
}

/// Similarity percentage derived from a distance.
pub struct Similarity;

impl Similarity {
    /// `(1 - distance) * 100` for a cosine distance within `[0, 1]`.
    ///
    /// Cosine distances above 1 (opposing vectors) and the unbounded metrics
    /// yield `None` instead of a negative percentage. Rounding below zero on
    /// exact matches is capped at 100.
    pub fn percent(distance: f32, metric: DistanceMetric) -> Option<f32> {
        match metric {
            DistanceMetric::Cosine if distance <= 1.0 => Some((1.0 - distance.max(0.0)) * 100.0),
            DistanceMetric::Cosine | DistanceMetric::L2 | DistanceMetric::InnerProduct => None,
        }
    }
}

/// Nested query response as returned by a store: outer index is the query,
/// inner index the rank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBatch {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub distances: Vec<Vec<f32>>,
    pub metadatas: Vec<Vec<Metadata>>,
}

impl QueryBatch {
    /// Results for the first query text, or empty sequences when the store
    /// returned nothing for it.
    pub fn into_first(self) -> QueryResult {
        fn first<T>(outer: Vec<Vec<T>>) -> Vec<T> {
            outer.into_iter().next().unwrap_or_default()
        }

        QueryResult::aligned(
            first(self.documents),
            first(self.distances),
            first(self.metadatas),
            first(self.ids),
        )
    }
}

/// Ranked hits for one query. The four sequences are position-aligned,
/// equally long and ordered by ascending distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    pub documents: Vec<String>,
    pub distances: Vec<f32>,
    #[schema(value_type = Vec<Object>)]
    pub metadatas: Vec<Metadata>,
    pub ids: Vec<String>,
}

impl QueryResult {
    /// Build a result, truncating every sequence to the shortest so positions
    /// always line up.
    pub fn aligned(
        mut documents: Vec<String>,
        mut distances: Vec<f32>,
        mut metadatas: Vec<Metadata>,
        mut ids: Vec<String>,
    ) -> Self {
        let len = documents
            .len()
            .min(distances.len())
            .min(metadatas.len())
            .min(ids.len());
        documents.truncate(len);
        distances.truncate(len);
        metadatas.truncate(len);
        ids.truncate(len);

        Self {
            documents,
            distances,
            metadatas,
            ids,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn hits(&self) -> impl Iterator<Item = Hit<'_>> {
        self.ids
            .iter()
            .zip(&self.documents)
            .zip(&self.distances)
            .zip(&self.metadatas)
            .enumerate()
            .map(|(rank, (((id, document), distance), metadata))| Hit {
                rank,
                id,
                document,
                distance: *distance,
                metadata,
            })
    }
}

/// A single ranked hit borrowed from a [`QueryResult`]
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub rank: usize,
    pub id: &'a str,
    pub document: &'a str,
    pub distance: f32,
    pub metadata: &'a Metadata,
}

/// A completed similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub query: String,
    pub limit: usize,
    pub metric: DistanceMetric,
    pub results: QueryResult,
}

/// Identifiers assigned to an added batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddOutcome {
    pub ids: Vec<String>,
    pub count: usize,
}

/// A document as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Metadata,
    pub embedding: Option<Vec<f32>>,
}

/// Collection listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionInfo {
    pub name: String,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

/// Shape of a stored embedding, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddingSummary {
    pub dimension: usize,
    /// First ten components
    pub preview: Vec<f32>,
    pub min: f32,
    pub max: f32,
}

impl EmbeddingSummary {
    pub fn of(embedding: &[f32]) -> Option<Self> {
        if embedding.is_empty() {
            return None;
        }

        let (min, max) = embedding
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        Some(Self {
            dimension: embedding.len(),
            preview: embedding.iter().take(10).copied().collect(),
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InspectedDocument {
    pub id: String,
    pub document: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
    /// `None` when the store holds no vector for the document
    pub embedding: Option<EmbeddingSummary>,
}

/// What a collection currently holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InspectionReport {
    pub collection: String,
    pub metric: DistanceMetric,
    pub count: usize,
    pub ids: Vec<String>,
    pub documents: Vec<InspectedDocument>,
}

impl InspectionReport {
    pub fn from_documents(
        collection: String,
        metric: DistanceMetric,
        stored: Vec<StoredDocument>,
    ) -> Self {
        let ids = stored.iter().map(|d| d.id.clone()).collect();
        let documents: Vec<InspectedDocument> = stored
            .into_iter()
            .map(|d| InspectedDocument {
                embedding: d.embedding.as_deref().and_then(EmbeddingSummary::of),
                id: d.id,
                document: d.document,
                metadata: d.metadata,
            })
            .collect();

        Self {
            collection,
            metric,
            count: documents.len(),
            ids,
            documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::index_metadata;

    #[test]
    fn test_similarity_percent_only_for_cosine() {
        let percent = Similarity::percent(0.25, DistanceMetric::Cosine).unwrap();
        assert!((percent - 75.0).abs() < 1e-4);
        assert_eq!(Similarity::percent(0.25, DistanceMetric::L2), None);
        assert_eq!(Similarity::percent(0.25, DistanceMetric::InnerProduct), None);
    }

    #[test]
    fn test_similarity_percent_outside_unit_range() {
        assert_eq!(Similarity::percent(1.4444444, DistanceMetric::Cosine), None);
        assert_eq!(Similarity::percent(2.0, DistanceMetric::Cosine), None);
        assert_eq!(Similarity::percent(1.0, DistanceMetric::Cosine), Some(0.0));
        assert_eq!(Similarity::percent(0.0, DistanceMetric::Cosine), Some(100.0));
        assert_eq!(Similarity::percent(-1e-7, DistanceMetric::Cosine), Some(100.0));
    }

    #[test]
    fn test_cosine_distance() {
        let metric = DistanceMetric::Cosine;
        assert!(metric.distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((metric.distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((metric.distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(metric.distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_l2_is_squared() {
        assert_eq!(DistanceMetric::L2.distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn test_metric_from_space() {
        assert_eq!(DistanceMetric::from_space(Some("cosine")), DistanceMetric::Cosine);
        assert_eq!(DistanceMetric::from_space(Some("ip")), DistanceMetric::InnerProduct);
        assert_eq!(DistanceMetric::from_space(None), DistanceMetric::L2);
    }

    #[test]
    fn test_into_first_empty_batch() {
        let result = QueryBatch::default().into_first();
        assert!(result.is_empty());
        assert_eq!(result.documents.len(), 0);
        assert_eq!(result.metadatas.len(), 0);
    }

    #[test]
    fn test_aligned_truncates_to_shortest() {
        let result = QueryResult::aligned(
            vec!["a".into(), "b".into()],
            vec![0.1, 0.2],
            vec![index_metadata(0)],
            vec!["id_a".into(), "id_b".into()],
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.documents.len(), result.distances.len());
        assert_eq!(result.ids.len(), result.metadatas.len());
    }

    #[test]
    fn test_hits_are_ranked_in_order() {
        let result = QueryResult::aligned(
            vec!["a".into(), "b".into()],
            vec![0.1, 0.2],
            vec![index_metadata(0), index_metadata(1)],
            vec!["id_a".into(), "id_b".into()],
        );
        let hits: Vec<_> = result.hits().collect();
        assert_eq!(hits[1].rank, 1);
        assert_eq!(hits[1].id, "id_b");
        assert_eq!(hits[1].document, "b");
    }

    #[test]
    fn test_embedding_summary() {
        let summary = EmbeddingSummary::of(&[0.5, -0.25, 1.0]).unwrap();
        assert_eq!(summary.dimension, 3);
        assert_eq!(summary.min, -0.25);
        assert_eq!(summary.max, 1.0);
        assert!(EmbeddingSummary::of(&[]).is_none());
    }

    #[test]
    fn test_inspection_report_counts() {
        let report = InspectionReport::from_documents(
            "my_documents".into(),
            DistanceMetric::Cosine,
            vec![StoredDocument {
                id: "doc_1_0".into(),
                document: Some("hello".into()),
                metadata: index_metadata(0),
                embedding: Some(vec![0.1, 0.2]),
            }],
        );
        assert_eq!(report.count, 1);
        assert_eq!(report.ids, vec!["doc_1_0".to_string()]);
        assert_eq!(report.documents[0].embedding.as_ref().unwrap().dimension, 2);
    }
}
