//! Pattern-based entity extraction
//!
//! Scans input text against an ordered table of category-tagged regex
//! patterns and returns deduplicated, position-sorted mentions. The
//! table is compiled once into a static and shared read-only across all
//! requests — extraction is pure and never fails on string input.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Confidence assigned to every lexical match. Pattern matching has no
/// model-derived scoring; all matches are equally weighted.
pub const PATTERN_CONFIDENCE: f32 = 0.8;

/// Closed set of entity categories understood by the graph layer.
///
/// `person`, `organization`, and `location` are part of the wire
/// enumeration but currently ship no seed patterns — the vocabulary only
/// covers what shows up in engineering notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Date,
    Technology,
    Concept,
}

impl EntityType {
    /// Lowercase wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "person",
            EntityType::Organization => "organization",
            EntityType::Location => "location",
            EntityType::Date => "date",
            EntityType::Technology => "technology",
            EntityType::Concept => "concept",
        }
    }
}

/// A single entity mention found in the input text.
///
/// `start`/`end` are byte offsets into the original input (0-indexed,
/// end-exclusive), so `&text[start..end] == name` holds verbatim with
/// the source casing preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Ordered category → pattern table. Declaration order matters: the
/// first category/pattern to claim an exact span wins deduplication.
///
/// Patterns are word-boundary anchored and case-insensitive. They are
/// illustrative vocabulary lists, not a grammar.
static PATTERNS: LazyLock<Vec<(EntityType, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            EntityType::Technology,
            compile(&[
                r"(?i)\b(?:Python|Rust|JavaScript|TypeScript|Go|Java|C\+\+|Ruby|Swift|Kotlin)\b",
                r"(?i)\b(?:React|Vue|Angular|Next\.js|FastAPI|Django|Flask|Express)\b",
                r"(?i)\b(?:PostgreSQL|MySQL|MongoDB|Redis|SurrealDB|Neo4j|Elasticsearch)\b",
                r"(?i)\b(?:Docker|Kubernetes|AWS|GCP|Azure|Terraform|Ansible)\b",
                r"(?i)\b(?:TensorFlow|PyTorch|scikit-learn|XGBoost|LangChain)\b",
                r"(?i)\b(?:GPT-\d|Claude|LLaMA|BERT|Transformer)\b",
                r"(?i)\b(?:API|REST|GraphQL|gRPC|WebSocket)\b",
            ]),
        ),
        (
            EntityType::Date,
            compile(&[
                r"(?i)\b\d{4}-\d{2}-\d{2}\b",
                r"(?i)\b\d{1,2}/\d{1,2}/\d{4}\b",
                r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b",
                r"(?i)\bQ[1-4]\s+\d{4}\b",
            ]),
        ),
        (
            EntityType::Concept,
            compile(&[
                r"(?i)\b(?:machine learning|deep learning|neural network|artificial intelligence)\b",
                r"(?i)\b(?:knowledge graph|vector search|semantic search|RAG)\b",
                r"(?i)\b(?:microservices?|serverless|event-driven|distributed system)\b",
            ]),
        ),
    ]
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in entity pattern must compile"))
        .collect()
}

/// Extract entity mentions from `text`.
///
/// Scans every category and pattern in declaration order; each match is
/// recorded with its verbatim surface text, byte span, category, and the
/// flat [`PATTERN_CONFIDENCE`]. Exact duplicates (same lowercased text
/// at the same span) are dropped in favor of the first claimant.
/// Overlapping (but not identical) spans from different patterns all
/// survive. The result is stably sorted ascending by start offset.
///
/// Total over any input: no matches yields an empty list, never an error.
pub fn extract(text: &str) -> Vec<ExtractedEntity> {
    let mut entities: Vec<ExtractedEntity> = Vec::new();
    // Dedupe by (lowercased name, start, end)
    let mut seen: HashSet<(String, usize, usize)> = HashSet::new();

    for (entity_type, patterns) in PATTERNS.iter() {
        for pattern in patterns {
            for found in pattern.find_iter(text) {
                let key = (found.as_str().to_lowercase(), found.start(), found.end());
                if !seen.insert(key) {
                    continue;
                }

                entities.push(ExtractedEntity {
                    name: found.as_str().to_string(),
                    entity_type: *entity_type,
                    start: found.start(),
                    end: found.end(),
                    confidence: PATTERN_CONFIDENCE,
                });
            }
        }
    }

    // Stable sort: ties keep scan order
    entities.sort_by_key(|e| e.start);

    tracing::debug!(
        count = entities.len(),
        text_len = text.len(),
        "Extracted entities"
    );

    entities
}
