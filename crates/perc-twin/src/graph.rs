//! Digital-twin graph
//!
//! Loads a twin export of the form
//!
//! ```json
//! {
//!   "digitalTwinsGraph": { "digitalTwins": [...], "relationships": [...] },
//!   "digitalTwinsModels": [...]
//! }
//! ```
//!
//! and indexes twins by `$dtId`, relationships by `($relationshipName,
//! $sourceId)` and models by the transitive closure of their `extends`.

use crate::error::TwinError;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One twin: identifier, model and remaining properties
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Twin {
    /// `$dtId`
    #[serde(rename = "$dtId")]
    pub id: String,
    #[serde(rename = "$metadata")]
    metadata: Metadata,
    /// Every other property, as found in the document
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Metadata {
    #[serde(rename = "$model")]
    model: String,
}

impl Twin {
    /// Model identifier from `$metadata.$model`
    #[must_use]
    pub fn model(&self) -> &str {
        &self.metadata.model
    }

    /// Numeric property, `None` if absent
    ///
    /// # Errors
    /// Returns [`TwinError::InvalidProperty`] if present but not a number
    pub fn number(&self, property: &str) -> Result<Option<f64>, TwinError> {
        match self.properties.get(property) {
            None => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| self.invalid(property, "number")),
        }
    }

    /// String property, `None` if absent
    ///
    /// # Errors
    /// Returns [`TwinError::InvalidProperty`] if present but not a string
    pub fn string(&self, property: &str) -> Result<Option<&str>, TwinError> {
        match self.properties.get(property) {
            None => Ok(None),
            Some(value) => value.as_str().map(Some).ok_or_else(|| self.invalid(property, "string")),
        }
    }

    fn invalid(&self, property: &str, expected: &'static str) -> TwinError {
        TwinError::InvalidProperty {
            twin: self.id.clone(),
            property: property.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Relationship {
    #[serde(rename = "$relationshipName")]
    name: String,
    #[serde(rename = "$sourceId")]
    source: String,
    #[serde(rename = "$targetId")]
    target: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
struct Model {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default)]
    extends: Option<Extends>,
}

impl Model {
    fn parents(&self) -> Vec<String> {
        match &self.extends {
            None => Vec::new(),
            Some(Extends::One(parent)) => vec![parent.clone()],
            Some(Extends::Many(parents)) => parents.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TwinDocument {
    digital_twins_graph: GraphSection,
    #[serde(default)]
    digital_twins_models: Vec<Model>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphSection {
    #[serde(default)]
    digital_twins: Vec<Twin>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

/// Indexed twin graph
#[derive(Debug, Clone)]
pub struct TwinGraph {
    twins: IndexMap<String, Twin>,
    relationships: HashMap<(String, String), Vec<String>>,
    is_a: HashMap<String, IndexSet<String>>,
}

impl TwinGraph {
    /// Parse and index a twin document
    ///
    /// # Errors
    /// - [`TwinError::Json`] for malformed input
    /// - [`TwinError::DuplicateTwin`] or [`TwinError::DuplicateModel`] for
    ///   repeated identifiers
    /// - [`TwinError::UnknownTwin`] for a relationship to a missing twin
    pub fn from_json(text: &str) -> Result<Self, TwinError> {
        let document: TwinDocument = serde_json::from_str(text)?;
        Self::from_parts(
            document.digital_twins_graph.digital_twins,
            document.digital_twins_graph.relationships,
            document.digital_twins_models,
        )
    }

    fn from_parts(
        twin_list: Vec<Twin>,
        relationship_list: Vec<Relationship>,
        models: Vec<Model>,
    ) -> Result<Self, TwinError> {
        let mut twins = IndexMap::with_capacity(twin_list.len());
        for twin in twin_list {
            if twins.contains_key(&twin.id) {
                return Err(TwinError::DuplicateTwin(twin.id));
            }
            twins.insert(twin.id.clone(), twin);
        }

        let mut relationships: HashMap<(String, String), Vec<String>> = HashMap::new();
        for rel in relationship_list {
            if !twins.contains_key(&rel.target) {
                return Err(TwinError::UnknownTwin {
                    relationship: rel.name,
                    source_id: rel.source,
                    target: rel.target,
                });
            }
            relationships
                .entry((rel.name, rel.source))
                .or_default()
                .push(rel.target);
        }

        let is_a = model_closure(&models)?;
        debug!(
            twins = twins.len(),
            models = is_a.len(),
            "indexed twin graph"
        );
        Ok(Self {
            twins,
            relationships,
            is_a,
        })
    }

    /// Twin by identifier
    #[must_use]
    pub fn twin(&self, id: &str) -> Option<&Twin> {
        self.twins.get(id)
    }

    /// Whether `twin`'s model is `model` or extends it, directly or not
    #[must_use]
    pub fn is_a(&self, twin: &Twin, model: &str) -> bool {
        match self.is_a.get(twin.model()) {
            Some(supertypes) => supertypes.contains(model),
            None => twin.model() == model,
        }
    }

    /// Twins of `model` (any twin for `None`), in document order
    pub fn twins<'g>(&'g self, model: Option<&'g str>) -> impl Iterator<Item = &'g Twin> + 'g {
        self.twins
            .values()
            .filter(move |twin| model.map_or(true, |m| self.is_a(twin, m)))
    }

    /// Targets of `relationship` edges leaving `source` whose model is `target_model`
    pub fn rel_targets<'g>(
        &'g self,
        relationship: &str,
        source: &str,
        target_model: &'g str,
    ) -> impl Iterator<Item = &'g Twin> + 'g {
        self.relationships
            .get(&(relationship.to_string(), source.to_string()))
            .into_iter()
            .flatten()
            .filter_map(|target| self.twins.get(target))
            .filter(move |twin| self.is_a(twin, target_model))
    }

    /// Every model `model` is, itself included; `None` for an undeclared model
    #[must_use]
    pub fn supertypes(&self, model: &str) -> Option<&IndexSet<String>> {
        self.is_a.get(model)
    }

    /// Number of twins
    #[must_use]
    pub fn len(&self) -> usize {
        self.twins.len()
    }

    /// Whether there are no twins
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.twins.is_empty()
    }
}

/// Transitive `extends` closure with a worklist per model; revisits are
/// skipped, so cycles terminate
fn model_closure(models: &[Model]) -> Result<HashMap<String, IndexSet<String>>, TwinError> {
    let mut parents: HashMap<&str, Vec<String>> = HashMap::with_capacity(models.len());
    for model in models {
        if parents.insert(&model.id, model.parents()).is_some() {
            return Err(TwinError::DuplicateModel(model.id.clone()));
        }
    }

    let mut closure = HashMap::with_capacity(models.len());
    for model in models {
        let mut seen = IndexSet::new();
        let mut pending = vec![model.id.clone()];
        while let Some(current) = pending.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            match parents.get(current.as_str()) {
                Some(next) => pending.extend(next.iter().cloned()),
                None => warn!(
                    model = %model.id,
                    extends = %current,
                    "extended model is not declared"
                ),
            }
        }
        closure.insert(model.id.clone(), seen);
    }
    Ok(closure)
}
