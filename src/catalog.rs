//! Logical export model: catalogs own resources, resources are sampled
//! through representations, and a [`CatalogItem`] names one exportable series.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl Catalog {
    pub fn new(id: impl Into<String>) -> Self {
        Catalog { id: id.into(), properties: None }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Resource { id: id.into(), properties: None }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// The physical unit, taken from the `"unit"` property when it is a string.
    pub fn unit(&self) -> Option<&str> {
        self.properties.as_ref()?.get("unit")?.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    pub id: String,
    pub sample_period: Duration,
    /// Parameters in insertion order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<(String, String)>>,
}

impl Representation {
    pub fn new(id: impl Into<String>, sample_period: Duration) -> Self {
        Representation { id: id.into(), sample_period, parameters: None }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }
}

/// One exportable time series: (catalog, resource, representation).
///
/// Equality and hashing only consider identifiers and representation
/// parameters, never property bags.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub catalog: Arc<Catalog>,
    pub resource: Arc<Resource>,
    pub representation: Arc<Representation>,
}

impl CatalogItem {
    pub fn new(catalog: Arc<Catalog>, resource: Arc<Resource>, representation: Arc<Representation>) -> Self {
        CatalogItem { catalog, resource, representation }
    }

    /// Channel display name: `resource_representation`, followed by
    /// `(k=v,k=v)` when the representation carries parameters.
    pub fn channel_name(&self) -> String {
        let mut name = format!("{}_{}", self.resource.id, self.representation.id);
        if let Some(parameters) = self.representation.parameters.as_ref().filter(|p| !p.is_empty()) {
            let rendered: Vec<String> = parameters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            name.push('(');
            name.push_str(&rendered.join(","));
            name.push(')');
        }
        name
    }
}

impl PartialEq for CatalogItem {
    fn eq(&self, other: &Self) -> bool {
        self.catalog.id == other.catalog.id
            && self.resource.id == other.resource.id
            && self.representation.id == other.representation.id
            && self.representation.parameters == other.representation.parameters
    }
}

impl Eq for CatalogItem {}

impl Hash for CatalogItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.catalog.id.hash(state);
        self.resource.id.hash(state);
        self.representation.id.hash(state);
        self.representation.parameters.hash(state);
    }
}

impl fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.catalog.id, self.channel_name())
    }
}

/// A batch entry for [`crate::session::DataWriter::write`].
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub item: CatalogItem,
    pub data: Vec<f64>,
}

impl WriteRequest {
    pub fn new(item: CatalogItem, data: Vec<f64>) -> Self {
        WriteRequest { item, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(parameters: &[(&str, &str)]) -> CatalogItem {
        let mut representation = Representation::new("1_s_mean", Duration::from_secs(1));
        for (k, v) in parameters {
            representation = representation.with_parameter(*k, *v);
        }
        CatalogItem::new(
            Arc::new(Catalog::new("/A/B")),
            Arc::new(Resource::new("T1")),
            Arc::new(representation),
        )
    }

    #[test]
    fn channel_name_without_parameters() {
        assert_eq!(item(&[]).channel_name(), "T1_1_s_mean");
    }

    #[test]
    fn channel_name_keeps_parameter_insertion_order() {
        let name = item(&[("window", "5"), ("alpha", "0.1")]).channel_name();
        assert_eq!(name, "T1_1_s_mean(window=5,alpha=0.1)");
        assert_eq!(name, item(&[("window", "5"), ("alpha", "0.1")]).channel_name());
    }

    #[test]
    fn identity_ignores_properties() {
        let a = item(&[]);
        let mut b = item(&[]);
        let mut props = Properties::new();
        props.insert("unit".into(), Value::String("°C".into()));
        b.resource = Arc::new(Resource::new("T1").with_properties(props));
        assert_eq!(a, b);
        assert_ne!(a, item(&[("window", "5")]));
    }

    #[test]
    fn unit_reads_string_property() {
        let mut props = Properties::new();
        props.insert("unit".into(), Value::String("m/s".into()));
        assert_eq!(Resource::new("v").with_properties(props).unit(), Some("m/s"));

        let mut numeric = Properties::new();
        numeric.insert("unit".into(), Value::from(3));
        assert_eq!(Resource::new("v").with_properties(numeric).unit(), None);
        assert_eq!(Resource::new("v").unit(), None);
    }
}
