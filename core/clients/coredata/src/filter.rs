use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;

/// Predicate selecting records returned by a core-data query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Filter {
    /// Select records whose attribute is equal to any of the given values.
    In { field: String, values: Vec<Json> },
}

impl Filter {
    /// Select records whose attribute is equal to any of the given values.
    pub fn field_in<F, I, V>(field: F, values: I) -> Filter
    where
        F: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Json>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a raw record is selected by the filter.
    pub fn matches(&self, record: &Json) -> bool {
        match self {
            Filter::In { field, values } => match record.get(field) {
                None => false,
                Some(value) => values.contains(value),
            },
        }
    }
}
