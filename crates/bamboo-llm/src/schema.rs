//! Response schemas for structured output
//!
//! A [`Schema`] describes the JSON shape a generation call must return. It
//! serialises to the OpenAPI subset accepted by Gemini's `responseSchema`:
//! upper-case `type`, `properties` with `propertyOrdering`, `required`,
//! `items`, `enum`, numeric bounds and array length bounds.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// JSON schema node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_properties"
    )]
    pub properties: Vec<(String, Schema)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_ordering: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "as_string")]
    pub min_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "as_string")]
    pub max_items: Option<u32>,
}

// The properties map keeps declaration order; serde_json would otherwise sort it.
fn serialize_properties<S: Serializer>(
    props: &[(String, Schema)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(props.len()))?;
    for (name, schema) in props {
        map.serialize_entry(name, schema)?;
    }
    map.end()
}

// OpenAPI int64 fields are carried as strings.
fn as_string<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

impl Schema {
    fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            enum_values: Vec::new(),
            properties: Vec::new(),
            property_ordering: Vec::new(),
            required: Vec::new(),
            items: None,
            minimum: None,
            maximum: None,
            min_items: None,
            max_items: None,
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::of(SchemaType::Integer)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaType::Boolean)
    }

    #[must_use]
    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    #[must_use]
    pub fn array(items: Schema) -> Self {
        let mut schema = Self::of(SchemaType::Array);
        schema.items = Some(Box::new(items));
        schema
    }

    /// A string restricted to `values`
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self::string();
        schema.enum_values = values.into_iter().map(Into::into).collect();
        schema
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required property
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.optional_property_named(name, schema)
    }

    /// Add a property the model may omit
    #[must_use]
    pub fn optional_property(self, name: impl Into<String>, schema: Schema) -> Self {
        self.optional_property_named(name.into(), schema)
    }

    fn optional_property_named(mut self, name: String, schema: Schema) -> Self {
        self.property_ordering.push(name.clone());
        self.properties.push((name, schema));
        self
    }

    #[must_use]
    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    #[must_use]
    pub fn min_items(mut self, n: u32) -> Self {
        self.min_items = Some(n);
        self
    }

    #[must_use]
    pub fn max_items(mut self, n: u32) -> Self {
        self.max_items = Some(n);
        self
    }

    /// Look up a property schema by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }
}
