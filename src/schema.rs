//! Declarative extraction schemas.
//!
//! A [`Schema`] describes what to pull out of a target page: a flat list of
//! named fields, each backed by a CSS selector. The engine itself never
//! interprets a schema — it is carried on every [`crate::job::Job`] and handed
//! to the content parser once a target page has been fetched.

use serde::{Deserialize, Serialize};

/// A single structured record extracted from a target page.
pub type Record = serde_json::Value;

/// How a field's value is read from the matched element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// The element's text content, whitespace-trimmed.
    Text,
    /// The element's inner HTML.
    Html,
    /// The value of a named attribute.
    Attribute(String),
}

/// One named field of an extraction schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub selector: String,
    pub kind: FieldKind,
}

/// A declarative description of the record to extract from a target page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    pub fn field(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Text,
        });
        self
    }

    /// Adds a field capturing inner HTML.
    pub fn html_field(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Html,
        });
        self
    }

    /// Adds a field capturing an attribute value.
    pub fn attr_field(
        mut self,
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            selector: selector.into(),
            kind: FieldKind::Attribute(attribute.into()),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_fields_in_order() {
        let schema = Schema::new()
            .field("title", "h1")
            .html_field("body", "article")
            .attr_field("image", "img.cover", "src");

        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.fields[0].name, "title");
        assert_eq!(schema.fields[1].kind, FieldKind::Html);
        assert_eq!(
            schema.fields[2].kind,
            FieldKind::Attribute("src".to_string())
        );
    }

    #[test]
    fn schema_round_trips_through_json() {
        let schema = Schema::new().field("title", "h1");
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
