//! Schema types and builders for tfplug
//!
//! This module provides the schema system for declaring provider, resource
//! and data source attributes.

use crate::types::Dynamic;
use std::collections::BTreeMap;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(BTreeMap<String, AttributeType>),
}

impl AttributeType {
    /// Type constraint in Terraform's JSON notation, e.g. `["list","string"]`
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            AttributeType::String => Value::from("string"),
            AttributeType::Number => Value::from("number"),
            AttributeType::Bool => Value::from("bool"),
            AttributeType::List(elem) => Value::Array(vec![Value::from("list"), elem.to_json()]),
            AttributeType::Map(elem) => Value::Array(vec![Value::from("map"), elem.to_json()]),
            AttributeType::Object(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, field_type)| (name.clone(), field_type.to_json()))
                    .collect();
                Value::Array(vec![Value::from("object"), Value::Object(fields)])
            }
        }
    }

    /// Whether `value` carries the right type tag. Null and unknown always conform.
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (value, self) {
            (Dynamic::Null, _) | (Dynamic::Unknown, _) => true,
            (Dynamic::String(_), AttributeType::String) => true,
            (Dynamic::Number(_), AttributeType::Number) => true,
            (Dynamic::Bool(_), AttributeType::Bool) => true,
            (Dynamic::List(items), AttributeType::List(elem)) => {
                items.iter().all(|item| elem.accepts(item))
            }
            (Dynamic::Map(entries), AttributeType::Map(elem)) => {
                entries.values().all(|entry| elem.accepts(entry))
            }
            (Dynamic::Map(entries), AttributeType::Object(fields)) => {
                entries.iter().all(|(name, entry)| {
                    fields
                        .get(name)
                        .is_some_and(|field_type| field_type.accepts(entry))
                })
            }
            _ => false,
        }
    }
}

/// Schema of a provider block, resource or data source
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|attr| attr.name == name)
    }
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub description: String,
}

/// Attribute represents a single configuration attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
}

impl Attribute {
    /// Computed and never settable from configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    version: 0,
                    attributes: Vec::new(),
                    description: String::new(),
                },
            },
        }
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("product", AttributeType::String)
            .description("Product code")
            .required()
            .build();

        assert_eq!(attr.name, "product");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert!(!attr.is_computed_only());
        assert_eq!(attr.description, "Product code");
    }

    #[test]
    fn schema_builder_creates_schema_with_attributes() {
        let schema = SchemaBuilder::new()
            .version(1)
            .description("Test resource schema")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .build(),
            )
            .build();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.block.attributes.len(), 2);
        assert_eq!(schema.block.description, "Test resource schema");
        assert!(schema.attribute("id").unwrap().is_computed_only());
        assert!(schema.attribute("missing").is_none());
    }

    #[test]
    fn type_constraint_json_matches_terraform_notation() {
        let element = AttributeType::Object(BTreeMap::from([
            ("id".to_string(), AttributeType::Number),
            ("name".to_string(), AttributeType::String),
        ]));
        let list = AttributeType::List(Box::new(element));

        assert_eq!(AttributeType::String.to_json().to_string(), r#""string""#);
        assert_eq!(
            list.to_json().to_string(),
            r#"["list",["object",{"id":"number","name":"string"}]]"#
        );
    }

    #[test]
    fn type_tags_are_checked_recursively() {
        let element = AttributeType::Object(BTreeMap::from([(
            "id".to_string(),
            AttributeType::Number,
        )]));
        let list = AttributeType::List(Box::new(element));

        let good = Dynamic::List(vec![Dynamic::Map(HashMap::from([(
            "id".to_string(),
            Dynamic::Number(1.0),
        )]))]);
        let bad = Dynamic::List(vec![Dynamic::Map(HashMap::from([(
            "id".to_string(),
            Dynamic::String("1".to_string()),
        )]))]);

        assert!(list.accepts(&good));
        assert!(!list.accepts(&bad));
        assert!(AttributeType::String.accepts(&Dynamic::Unknown));
        assert!(!AttributeType::String.accepts(&Dynamic::Bool(true)));
    }
}
