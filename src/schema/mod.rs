//! Form schema definitions.
//!
//! A [`FormSchema`] is the runtime description of a form: an ordered list of
//! fields, each with a kind, required flag, optional default and constraints.
//! Schemas are built in code with the builder methods or deserialized from
//! YAML/JSON, then compiled into a [`CompiledSchema`] which owns the JSON
//! Schema validator used on every submission.

pub mod validate;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::SchemaError;

pub use validate::CompiledSchema;

/// Input kinds a form field can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Password,
    Email,
    Textarea,
    Integer,
    Number,
    Boolean,
    Date,
    Select,
}

impl FieldKind {
    /// JSON Schema primitive type accepted for this kind
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            _ => "string",
        }
    }

    pub fn is_string(&self) -> bool {
        self.json_type() == "string"
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Number)
    }

    /// JSON Schema `format` checked on top of the primitive type
    pub fn format(&self) -> Option<&'static str> {
        match self {
            FieldKind::Email => Some("email"),
            FieldKind::Date => Some("date"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

fn default_required() -> bool {
    true
}

/// A single form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// `false` admits `null`. A default only makes the key omittable.
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FormField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            label: None,
            description: None,
            placeholder: None,
            default: None,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            options: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Password)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Textarea)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn select(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Select)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min_length(mut self, len: u64) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: u64) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn option(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.push(SelectOption {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Key must be present in a submission
    pub fn is_required(&self) -> bool {
        self.required && self.default.is_none()
    }

    pub fn is_nullable(&self) -> bool {
        !self.required
    }

    /// Label shown next to the control, falling back to the field name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// JSON Schema fragment for this field's value
    pub fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();

        if self.kind == FieldKind::Select {
            let mut values: Vec<Value> = self.options.iter().map(|o| o.value.clone()).collect();
            if self.is_nullable() {
                values.push(Value::Null);
            }
            prop.insert("enum".into(), Value::Array(values));
        } else if self.is_nullable() {
            prop.insert("type".into(), json!([self.kind.json_type(), "null"]));
        } else {
            prop.insert("type".into(), json!(self.kind.json_type()));
        }
        if let Some(format) = self.kind.format() {
            prop.insert("format".into(), json!(format));
        }

        if let Some(label) = &self.label {
            prop.insert("title".into(), json!(label));
        }
        if let Some(description) = &self.description {
            prop.insert("description".into(), json!(description));
        }
        if self.kind.is_string() {
            if let Some(n) = self.min_length {
                prop.insert("minLength".into(), json!(n));
            }
            if let Some(n) = self.max_length {
                prop.insert("maxLength".into(), json!(n));
            }
        }
        if self.kind.is_numeric() {
            if let Some(n) = self.minimum {
                prop.insert("minimum".into(), json!(n));
            }
            if let Some(n) = self.maximum {
                prop.insert("maximum".into(), json!(n));
            }
        }

        Value::Object(prop)
    }
}

/// Ordered field definitions for one form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn from_yaml(source: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(source).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(source).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Object-level JSON Schema describing a valid submission
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            properties.insert(field.name.clone(), field.to_json_schema());
            if field.is_required() {
                required.push(json!(field.name));
            }
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "required": required,
        });
        if let Some(title) = &self.title {
            schema["title"] = json!(title);
        }
        schema
    }

    /// Declared defaults, one entry per field that has one
    pub fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|f| f.default.clone().map(|v| (f.name.clone(), v)))
            .collect()
    }

    /// Check the definition and build its validator
    pub fn compile(self) -> Result<CompiledSchema, SchemaError> {
        CompiledSchema::new(self)
    }
}
