//! UI descriptors in the amis front-end JSON format.
//!
//! Only the subset needed to draw a single form page is modelled.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::schema::{FieldKind, FormField, FormSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiTarget {
    pub method: String,
    pub url: String,
}

impl ApiTarget {
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "get".into(), url: url.into() }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self { method: "post".into(), url: url.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub label: String,
    pub value: Value,
}

/// One input control inside a form body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub label: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub validations: Map<String, Value>,
}

impl From<&FormField> for FormItem {
    fn from(field: &FormField) -> Self {
        let kind = match field.kind {
            FieldKind::Text => "input-text",
            FieldKind::Password => "input-password",
            FieldKind::Email => "input-email",
            FieldKind::Textarea => "textarea",
            FieldKind::Integer | FieldKind::Number => "input-number",
            FieldKind::Boolean => "switch",
            FieldKind::Date => "input-date",
            FieldKind::Select => "select",
        };

        let mut validations = Map::new();
        if field.kind.is_string() {
            if let Some(n) = field.min_length {
                validations.insert("minLength".into(), json!(n));
            }
            if let Some(n) = field.max_length {
                validations.insert("maxLength".into(), json!(n));
            }
        }
        if field.kind.is_numeric() {
            if let Some(n) = field.minimum {
                validations.insert("minimum".into(), json!(n));
            }
            if let Some(n) = field.maximum {
                validations.insert("maximum".into(), json!(n));
            }
        }

        Self {
            kind: kind.to_string(),
            name: field.name.clone(),
            label: field.display_label().to_string(),
            required: field.is_required(),
            value: field.default.clone(),
            placeholder: field.placeholder.clone(),
            description: field.description.clone(),
            options: field
                .options
                .iter()
                .map(|o| SelectItem { label: o.label.clone(), value: o.value.clone() })
                .collect(),
            precision: (field.kind == FieldKind::Integer).then_some(0),
            validations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub api: ApiTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_api: Option<ApiTarget>,
    pub submit_text: String,
    pub body: Vec<FormItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub body: FormDescriptor,
}

/// Inputs needed to describe one form page
#[derive(Debug, Clone)]
pub struct FormPage<'a> {
    pub title: &'a str,
    pub schema: &'a FormSchema,
    pub form_url: &'a str,
    pub form_init: bool,
    pub submit_text: &'a str,
}

impl FormPage<'_> {
    /// The form always submits to `form_url`; with `form_init` it also loads
    /// its initial values from the same URL.
    pub fn render(&self) -> PageDescriptor {
        PageDescriptor {
            kind: "page".to_string(),
            title: self.title.to_string(),
            body: FormDescriptor {
                kind: "form".to_string(),
                title: self.schema.title.clone(),
                api: ApiTarget::post(self.form_url),
                init_api: self.form_init.then(|| ApiTarget::get(self.form_url)),
                submit_text: self.submit_text.to_string(),
                body: self.schema.fields.iter().map(FormItem::from).collect(),
            },
        }
    }
}
