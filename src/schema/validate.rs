use std::collections::{BTreeMap, HashSet};
use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use serde_json::{Map, Value};

use super::{FieldKind, FormSchema};
use crate::error::{ApiError, SchemaError};

/// Key used in `field_errors` for problems with the payload as a whole
pub const ROOT_FIELD: &str = "__root__";

/// A checked [`FormSchema`] together with its compiled JSON Schema validator.
///
/// Compiled once when an admin is materialized and shared read-only by every
/// request afterwards.
pub struct CompiledSchema {
    schema: FormSchema,
    validator: JSONSchema,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    pub fn new(schema: FormSchema) -> Result<Self, SchemaError> {
        check_fields(&schema)?;

        let validator = compile_validator(&schema.to_json_schema())?;

        Ok(Self { schema, validator })
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Validate a raw submission.
    ///
    /// On success the result holds exactly the schema's fields in schema
    /// order: unknown keys are dropped, absent optional fields take their
    /// default or `null`.
    pub fn validate(&self, raw: &Value) -> Result<Map<String, Value>, ApiError> {
        let Some(input) = raw.as_object() else {
            let mut field_errors = BTreeMap::new();
            field_errors.insert(ROOT_FIELD.to_string(), "Expected a JSON object".to_string());
            return Err(ApiError::validation_error("Invalid form data", field_errors));
        };

        if let Err(errors) = self.validator.validate(raw) {
            let mut field_errors = BTreeMap::new();
            for error in errors {
                let (field, message) = match &error.kind {
                    ValidationErrorKind::Required { property } => (
                        property
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| property.to_string()),
                        "This field is required".to_string(),
                    ),
                    _ => (field_from_pointer(&error.instance_path.to_string()), error.to_string()),
                };
                field_errors.entry(field).or_insert(message);
            }
            tracing::debug!(fields = ?field_errors.keys().collect::<Vec<_>>(), "form submission rejected");
            return Err(ApiError::validation_error("Invalid form data", field_errors));
        }

        let mut data = Map::new();
        for field in &self.schema.fields {
            let value = input
                .get(&field.name)
                .cloned()
                .or_else(|| field.default.clone())
                .unwrap_or(Value::Null);
            data.insert(field.name.clone(), value);
        }
        Ok(data)
    }
}

/// Format keywords are asserted, not just annotated
fn compile_validator(document: &Value) -> Result<JSONSchema, SchemaError> {
    JSONSchema::options()
        .should_validate_formats(true)
        .compile(document)
        .map_err(|e| SchemaError::Compile(e.to_string()))
}

fn field_from_pointer(pointer: &str) -> String {
    match pointer.trim_start_matches('/').split('/').next() {
        Some(first) if !first.is_empty() => first.replace("~1", "/").replace("~0", "~"),
        _ => ROOT_FIELD.to_string(),
    }
}

fn check_fields(schema: &FormSchema) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();

    for field in &schema.fields {
        if field.name.trim().is_empty() {
            return Err(SchemaError::EmptyFieldName);
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField(field.name.clone()));
        }
        if field.kind == FieldKind::Select && field.options.is_empty() {
            return Err(SchemaError::EmptyOptions(field.name.clone()));
        }

        if let Some(default) = &field.default {
            let validator = compile_validator(&field.to_json_schema())?;
            if !validator.is_valid(default) {
                return Err(SchemaError::InvalidDefault {
                    field: field.name.clone(),
                    reason: format!("{} is not a valid {:?} value", default, field.kind),
                });
            }
        }
    }

    Ok(())
}
