//! Coercion adapters translate an endpoint's parameter and response types into documentation
//!
//! The adapter is attached per endpoint (see [`Endpoint::coercion`](crate::router::Endpoint::coercion))
//! and only asked for its fragment when a document is assembled.

use std::fmt;

use axum::http::StatusCode;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::fragment::DocFragment;
use crate::router::EndpointData;

/// The kinds of fragments an adapter might be asked for
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FragmentKind {
    /// A fragment to be merged into a swagger 2.0 operation
    OpenapiFragment,
}

/// Error produced by a [`CoercionAdapter`]
///
/// It indicates a misconfigured endpoint and is not recovered from.
#[derive(Debug, Error)]
pub enum CoercionError {
    /// A type used for non-body parameters is not described by an object schema
    #[error("{type_name} can't be used for {location} parameters because its schema is not an object")]
    NotAnObject {
        /// Name of the offending rust type
        type_name: &'static str,
        /// The parameters' `in` value
        location: &'static str,
    },

    /// A schema could not be converted into json
    #[error("Failed to serialize schema: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Error raised by a custom adapter
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

/// Capability to derive documentation from an endpoint's coercion configuration
pub trait CoercionAdapter: fmt::Debug + Send + Sync + 'static {
    /// Produces a fragment describing `endpoint`'s parameters and responses
    fn documentation_fragment(
        &self,
        kind: FragmentKind,
        endpoint: &EndpointData,
    ) -> Result<DocFragment, CoercionError>;
}

/// A lazily generated json schema for some type
#[derive(Copy, Clone)]
struct SchemaSource {
    type_name: &'static str,
    schema: fn() -> RootSchema,
}

impl SchemaSource {
    fn of<T: JsonSchema>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            schema: root_schema_for::<T>,
        }
    }
}

impl fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// [`CoercionAdapter`] describing parameters and responses through [`JsonSchema`] implementations
///
/// ```
/// # use axum::http::StatusCode;
/// # use schemars::JsonSchema;
/// # use swagroute_core::coercion::SchemaCoercion;
/// #[derive(JsonSchema)]
/// struct Operands {
///     a: i64,
///     b: i64,
/// }
///
/// SchemaCoercion::new()
///     .query::<Operands>()
///     .response::<i64>(StatusCode::OK, "The result");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaCoercion {
    path: Option<SchemaSource>,
    query: Option<SchemaSource>,
    body: Option<SchemaSource>,
    responses: Vec<(StatusCode, &'static str, Option<SchemaSource>)>,
}

/// Keys copied from a property's schema onto a non-body parameter
const PARAMETER_SCHEMA_KEYS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "default",
    "description",
    "minimum",
    "maximum",
    "pattern",
];

impl SchemaCoercion {
    /// Creates an adapter which doesn't describe anything yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Describes the path parameters through the properties of `T`
    pub fn path<T: JsonSchema>(mut self) -> Self {
        self.path = Some(SchemaSource::of::<T>());
        self
    }

    /// Describes the query parameters through the properties of `T`
    pub fn query<T: JsonSchema>(mut self) -> Self {
        self.query = Some(SchemaSource::of::<T>());
        self
    }

    /// Describes a json request body
    pub fn body<T: JsonSchema>(mut self) -> Self {
        self.body = Some(SchemaSource::of::<T>());
        self
    }

    /// Describes a json response
    pub fn response<T: JsonSchema>(mut self, status: StatusCode, description: &'static str) -> Self {
        self.responses
            .push((status, description, Some(SchemaSource::of::<T>())));
        self
    }

    /// Describes a response without body
    pub fn empty_response(mut self, status: StatusCode, description: &'static str) -> Self {
        self.responses.push((status, description, None));
        self
    }

    fn parameters(&self) -> Result<Vec<Value>, CoercionError> {
        let mut parameters = Vec::new();
        if let Some(source) = &self.path {
            parameters.extend(object_parameters(source, "path")?);
        }
        if let Some(source) = &self.query {
            parameters.extend(object_parameters(source, "query")?);
        }
        if let Some(source) = &self.body {
            let schema = serde_json::to_value((source.schema)().schema)?;
            parameters.push(json!({
                "name": "body",
                "in": "body",
                "required": true,
                "schema": schema,
            }));
        }
        Ok(parameters)
    }

    fn responses(&self) -> Result<DocFragment, CoercionError> {
        let mut responses = DocFragment::new();
        for (status, description, source) in &self.responses {
            let mut response = DocFragment::new();
            response.insert("description".to_string(), Value::from(*description));
            if let Some(source) = source {
                response.insert(
                    "schema".to_string(),
                    serde_json::to_value((source.schema)().schema)?,
                );
            }
            responses.insert(status.as_u16().to_string(), Value::Object(response));
        }
        Ok(responses)
    }
}

impl CoercionAdapter for SchemaCoercion {
    fn documentation_fragment(
        &self,
        kind: FragmentKind,
        _endpoint: &EndpointData,
    ) -> Result<DocFragment, CoercionError> {
        match kind {
            FragmentKind::OpenapiFragment => {}
        }

        let json = Value::from(mime::APPLICATION_JSON.essence_str());
        let mut fragment = DocFragment::new();
        if self.body.is_some() {
            fragment.insert("consumes".to_string(), Value::Array(vec![json.clone()]));
        }
        if self.responses.iter().any(|(_, _, source)| source.is_some()) {
            fragment.insert("produces".to_string(), Value::Array(vec![json]));
        }

        let parameters = self.parameters()?;
        if !parameters.is_empty() {
            fragment.insert("parameters".to_string(), Value::Array(parameters));
        }

        let responses = self.responses()?;
        if !responses.is_empty() {
            fragment.insert("responses".to_string(), Value::Object(responses));
        }

        Ok(fragment)
    }
}

/// Generates a self-contained schema for `T`
fn root_schema_for<T: JsonSchema>() -> RootSchema {
    SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.option_add_null_type = false;
            settings.meta_schema = None;
        })
        .into_generator()
        .into_root_schema_for::<T>()
}

/// Expands the properties of an object schema into non-body parameters
fn object_parameters(
    source: &SchemaSource,
    location: &'static str,
) -> Result<Vec<Value>, CoercionError> {
    let root = (source.schema)();
    let Some(object) = root.schema.object.as_deref() else {
        return Err(CoercionError::NotAnObject {
            type_name: source.type_name,
            location,
        });
    };

    let mut parameters = Vec::with_capacity(object.properties.len());
    for (name, schema) in &object.properties {
        let mut parameter = DocFragment::new();
        parameter.insert("name".to_string(), Value::from(name.as_str()));
        parameter.insert("in".to_string(), Value::from(location));
        parameter.insert(
            "required".to_string(),
            Value::from(location == "path" || object.required.contains(name)),
        );
        if let Value::Object(schema) = serde_json::to_value(schema)? {
            for key in PARAMETER_SCHEMA_KEYS {
                if let Some(value) = schema.get(*key) {
                    parameter.insert(key.to_string(), value.clone());
                }
            }
        }
        parameters.push(Value::Object(parameter));
    }
    Ok(parameters)
}
