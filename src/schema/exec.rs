//! Minimal executor for pre-parsed selections.
//!
//! # Responsibilities
//! - Run the root hook once per operation
//! - Resolve sibling fields concurrently
//! - Await deferred resolver results
//! - Collect field errors as nulls plus error entries

use std::sync::{Arc, Mutex, PoisonError};
use futures_util::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::definition::{FieldType, ObjectType, Schema};
use crate::schema::types::{
    OperationInfo, PathSegment, ResolveContext, ResolveInfo, ResolveParams, Resolved,
};

/// One requested field.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub name: String,
    pub alias: Option<String>,
    pub args: Map<String, Value>,
    pub selections: Vec<Selection>,
}

impl Selection {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn select(mut self, selections: Vec<Selection>) -> Self {
        self.selections = selections;
        self
    }

    /// Key of this field in the response object.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A request ready for execution.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub operation: OperationInfo,
    pub selections: Vec<Selection>,
    pub root_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub message: String,
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// Execute `request` against `schema`.
pub async fn execute(schema: &Schema, request: Request, context: ResolveContext) -> ExecutionResult {
    let operation = Arc::new(request.operation);
    let root_info = ResolveInfo {
        parent_type: schema.query_type().to_string(),
        field_name: String::new(),
        path: Vec::new(),
        operation: operation.clone(),
    };
    let root = schema.run_root_hook(request.root_value, &context, &root_info);

    let execution = Execution {
        schema,
        context,
        operation,
        errors: Mutex::new(Vec::new()),
    };
    let data = execution
        .resolve_object(schema.query_type(), root, &request.selections, Vec::new())
        .await;

    ExecutionResult {
        data,
        errors: execution
            .errors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner),
    }
}

struct Execution<'a> {
    schema: &'a Schema,
    context: ResolveContext,
    operation: Arc<OperationInfo>,
    errors: Mutex<Vec<FieldError>>,
}

impl<'a> Execution<'a> {
    fn error(&self, message: String, path: Vec<PathSegment>) {
        tracing::debug!(message = %message, path = ?path, "Field error");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FieldError { message, path });
    }

    fn resolve_object<'b>(
        &'b self,
        type_name: &'b str,
        source: Value,
        selections: &'b [Selection],
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Value> {
        async move {
            let object = match self.schema.get_type(type_name) {
                Some(object) => object,
                None => {
                    self.error(format!("Unknown type \"{}\"", type_name), path);
                    return Value::Null;
                }
            };

            let fields = selections.iter().map(|selection| {
                let mut field_path = path.clone();
                field_path.push(PathSegment::Key(selection.response_key().to_string()));
                self.resolve_field(object, &source, selection, field_path)
            });
            let values = join_all(fields).await;

            let mut map = Map::new();
            for (selection, value) in selections.iter().zip(values) {
                map.insert(selection.response_key().to_string(), value);
            }
            Value::Object(map)
        }
        .boxed()
    }

    fn resolve_field<'b>(
        &'b self,
        object: &'b ObjectType,
        source: &'b Value,
        selection: &'b Selection,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Value> {
        async move {
            let field = match object.get_field(&selection.name) {
                Some(field) => field,
                None => {
                    self.error(
                        format!("Cannot query field \"{}\" on type \"{}\"", selection.name, object.name),
                        path,
                    );
                    return Value::Null;
                }
            };

            let resolved = match &field.resolve {
                Some(resolver) => {
                    let params = ResolveParams {
                        source: source.clone(),
                        args: selection.args.clone(),
                        context: self.context.clone(),
                        info: ResolveInfo {
                            parent_type: object.name.clone(),
                            field_name: field.name.clone(),
                            path: path.clone(),
                            operation: self.operation.clone(),
                        },
                    };
                    match resolver.call(params) {
                        Ok(Resolved::Value(value)) => Ok(value),
                        Ok(Resolved::Undefined) => Ok(Value::Null),
                        Ok(Resolved::Deferred(deferred)) => deferred.await,
                        Err(e) => Err(e),
                    }
                }
                None => Ok(source.get(&field.name).cloned().unwrap_or(Value::Null)),
            };

            match resolved {
                Ok(value) => {
                    self.complete(&field.field_type, value, &selection.selections, path)
                        .await
                }
                Err(e) => {
                    self.error(e.to_string(), path);
                    Value::Null
                }
            }
        }
        .boxed()
    }

    fn complete<'b>(
        &'b self,
        field_type: &'b FieldType,
        value: Value,
        selections: &'b [Selection],
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Value> {
        async move {
            match (field_type, value) {
                (_, Value::Null) => Value::Null,
                (FieldType::Scalar, value) => value,
                (FieldType::Object(name), value) => {
                    self.resolve_object(name, value, selections, path).await
                }
                (FieldType::List(inner), Value::Array(items)) => {
                    let elements = items.into_iter().enumerate().map(|(index, item)| {
                        let mut item_path = path.clone();
                        item_path.push(PathSegment::Index(index));
                        self.complete(inner, item, selections, item_path)
                    });
                    Value::Array(join_all(elements).await)
                }
                (FieldType::List(_), _) => {
                    self.error("Expected a list value".to_string(), path);
                    Value::Null
                }
            }
        }
        .boxed()
    }
}
