//! Schema instrumentation.
//!
//! # Responsibilities
//! - Wrap every field resolver of a schema exactly once
//! - Install the per-operation hook that logs the query, in front of any
//!   hook the application already installed
//! - Remember instrumented schemas by identity

use std::sync::Arc;
use dashmap::DashSet;
use serde_json::{json, Map, Value};

use crate::instrument::absorb;
use crate::instrument::resolver::instrument_resolver;
use crate::schema::{ResolveContext, ResolveInfo, Resolver, RootHook, SchemaFields, SchemaId};

/// Event type of the per-operation query record.
pub const QUERY_EVENT: &str = "graphql.query";

/// Applies instrumentation to schemas, at most once per schema instance.
#[derive(Debug, Default)]
pub struct SchemaInstrumenter {
    instrumented: DashSet<SchemaId>,
}

impl SchemaInstrumenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instrument `schema`. Returns false if it already was.
    pub fn instrument<S: SchemaFields + ?Sized>(&self, schema: &mut S) -> bool {
        let id = schema.id();
        if !self.instrumented.insert(id) {
            tracing::debug!(schema = %id, "Schema already instrumented");
            return false;
        }

        let mut wrapped = 0usize;
        schema.for_each_field_mut(&mut |type_name: &str, field_name: &str, resolve: &mut Option<Resolver>| {
            if let Some(resolver) = resolve.as_ref() {
                if !resolver.is_instrumented() {
                    *resolve = Some(instrument_resolver(type_name, field_name, resolver));
                    wrapped += 1;
                }
            }
        });
        let previous = schema.take_root_hook();
        let chained = previous.is_some();
        schema.set_root_hook(query_hook(previous));

        tracing::info!(schema = %id, resolvers = wrapped, chained, "Schema instrumented");
        true
    }

    pub fn is_instrumented(&self, id: SchemaId) -> bool {
        self.instrumented.contains(&id)
    }
}

/// Hook logging the operation text, variables and name. The root value goes
/// untouched to `previous`, whose result is returned.
fn query_hook(previous: Option<RootHook>) -> RootHook {
    Arc::new(
        move |root: Value, args: &Map<String, Value>, context: &ResolveContext, info: &ResolveInfo| {
            if let Some(session) = context.session() {
                absorb(session, "query hook", || {
                    let operation = &info.operation;
                    session.log(
                        QUERY_EVENT,
                        Some(json!({
                            "query": operation.full_text(),
                            "variables": operation.variables,
                            "operationName": operation.operation_name,
                        })),
                    )
                });
            }
            match &previous {
                Some(hook) => hook(root, args, context, info),
                None => root,
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType, ObjectType, OperationInfo, Resolved, Schema};
    use crate::tracer::{Tracer, TracerOptions};

    const KEY: &str = "0123456789abcdef0123456789abcdef0123";

    fn schema() -> Schema {
        Schema::new("Query").with_type(
            ObjectType::new("Query")
                .field(Field::new("a", FieldType::Scalar).resolver(|_| Ok(Resolved::Value(json!(1)))))
                .field(Field::new("b", FieldType::Scalar)),
        )
    }

    #[test]
    fn test_wraps_present_resolvers_only() {
        let instrumenter = SchemaInstrumenter::new();
        let mut schema = schema();
        assert!(instrumenter.instrument(&mut schema));

        assert!(schema.get_field("Query", "a").unwrap().resolve.as_ref().unwrap().is_instrumented());
        assert!(schema.get_field("Query", "b").unwrap().resolve.is_none());
        assert!(schema.root_hook().is_some());
        assert!(instrumenter.is_instrumented(schema.id()));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let instrumenter = SchemaInstrumenter::new();
        let mut schema = schema();
        instrumenter.instrument(&mut schema);
        let first = schema.get_field("Query", "a").unwrap().resolve.clone().unwrap();

        assert!(!instrumenter.instrument(&mut schema));
        let second = schema.get_field("Query", "a").unwrap().resolve.clone().unwrap();
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn test_hook_logs_operation_and_returns_root() {
        let session = Tracer::new(TracerOptions::new(KEY).send_reports(false))
            .unwrap()
            .new_session();
        let context = ResolveContext::default().with_session(session.clone());
        let mut variables = Map::new();
        variables.insert("id".to_string(), json!(7));
        let info = ResolveInfo {
            parent_type: "Query".to_string(),
            field_name: String::new(),
            path: Vec::new(),
            operation: Arc::new(OperationInfo {
                query: "query Q($id: ID) { user(id: $id) { ...F } }".to_string(),
                fragments: vec![("F".to_string(), "fragment F on User { id }".to_string())],
                variables,
                operation_name: Some("Q".to_string()),
            }),
        };

        let root = query_hook(None)(json!({"seed": true}), &Map::new(), &context, &info);
        assert_eq!(root, json!({"seed": true}));

        let events = session.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, QUERY_EVENT);
        let data = events[0].data.as_ref().unwrap();
        assert_eq!(
            data.get("query"),
            Some(&json!("query Q($id: ID) { user(id: $id) { ...F } }\nfragment F on User { id }"))
        );
        assert_eq!(data.get("variables"), Some(&json!({"id": 7})));
        assert_eq!(data.get("operationName"), Some(&json!("Q")));
    }

    #[test]
    fn test_existing_hook_still_shapes_the_root() {
        let instrumenter = SchemaInstrumenter::new();
        let mut schema = schema();
        schema.set_root_hook(Arc::new(
            |mut root: Value, _args: &Map<String, Value>, _ctx: &ResolveContext, _info: &ResolveInfo| {
                root["seen"] = json!(true);
                root
            },
        ));
        instrumenter.instrument(&mut schema);

        let session = Tracer::new(TracerOptions::new(KEY).send_reports(false))
            .unwrap()
            .new_session();
        let context = ResolveContext::default().with_session(session.clone());
        let info = ResolveInfo {
            parent_type: "Query".to_string(),
            field_name: String::new(),
            path: Vec::new(),
            operation: Arc::new(OperationInfo::default()),
        };

        let hook = schema.root_hook().unwrap();
        assert_eq!(hook(json!({}), &Map::new(), &context, &info), json!({"seen": true}));
        assert_eq!(session.events()[0].kind, QUERY_EVENT);
    }
}
