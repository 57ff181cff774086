//! End-to-end instrumentation tests: instrumented schema, executor, session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use graphql_tracer::events::{Event, EventType};
use graphql_tracer::instrument::{QUERY_EVENT, RESOLVER_END_EVENT, RESOLVER_START_EVENT};
use graphql_tracer::report::{group, Report};
use graphql_tracer::schema::{
    execute, Field, FieldType, ObjectType, OperationInfo, Request, ResolveContext, ResolveInfo,
    Resolved, ResolverError, Schema, SchemaFields, Selection,
};
use graphql_tracer::transport::ReportTransport;
use graphql_tracer::{QuerySession, Tracer, TracerOptions};
use serde_json::{json, Map, Value};

mod common;
use common::{RecordingTransport, APP_KEY};

fn schema() -> Schema {
    Schema::new("Query")
        .with_type(
            ObjectType::new("Query")
                .field(Field::new("hello", FieldType::Scalar).resolver(|_| Ok(Resolved::Value(json!("world")))))
                .field(Field::new("wait", FieldType::Scalar).resolver(|p| {
                    let ms = p.args.get("ms").and_then(Value::as_u64).unwrap_or(0);
                    Ok(Resolved::deferred(async move {
                        tokio::time::sleep(Duration::from_millis(ms)).await;
                        Ok(json!(ms))
                    }))
                }))
                .field(
                    Field::new("fail", FieldType::Scalar)
                        .resolver(|_| Err(ResolverError::msg("resolver failed"))),
                )
                .field(Field::new("items", FieldType::list(FieldType::object("Item"))).resolver(|_| {
                    Ok(Resolved::Value(json!([{"name": "a"}, {"name": "b"}, {"name": "c"}])))
                })),
        )
        .with_type(ObjectType::new("Item").field(Field::new("name", FieldType::Scalar).resolver(|p| {
            Ok(Resolved::Value(p.source.get("name").cloned().unwrap_or(Value::Null)))
        })))
}

fn request(selections: Vec<Selection>) -> Request {
    Request {
        operation: OperationInfo {
            query: "{ traced }".to_string(),
            ..Default::default()
        },
        selections,
        root_value: json!({}),
    }
}

fn tracer() -> Tracer {
    Tracer::new(TracerOptions::new(APP_KEY).send_reports(false)).unwrap()
}

async fn run(schema: &Schema, session: &QuerySession, selections: Vec<Selection>) -> graphql_tracer::schema::ExecutionResult {
    let context = ResolveContext::default().with_session(session.clone());
    execute(schema, request(selections), context).await
}

fn resolver_events<'a>(events: &'a [Event], kind: &str) -> Vec<&'a Event> {
    events.iter().filter(|e| e.kind == kind).collect()
}

/// Every end names a start of the same resolver that precedes it.
fn assert_paired(events: &[Event]) {
    let starts: HashMap<_, _> = resolver_events(events, RESOLVER_START_EVENT)
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    let ends = resolver_events(events, RESOLVER_END_EVENT);
    assert_eq!(starts.len(), ends.len());

    for end in ends {
        let start = starts[&end.start_event_id.expect("end without start id")];
        assert_eq!(start.event_type, EventType::Start);
        assert_eq!(end.event_type, EventType::End);
        assert_eq!(start.resolver_name, end.resolver_name);
        assert!(start.timestamp <= end.timestamp);
        assert!(start.id < end.id);
    }
}

#[tokio::test]
async fn test_every_call_is_traced_once() {
    let tracer = tracer();
    let mut schema = schema();
    assert!(tracer.instrument_schema(&mut schema));

    let session = tracer.new_session();
    let result = run(
        &schema,
        &session,
        vec![
            Selection::field("hello"),
            Selection::field("fail"),
            Selection::field("items").select(vec![Selection::field("name")]),
        ],
    )
    .await;
    assert_eq!(result.data["items"], json!([{"name": "a"}, {"name": "b"}, {"name": "c"}]));

    let events = session.events();
    // hello + fail + items + three names
    assert_eq!(resolver_events(&events, RESOLVER_START_EVENT).len(), 6);
    assert_paired(&events);

    let queries = resolver_events(&events, QUERY_EVENT);
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].id.0, 0);
    assert_eq!(queries[0].data.as_ref().unwrap().get("query"), Some(&json!("{ traced }")));
}

#[tokio::test]
async fn test_results_match_uninstrumented_execution() {
    let selections = || {
        vec![
            Selection::field("hello").alias("greeting"),
            Selection::field("wait").arg("ms", json!(2)),
            Selection::field("fail"),
            Selection::field("items").select(vec![Selection::field("name")]),
        ]
    };

    let plain = execute(&schema(), request(selections()), ResolveContext::default()).await;

    let tracer = tracer();
    let mut instrumented = schema();
    tracer.instrument_schema(&mut instrumented);
    let traced = run(&instrumented, &tracer.new_session(), selections()).await;

    assert_eq!(plain.data, traced.data);
    assert_eq!(plain.errors, traced.errors);
    assert_eq!(traced.errors[0].message, "resolver failed");
}

#[tokio::test]
async fn test_concurrent_siblings_correlate_to_their_own_start() {
    let tracer = tracer();
    let mut schema = schema();
    tracer.instrument_schema(&mut schema);
    let session = tracer.new_session();

    // Started in order w0..w4, finishing in reverse order.
    let delays = [80u64, 60, 40, 20, 0];
    let selections = delays
        .iter()
        .enumerate()
        .map(|(i, ms)| Selection::field("wait").alias(format!("w{}", i)).arg("ms", json!(ms)))
        .collect();
    let result = run(&schema, &session, selections).await;
    assert!(result.errors.is_empty());

    let events = session.events();
    assert_paired(&events);

    let by_id: HashMap<_, _> = events.iter().map(|e| (e.id, e)).collect();
    let finish_order: Vec<Value> = resolver_events(&events, RESOLVER_END_EVENT)
        .into_iter()
        .map(|end| {
            let start = by_id[&end.start_event_id.unwrap()];
            start.data.as_ref().unwrap().get("path").cloned().unwrap()
        })
        .collect();
    assert_eq!(
        finish_order,
        vec![json!(["w4"]), json!(["w3"]), json!(["w2"]), json!(["w1"]), json!(["w0"])]
    );

    for end in resolver_events(&events, RESOLVER_END_EVENT) {
        assert_eq!(end.data.as_ref().unwrap().get("fulfilled"), Some(&json!(true)));
    }
}

#[tokio::test]
async fn test_double_instrumentation_logs_one_pair() {
    let tracer = tracer();
    let mut schema = schema();
    assert!(tracer.instrument_schema(&mut schema));
    assert!(!tracer.instrument_schema(&mut schema));

    let session = tracer.new_session();
    run(&schema, &session, vec![Selection::field("hello")]).await;

    let events = session.events();
    assert_eq!(resolver_events(&events, QUERY_EVENT).len(), 1);
    assert_eq!(resolver_events(&events, RESOLVER_START_EVENT).len(), 1);
    assert_eq!(resolver_events(&events, RESOLVER_END_EVENT).len(), 1);
}

#[tokio::test]
async fn test_second_tracer_does_not_stack_wrappers() {
    let first = tracer();
    let second = tracer();
    let mut schema = schema();
    first.instrument_schema(&mut schema);
    second.instrument_schema(&mut schema);

    let session = first.new_session();
    run(&schema, &session, vec![Selection::field("hello")]).await;
    assert_eq!(resolver_events(&session.events(), RESOLVER_START_EVENT).len(), 1);
}

#[tokio::test]
async fn test_clone_taken_before_instrumenting_is_untouched() {
    let tracer = tracer();
    let mut schema = schema();
    let pristine = schema.clone();
    tracer.instrument_schema(&mut schema);

    let session = tracer.new_session();
    run(&pristine, &session, vec![Selection::field("hello")]).await;
    assert!(session.events().is_empty());
}

#[tokio::test]
async fn test_application_root_hook_survives_instrumentation() {
    let mut schema = Schema::new("Query").with_type(
        ObjectType::new("Query").field(Field::new("greeting", FieldType::Scalar)),
    );
    schema.set_root_hook(Arc::new(
        |mut root: Value, _args: &Map<String, Value>, _ctx: &ResolveContext, _info: &ResolveInfo| {
            root["greeting"] = json!("hello");
            root
        },
    ));

    let plain = execute(&schema, request(vec![Selection::field("greeting")]), ResolveContext::default()).await;
    assert_eq!(plain.data, json!({"greeting": "hello"}));

    let tracer = tracer();
    tracer.instrument_schema(&mut schema);
    let session = tracer.new_session();
    let traced = run(&schema, &session, vec![Selection::field("greeting")]).await;

    assert_eq!(traced.data, plain.data);
    assert_eq!(resolver_events(&session.events(), QUERY_EVENT).len(), 1);
}

#[tokio::test]
async fn test_untraced_requests_log_nothing() {
    let tracer = tracer();
    let mut schema = schema();
    tracer.instrument_schema(&mut schema);

    let session = tracer.new_session();
    let result = execute(&schema, request(vec![Selection::field("hello")]), ResolveContext::default()).await;
    assert_eq!(result.data, json!({"hello": "world"}));
    assert!(session.events().is_empty());
}

#[tokio::test]
async fn test_submitted_report_groups_into_intervals() {
    let transport = Arc::new(RecordingTransport::default());
    let shared: Arc<dyn ReportTransport> = transport.clone();
    let tracer = Tracer::new(TracerOptions::new(APP_KEY).transport(shared)).unwrap();
    let mut schema = schema();
    tracer.instrument_schema(&mut schema);

    let session = tracer.new_session();
    run(
        &schema,
        &session,
        vec![
            Selection::field("wait").arg("ms", json!(5)),
            Selection::field("fail"),
        ],
    )
    .await;
    session.submit();

    assert_eq!(transport.calls(), 1);
    let report: Report = serde_json::from_slice(&transport.bodies()[0]).unwrap();
    assert_eq!(report.query_id, session.query_id());

    let grouped = group(&report);
    assert_eq!(grouped.orphaned_ends, 0);
    // query tick + two resolver intervals
    assert_eq!(grouped.intervals.len(), 3);

    let wait = grouped
        .intervals
        .iter()
        .find(|i| i.resolver_name.as_deref() == Some("Query.wait"))
        .unwrap();
    assert!(wait.duration() >= 4.0, "duration {}", wait.duration());

    let fail = grouped
        .intervals
        .iter()
        .find(|i| i.resolver_name.as_deref() == Some("Query.fail"))
        .unwrap();
    assert_eq!(fail.outcome.as_ref().unwrap()["error"]["message"], json!("resolver failed"));
}
