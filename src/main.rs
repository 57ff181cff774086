//! GraphQL tracer demo runner.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (TOML + TRACER_* env)
//!        │
//!        ▼
//!   ┌──────────┐  instrument_schema   ┌─────────────┐
//!   │  Tracer  │─────────────────────▶│   Schema    │
//!   └────┬─────┘                      └──────┬──────┘
//!        │ new_session                       │ execute
//!        ▼                                   ▼
//!   ┌──────────────┐   resolver.start/end ┌──────────┐
//!   │ QuerySession │◀─────────────────────│ resolvers│
//!   └────┬─────────┘                      └──────────┘
//!        │ submit: filter → map → serialize
//!        ▼
//!   transport (HTTP PUT to ingress)
//! ```
//!
//! Runs one sample query against a small in-process schema and reports it.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};

use graphql_tracer::config::{load_config, TracerConfig};
use graphql_tracer::observability::{logging, metrics};
use graphql_tracer::report::group;
use graphql_tracer::schema::{
    execute, Field, FieldType, ObjectType, OperationInfo, Request, ResolveContext, Resolved,
    ResolverError, Schema, Selection,
};
use graphql_tracer::Tracer;

#[derive(Parser)]
#[command(name = "graphql-tracer")]
#[command(about = "Trace a sample GraphQL query and report it", long_about = None)]
struct Cli {
    /// TOML config file; `TRACER_*` variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report instead of sending it.
    #[arg(long)]
    dry_run: bool,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TracerConfig::default().apply_env(),
    };
    if cli.dry_run {
        config.send_reports = false;
    }
    if let Some(address) = cli.metrics_address {
        config.observability.metrics_address = Some(address);
    }

    logging::init(&config.observability.log_level);
    tracing::info!("graphql-tracer v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(address) = &config.observability.metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %address, "Failed to parse metrics address"),
        }
    }

    let tracer = Tracer::from_config(config)?;
    let mut schema = sample_schema();
    tracer.instrument_schema(&mut schema);

    let session = tracer.new_session();
    let request = Request {
        operation: OperationInfo {
            query: "query Sample { viewer { name friends { name } } slow broken }".to_string(),
            operation_name: Some("Sample".to_string()),
            ..Default::default()
        },
        selections: vec![
            Selection::field("viewer").select(vec![
                Selection::field("name"),
                Selection::field("friends").select(vec![Selection::field("name")]),
            ]),
            Selection::field("slow"),
            Selection::field("broken"),
        ],
        root_value: json!({}),
    };
    let context = ResolveContext::new(Value::Null).with_session(session.clone());
    let result = execute(&schema, request, context).await;

    tracing::info!(
        query_id = %session.query_id(),
        errors = result.errors.len(),
        "Query executed"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    if cli.dry_run {
        let report = session.report();
        println!("{}", serde_json::to_string_pretty(&report)?);
        let grouped = group(&report);
        for interval in &grouped.intervals {
            println!(
                "{:<24} {:>8.3} ms",
                interval.resolver_name.as_deref().unwrap_or(&interval.kind),
                interval.duration()
            );
        }
        return Ok(());
    }

    if let Some(handle) = session.submit() {
        handle.await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn sample_schema() -> Schema {
    Schema::new("Query")
        .with_type(
            ObjectType::new("Query")
                .field(Field::new("viewer", FieldType::object("User")).resolver(|_| {
                    Ok(Resolved::Value(json!({
                        "name": "ada",
                        "friends": [{"name": "grace"}, {"name": "linus"}]
                    })))
                }))
                .field(Field::new("slow", FieldType::Scalar).resolver(|_| {
                    Ok(Resolved::deferred(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(json!("done"))
                    }))
                }))
                .field(
                    Field::new("broken", FieldType::Scalar)
                        .resolver(|_| Err(ResolverError::msg("backend unavailable"))),
                ),
        )
        .with_type(
            ObjectType::new("User")
                .field(Field::new("name", FieldType::Scalar).resolver(|p| {
                    Ok(Resolved::Value(p.source.get("name").cloned().unwrap_or(Value::Null)))
                }))
                .field(Field::new("friends", FieldType::list(FieldType::object("User")))),
        )
}
