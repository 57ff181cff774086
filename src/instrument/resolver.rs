//! Resolver instrumentation.
//!
//! # States
//! ```text
//! INVOKED  --call-->   THREW | RETURNED
//! RETURNED --classify--> NULL | UNDEFINED | DEFERRED | VALUE
//! DEFERRED --settle-->  FULFILLED | REJECTED
//! ```
//!
//! Every path logs exactly one `resolver.start` and one `resolver.end`; the
//! end carries the start id. The caller always receives exactly what the
//! wrapped resolver produced: the same value, the same error, the same panic.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::events::{Correlation, EventId};
use crate::instrument::absorb;
use crate::schema::{DeferredValue, ResolveInfo, Resolved, Resolver, ResolverError};
use crate::tracer::session::panic_message;
use crate::tracer::QuerySession;

pub const RESOLVER_START_EVENT: &str = "resolver.start";
pub const RESOLVER_END_EVENT: &str = "resolver.end";

/// Wrap `resolver` of `parent_type.field_name` so every call is traced.
///
/// Already instrumented resolvers are returned as they are. Calls whose
/// context carries no session go straight to the original.
pub fn instrument_resolver(parent_type: &str, field_name: &str, resolver: &Resolver) -> Resolver {
    if resolver.is_instrumented() {
        return resolver.clone();
    }

    let name: Arc<str> = Arc::from(format!("{}.{}", parent_type, field_name));
    let inner = resolver.clone();

    Resolver::wrapping(resolver, move |params| {
        let session = match params.context.session() {
            Some(session) => session.clone(),
            None => return inner.call(params),
        };

        let start = absorb(&session, "resolver start", || {
            session.resolver_event(
                RESOLVER_START_EVENT,
                &name,
                start_data(&params.info),
                Correlation::Start,
            )
        });
        let end = Ending {
            session,
            name: name.clone(),
            start,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| inner.call(params))) {
            Err(payload) => {
                end.log(|| json!({ "panicked": true, "message": panic_message(payload.as_ref()) }));
                panic::resume_unwind(payload)
            }
            Ok(Err(error)) => {
                end.log(|| error_data(&error, false));
                Err(error)
            }
            Ok(Ok(Resolved::Value(Value::Null))) => {
                end.log(|| json!({ "returnedNull": true }));
                Ok(Resolved::Value(Value::Null))
            }
            Ok(Ok(Resolved::Undefined)) => {
                end.log(|| json!({ "returnedUndefined": true }));
                Ok(Resolved::Undefined)
            }
            Ok(Ok(Resolved::Deferred(deferred))) => Ok(Resolved::Deferred(track_deferred(end, deferred))),
            Ok(Ok(Resolved::Value(value))) => {
                end.log(|| json!({}));
                Ok(Resolved::Value(value))
            }
        }
    })
}

/// Pass the deferred result through, logging the end once it settles on
/// either channel.
fn track_deferred(end: Ending, deferred: DeferredValue) -> DeferredValue {
    async move {
        match AssertUnwindSafe(deferred).catch_unwind().await {
            Ok(Ok(value)) => {
                end.log(|| json!({ "deferred": true, "fulfilled": true }));
                Ok(value)
            }
            Ok(Err(error)) => {
                end.log(|| error_data(&error, true));
                Err(error)
            }
            Err(payload) => {
                end.log(|| {
                    json!({ "deferred": true, "panicked": true, "message": panic_message(payload.as_ref()) })
                });
                panic::resume_unwind(payload)
            }
        }
    }
    .boxed()
}

/// What is needed to close the interval opened on entry.
struct Ending {
    session: QuerySession,
    name: Arc<str>,
    start: Option<EventId>,
}

impl Ending {
    /// Log the end event. Payload construction runs user code (error
    /// `Display` impls); if it fails the end is still logged, without data.
    fn log(&self, data: impl FnOnce() -> Value) {
        let data = absorb(&self.session, "resolver end payload", data)
            .unwrap_or_else(|| json!({ "payloadUnavailable": true }));
        absorb(&self.session, "resolver end", || {
            self.session.resolver_event(
                RESOLVER_END_EVENT,
                &self.name,
                data,
                Correlation::End(self.start),
            )
        });
    }
}

fn start_data(info: &ResolveInfo) -> Value {
    json!({
        "parentType": info.parent_type,
        "fieldName": info.field_name,
        "path": info.path,
    })
}

fn error_data(error: &ResolverError, deferred: bool) -> Value {
    let mut data = json!({
        "error": {
            "message": error.to_string(),
            "stack": error.chain(),
        }
    });
    if deferred {
        data["deferred"] = Value::Bool(true);
    }
    data
}
