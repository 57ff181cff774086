//! Resolver-facing types: resolvers, their arguments and their outcomes.

use std::fmt;
use std::sync::Arc;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tracer::QuerySession;

/// Future returned by a resolver whose value is not ready yet.
pub type DeferredValue = BoxFuture<'static, Result<Value, ResolverError>>;

/// Outcome of a resolver call that did not fail.
pub enum Resolved {
    /// A ready value. `Value::Null` is an explicit null.
    Value(Value),
    /// The resolver produced nothing at all.
    Undefined,
    /// The value settles later.
    Deferred(DeferredValue),
}

impl Resolved {
    pub fn deferred<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<Value, ResolverError>> + Send + 'static,
    {
        Resolved::Deferred(Box::pin(future))
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Resolved::Undefined => f.write_str("Undefined"),
            Resolved::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

pub type ResolveResult = Result<Resolved, ResolverError>;

/// Error raised by application resolver code.
///
/// Cheap to clone; clones share the same underlying error so identity can be
/// checked with [`ResolverError::ptr_eq`].
#[derive(Clone)]
pub struct ResolverError(Arc<dyn std::error::Error + Send + Sync>);

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

impl ResolverError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// The wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// True when both handles point at the same error value.
    pub fn ptr_eq(&self, other: &ResolverError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Messages of the `source()` chain below this error, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.0.source();
        while let Some(err) = current {
            chain.push(err.to_string());
            current = err.source();
        }
        chain
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl std::error::Error for ResolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// One step of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Operation-wide information shared by every resolver of one request.
#[derive(Debug, Clone, Default)]
pub struct OperationInfo {
    /// Printed operation text.
    pub query: String,
    /// `(name, printed definition)` of every fragment the operation uses.
    pub fragments: Vec<(String, String)>,
    pub variables: Map<String, Value>,
    pub operation_name: Option<String>,
}

impl OperationInfo {
    /// The operation followed by its fragment definitions.
    pub fn full_text(&self) -> String {
        let mut text = self.query.clone();
        for (_, definition) in &self.fragments {
            text.push('\n');
            text.push_str(definition);
        }
        text
    }
}

/// Where in the operation a resolver is running.
#[derive(Debug, Clone)]
pub struct ResolveInfo {
    pub parent_type: String,
    pub field_name: String,
    pub path: Vec<PathSegment>,
    pub operation: Arc<OperationInfo>,
}

/// Per-request context handed to every resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    session: Option<QuerySession>,
    data: Arc<Value>,
}

impl ResolveContext {
    pub fn new(data: Value) -> Self {
        Self {
            session: None,
            data: Arc::new(data),
        }
    }

    /// Attach the trace session of this request.
    pub fn with_session(mut self, session: QuerySession) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&QuerySession> {
        self.session.as_ref()
    }

    /// Application data shared by the request's resolvers.
    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// Arguments of one resolver call.
#[derive(Debug, Clone)]
pub struct ResolveParams {
    /// Value resolved for the parent object.
    pub source: Value,
    pub args: Map<String, Value>,
    pub context: ResolveContext,
    pub info: ResolveInfo,
}

type ResolverFn = Arc<dyn Fn(ResolveParams) -> ResolveResult + Send + Sync>;

/// A field resolver.
///
/// An instrumented resolver keeps a handle on the function it wraps, so
/// tooling can detect instrumentation and call the original directly.
#[derive(Clone)]
pub struct Resolver {
    func: ResolverFn,
    original: Option<ResolverFn>,
}

impl Resolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(ResolveParams) -> ResolveResult + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(f),
            original: None,
        }
    }

    /// Build a resolver that wraps `inner`, remembering its unwrapped origin.
    pub(crate) fn wrapping<F>(inner: &Resolver, f: F) -> Self
    where
        F: Fn(ResolveParams) -> ResolveResult + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(f),
            original: Some(inner.original.clone().unwrap_or_else(|| inner.func.clone())),
        }
    }

    pub fn call(&self, params: ResolveParams) -> ResolveResult {
        (self.func)(params)
    }

    pub fn is_instrumented(&self) -> bool {
        self.original.is_some()
    }

    /// The unwrapped resolver, if this one is instrumented.
    pub fn original(&self) -> Option<Resolver> {
        self.original.as_ref().map(|func| Resolver {
            func: func.clone(),
            original: None,
        })
    }

    /// True when both resolvers run the same function.
    pub fn ptr_eq(&self, other: &Resolver) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("instrumented", &self.is_instrumented())
            .finish()
    }
}

/// Hook run once per operation before field resolution; returns the root value.
pub type RootHook =
    Arc<dyn Fn(Value, &Map<String, Value>, &ResolveContext, &ResolveInfo) -> Value + Send + Sync>;
