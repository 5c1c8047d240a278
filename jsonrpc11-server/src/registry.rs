//! Method registry
//!
//! The registry maps each externally callable method name to a
//! [`MethodSpec`]: the handler plus what the method declares about its
//! parameters and result.
//!
//! Registration happens while configuring a dispatcher; once the dispatcher
//! is built its registry is read-only, so lookups need no locking.
//!
//! # Duplicates
//!
//! Names are unique. Registering a name twice fails with
//! `Error::DuplicateMethod` and leaves the first registration in place.
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_core::ParamShape;
//! use jsonrpc11_server::{from_typed_fn, MethodRegistry, MethodSpec};
//! use serde_json::json;
//!
//! let mut registry = MethodRegistry::new();
//! registry
//!     .register(
//!         MethodSpec::new("add", from_typed_fn(|(a, b): (f64, f64)| async move { Ok(a + b) }))
//!             .accepts(ParamShape::Positional)
//!             .params_schema(json!({"type": "array", "items": {"type": "number"}}))
//!             .result_schema(json!({"type": "number"})),
//!     )
//!     .unwrap();
//!
//! assert!(registry.contains("add"));
//! assert!(registry.register(MethodSpec::new("add", from_typed_fn(|_: ()| async { Ok(0) }))).is_err());
//! ```

use crate::handler::{Handler, NamedHandler};
use crate::schema::{Schema, SchemaCatalog};
use jsonrpc11_core::{Error, ParamShape, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A registered method
pub struct MethodSpec {
    name: String,
    handler: Arc<dyn Handler>,
    params_schema: Option<Schema>,
    result_schema: Option<Schema>,
    accepts: ParamShape,
}

impl MethodSpec {
    /// A method with no schemas that accepts either parameter shape
    pub fn new(name: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        Self {
            name: name.into(),
            handler: Arc::from(handler),
            params_schema: None,
            result_schema: None,
            accepts: ParamShape::Any,
        }
    }

    /// A method registered under the handler's own name
    pub fn named(handler: NamedHandler) -> Self {
        let (name, handler) = handler.into_parts();
        Self::new(name, handler)
    }

    /// Declare the schema inbound parameters must satisfy
    pub fn params_schema(mut self, schema: impl Into<Schema>) -> Self {
        self.params_schema = Some(schema.into());
        self
    }

    /// Declare the schema the handler's return value must satisfy
    pub fn result_schema(mut self, schema: impl Into<Schema>) -> Self {
        self.result_schema = Some(schema.into());
        self
    }

    /// Restrict the parameter shape the handler is called with
    pub fn accepts(mut self, shape: ParamShape) -> Self {
        self.accepts = shape;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn declared_params(&self) -> Option<&Schema> {
        self.params_schema.as_ref()
    }

    pub fn declared_result(&self) -> Option<&Schema> {
        self.result_schema.as_ref()
    }

    pub fn accepted_shape(&self) -> ParamShape {
        self.accepts
    }
}

impl std::fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("params_schema", &self.params_schema)
            .field("result_schema", &self.result_schema)
            .field("accepts", &self.accepts)
            .finish()
    }
}

/// Name-to-method table consulted by the dispatcher
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodSpec>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateMethod` if the name is taken, and
    /// `Error::InvalidRequest` if the name is empty.
    pub fn register(&mut self, spec: MethodSpec) -> Result<()> {
        if spec.name.is_empty() {
            return Err(Error::InvalidRequest("method name must not be empty".into()));
        }
        if self.methods.contains_key(&spec.name) {
            return Err(Error::DuplicateMethod(spec.name));
        }

        tracing::debug!(
            method = %spec.name,
            params_schema = spec.params_schema.is_some(),
            result_schema = spec.result_schema.is_some(),
            accepts = %spec.accepts,
            "Method registered"
        );
        self.methods.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Add a handler under its own name
    pub fn add(&mut self, handler: NamedHandler) -> Result<()> {
        self.register(MethodSpec::named(handler))
    }

    /// Add a handler under an explicit name
    pub fn add_as(&mut self, name: impl Into<String>, handler: Box<dyn Handler>) -> Result<()> {
        self.register(MethodSpec::new(name, handler))
    }

    /// Look up a method by name
    ///
    /// # Errors
    ///
    /// Returns `Error::MethodNotFound` listing the registered names.
    pub fn resolve(&self, name: &str) -> Result<&MethodSpec> {
        self.methods.get(name).ok_or_else(|| Error::MethodNotFound {
            method: name.to_string(),
            available: self.methods(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Fill in schemas from a catalog for methods that declare none
    ///
    /// Explicitly declared schemas win. Catalog entries for methods that are
    /// not registered are logged and ignored.
    pub fn attach_schemas(&mut self, catalog: &SchemaCatalog) {
        for name in catalog.methods() {
            let Some(spec) = self.methods.get_mut(&name) else {
                tracing::warn!(method = %name, "Schema found for unregistered method");
                continue;
            };
            if spec.params_schema.is_none() {
                spec.params_schema = catalog.params_schema(&name).cloned();
            }
            if spec.result_schema.is_none() {
                spec.result_schema = catalog.result_schema(&name).cloned();
            }
        }
    }
}
