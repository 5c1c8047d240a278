//! Parameter and result schemas
//!
//! Methods may declare a JSON Schema for their parameters, their result, or
//! both. Validation goes through the [`SchemaValidator`] capability so the
//! engine can be swapped; [`JsonSchemaValidator`] is the default, built on
//! the `jsonschema` crate.
//!
//! # Absent schemas
//!
//! Besides a schema document, a method can declare [`Schema::Absent`]: the
//! value must not be there at all. For parameters that means the call must
//! carry none; for results it means the handler must return `null`.
//!
//! # Schema directories
//!
//! [`SchemaCatalog::load`] reads a directory of schema files named after
//! the methods they describe:
//!
//! ```text
//! schemas/
//!   add.params.json        # {"type": "array", "items": {"type": "number"}}
//!   add.result.json        # {"type": "number"}
//!   shutdown.params.json   # (empty file: no parameters allowed)
//! ```
//!
//! An empty file stands for [`Schema::Absent`].
//!
//! # Unusable schemas
//!
//! A schema document the validator cannot use is a fault of the service,
//! not of the caller. `DispatcherBuilder::build` refuses to build with one,
//! and a schema that becomes unusable later fails its calls with
//! `Internal error`, never `Invalid params`.

use jsonrpc11_core::{Error, Result, SchemaViolation};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// What a method declares about its parameters or its result
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// The value must validate against this JSON Schema document
    Document(Value),
    /// The value must be absent
    Absent,
}

impl Schema {
    /// Interpret the contents of a schema file
    ///
    /// Blank contents mean [`Schema::Absent`].
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Schema::Absent);
        }
        serde_json::from_str(text)
            .map(Schema::Document)
            .map_err(|e| Error::Schema(e.to_string()))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Schema::Absent)
    }

    pub fn document(&self) -> Option<&Value> {
        match self {
            Schema::Document(doc) => Some(doc),
            Schema::Absent => None,
        }
    }
}

impl From<Value> for Schema {
    fn from(doc: Value) -> Self {
        Schema::Document(doc)
    }
}

/// Capability for checking a value against a schema document
///
/// Implementations must be thread-safe; one validator serves every call of
/// a dispatcher.
pub trait SchemaValidator: Send + Sync {
    /// Check `value` against `schema`, describing the first problem found
    fn validate(&self, schema: &Value, value: &Value) -> std::result::Result<(), SchemaViolation>;

    /// Check that `schema` itself is usable, saying why not
    ///
    /// Runs for every declared document when the dispatcher is built, and
    /// before each validation. The default accepts every document.
    fn check_schema(&self, schema: &Value) -> std::result::Result<(), String> {
        let _ = schema;
        Ok(())
    }
}

/// Check a declared schema document of `method`, as an `Error::Schema`
pub(crate) fn check_declared(
    validator: &dyn SchemaValidator,
    method: &str,
    role: &str,
    schema: &Value,
) -> Result<()> {
    validator
        .check_schema(schema)
        .map_err(|reason| Error::Schema(format!("{role} schema of method '{method}': {reason}")))
}

/// [`SchemaValidator`] backed by the `jsonschema` crate
///
/// Compiled validators are cached per schema document, so checking every
/// declared schema at build time also warms the cache.
///
/// # Examples
///
/// ```rust
/// use jsonrpc11_server::{JsonSchemaValidator, SchemaValidator};
/// use serde_json::json;
///
/// let validator = JsonSchemaValidator::new();
/// let schema = json!({"type": "array", "items": {"type": "integer"}});
///
/// assert!(validator.validate(&schema, &json!([1, 2])).is_ok());
///
/// let violation = validator.validate(&schema, &json!([1, "two"])).unwrap_err();
/// assert_eq!(violation.path, "/1");
/// ```
#[derive(Default)]
pub struct JsonSchemaValidator {
    compiled: RwLock<HashMap<String, Arc<jsonschema::Validator>>>,
}

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct schemas compiled so far
    pub fn cached(&self) -> usize {
        self.compiled.read().map(|cache| cache.len()).unwrap_or(0)
    }

    fn compiled_for(&self, schema: &Value) -> std::result::Result<Arc<jsonschema::Validator>, String> {
        let key = schema.to_string();

        if let Ok(cache) = self.compiled.read() {
            if let Some(validator) = cache.get(&key) {
                return Ok(Arc::clone(validator));
            }
        }

        let validator = jsonschema::Validator::new(schema)
            .map(Arc::new)
            .map_err(|e| format!("schema does not compile: {e} (at {})", e.schema_path))?;

        if let Ok(mut cache) = self.compiled.write() {
            cache.insert(key, Arc::clone(&validator));
        }
        Ok(validator)
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, value: &Value) -> std::result::Result<(), SchemaViolation> {
        let validator = self.compiled_for(schema).map_err(SchemaViolation::new)?;

        validator.validate(value).map_err(|e| {
            SchemaViolation::new(e.to_string())
                .with_path(e.instance_path.to_string())
                .with_schema_path(e.schema_path.to_string())
                .with_value(e.instance.into_owned())
        })
    }

    fn check_schema(&self, schema: &Value) -> std::result::Result<(), String> {
        self.compiled_for(schema).map(|_| ())
    }
}

/// Validator that accepts everything
///
/// Useful when schemas are declared for documentation only.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl SchemaValidator for AcceptAll {
    fn validate(&self, _schema: &Value, _value: &Value) -> std::result::Result<(), SchemaViolation> {
        Ok(())
    }
}

const PARAMS_SUFFIX: &str = ".params.json";
const RESULT_SUFFIX: &str = ".result.json";

/// Schemas loaded from a directory, keyed by method name
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    params: HashMap<String, Schema>,
    results: HashMap<String, Schema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<method>.params.json` and `<method>.result.json` in `dir`
    ///
    /// # Errors
    ///
    /// - `Error::Io` if the directory or a file cannot be read
    /// - `Error::Schema` if a non-empty file is not valid JSON
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::Io(format!(
                "schema directory {} does not exist",
                dir.display()
            )));
        }

        let mut catalog = Self::new();
        for (suffix, target) in [
            (PARAMS_SUFFIX, &mut catalog.params),
            (RESULT_SUFFIX, &mut catalog.results),
        ] {
            for path in matching_files(dir, suffix)? {
                let Some(method) = method_name(&path, suffix) else {
                    continue;
                };
                let text = std::fs::read_to_string(&path)?;
                let schema = Schema::parse(&text)
                    .map_err(|e| Error::Schema(format!("{}: {e}", path.display())))?;

                tracing::debug!(
                    method = %method,
                    file = %path.display(),
                    absent = schema.is_absent(),
                    "Loaded schema"
                );
                target.insert(method, schema);
            }
        }

        tracing::info!(
            dir = %dir.display(),
            params = catalog.params.len(),
            results = catalog.results.len(),
            "Schema directory loaded"
        );
        Ok(catalog)
    }

    pub fn insert_params(&mut self, method: impl Into<String>, schema: Schema) {
        self.params.insert(method.into(), schema);
    }

    pub fn insert_result(&mut self, method: impl Into<String>, schema: Schema) {
        self.results.insert(method.into(), schema);
    }

    pub fn params_schema(&self, method: &str) -> Option<&Schema> {
        self.params.get(method)
    }

    pub fn result_schema(&self, method: &str) -> Option<&Schema> {
        self.results.get(method)
    }

    /// Every method with at least one schema, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .params
            .keys()
            .chain(self.results.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.results.is_empty()
    }
}

fn matching_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        suffix
    );

    let paths = glob::glob(&pattern).map_err(|e| Error::Schema(e.to_string()))?;
    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| Error::Io(e.to_string()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn method_name(path: &Path, suffix: &str) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let method = file_name.strip_suffix(suffix)?;
    (!method.is_empty()).then(|| method.to_string())
}
