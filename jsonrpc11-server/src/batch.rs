//! Batch processing
//!
//! A batch is a JSON array of request envelopes submitted together. Entries
//! are independent: each one is validated, resolved and invoked on its own,
//! and a failure in one never affects the others.
//!
//! # Batch Modes
//!
//! - **Sequential** (default): entries run one after another, in order
//! - **Parallel**: every entry runs on its own tokio task
//!
//! Either way, responses come back in request order, and every entry sees
//! the same [`CallContext`].
//!
//! # Size Limiting
//!
//! An optional limit caps the number of entries. An oversized batch is
//! rejected as a whole with one `Invalid Request` response carrying the
//! limit and the actual size.
//!
//! # Examples
//!
//! ```rust
//! use jsonrpc11_server::{BatchMode, BatchProcessor};
//!
//! // Parallel processing with a 100-entry limit
//! let processor = BatchProcessor::with_limit(BatchMode::Parallel, Some(100));
//! assert!(processor.check_size(100).is_ok());
//! assert!(processor.check_size(101).is_err());
//!
//! // Sequential processing, unlimited size
//! let sequential = BatchProcessor::new(BatchMode::Sequential);
//! assert_eq!(sequential.max_size(), None);
//! ```

use crate::context::CallContext;
use crate::dispatcher::{Dispatcher, EntryOutcome};
use jsonrpc11_core::{Error, Request, Result};
use serde_json::Value;

/// How the entries of a batch are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One entry at a time, in order
    ///
    /// Needs no async runtime beyond whatever drives the dispatch future.
    #[default]
    Sequential,

    /// All entries concurrently, each on its own tokio task
    ///
    /// Requires a tokio runtime.
    Parallel,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Sequential => "sequential",
            BatchMode::Parallel => "parallel",
        }
    }
}

/// Executes the entries of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    mode: BatchMode,
    max_size: Option<usize>,
}

impl BatchProcessor {
    /// Create a processor with no size limit
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            max_size: None,
        }
    }

    /// Create a processor with an optional size limit
    pub fn with_limit(mode: BatchMode, max_size: Option<usize>) -> Self {
        Self { mode, max_size }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Check a batch size against the limit
    ///
    /// # Errors
    ///
    /// Returns `Error::BatchSizeExceeded` if the batch is too large.
    pub fn check_size(&self, size: usize) -> Result<()> {
        match self.max_size {
            Some(limit) if size > limit => Err(Error::BatchSizeExceeded {
                limit,
                actual: size,
            }),
            _ => Ok(()),
        }
    }

    /// Run every entry, returning one outcome per entry in order
    #[tracing::instrument(skip(self, entries, dispatcher, ctx), fields(batch_size = entries.len(), mode = ?self.mode))]
    pub(crate) async fn process_batch(
        &self,
        entries: Vec<Value>,
        dispatcher: &Dispatcher,
        ctx: &CallContext,
    ) -> Vec<EntryOutcome> {
        let outcomes = match self.mode {
            BatchMode::Parallel => self.process_parallel(entries, dispatcher, ctx).await,
            BatchMode::Sequential => self.process_sequential(entries, dispatcher, ctx).await,
        };

        tracing::debug!(outcome_count = outcomes.len(), "Batch processing completed");
        outcomes
    }

    async fn process_parallel(
        &self,
        entries: Vec<Value>,
        dispatcher: &Dispatcher,
        ctx: &CallContext,
    ) -> Vec<EntryOutcome> {
        let mut tasks = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = Request::id_of(&entry);
            let is_envelope = entry.is_object();
            let method = entry.get("method").and_then(Value::as_str).map(str::to_string);
            let task_dispatcher = dispatcher.clone();
            let task_ctx = ctx.clone();

            let task =
                tokio::spawn(async move { task_dispatcher.process_entry(entry, &task_ctx).await });
            tasks.push((task, id, is_envelope, method));
        }

        // Awaiting in spawn order keeps responses in request order
        let mut outcomes = Vec::with_capacity(tasks.len());
        for (task, id, is_envelope, method) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "Batch entry task failed");
                    dispatcher.settle(
                        id,
                        is_envelope,
                        method,
                        Err(Error::internal(format!("batch entry task failed: {e}"))),
                    )
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn process_sequential(
        &self,
        entries: Vec<Value>,
        dispatcher: &Dispatcher,
        ctx: &CallContext,
    ) -> Vec<EntryOutcome> {
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            outcomes.push(dispatcher.process_entry(entry, ctx).await);
        }

        outcomes
    }
}
