//! # Span Processor Interface
//!
//! Span processors are hooks invoked when spans start and end. They are
//! responsible for converting finished spans into exportable representation
//! and passing them to exporters.
//!
//! The following diagram shows the processor's relationship to the other
//! components of the pipeline:
//!
//! ```ascii
//!   +-----+--------------+   +-----------------------+   +-------------------+
//!   |     |              |   |                       |   |                   |
//!   |     | Span.end()   +---> SerialSpanProcessor   +--->   SpanExporter    |
//!   | SDK |              |   |                       |   |                   |
//!   |     |              |   +-----------------------+   +-------------------+
//!   +-----+--------------+
//! ```
//!
//! [`SerialSpanProcessor`] forwards each finished span to the exporter as
//! soon as it ends, without batching, while guaranteeing that exporter
//! operations started from overlapping calls (span end, flush, shutdown,
//! and any calls the exporter itself re-triggers) run one at a time, in
//! arrival order, and are never dropped.

use crate::error::{ExportError, ExportResult};
use crate::export::{SpanExporter, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::span::{SpanContext, SpanData};
use crate::{diag_debug, diag_error, diag_warn};
use std::collections::VecDeque;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Environment variable overriding the default shutdown timeout, in
/// milliseconds.
pub(crate) const SPAN_EXPORT_SHUTDOWN_TIMEOUT: &str = "SPAN_EXPORT_SHUTDOWN_TIMEOUT";

/// `SpanProcessor` is an interface which allows hooks for span start and
/// end method invocations. Processors are only invoked for spans that are
/// recording.
pub trait SpanProcessor: Send + Sync + Debug {
    /// `on_start` is called when a span is started. This method is called
    /// synchronously on the thread that started the span, therefore it
    /// should not block or throw exceptions.
    fn on_start(&self, span: &mut SpanData, parent: Option<&SpanContext>);

    /// `on_end` is called after a span is ended (i.e., the end timestamp is
    /// already set). This method is called synchronously within the span
    /// end operation and never reports an outcome to its caller; failures
    /// are routed to the diagnostic sink.
    fn on_end(&self, span: SpanData);

    /// Force the exporter to flush any internally buffered state.
    fn force_flush(&self) -> ExportResult;

    /// Shuts down the processor, giving the exporter `timeout` to finish.
    /// Implementations must make sure shutdown can be called multiple
    /// times; only the first call reaches the exporter.
    fn shutdown_with_timeout(&self, timeout: Duration) -> ExportResult;

    /// Shuts down the processor with the default timeout.
    fn shutdown(&self) -> ExportResult {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}

/// One queued exporter operation.
#[derive(Debug)]
enum ExportOp {
    ExportSpan(Box<SpanData>),
    ForceFlush,
    Shutdown(Duration),
}

impl ExportOp {
    fn label(&self) -> &'static str {
        match self {
            ExportOp::ExportSpan(_) => "export",
            ExportOp::ForceFlush => "force_flush",
            ExportOp::Shutdown(_) => "shutdown",
        }
    }
}

/// A queued operation plus whether its outcome is reported to the caller
/// that enqueued it. `propagate` is decided once, at enqueue time: only a
/// call that finds no drain in progress (and therefore becomes the drain
/// owner) may observe an outcome.
#[derive(Debug)]
struct ExportTask {
    op: ExportOp,
    propagate: bool,
}

#[derive(Debug)]
struct QueueState {
    tasks: VecDeque<ExportTask>,
    /// True exactly while one call is inside [`SerialSpanProcessor::drain`].
    draining: bool,
}

/// A [`SpanProcessor`] that passes finished spans to the configured
/// [`SpanExporter`] as soon as they are finished, without batching.
///
/// Exporter operations requested while another one is running - whether
/// from a parallel thread or reentrantly from inside the exporter itself -
/// are queued and executed by the call that currently owns the queue, in
/// FIFO order. The owning call pays the full latency of draining the
/// queue, including work queued by others meanwhile; every other call
/// returns immediately with [`ExportError::DrainInProgress`].
///
/// This is typically useful for debugging and testing. For scenarios
/// requiring higher throughput, a batching processor should be used.
#[derive(Debug)]
pub struct SerialSpanProcessor<T: SpanExporter> {
    exporter: T,
    state: Mutex<QueueState>,
    closed: AtomicBool,
    shutdown_timeout: Duration,
}

impl<T: SpanExporter> SerialSpanProcessor<T> {
    /// Create a new [`SerialSpanProcessor`] using the provided exporter
    /// and default configuration.
    pub fn new(exporter: T) -> Self {
        SerialSpanProcessorBuilder::new(exporter).build()
    }

    /// Create a builder to configure a [`SerialSpanProcessor`].
    pub fn builder(exporter: T) -> SerialSpanProcessorBuilder<T> {
        SerialSpanProcessorBuilder::new(exporter)
    }

    /// Enqueue one exporter operation and, if no drain is in progress,
    /// become the drain owner and run the queue to completion.
    ///
    /// The lock makes "observe `draining`, decide propagation, enqueue,
    /// claim ownership" a single atomic step; it is released before any
    /// exporter code runs, so a reentrant call re-enters here, observes
    /// `draining == true` and returns without blocking.
    fn submit(&self, op: ExportOp, propagate: bool) -> ExportResult {
        let is_owner = {
            let mut state = self.state.lock()?;
            let propagate = propagate && !state.draining;
            state.tasks.push_back(ExportTask { op, propagate });
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if is_owner {
            self.drain()
        } else {
            Err(ExportError::DrainInProgress)
        }
    }

    /// Run queued operations until the queue is empty, then release drain
    /// ownership. At most one invocation is ever inside this method.
    fn drain(&self) -> ExportResult {
        // Clears `draining` if the exporter unwinds, so a panicking export
        // cannot wedge the queue.
        let mut unwind_guard = DrainGuard::new(&self.state);
        let mut failure = None;

        loop {
            let task = {
                let mut state = self.state.lock()?;
                match state.tasks.pop_front() {
                    Some(task) => task,
                    None => {
                        // Released under the same lock as the empty check:
                        // a concurrent enqueue either landed in this drain
                        // or finds the flag cleared and starts the next.
                        state.draining = false;
                        break;
                    }
                }
            };

            let label = task.op.label();
            if let Err(err) = self.run_op(task.op) {
                if task.propagate {
                    // Surfaced to the drain owner's caller, but only after
                    // the rest of the queue has been processed.
                    failure = Some(err);
                } else {
                    diag_error!(
                        name: "SerialSpanProcessor.Drain.TaskError",
                        operation = label,
                        error = format!("{err}")
                    );
                }
            }
        }

        unwind_guard.disarm();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_op(&self, op: ExportOp) -> ExportResult {
        match op {
            ExportOp::ExportSpan(span) => {
                futures_executor::block_on(self.exporter.export(vec![*span]))
            }
            ExportOp::ForceFlush => self.exporter.force_flush(),
            ExportOp::Shutdown(timeout) => self.exporter.shutdown_with_timeout(timeout),
        }
    }
}

impl<T: SpanExporter> SpanProcessor for SerialSpanProcessor<T> {
    fn on_start(&self, _span: &mut SpanData, _parent: Option<&SpanContext>) {
        // Ignored
    }

    fn on_end(&self, span: SpanData) {
        if self.closed.load(Ordering::Relaxed) {
            diag_warn!(name: "SerialSpanProcessor.OnEnd.ProcessorShutdown");
            return;
        }
        if !span.span_context.is_sampled() {
            return;
        }

        match self.submit(ExportOp::ExportSpan(Box::new(span)), false) {
            // DrainInProgress means the active drain owner took the task.
            Ok(()) | Err(ExportError::DrainInProgress) => {}
            Err(err) => {
                diag_debug!(
                    name: "SerialSpanProcessor.OnEnd.Error",
                    reason = format!("{err:?}")
                );
            }
        }
    }

    fn force_flush(&self) -> ExportResult {
        if self.closed.load(Ordering::Relaxed) {
            return Err(ExportError::AlreadyShutdown);
        }
        self.submit(ExportOp::ForceFlush, true)
    }

    fn shutdown_with_timeout(&self, timeout: Duration) -> ExportResult {
        // Accepted exactly once, and marked closed before the task is
        // enqueued so no span ending concurrently can slip in behind it.
        if self.closed.swap(true, Ordering::Relaxed) {
            return Err(ExportError::AlreadyShutdown);
        }
        self.submit(ExportOp::Shutdown(timeout), true)
    }

    fn shutdown(&self) -> ExportResult {
        self.shutdown_with_timeout(self.shutdown_timeout)
    }
}

/// Clears [`QueueState::draining`] on unwind. On the normal path the drain
/// loop releases the flag itself, atomically with observing the queue
/// empty, and disarms this guard.
struct DrainGuard<'a> {
    state: &'a Mutex<QueueState>,
    armed: bool,
}

impl<'a> DrainGuard<'a> {
    fn new(state: &'a Mutex<QueueState>) -> Self {
        DrainGuard { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Ok(mut state) = self.state.lock() {
                state.draining = false;
            }
        }
    }
}

/// Builder for [`SerialSpanProcessor`].
#[derive(Debug)]
pub struct SerialSpanProcessorBuilder<T: SpanExporter> {
    exporter: T,
    shutdown_timeout: Duration,
}

impl<T: SpanExporter> SerialSpanProcessorBuilder<T> {
    /// Create a new builder for the provided exporter. The default
    /// shutdown timeout is taken from the `SPAN_EXPORT_SHUTDOWN_TIMEOUT`
    /// environment variable (milliseconds) if set and valid.
    pub fn new(exporter: T) -> Self {
        SerialSpanProcessorBuilder {
            exporter,
            shutdown_timeout: default_shutdown_timeout(),
        }
    }

    /// Set the timeout handed to the exporter when [`SpanProcessor::shutdown`]
    /// is called without an explicit timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Build a new [`SerialSpanProcessor`].
    pub fn build(self) -> SerialSpanProcessor<T> {
        SerialSpanProcessor {
            exporter: self.exporter,
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                draining: false,
            }),
            closed: AtomicBool::new(false),
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

fn default_shutdown_timeout() -> Duration {
    env::var(SPAN_EXPORT_SHUTDOWN_TIMEOUT)
        .ok()
        .and_then(|timeout| u64::from_str(&timeout).ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT)
}
