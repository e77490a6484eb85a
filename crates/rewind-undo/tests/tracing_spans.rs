#![forbid(unsafe_code)]

//! Tracing span enforcement for undo/redo.
//!
//! Verify that each command runs inside its `undo.execute` / `redo.execute`
//! span, that the declared fields get recorded, and that a rolled back
//! transaction warns.
//!
//! Run:
//!   cargo test -p rewind-undo --test tracing_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rewind_core::text::{TextBuffer, TextOp, TextTransform};
use rewind_core::{BatchType, Delta, Document, TransformError};
use rewind_undo::UndoManager;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    parent_span_name: Option<String>,
}

#[derive(Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
    span_index: HashMap<u64, usize>,
}

struct SpanCapture(Arc<Mutex<Captured>>);

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        for field in attrs.metadata().fields() {
            fields.entry(field.name().to_string()).or_default();
        }

        let mut captured = self.0.lock().unwrap();
        let idx = captured.spans.len();
        captured.spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields,
        });
        captured.span_index.insert(id.into_u64(), idx);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        values.record(&mut visitor);

        let mut captured = self.0.lock().unwrap();
        if let Some(&idx) = captured.span_index.get(&id.into_u64()) {
            for (k, v) in visitor.0 {
                captured.spans[idx].fields.insert(k, v);
            }
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .iter()
            .find(|(k, _)| k == "message")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.0.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            parent_span_name,
        });
    }
}

fn with_captured<F>(f: F) -> Captured
where
    F: FnOnce(),
{
    let captured = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(SpanCapture(Arc::clone(&captured)));
    tracing::subscriber::with_default(subscriber, f);
    let mut guard = captured.lock().unwrap();
    std::mem::take(&mut *guard)
}

fn session() -> (Document<TextBuffer>, UndoManager<TextOp>) {
    let mut doc = Document::new(TextBuffer::from("abc"));
    doc.apply_single(BatchType::Undoable, TextOp::insert(0, 3, "d"))
        .unwrap();
    (doc, UndoManager::default())
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn undo_and_redo_run_in_named_spans_with_fields() {
    let (mut doc, mut manager) = session();
    let captured = with_captured(|| {
        manager.undo(&mut doc, &TextTransform).unwrap();
        manager.redo(&mut doc, &TextTransform).unwrap();
    });

    for name in ["undo.execute", "redo.execute"] {
        let span = captured
            .spans
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing span {name}"));
        for field in ["batch", "deltas", "version", "result"] {
            let value = span.fields.get(field).map(String::as_str).unwrap_or("");
            assert!(!value.is_empty(), "{name}.{field} not recorded");
        }
        assert_eq!(span.fields["result"], "ok");
    }

    let undo_span = captured
        .spans
        .iter()
        .find(|s| s.name == "undo.execute")
        .unwrap();
    assert_eq!(undo_span.fields["version"], "2");
    assert_eq!(undo_span.fields["deltas"], "1");
}

#[test]
fn applied_deltas_are_logged_inside_the_command_span() {
    let (mut doc, mut manager) = session();
    let captured = with_captured(|| {
        manager.undo(&mut doc, &TextTransform).unwrap();
    });
    let applied: Vec<_> = captured
        .events
        .iter()
        .filter(|e| e.message == "delta applied")
        .collect();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].level, tracing::Level::DEBUG);
    assert_eq!(applied[0].parent_span_name.as_deref(), Some("undo.execute"));
}

#[test]
fn failed_undo_records_error_and_warns() {
    let mut doc = Document::new(TextBuffer::from(""));
    let mut manager: UndoManager<TextOp> = UndoManager::default();
    doc.apply_single(BatchType::Undoable, TextOp::insert(0, 0, "a"))
        .unwrap();
    doc.apply_single(BatchType::Transparent, TextOp::insert(0, 1, "b"))
        .unwrap();
    let broken = |_: Vec<Delta<TextOp>>,
                  _: &[Delta<TextOp>],
                  _: bool|
     -> Result<Vec<Delta<TextOp>>, TransformError> {
        Err(TransformError::invalid("offline"))
    };

    let captured = with_captured(|| {
        assert!(manager.undo(&mut doc, &broken).is_err());
    });
    let span = captured
        .spans
        .iter()
        .find(|s| s.name == "undo.execute")
        .unwrap();
    assert_eq!(span.fields["result"], "error");
    assert!(captured
        .events
        .iter()
        .any(|e| e.level == tracing::Level::WARN && e.message == "undo failed"));
}

#[test]
fn rollback_with_changes_warns() {
    let mut doc = Document::new(TextBuffer::from(""));
    let captured = with_captured(|| {
        let mut tx = doc.transaction();
        let batch = tx.begin_batch(BatchType::Undoable);
        tx.apply_operation(batch, TextOp::insert(0, 0, "x")).unwrap();
    });
    assert!(captured
        .events
        .iter()
        .any(|e| e.level == tracing::Level::WARN && e.message == "transaction rolled back"));
    assert_eq!(doc.model().as_str(), "");
}
