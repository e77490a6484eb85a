#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rewind_core::text::{TextBuffer, TextOp, TextTransform};
use rewind_core::{BatchType, Document};
use rewind_undo::{UndoConfig, UndoManager};

#[derive(Debug, Arbitrary)]
enum Step {
    Type { at: u8, remote: bool },
    Erase { at: u8 },
    Undo,
    Redo,
}

fuzz_target!(|steps: Vec<Step>| {
    let mut doc = Document::new(TextBuffer::from("seed"));
    let mut manager: UndoManager<TextOp> = UndoManager::new(UndoConfig::new(32));
    let mut remote_seen = false;

    for step in steps.iter().take(64) {
        let len = doc.model().char_len();
        let before = (doc.model().as_str().to_owned(), doc.version());
        match *step {
            Step::Type { at, remote } => {
                let kind = if remote {
                    BatchType::Transparent
                } else {
                    BatchType::Undoable
                };
                let op = TextOp::insert(0, usize::from(at) % (len + 1), "k");
                doc.apply_single(kind, op).expect("in-range insert applies");
                remote_seen |= remote;
            }
            Step::Erase { at } => {
                if len == 0 {
                    continue;
                }
                let position = usize::from(at) % len;
                let ch: String = doc.model().as_str().chars().skip(position).take(1).collect();
                doc.apply_single(BatchType::Undoable, TextOp::delete(0, position, ch))
                    .expect("in-range delete applies");
            }
            Step::Undo | Step::Redo => {
                let result = if matches!(step, Step::Undo) {
                    manager.undo(&mut doc, &TextTransform)
                } else {
                    manager.redo(&mut doc, &TextTransform)
                };
                if let Err(err) = &result {
                    assert!(remote_seen, "command failed without concurrent edits: {err}");
                    assert_eq!(doc.model().as_str(), before.0, "failed command changed text");
                    assert_eq!(doc.version(), before.1, "failed command moved version");
                }
            }
        }

        let mut expected = 0;
        for delta in doc.history().iter() {
            assert_eq!(delta.base_version(), expected, "history gap");
            expected = delta.end_version();
        }
        assert_eq!(expected, doc.version(), "version out of sync with history");
    }
});
