#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rewind_core::DocumentModel;
use rewind_core::text::{TextBuffer, TextEdit, TextOp, TextTransform};

#[derive(Debug, Arbitrary)]
enum RawEdit {
    Insert { at: u8, text: u8 },
    Delete { at: u8, len: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    start: u8,
    strong: bool,
    a: Vec<RawEdit>,
    b: Vec<RawEdit>,
}

/// Fit raw edits to `start`, applying each so the next sees its result.
fn materialize(start: &str, raw: &[RawEdit]) -> Vec<TextEdit> {
    let mut buf = TextBuffer::from(start);
    let mut out = Vec::new();
    for edit in raw.iter().take(16) {
        let chars: Vec<char> = buf.as_str().chars().collect();
        let edit = match *edit {
            RawEdit::Insert { at, text } => TextEdit::Insert {
                position: usize::from(at) % (chars.len() + 1),
                // Multi-byte characters keep char/byte offsets honest.
                text: ["x", "é", "yz", "日本"][usize::from(text) % 4].to_owned(),
            },
            RawEdit::Delete { at, len } => {
                if chars.is_empty() {
                    continue;
                }
                let position = usize::from(at) % chars.len();
                let end = (position + usize::from(len % 4) + 1).min(chars.len());
                TextEdit::Delete {
                    position,
                    text: chars[position..end].iter().collect(),
                }
            }
        };
        if buf.apply(&TextOp::new(0, edit.clone())).is_err() {
            return out;
        }
        out.push(edit);
    }
    out
}

fn run(start: &str, edits: &[TextEdit]) -> String {
    let mut buf = TextBuffer::from(start);
    for edit in edits {
        buf.apply(&TextOp::new(0, edit.clone()))
            .expect("transformed edit must apply");
    }
    buf.into_string()
}

fuzz_target!(|input: Input| {
    let start: String = "abcdéfghij".chars().take(usize::from(input.start % 11)).collect();
    let a = materialize(&start, &input.a);
    let b = materialize(&start, &input.b);

    let (a1, b1) = TextTransform::transform_edits(&a, &b, input.strong);
    let mut ab = a.clone();
    ab.extend(b1);
    let mut ba = b.clone();
    ba.extend(a1);
    assert_eq!(run(&start, &ab), run(&start, &ba), "transform diverged");
});
