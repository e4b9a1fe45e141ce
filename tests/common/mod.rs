#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use sqlm::{Directives, format, parse};

/// Build a script whose directive block has `description` and one `[dev]`
/// section made of `entries`, followed by `body`.
pub fn script(description: &str, entries: &[&str], body: &str) -> String {
    let mut out = String::from("/* [sqlmbegin]\n[script]\n");
    out.push_str(&format!("\t- description: \"{description}\"\n[dev]\n"));
    for entry in entries {
        out.push_str("\t- ");
        out.push_str(entry);
        out.push('\n');
    }
    out.push_str("[sqlmend] */\n");
    out.push_str(body);
    out
}

/// Helper: format a tree, parse it back, assert structural equality.
pub fn assert_tree_roundtrip(original: &Directives) {
    let formatted = format(original);
    let parsed = parse(&formatted).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{formatted}"
        )
    });
    assert_eq!(
        *original, parsed,
        "tree mismatch\n--- formatted ---\n{formatted}"
    );
}

/// In-memory log sink for `tracing_subscriber::fmt().with_writer(..)`.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A dispatch writing every event at `debug` and above into `sink`.
pub fn capturing_dispatch(sink: &Captured) -> tracing::Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(sink.clone())
        .finish();
    tracing::Dispatch::new(subscriber)
}
