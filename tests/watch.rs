//! Recompile loop driven by signals, without a live file watcher.

use std::fs;
use std::thread;

use sqlm::{
    CompileOptions, Compiler, FsLoader, Recompiler, SIGNAL_CAPACITY, WatchError, signal_channel,
};

const ROOT: &str = "/* [sqlmbegin] [script] - description: \"w\"\n\
                    [dev] - body: sqlmfile(\"child.sql\")\n[sqlmend] */\n\
                    insert into t {{ body }};\n";

fn recompiler(dir: &std::path::Path) -> Recompiler<FsLoader> {
    Recompiler::new(
        Compiler::new(FsLoader::new(dir)),
        CompileOptions::new(),
        dir.join("root.sql"),
        dir.join("out.sql"),
    )
}

#[test]
fn recompile_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("root.sql"), ROOT).unwrap();
    fs::write(dir.path().join("child.sql"), "select 1").unwrap();

    recompiler(dir.path()).recompile().unwrap();

    let out = fs::read_to_string(dir.path().join("out.sql")).unwrap();
    assert!(out.ends_with("insert into t select 1;\n"), "{out}");
}

#[test]
fn failed_compile_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("root.sql"), ROOT).unwrap();
    fs::write(dir.path().join("out.sql"), "previous").unwrap();

    let err = recompiler(dir.path()).recompile().unwrap_err();
    assert!(matches!(err, WatchError::Compile(_)));
    assert_eq!(
        fs::read_to_string(dir.path().join("out.sql")).unwrap(),
        "previous"
    );
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = recompiler(dir.path()).recompile().unwrap_err();
    assert!(matches!(err, WatchError::Io { path, .. } if path.ends_with("root.sql")));
}

#[test]
fn run_recompiles_once_per_queued_signal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("root.sql"), ROOT).unwrap();
    fs::write(dir.path().join("child.sql"), "select 2").unwrap();

    let (tx, rx) = signal_channel();
    let mut accepted = 0;
    for _ in 0..SIGNAL_CAPACITY + 3 {
        if tx.notify() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, SIGNAL_CAPACITY);
    drop(tx);

    let compiled = recompiler(dir.path()).run(&rx);
    assert_eq!(compiled, SIGNAL_CAPACITY);
    let out = fs::read_to_string(dir.path().join("out.sql")).unwrap();
    assert!(out.ends_with("insert into t select 2;\n"));
}

#[test]
fn signals_from_another_thread() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("root.sql"), ROOT).unwrap();
    fs::write(dir.path().join("child.sql"), "select 3").unwrap();

    let (tx, rx) = signal_channel();
    let sender = thread::spawn(move || {
        tx.notify();
    });
    sender.join().unwrap();

    assert_eq!(recompiler(dir.path()).run(&rx), 1);
    assert!(
        fs::read_to_string(dir.path().join("out.sql"))
            .unwrap()
            .contains("select 3")
    );
}
