//! Watch a script and recompile it on every write.
//!
//! File events arrive on the watcher's thread and are forwarded as unit
//! signals through a bounded channel. When the channel is full the signal
//! is dropped: a burst of edits still triggers at least one recompile that
//! sees a recent state of the file.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use notify::event::{EventKind, ModifyKind};
use notify::{RecursiveMode, Watcher};

use crate::compiler::{CompileError, CompileOptions, Compiler};
use crate::loader::ScriptLoader;

/// Pending recompile signals held before new ones are dropped.
pub const SIGNAL_CAPACITY: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("file watcher failed: {0}")]
    Notify(#[from] notify::Error),
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Sending half of the recompile signal channel.
#[derive(Debug, Clone)]
pub struct SignalSender(SyncSender<()>);

impl SignalSender {
    /// Queue a recompile. Returns `false` when the signal was dropped
    /// because the queue is full or the receiver is gone.
    pub fn notify(&self) -> bool {
        match self.0.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                tracing::trace!("recompile already queued, dropping signal");
                false
            }
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// Whether `kind` is a write to the file contents. Metadata changes and
/// renames are not.
#[must_use]
pub const fn is_write(kind: EventKind) -> bool {
    matches!(kind, EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any))
}

/// Create a signal channel holding at most [`SIGNAL_CAPACITY`] signals.
#[must_use]
pub fn signal_channel() -> (SignalSender, Receiver<()>) {
    let (tx, rx) = mpsc::sync_channel(SIGNAL_CAPACITY);
    (SignalSender(tx), rx)
}

/// Compiles one input file into one output file.
#[derive(Debug)]
pub struct Recompiler<L> {
    compiler: Compiler<L>,
    options: CompileOptions,
    input: PathBuf,
    output: PathBuf,
}

impl<L: ScriptLoader> Recompiler<L> {
    #[must_use]
    pub fn new(
        compiler: Compiler<L>,
        options: CompileOptions,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            options,
            input: input.into(),
            output: output.into(),
        }
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Read, compile and write once. The output file is left untouched
    /// when any step fails.
    pub fn recompile(&self) -> Result<(), WatchError> {
        let script = std::fs::read_to_string(&self.input).map_err(|source| WatchError::Io {
            path: self.input.clone(),
            source,
        })?;
        let compiled = self.compiler.compile(&script, &self.options)?;
        std::fs::write(&self.output, compiled).map_err(|source| WatchError::Io {
            path: self.output.clone(),
            source,
        })?;
        tracing::debug!(output = %self.output.display(), "recompiled");
        Ok(())
    }

    /// Recompile once per received signal until every sender is dropped.
    /// Returns the number of successful recompiles.
    pub fn run(&self, signals: &Receiver<()>) -> usize {
        let mut compiled = 0;
        for () in signals {
            match self.recompile() {
                Ok(()) => compiled += 1,
                Err(err) => {
                    tracing::error!(
                        input = %self.input.display(),
                        error = %err,
                        "recompile failed"
                    );
                }
            }
        }
        compiled
    }

    /// Watch the input file and recompile on every write.
    ///
    /// Blocks for as long as the watcher is alive.
    pub fn watch(&self) -> Result<(), WatchError> {
        let (tx, rx) = signal_channel();
        let handler = move |event: notify::Result<notify::Event>| match event {
            Ok(event) if is_write(event.kind) => {
                tx.notify();
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "watch event error"),
        };
        let mut watcher = notify::recommended_watcher(handler)?;
        watcher.watch(&self.input, RecursiveMode::NonRecursive)?;
        tracing::info!(input = %self.input.display(), output = %self.output.display(), "watching");

        self.run(&rx);
        Ok(())
    }
}
