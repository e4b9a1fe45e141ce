//! Fragment compiler: inlines nested references and substitutes
//! placeholders for one target environment.
//!
//! A compile runs four stages in order:
//!
//! 1. parse the root script's directive block;
//! 2. resolve nested references depth-first into a bounded stack of
//!    fragments;
//! 3. merge fragments bottom-up, rendering each child and publishing its
//!    output to its parent under the reference key;
//! 4. finalize the root with its own keywords, caller overrides and
//!    migration-applied flags.
//!
//! Any failure aborts the compile; no partial output is returned.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::Dispatch;

use crate::ast::{Directives, Environment, NestedRef, RefSource};
use crate::loader::{LoadError, ScriptLoader};
use crate::migration::Migrations;
use crate::parser::{ParseError, parse};
use crate::template::{self, Context};

/// Upper bound on fragments held during one compile.
pub const MAX_FRAGMENTS: usize = 100;

/// Fatal compile failure.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("invalid directives in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: ParseError,
    },
    #[error("more than {limit} fragments, nested references are cyclic or too deep")]
    RecursionExceeded { limit: usize },
    #[error("cannot load {reference} for key '{key}': {source}")]
    Load {
        key: String,
        reference: String,
        #[source]
        source: LoadError,
    },
    #[error("cannot render {origin}: {source}")]
    Template {
        origin: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Progress of one compile invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unparsed,
    DirectivesParsed,
    FragmentsResolved,
    Merged,
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unparsed => "unparsed",
            Self::DirectivesParsed => "directives parsed",
            Self::FragmentsResolved => "fragments resolved",
            Self::Merged => "merged",
            Self::Finalized => "finalized",
        })
    }
}

/// Per-compile settings.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    env: Environment,
    overrides: BTreeMap<String, String>,
    migrations: Migrations,
}

impl CompileOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Target environment; defaults to `dev`.
    #[must_use]
    pub const fn env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Override a keyword in the final render.
    #[must_use]
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.overrides.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn migrations(mut self, migrations: Migrations) -> Self {
        self.migrations = migrations;
        self
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.env
    }

    #[must_use]
    pub const fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }
}

/// One script taking part in a compile.
#[derive(Debug)]
struct Fragment {
    level: usize,
    /// Position of the fragment whose directives referenced this one.
    parent: Option<usize>,
    origin: Option<NestedRef>,
    script: String,
    directives: Directives,
}

impl Fragment {
    fn describe(&self) -> String {
        self.origin
            .as_ref()
            .map_or_else(|| "root script".to_string(), ToString::to_string)
    }
}

/// Fragments in discovery order, bounded at every push.
#[derive(Debug)]
struct FragmentStack {
    fragments: Vec<Fragment>,
    limit: usize,
}

impl FragmentStack {
    const fn new(limit: usize) -> Self {
        Self {
            fragments: Vec::new(),
            limit,
        }
    }

    fn push(&mut self, fragment: Fragment) -> Result<usize, CompileError> {
        if self.fragments.len() >= self.limit {
            return Err(CompileError::RecursionExceeded { limit: self.limit });
        }
        self.fragments.push(fragment);
        Ok(self.fragments.len() - 1)
    }

    fn len(&self) -> usize {
        self.fragments.len()
    }
}

/// Compiles scripts against a loader.
///
/// A compiler holds no per-compile state and can be reused; every call to
/// [`Compiler::compile`] builds its own fragment stack.
#[derive(Debug, Clone)]
pub struct Compiler<L> {
    loader: L,
    max_fragments: usize,
    dispatch: Option<Dispatch>,
}

impl<L: ScriptLoader> Compiler<L> {
    #[must_use]
    pub const fn new(loader: L) -> Self {
        Self {
            loader,
            max_fragments: MAX_FRAGMENTS,
            dispatch: None,
        }
    }

    #[must_use]
    pub const fn with_max_fragments(mut self, limit: usize) -> Self {
        self.max_fragments = limit;
        self
    }

    /// Route every diagnostic emitted while compiling to `dispatch`
    /// instead of the ambient subscriber.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Compile `script` for the environment in `options`.
    pub fn compile(&self, script: &str, options: &CompileOptions) -> Result<String, CompileError> {
        match &self.dispatch {
            Some(dispatch) => {
                tracing::dispatcher::with_default(dispatch, || self.run(script, options))
            }
            None => self.run(script, options),
        }
    }

    fn run(&self, script: &str, options: &CompileOptions) -> Result<String, CompileError> {
        let span = tracing::debug_span!("compile", env = %options.env);
        let _entered = span.enter();

        let mut compilation = Compilation {
            loader: &self.loader,
            options,
            stage: Stage::Unparsed,
            fragments: FragmentStack::new(self.max_fragments),
            child_outputs: Vec::new(),
        };
        let result = compilation.execute(script);
        if let Err(err) = &result {
            tracing::debug!(stage = %compilation.stage, error = %err, "compile failed");
        }
        result
    }
}

/// State of one compile invocation.
struct Compilation<'c, L> {
    loader: &'c L,
    options: &'c CompileOptions,
    stage: Stage,
    fragments: FragmentStack,
    /// Rendered children per fragment position, keyed by reference key.
    child_outputs: Vec<Context>,
}

impl<L: ScriptLoader> Compilation<'_, L> {
    fn execute(&mut self, script: &str) -> Result<String, CompileError> {
        let root = parse(script).map_err(|source| CompileError::Parse {
            origin: "root script".to_string(),
            source,
        })?;
        self.advance(Stage::DirectivesParsed);

        self.resolve(script, root)?;
        self.advance(Stage::FragmentsResolved);

        self.merge()?;
        self.advance(Stage::Merged);

        let output = self.finalize()?;
        self.advance(Stage::Finalized);
        Ok(output)
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, fragments = self.fragments.len(), "stage");
        self.stage = stage;
    }

    /// Build the fragment stack in depth-first discovery order.
    fn resolve(&mut self, script: &str, root: Directives) -> Result<(), CompileError> {
        let env = self.options.env;
        let mut pending: Vec<(usize, NestedRef)> = Vec::new();

        let root_refs = root.env(env).nested.clone();
        let root_index = self.fragments.push(Fragment {
            level: 0,
            parent: None,
            origin: None,
            script: script.to_string(),
            directives: root,
        })?;
        pending.extend(root_refs.into_iter().rev().map(|r| (root_index, r)));

        while let Some((parent, reference)) = pending.pop() {
            let content = self.load(&reference)?;
            let directives = parse(&content).map_err(|source| CompileError::Parse {
                origin: reference.to_string(),
                source,
            })?;
            let level = self.fragments.fragments[parent].level + 1;
            tracing::trace!(level, reference = %reference, key = %reference.key, "resolved fragment");

            let refs = directives.env(env).nested.clone();
            let index = self.fragments.push(Fragment {
                level,
                parent: Some(parent),
                origin: Some(reference),
                script: content,
                directives,
            })?;
            pending.extend(refs.into_iter().rev().map(|r| (index, r)));
        }
        Ok(())
    }

    fn load(&self, reference: &NestedRef) -> Result<String, CompileError> {
        let loaded = match &reference.source {
            RefSource::File(path) => self.loader.read_file(Path::new(path)),
            RefSource::Name(name) => self.loader.fetch_named(name),
        };
        loaded.map_err(|source| CompileError::Load {
            key: reference.key.clone(),
            reference: reference.to_string(),
            source,
        })
    }

    /// Render children deepest-first and publish each output to its parent.
    fn merge(&mut self) -> Result<(), CompileError> {
        let env = self.options.env;
        self.child_outputs = vec![Context::new(); self.fragments.len()];

        for index in (1..self.fragments.len()).rev() {
            let fragment = &self.fragments.fragments[index];
            let mut context = fragment.directives.env(env).keywords.clone();
            context.extend(std::mem::take(&mut self.child_outputs[index]));

            let rendered =
                template::render(&fragment.script, &context).map_err(|source| {
                    CompileError::Template {
                        origin: fragment.describe(),
                        source,
                    }
                })?;

            if let (Some(parent), Some(origin)) = (fragment.parent, &fragment.origin) {
                tracing::trace!(level = fragment.level, key = %origin.key, "merged fragment");
                self.child_outputs[parent].insert(origin.key.clone(), rendered);
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<String, CompileError> {
        let env = self.options.env;
        let root = &self.fragments.fragments[0];

        let mut context = self.child_outputs.first_mut().map(std::mem::take).unwrap_or_default();
        context.extend(root.directives.env(env).keywords.clone());
        context.extend(self.options.overrides.clone());
        context.extend(self.options.migrations.applied_flags(env));

        template::render(&root.script, &context).map_err(|source| CompileError::Template {
            origin: root.describe(),
            source,
        })
    }
}
