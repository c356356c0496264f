//! The evaluation driver.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use scad_diagnostic::{Diagnostic, DiagnosticEmitter};
use scad_eval::{EvalCounters, EvalError, Evaluator, Node};
use scad_units::{CompiledUnit, FileSystem, SourceParser, UnitCache, UnitError};
use tracing::{debug, info};

use crate::{DriverConfig, DriverError};

/// Owns the unit cache for one root file and evaluates it on demand.
///
/// The cache persists across calls, so repeated loads only re-parse what
/// changed on disk. Each [`Driver::instantiate_root`] runs a fresh
/// evaluator session over the cached units.
pub struct Driver {
    config: DriverConfig,
    cache: UnitCache,
    counters: EvalCounters,
    diagnostics: Vec<Diagnostic>,
}

impl Driver {
    pub fn new(
        config: DriverConfig,
        fs: impl FileSystem + 'static,
        parser: impl SourceParser + 'static,
    ) -> Self {
        let cache = UnitCache::new(fs, parser, config.search_path.clone());
        Driver {
            config,
            cache,
            counters: EvalCounters::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Driver over the real filesystem.
    pub fn with_std(config: DriverConfig, parser: impl SourceParser + 'static) -> Self {
        Self::new(config, scad_units::StdFileSystem, parser)
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn cache(&self) -> &UnitCache {
        &self.cache
    }

    /// Counters summed over every session run by this driver.
    pub fn counters(&self) -> &EvalCounters {
        &self.counters
    }

    /// Bring the root unit and everything it uses up to date.
    pub fn load(&mut self) -> Result<Arc<CompiledUnit>, DriverError> {
        let evaluated = self.cache.load_root(&self.config.root)?;
        match evaluated.unit {
            Some(unit) => Ok(unit),
            None => Err(UnitError::NotFound {
                path: self.config.root.clone(),
            }
            .into()),
        }
    }

    /// Compile `text` as the root file's contents, then load what it uses.
    pub fn load_text(&mut self, text: &str) -> Result<Arc<CompiledUnit>, DriverError> {
        let unit = self.cache.insert_root(&self.config.root, text)?;
        self.cache.handle_dependencies(unit.path(), true);
        Ok(unit)
    }

    /// Re-check the root's `use` targets. Returns the newest timestamp of
    /// anything the root depends on.
    pub fn handle_dependencies(&mut self, is_root: bool) -> SystemTime {
        let root = self.config.root.clone();
        self.cache.handle_dependencies(&root, is_root)
    }

    /// Load the root and evaluate it into a node tree.
    ///
    /// Diagnostics from both stages are kept for
    /// [`Driver::take_diagnostics`], also when evaluation fails. In strict
    /// mode an escalatable load report, such as a missing library, aborts
    /// before evaluation starts.
    #[tracing::instrument(level = "info", skip_all, fields(root = %self.config.root.display()))]
    pub fn instantiate_root(&mut self) -> Result<Node, DriverError> {
        let loaded = self.load();
        let reported = self.cache.take_diagnostics();
        let escalated = self
            .config
            .eval
            .hard_warnings
            .then(|| reported.iter().find(|d| d.is_hard_warning()).cloned())
            .flatten();
        self.diagnostics.extend(reported);
        if let Some(diagnostic) = escalated {
            return Err(EvalError::HardWarning(diagnostic).into());
        }
        let unit = loaded?;

        let mut evaluator = Evaluator::builder(self.config.eval.clone())
            .units(&self.cache)
            .build();
        let tree = evaluator.instantiate_unit(&unit);
        self.diagnostics.extend(evaluator.take_diagnostics());
        self.counters.merge(evaluator.counters());
        debug!(
            instantiations = evaluator.counters().module_instantiations,
            max_depth = evaluator.counters().max_call_depth,
            "session finished"
        );
        let tree = tree?;
        info!(nodes = tree.children.len(), "root instantiated");
        Ok(tree)
    }

    /// Diagnostics reported since the last call, cache reports first.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        diagnostics.extend(self.cache.take_diagnostics());
        diagnostics
    }

    /// Write pending diagnostics and a summary to `emitter`.
    pub fn emit_diagnostics(&mut self, emitter: &mut dyn DiagnosticEmitter) {
        let diagnostics = self.take_diagnostics();
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        emitter.emit_all(&diagnostics);
        emitter.emit_summary(errors, diagnostics.len() - errors);
        emitter.flush();
    }
}
