//! The unit cache.
//!
//! Maps absolute paths to the latest good [`CompiledUnit`] for that file and
//! keeps the dependency walk state:
//!
//! - `mtime` / `includes_mtime` decide whether a cached unit is still fresh;
//! - `resolving` markers cut `use` cycles within one pass;
//! - `uses` holds the unit's `use` targets, promoted from relative spelling
//!   to absolute path the first time they are found.
//!
//! The cache is plain state owned by the caller. Mutation (`evaluate`,
//! `handle_dependencies`) needs `&mut`; the evaluator reads it through
//! [`UnitSource`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::{FxHashMap, FxHashSet};
use scad_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use tracing::{debug, trace, warn};

use crate::fs::absolutize;
use crate::{
    CompiledUnit, FileSystem, SearchPath, SourceParser, StdFileSystem, UnitBuilder, UnitError,
};

/// Read-only view of compiled units, used during instantiation.
pub trait UnitSource {
    /// The unit cached for an absolute path.
    fn unit(&self, path: &Path) -> Option<Arc<CompiledUnit>>;

    /// Units named by `use` in the file at `path`, latest `use` first.
    /// Targets that were never found are skipped.
    fn used_units(&self, path: &Path) -> Vec<Arc<CompiledUnit>>;
}

/// A `UnitSource` with nothing in it.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoUnits;

impl UnitSource for NoUnits {
    fn unit(&self, _path: &Path) -> Option<Arc<CompiledUnit>> {
        None
    }

    fn used_units(&self, _path: &Path) -> Vec<Arc<CompiledUnit>> {
        Vec::new()
    }
}

/// A `use` target of a cached unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UseTarget {
    /// Found on disk; the absolute path is also a cache key.
    Resolved(PathBuf),
    /// Not found yet; retried on every dependency pass.
    Unresolved(String),
}

/// Cache state for one file.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    unit: Option<Arc<CompiledUnit>>,
    mtime: Option<SystemTime>,
    includes_mtime: SystemTime,
    resolving: bool,
    uses: Vec<UseTarget>,
    /// Spellings already reported missing; each is reported once.
    reported_missing: FxHashSet<String>,
}

impl Default for CacheEntry {
    fn default() -> Self {
        CacheEntry {
            unit: None,
            mtime: None,
            includes_mtime: UNIX_EPOCH,
            resolving: false,
            uses: Vec::new(),
            reported_missing: FxHashSet::default(),
        }
    }
}

impl CacheEntry {
    fn for_unit(unit: Arc<CompiledUnit>, mtime: Option<SystemTime>, fs: &dyn FileSystem) -> Self {
        let includes_mtime = unit.includes_mtime(fs);
        let uses = unit
            .used_units()
            .iter()
            .map(|spelling| UseTarget::Unresolved(spelling.clone()))
            .collect();
        CacheEntry {
            unit: Some(unit),
            mtime,
            includes_mtime,
            resolving: false,
            uses,
            reported_missing: FxHashSet::default(),
        }
    }

    /// Replace the unit, keeping the walk state of the old entry.
    ///
    /// `use` targets restart unresolved: the new text may spell them
    /// differently.
    fn replace(&mut self, fresh: CacheEntry) {
        self.unit = fresh.unit;
        self.mtime = fresh.mtime;
        self.includes_mtime = fresh.includes_mtime;
        self.uses = fresh.uses;
    }

    pub fn unit(&self) -> Option<&Arc<CompiledUnit>> {
        self.unit.as_ref()
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub fn includes_mtime(&self) -> SystemTime {
        self.includes_mtime
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    pub fn uses(&self) -> &[UseTarget] {
        &self.uses
    }
}

/// Result of [`UnitCache::evaluate`].
#[derive(Clone, Debug)]
pub struct Evaluated {
    pub unit: Option<Arc<CompiledUnit>>,
    /// Newest modification time of the file, its includes and everything it
    /// transitively uses.
    pub latest: SystemTime,
}

/// Dependency-aware cache of compiled units, keyed by absolute path.
pub struct UnitCache {
    fs: Box<dyn FileSystem>,
    parser: Box<dyn SourceParser>,
    search_path: SearchPath,
    entries: FxHashMap<PathBuf, CacheEntry>,
    diagnostics: DiagnosticQueue,
}

impl UnitCache {
    pub fn new(
        fs: impl FileSystem + 'static,
        parser: impl SourceParser + 'static,
        search_path: SearchPath,
    ) -> Self {
        UnitCache {
            fs: Box::new(fs),
            parser: Box::new(parser),
            search_path,
            entries: FxHashMap::default(),
            diagnostics: DiagnosticQueue::new(),
        }
    }

    /// Cache over the real filesystem, library directories from the
    /// environment.
    pub fn with_std(parser: impl SourceParser + 'static) -> Self {
        Self::new(StdFileSystem, parser, SearchPath::from_env())
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Bring the unit for `target` up to date and return it.
    ///
    /// `requesting` is the file whose `use` led here; relative targets are
    /// resolved against its directory.
    #[tracing::instrument(level = "debug", skip_all, fields(target = %target.display()))]
    pub fn evaluate(
        &mut self,
        requesting: Option<&Path>,
        target: &Path,
    ) -> Result<Evaluated, UnitError> {
        let path = absolutize(target, requesting.and_then(Path::parent));

        let Some(mtime) = self.fs.stat(&path) else {
            return match self.entries.get(&path).and_then(|e| e.unit.clone()) {
                Some(unit) => {
                    warn!(path = %path.display(), "file vanished, keeping cached unit");
                    Ok(Evaluated {
                        unit: Some(unit),
                        latest: UNIX_EPOCH,
                    })
                }
                None => Err(UnitError::NotFound { path }),
            };
        };

        let cached = self.entries.get(&path).and_then(|entry| {
            let unit = entry.unit.clone()?;
            let includes_mtime = unit.includes_mtime(self.fs.as_ref());
            let fresh = entry.mtime == Some(mtime) && includes_mtime <= entry.includes_mtime;
            fresh.then_some(unit)
        });

        let (unit, includes_mtime) = match cached {
            Some(unit) => {
                trace!(path = %path.display(), "cache hit");
                let includes_mtime = self
                    .entries
                    .get(&path)
                    .map_or(UNIX_EPOCH, |e| e.includes_mtime);
                (unit, includes_mtime)
            }
            None => {
                // `None` from compile is stale-on-error: the old unit stays.
                if let Some(fresh) = self.compile(&path, mtime)? {
                    self.entries.entry(path.clone()).or_default().replace(fresh);
                }
                match self.entries.get(&path) {
                    Some(CacheEntry {
                        unit: Some(unit),
                        includes_mtime,
                        ..
                    }) => (Arc::clone(unit), *includes_mtime),
                    _ => return Err(UnitError::NotFound { path }),
                }
            }
        };

        let deps = self.handle_dependencies(&path, false);
        Ok(Evaluated {
            unit: Some(unit),
            latest: mtime.max(includes_mtime).max(deps),
        })
    }

    /// Read and parse `path`.
    ///
    /// `Ok(None)` means the read or parse failed but a previous unit exists
    /// and stays in place; the failure is reported as a diagnostic.
    fn compile(&mut self, path: &Path, mtime: SystemTime) -> Result<Option<CacheEntry>, UnitError> {
        let has_previous = self.entries.get(path).is_some_and(|e| e.unit.is_some());
        let text = match self.fs.read(path) {
            Ok(text) => text,
            Err(source) if has_previous => {
                self.diagnostics.push(
                    Diagnostic::warning(ErrorCode::E1002)
                        .with_message(format!("Can't read '{}': {source}", path.display()))
                        .with_file(path)
                        .with_note("keeping the previously compiled version"),
                );
                self.mark_stale(path, mtime);
                return Ok(None);
            }
            Err(source) => {
                self.diagnostics.push(
                    Diagnostic::warning(ErrorCode::E1002)
                        .with_message(format!("Can't read '{}': {source}", path.display()))
                        .with_file(path),
                );
                return Err(UnitError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        debug!(path = %path.display(), "compiling");
        let built = UnitBuilder::new(self.fs.as_ref(), self.parser.as_ref(), &self.search_path)
            .build(path, &text, mtime);
        match built {
            Ok((unit, diagnostics)) => {
                self.diagnostics.extend(diagnostics);
                Ok(Some(CacheEntry::for_unit(
                    Arc::new(unit),
                    Some(mtime),
                    self.fs.as_ref(),
                )))
            }
            Err(source) => {
                let mut diag = Diagnostic::error(ErrorCode::E1003)
                    .with_message(format!("Parser error: {}", source.message))
                    .with_file(path)
                    .at(source.location);
                if has_previous {
                    diag = diag.with_note("keeping the previously compiled version");
                    self.diagnostics.push(diag);
                    self.mark_stale(path, mtime);
                    return Ok(None);
                }
                self.diagnostics.push(diag);
                Err(UnitError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Remember that `mtime` was seen so a broken file is reported once.
    fn mark_stale(&mut self, path: &Path, mtime: SystemTime) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.mtime = Some(mtime);
            if let Some(unit) = &entry.unit {
                entry.includes_mtime = unit.includes_mtime(self.fs.as_ref());
            }
        }
    }

    /// Walk the `use` targets of the unit at `path`, bringing each up to date.
    ///
    /// With `is_root` all `resolving` markers are cleared first. Otherwise a
    /// unit already being resolved in this pass returns `UNIX_EPOCH`, which
    /// cuts `use` cycles. Returns the newest timestamp seen.
    pub fn handle_dependencies(&mut self, path: &Path, is_root: bool) -> SystemTime {
        let path = absolutize(path, None);
        if is_root {
            self.clear_markers();
        }
        let Some(entry) = self.entries.get_mut(&path) else {
            return UNIX_EPOCH;
        };
        if entry.resolving {
            return UNIX_EPOCH;
        }
        entry.resolving = true;
        let uses = entry.uses.clone();
        let base_dir = path.parent().map(Path::to_path_buf);

        let mut latest = UNIX_EPOCH;
        let mut promotions: Vec<(String, PathBuf)> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        for target in uses {
            let (spelling, resolved) = match target {
                UseTarget::Resolved(resolved) => {
                    (resolved.display().to_string(), Some(resolved))
                }
                UseTarget::Unresolved(spelling) => {
                    if is_font(&spelling) {
                        debug!(font = %spelling, "ignoring font use");
                        continue;
                    }
                    let found =
                        self.search_path
                            .resolve(self.fs.as_ref(), base_dir.as_deref(), &spelling);
                    if let Some(found) = &found {
                        promotions.push((spelling.clone(), found.clone()));
                    }
                    (spelling, found)
                }
            };
            let Some(resolved) = resolved else {
                missing.push(spelling);
                continue;
            };
            match self.evaluate(Some(&path), &resolved) {
                Ok(evaluated) => latest = latest.max(evaluated.latest),
                Err(UnitError::NotFound { .. }) => missing.push(spelling),
                Err(err) => debug!(%err, "dependency failed"),
            }
        }

        let Some(entry) = self.entries.get_mut(&path) else {
            return latest;
        };
        for (spelling, resolved) in promotions {
            promote(&mut entry.uses, &spelling, resolved);
            entry.reported_missing.remove(&spelling);
        }
        let mut reports = Vec::new();
        for spelling in missing {
            if entry.reported_missing.insert(spelling.clone()) {
                reports.push(
                    Diagnostic::warning(ErrorCode::E1001)
                        .with_message(format!("Can't open library '{spelling}'."))
                        .with_file(path.clone()),
                );
            }
        }
        self.diagnostics.extend(reports);
        latest
    }

    /// Evaluate the root file and everything it uses, in a fresh pass.
    pub fn load_root(&mut self, path: &Path) -> Result<Evaluated, UnitError> {
        self.clear_markers();
        self.evaluate(None, path)
    }

    /// Compile `text` as the current contents of `path` (an unsaved buffer)
    /// and store it as that path's unit.
    ///
    /// Call [`UnitCache::handle_dependencies`] with `is_root` afterwards to
    /// load what the buffer uses.
    pub fn insert_root(&mut self, path: &Path, text: &str) -> Result<Arc<CompiledUnit>, UnitError> {
        let path = absolutize(path, None);
        let mtime = self.fs.stat(&path);
        let built = UnitBuilder::new(self.fs.as_ref(), self.parser.as_ref(), &self.search_path)
            .build(&path, text, mtime.unwrap_or(UNIX_EPOCH));
        let (unit, diagnostics) = match built {
            Ok(built) => built,
            Err(source) => {
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E1003)
                        .with_message(format!("Parser error: {}", source.message))
                        .with_file(path.clone())
                        .at(source.location),
                );
                return Err(UnitError::Parse { path, source });
            }
        };
        self.diagnostics.extend(diagnostics);
        let unit = Arc::new(unit);
        let fresh = CacheEntry::for_unit(Arc::clone(&unit), mtime, self.fs.as_ref());
        debug!(path = %path.display(), "inserted root buffer");
        self.entries.entry(path).or_default().replace(fresh);
        Ok(unit)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "clearing unit cache");
        self.entries.clear();
    }

    /// Clear all `resolving` markers.
    pub fn clear_markers(&mut self) {
        for entry in self.entries.values_mut() {
            entry.resolving = false;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cached unit for `path`, without touching the filesystem.
    pub fn lookup(&self, path: &Path) -> Option<Arc<CompiledUnit>> {
        self.entries.get(&absolutize(path, None))?.unit.clone()
    }

    pub fn entry(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(&absolutize(path, None))
    }

    /// Paths of all cached entries, sorted.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.entries.keys().map(PathBuf::as_path).collect();
        paths.sort();
        paths
    }

    /// Diagnostics reported since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.flush()
    }
}

impl UnitSource for UnitCache {
    fn unit(&self, path: &Path) -> Option<Arc<CompiledUnit>> {
        self.lookup(path)
    }

    fn used_units(&self, path: &Path) -> Vec<Arc<CompiledUnit>> {
        let Some(entry) = self.entries.get(&absolutize(path, None)) else {
            return Vec::new();
        };
        entry
            .uses
            .iter()
            .filter_map(|target| match target {
                UseTarget::Resolved(resolved) => self.lookup(resolved),
                UseTarget::Unresolved(_) => None,
            })
            .collect()
    }
}

/// Rewrite `spelling` to `resolved` in place. If `resolved` is already
/// present the relative spelling is dropped instead, so a file is never
/// listed twice.
fn promote(uses: &mut Vec<UseTarget>, spelling: &str, resolved: PathBuf) {
    let Some(pos) = uses
        .iter()
        .position(|t| matches!(t, UseTarget::Unresolved(s) if s == spelling))
    else {
        return;
    };
    let target = UseTarget::Resolved(resolved);
    if uses.contains(&target) {
        uses.remove(pos);
    } else {
        trace!(spelling, "promoted use target");
        uses[pos] = target;
    }
}

fn is_font(spelling: &str) -> bool {
    Path::new(spelling)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}
