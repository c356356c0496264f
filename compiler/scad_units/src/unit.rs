//! Compiled units and include splicing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use scad_diagnostic::{Diagnostic, ErrorCode};
use scad_ir::Scope;
use tracing::{debug, trace};

use crate::fs::normalize;
use crate::{FileSystem, ParseError, ParsedSource, SearchPath, SourceParser};

/// One parsed source file with its includes spliced in.
///
/// Immutable once built. A change on disk produces a new unit; the old one
/// stays valid for anyone still holding the `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledUnit {
    path: PathBuf,
    scope: Scope,
    used_units: Vec<String>,
    included_units: BTreeMap<String, PathBuf>,
    parsed_at: SystemTime,
}

impl CompiledUnit {
    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the file lives in; base for its relative references.
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// `use` spellings, latest `use` first, without duplicates.
    pub fn used_units(&self) -> &[String] {
        &self.used_units
    }

    /// Include spelling → resolved (or would-be) path, nested includes too.
    pub fn included_units(&self) -> &BTreeMap<String, PathBuf> {
        &self.included_units
    }

    /// Modification time of the file when it was parsed.
    pub fn parsed_at(&self) -> SystemTime {
        self.parsed_at
    }

    /// Newest modification time among the included files.
    ///
    /// Missing includes count as `UNIX_EPOCH`, so their later appearance is
    /// seen as an advance.
    pub fn includes_mtime(&self, fs: &dyn FileSystem) -> SystemTime {
        self.included_units
            .values()
            .filter_map(|path| fs.stat(path))
            .max()
            .unwrap_or(UNIX_EPOCH)
    }
}

/// Builds a [`CompiledUnit`] from source text, splicing includes eagerly.
///
/// Problems with individual includes (missing, unreadable, cyclic) become
/// diagnostics and the directive is skipped. A parse failure anywhere fails
/// the whole unit.
pub struct UnitBuilder<'a> {
    fs: &'a dyn FileSystem,
    parser: &'a dyn SourceParser,
    search_path: &'a SearchPath,
    diagnostics: Vec<Diagnostic>,
    used: Vec<String>,
    included: BTreeMap<String, PathBuf>,
    stack: Vec<PathBuf>,
}

impl<'a> UnitBuilder<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        parser: &'a dyn SourceParser,
        search_path: &'a SearchPath,
    ) -> Self {
        UnitBuilder {
            fs,
            parser,
            search_path,
            diagnostics: Vec::new(),
            used: Vec::new(),
            included: BTreeMap::new(),
            stack: Vec::new(),
        }
    }

    /// Parse `text` as the contents of `path` (absolute) modified at `mtime`.
    ///
    /// Returns the unit and any diagnostics produced while splicing.
    pub fn build(
        mut self,
        path: &Path,
        text: &str,
        mtime: SystemTime,
    ) -> Result<(CompiledUnit, Vec<Diagnostic>), ParseError> {
        let parsed = self.parser.parse(text, path)?;
        self.stack.push(path.to_path_buf());
        let scope = self.expand(parsed, path)?;

        // Latest `use` wins the front position.
        let mut used_units: Vec<String> = Vec::with_capacity(self.used.len());
        for spelling in self.used.into_iter().rev() {
            if !used_units.contains(&spelling) {
                used_units.push(spelling);
            }
        }

        debug!(
            path = %path.display(),
            uses = used_units.len(),
            includes = self.included.len(),
            "compiled unit"
        );
        let unit = CompiledUnit {
            path: path.to_path_buf(),
            scope,
            used_units,
            included_units: self.included,
            parsed_at: mtime,
        };
        Ok((unit, self.diagnostics))
    }

    fn expand(&mut self, parsed: ParsedSource, file: &Path) -> Result<Scope, ParseError> {
        let ParsedSource {
            mut scope,
            uses,
            includes,
        } = parsed;
        self.used.extend(uses);

        let base_dir = file.parent();
        let mut spliced = Vec::with_capacity(includes.len());
        for directive in includes {
            let Some(resolved) = self.search_path.resolve(self.fs, base_dir, &directive.path)
            else {
                let would_be = normalize(&base_dir.map_or_else(
                    || PathBuf::from(&directive.path),
                    |dir| dir.join(&directive.path),
                ));
                self.included.insert(directive.path.clone(), would_be);
                self.diagnostics.push(
                    Diagnostic::warning(ErrorCode::E1001)
                        .with_message(format!("Can't open include file '{}'.", directive.path))
                        .with_file(file)
                        .at(directive.location),
                );
                continue;
            };
            self.included
                .insert(directive.path.clone(), resolved.clone());

            if self.stack.contains(&resolved) {
                self.diagnostics.push(
                    Diagnostic::warning(ErrorCode::E1004)
                        .with_message(format!(
                            "Include cycle: '{}' includes itself, skipping.",
                            resolved.display()
                        ))
                        .with_file(file)
                        .at(directive.location),
                );
                continue;
            }

            let text = match self.fs.read(&resolved) {
                Ok(text) => text,
                Err(err) => {
                    self.diagnostics.push(
                        Diagnostic::warning(ErrorCode::E1002)
                            .with_message(format!(
                                "Can't read include file '{}': {err}",
                                resolved.display()
                            ))
                            .with_file(file)
                            .at(directive.location),
                    );
                    continue;
                }
            };
            trace!(include = %resolved.display(), "splicing include");
            let nested = self.parser.parse(&text, &resolved).map_err(|err| {
                ParseError::new(
                    format!("in included file '{}': {}", resolved.display(), err.message),
                    directive.location,
                )
            })?;
            self.stack.push(resolved.clone());
            let included_scope = self.expand(nested, &resolved)?;
            self.stack.pop();
            spliced.push((included_scope, directive.assignment_at, directive.child_at));
        }
        // Splice back to front so earlier positions stay valid.
        for (included_scope, assignment_at, child_at) in spliced.into_iter().rev() {
            scope.splice(included_scope, assignment_at, child_at);
        }
        Ok(scope)
    }
}
