//! Test doubles for the cache's collaborators.
//!
//! - [`MemoryFileSystem`]: an in-memory filesystem with explicit mtimes
//! - [`LineParser`]: a tiny line-oriented stand-in for the real parser
//!
//! # Usage
//!
//! ```ignore
//! use scad_units::testing::{LineParser, MemoryFileSystem};
//!
//! let fs = MemoryFileSystem::new();
//! fs.write("/p/main.scad", "use <lib.scad>\nthing();");
//! let mut cache = UnitCache::new(fs.clone(), LineParser, SearchPath::default());
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use scad_ir::{Expr, InstantiationRequest, Location, ModuleDef, Scope};

use crate::fs::normalize;
use crate::{FileSystem, IncludeDirective, ParseError, ParsedSource, SourceParser};

/// In-memory filesystem.
///
/// Clones share state, so a test can keep a handle and edit files after
/// giving the filesystem to a cache. Every write advances a logical clock by
/// one second and stamps the file with it.
#[derive(Clone, Debug, Default)]
pub struct MemoryFileSystem {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: FxHashMap<PathBuf, MemoryFile>,
    clock: u64,
    reads: usize,
}

#[derive(Debug)]
struct MemoryFile {
    text: String,
    mtime: SystemTime,
}

impl MemoryState {
    fn tick(&mut self) -> SystemTime {
        self.clock += 1;
        UNIX_EPOCH + Duration::from_secs(self.clock)
    }
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file, stamping it with the next clock tick.
    pub fn write(&self, path: impl AsRef<Path>, text: impl Into<String>) -> SystemTime {
        let mut state = self.state.write();
        let mtime = state.tick();
        state.files.insert(
            normalize(path.as_ref()),
            MemoryFile {
                text: text.into(),
                mtime,
            },
        );
        mtime
    }

    /// Create or replace a file with an explicit mtime.
    pub fn write_at(&self, path: impl AsRef<Path>, text: impl Into<String>, mtime: SystemTime) {
        self.state.write().files.insert(
            normalize(path.as_ref()),
            MemoryFile {
                text: text.into(),
                mtime,
            },
        );
    }

    /// Advance a file's mtime without changing its text.
    pub fn touch(&self, path: impl AsRef<Path>) -> Option<SystemTime> {
        let mut state = self.state.write();
        let mtime = state.tick();
        let file = state.files.get_mut(&normalize(path.as_ref()))?;
        file.mtime = mtime;
        Some(mtime)
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.state
            .write()
            .files
            .remove(&normalize(path.as_ref()))
            .is_some()
    }

    /// Number of successful `read` calls so far.
    pub fn read_count(&self) -> usize {
        self.state.read().reads
    }
}

impl FileSystem for MemoryFileSystem {
    fn stat(&self, path: &Path) -> Option<SystemTime> {
        self.state.read().files.get(path).map(|f| f.mtime)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        let mut state = self.state.write();
        let text = state
            .files
            .get(path)
            .map(|f| f.text.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
        state.reads += 1;
        Ok(text)
    }
}

/// Line-oriented parser for tests.
///
/// One statement per line:
///
/// ```text
/// use <lib.scad>
/// include <defs.scad>
/// module name;                 // empty module
/// module name { a(); b(); }    // module with child calls
/// function name = 3;
/// name();
/// x = 1;                       // number, "string", true/false, undef, or identifier
/// // comment
/// ```
///
/// Anything else is a parse error.
#[derive(Copy, Clone, Debug, Default)]
pub struct LineParser;

impl SourceParser for LineParser {
    fn parse(&self, text: &str, _path: &Path) -> Result<ParsedSource, ParseError> {
        let mut parsed = ParsedSource::default();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let location = Location::new(index as u32 + 1, 1);
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if let Some(path) = directive(line, "use") {
                parsed.uses.push(path);
            } else if let Some(path) = directive(line, "include") {
                parsed.includes.push(IncludeDirective {
                    path,
                    assignment_at: parsed.scope.assignments.len(),
                    child_at: parsed.scope.children.len(),
                    location,
                });
            } else if let Some(rest) = line.strip_prefix("module ") {
                let module = module_def(rest, location)?;
                parsed.scope.define_module(module);
            } else if let Some(rest) = line.strip_prefix("function ") {
                let (name, value) = binding(rest, location)?;
                let mut function = scad_ir::FunctionDef::new(name, vec![], value);
                function.location = location;
                parsed.scope.define_function(function);
            } else if let Some(name) = call(line) {
                parsed
                    .scope
                    .push_child(InstantiationRequest::new(name).at(location));
            } else {
                let (name, value) = binding(line, location)?;
                parsed
                    .scope
                    .push_assignment(scad_ir::Assignment::new(name, value).at(location));
            }
        }
        Ok(parsed)
    }
}

fn directive(line: &str, keyword: &str) -> Option<String> {
    let rest = line.strip_prefix(keyword)?.trim_start();
    let rest = rest.strip_suffix(';').unwrap_or(rest);
    let path = rest.strip_prefix('<')?.strip_suffix('>')?;
    Some(path.to_string())
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `name();`
fn call(line: &str) -> Option<&str> {
    let name = line.strip_suffix("();")?.trim();
    is_identifier(name).then_some(name)
}

/// `name = value;`
fn binding(text: &str, location: Location) -> Result<(String, Expr), ParseError> {
    let syntax_error = || ParseError::new(format!("syntax error near '{text}'"), location);
    let body = text.strip_suffix(';').ok_or_else(syntax_error)?;
    let (name, value) = body.split_once('=').ok_or_else(syntax_error)?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(syntax_error());
    }
    Ok((name.to_string(), value_expr(value.trim()).at(location)))
}

fn value_expr(text: &str) -> Expr {
    if let Ok(number) = text.parse::<f64>() {
        return Expr::number(number);
    }
    if let Some(s) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return Expr::string(s);
    }
    match text {
        "true" => Expr::bool(true),
        "false" => Expr::bool(false),
        "undef" => Expr::undef(),
        _ => Expr::ident(text),
    }
}

/// `name;` or `name { a(); b(); }`
fn module_def(rest: &str, location: Location) -> Result<ModuleDef, ParseError> {
    let syntax_error = || ParseError::new(format!("bad module definition '{rest}'"), location);
    let (name, body) = match rest.split_once('{') {
        Some((name, body)) => (name.trim(), Some(body)),
        None => (rest.strip_suffix(';').ok_or_else(syntax_error)?.trim(), None),
    };
    if !is_identifier(name) {
        return Err(syntax_error());
    }
    let mut scope = Scope::new();
    if let Some(body) = body {
        let body = body.trim().strip_suffix('}').ok_or_else(syntax_error)?;
        for statement in body.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let child = statement
                .strip_suffix("()")
                .filter(|n| is_identifier(n))
                .ok_or_else(syntax_error)?;
            scope.push_child(InstantiationRequest::new(child).at(location));
        }
    }
    let mut module = ModuleDef::new(name, vec![], scope);
    module.location = location;
    Ok(module)
}
