//! Discovery of C/C++ sources to analyze.
//!
//! Directories are walked in parallel with `ignore::WalkBuilder`, honouring
//! `.gitignore`. Only supported sources that pass the include/exclude globs
//! are returned, sorted so runs are reproducible.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, ParallelVisitor, ParallelVisitorBuilder, WalkBuilder, WalkState};
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::source::is_supported_source;

/// Options for source discovery.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Honour `.gitignore` and related ignore files. Default: true
    pub respect_gitignore: bool,
    /// Descend into hidden directories and pick up hidden files. Default: false
    pub include_hidden: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl WalkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the include/exclude globs of a configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            include_patterns: config.include.clone(),
            exclude_patterns: config.exclude.clone(),
            ..Self::default()
        }
    }

    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.include_hidden = yes;
        self
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }
}

/// Finds analyzable sources below a set of paths.
#[derive(Debug)]
pub struct SourceWalker {
    options: WalkOptions,
    filter: Arc<SourceFilter>,
}

impl SourceWalker {
    pub fn new(options: WalkOptions) -> Self {
        let filter = Arc::new(SourceFilter::new(
            &options.include_patterns,
            &options.exclude_patterns,
        ));
        Self { options, filter }
    }

    /// Returns the supported sources found in `paths`, sorted and deduplicated.
    ///
    /// Files named explicitly are returned if they are supported sources and
    /// not excluded, regardless of ignore files.
    pub fn walk(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let (files, dirs): (Vec<&PathBuf>, Vec<&PathBuf>) =
            paths.iter().partition(|p| p.is_file());

        let mut found: Vec<PathBuf> = files
            .into_iter()
            .filter(|f| self.filter.accepts(f))
            .cloned()
            .collect();

        if let Some((first, rest)) = dirs.split_first() {
            found.extend(self.walk_dirs(first, rest));
        }

        found.sort();
        found.dedup();

        debug!("Discovered {} source file(s)", found.len());
        found
    }

    fn walk_dirs(&self, first: &Path, rest: &[&PathBuf]) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(first);
        for dir in rest {
            builder.add(dir);
        }
        builder
            .git_ignore(self.options.respect_gitignore)
            .git_global(self.options.respect_gitignore)
            .git_exclude(self.options.respect_gitignore)
            .hidden(!self.options.include_hidden);

        let (tx, rx) = crossbeam_channel::bounded::<PathBuf>(256);

        // Drain concurrently; workers would block on a full channel otherwise.
        let collector = thread::spawn(move || rx.iter().collect::<Vec<_>>());

        let mut visitors = SourceVisitorBuilder {
            tx,
            filter: Arc::clone(&self.filter),
        };
        builder.build_parallel().visit(&mut visitors);
        drop(visitors);

        collector.join().unwrap_or_else(|_| {
            warn!("Source collector thread panicked");
            Vec::new()
        })
    }
}

impl Default for SourceWalker {
    fn default() -> Self {
        Self::new(WalkOptions::default())
    }
}

struct SourceVisitorBuilder {
    tx: Sender<PathBuf>,
    filter: Arc<SourceFilter>,
}

impl<'s> ParallelVisitorBuilder<'s> for SourceVisitorBuilder {
    fn build(&mut self) -> Box<dyn ParallelVisitor + 's> {
        Box::new(SourceVisitor {
            tx: self.tx.clone(),
            filter: Arc::clone(&self.filter),
        })
    }
}

struct SourceVisitor {
    tx: Sender<PathBuf>,
    filter: Arc<SourceFilter>,
}

impl ParallelVisitor for SourceVisitor {
    fn visit(&mut self, entry: Result<DirEntry, ignore::Error>) -> WalkState {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_some_and(|ft| ft.is_file())
                    && self.filter.accepts(entry.path())
                    && self.tx.send(entry.into_path()).is_err()
                {
                    return WalkState::Quit;
                }
            }
            Err(e) => debug!("Walk error: {}", e),
        }
        WalkState::Continue
    }
}

/// Extension check plus include/exclude globs.
#[derive(Debug)]
struct SourceFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl SourceFilter {
    fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: build_globset(include, "include"),
            exclude: build_globset(exclude, "exclude"),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        if !is_supported_source(path) {
            return false;
        }
        if let Some(exclude) = &self.exclude
            && exclude.is_match(path)
        {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(path),
            None => true,
        }
    }
}

/// Invalid patterns are logged and left out; an empty list means "no filter".
fn build_globset(patterns: &[String], name: &str) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!("Invalid {} pattern {:?}: {}", name, pattern, e),
        }
    }

    builder
        .build()
        .inspect_err(|e| warn!("Failed to build {} patterns: {}", name, e))
        .ok()
}
