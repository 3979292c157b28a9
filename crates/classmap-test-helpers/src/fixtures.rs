//! Test fixtures - source snippets and scratch source trees

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A single class declaration
pub fn class_source(name: &str) -> String {
    format!("<?php\n\nclass {} {{\n    public function run() {{}}\n}}\n", name)
}

/// A single interface declaration
pub fn interface_source(name: &str) -> String {
    format!("<?php\n\ninterface {} {{\n    function run();\n}}\n", name)
}

/// Declarations with every supported modifier
pub fn modifiers_source() -> &'static str {
    r#"<?php

abstract class BaseTask {
    abstract protected function execute();
}

final class SealedTask extends BaseTask {
    protected function execute() {}
}

    interface Runnable {}
"#
}

/// Mentions of the keywords that are not declarations
pub fn decoy_source() -> &'static str {
    r#"<?php
// class NotReal is only mentioned in a comment
$name = "class AlsoNotReal";
$obj = new class {};
"#
}

/// A scratch directory of source files, removed on drop
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `rel` inside the tree
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories
    ///
    /// Returns the canonical path, as the scanner records it.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write fixture");
        path.canonicalize().expect("canonicalize fixture")
    }

    pub fn write_class(&self, rel: &str, name: &str) -> PathBuf {
        self.write(rel, &class_source(name))
    }

    pub fn write_interface(&self, rel: &str, name: &str) -> PathBuf {
        self.write(rel, &interface_source(name))
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("create dir");
        path
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}
