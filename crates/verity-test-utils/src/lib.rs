//! Testing utilities for the Verity workspace
//!
//! Temporary source trees on disk and worker-output builders whose paths
//! point into them.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use verity_claim::WorkerOutput;

/// Python module defining one function, one class and two imports
pub const SAMPLE_PYTHON: &str = "\
import os
from typing import Dict

def real_function():
    return True

class RealClass:
    def method(self):
        pass
";

/// Temporary directory that is removed on drop
#[derive(Debug)]
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Tree with `main.py` holding [`SAMPLE_PYTHON`]
    pub fn with_sample() -> Self {
        let tree = Self::new();
        tree.write("main.py", SAMPLE_PYTHON);
        tree
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Absolute path as an owned string, the form worker outputs carry
    pub fn path_str(&self, relative: &str) -> String {
        self.path(relative).to_string_lossy().into_owned()
    }

    /// Write a file, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Output builder resolving relative paths against this tree
    pub fn output(&self) -> OutputBuilder<'_> {
        OutputBuilder {
            tree: self,
            output: WorkerOutput::new(),
        }
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a [`WorkerOutput`] with paths inside a [`SourceTree`]
#[derive(Debug)]
pub struct OutputBuilder<'a> {
    tree: &'a SourceTree,
    output: WorkerOutput,
}

impl OutputBuilder<'_> {
    pub fn file(mut self, relative: &str) -> Self {
        self.output = self.output.with_file(self.tree.path_str(relative));
        self
    }

    pub fn function(mut self, relative: &str, name: &str) -> Self {
        self.output = self.output.with_function(self.tree.path_str(relative), name);
        self
    }

    pub fn class(mut self, relative: &str, name: &str) -> Self {
        self.output = self.output.with_class(self.tree.path_str(relative), name);
        self
    }

    pub fn import(mut self, relative: &str, name: &str) -> Self {
        self.output = self.output.with_import(self.tree.path_str(relative), name);
        self
    }

    pub fn snippet(mut self, relative: &str, code: &str) -> Self {
        self.output = self.output.with_snippet(self.tree.path_str(relative), code);
        self
    }

    /// Analysis text; `{root}` is replaced by the tree's root directory
    pub fn analysis(mut self, text: &str) -> Self {
        let root = self.tree.root().to_string_lossy();
        self.output = self.output.with_analysis(text.replace("{root}", &root));
        self
    }

    pub fn build(self) -> WorkerOutput {
        self.output
    }
}
