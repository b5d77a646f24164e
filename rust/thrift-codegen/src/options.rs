use std::collections::BTreeMap;

use thrift_schema::Program;

use crate::GenError;
use crate::targets::js::episode;

/// Dialect switches and import mappings, fixed for a whole generation run.
///
/// Every component receives this by reference; nothing reads switches from
/// anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsOptions {
    /// Target node.js (`require`, `module.exports`, processors) instead of
    /// the browser.
    pub node: bool,
    /// Emit classes, `const`/`let` and promises instead of prototypes.
    pub es6: bool,
    /// Keep `namespace js` objects under node.
    pub with_ns: bool,
    /// Also emit `.d.ts` declaration files.
    pub ts: bool,
    /// Module name → import path, gathered from the episode files of
    /// previously generated packages.
    pub imports: BTreeMap<String, String>,
    /// The package roots the `imports` entries were read from.
    pub import_roots: Vec<String>,
    /// Prefix for the emitted episode file. `None` disables it.
    pub package_output_dir: Option<String>,
    /// Stamped into the autogenerated banner.
    pub compiler_version: String,
}

impl Default for JsOptions {
    fn default() -> Self {
        Self {
            node: false,
            es6: false,
            with_ns: false,
            ts: false,
            imports: BTreeMap::new(),
            import_roots: Vec::new(),
            package_output_dir: None,
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl JsOptions {
    pub fn node() -> Self {
        Self {
            node: true,
            ..Self::default()
        }
    }

    pub fn browser() -> Self {
        Self::default()
    }

    pub fn es6(mut self) -> Self {
        self.es6 = true;
        self
    }

    pub fn with_ns(mut self) -> Self {
        self.with_ns = true;
        self
    }

    pub fn ts(mut self) -> Self {
        self.ts = true;
        self
    }

    pub fn package_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.package_output_dir = Some(dir.into());
        self
    }

    /// Register a previously generated package rooted at `root` whose
    /// `thrift.js.episode` file holds `episode`.
    pub fn add_import(&mut self, root: &str, episode: &str) -> Result<(), GenError> {
        let root = strip_trailing_slash(root);
        if root.is_empty() {
            return Err(GenError::InvalidOptions(
                "empty paths are not allowed in imports".into(),
            ));
        }
        episode::parse(root, episode, &mut self.imports)?;
        self.import_roots.push(root.to_string());
        Ok(())
    }

    /// Reject switch combinations the generator cannot honor.
    pub fn validate(&self, program: &Program) -> Result<(), GenError> {
        if self.with_ns && !self.node {
            return Err(GenError::InvalidOptions(
                "invalid switch: [-gen js:with_ns] is only valid when using node.js".into(),
            ));
        }
        if program.recursive && !self.import_roots.is_empty() {
            return Err(GenError::InvalidOptions(
                "[-gen js:imports=] option is not usable in recursive code generation mode".into(),
            ));
        }
        if let Some(dir) = &self.package_output_dir
            && strip_trailing_slash(dir).is_empty()
        {
            return Err(GenError::InvalidOptions(
                "the thrift_package_output_directory argument must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The episode prefix without its trailing `/`.
    pub fn package_dir(&self) -> Option<&str> {
        self.package_output_dir
            .as_deref()
            .map(strip_trailing_slash)
            .filter(|d| !d.is_empty())
    }

    /// Node without `with_ns` flattens `namespace js` away.
    pub fn no_ns(&self) -> bool {
        self.node && !self.with_ns
    }
}

fn strip_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}
