//! JavaScript code generation.
//!
//! One run turns a [`Program`] into a `<program>_types.js` module (enums,
//! constants, structs and exceptions, each with its reader and writer) and
//! one module per service (args/result helpers, a client and, under node,
//! a processor). With `ts` set, matching `.d.ts` files are produced, and
//! with a package directory the run also writes an episode file.
//!
//! The dialect (node or browser, es5 or es6) never changes inside a run;
//! code paths read it from [`Syntax`].

mod client;
mod decode;
mod encode;
pub(crate) mod episode;
mod names;
mod processor;
mod service;
mod structs;
mod syntax;
mod types;
mod typescript;
mod value;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use thrift_schema::Program;

use crate::code_writer::CodeWriter;
use crate::{GenError, JsOptions};

pub use episode::EPISODE_FILE_NAME;
pub use syntax::Syntax;

type Out = CodeWriter<String>;

fn writer() -> Out {
    CodeWriter::with_indent_spaces(String::new(), 2)
}

/// One output artifact, named relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

impl GeneratedFile {
    fn new(name: impl Into<String>, contents: String) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

/// Generate every artifact for `program`.
///
/// Everything is built in memory; on error nothing is returned.
pub fn generate(program: &Program, options: &JsOptions) -> Result<Vec<GeneratedFile>, GenError> {
    options.validate(program)?;
    let generator = JsGenerator::new(program, options);

    let mut files = vec![GeneratedFile::new(
        format!("{}_types.js", program.name),
        types::types_file(&generator)?,
    )];
    for svc in &program.services {
        files.push(GeneratedFile::new(
            format!("{}.js", svc.name),
            service::service_file(&generator, svc)?,
        ));
    }

    if options.ts {
        files.push(GeneratedFile::new(
            format!("{}_types.d.ts", program.name),
            typescript::types_declarations(&generator)?,
        ));
        for svc in &program.services {
            files.push(GeneratedFile::new(
                format!("{}.d.ts", svc.name),
                typescript::service_declarations(&generator, svc)?,
            ));
        }
    }

    if let Some(dir) = options.package_dir() {
        files.push(GeneratedFile::new(
            EPISODE_FILE_NAME,
            episode::render(program, dir),
        ));
    }

    tracing::debug!(
        program = %program.name,
        files = files.len(),
        "generated javascript"
    );
    Ok(files)
}

/// State shared by every emitter during one run.
pub(crate) struct JsGenerator<'a> {
    program: &'a Program,
    options: &'a JsOptions,
    syntax: Syntax,
    /// Suffix for loop and element temporaries. Never reset, so names stay
    /// unique across every file of the run.
    tmp: Cell<usize>,
    /// Program name → `<ident>_ttypes` alias, filled on first use.
    aliases: RefCell<HashMap<String, String>>,
}

impl<'a> JsGenerator<'a> {
    fn new(program: &'a Program, options: &'a JsOptions) -> Self {
        Self {
            program,
            options,
            syntax: Syntax::new(options),
            tmp: Cell::new(0),
            aliases: RefCell::new(HashMap::new()),
        }
    }

    /// A fresh temporary name: `_size3`, `elem4`, ...
    fn tmp(&self, name: &str) -> String {
        let n = self.tmp.get();
        self.tmp.set(n + 1);
        format!("{name}{n}")
    }
}
