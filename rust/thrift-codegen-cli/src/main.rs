//! `thrift-js`: generate JavaScript from a parsed Thrift program.
//!
//! The parser runs upstream and hands over its type graph as JSON. Every
//! file is generated in memory first, so a fatal error leaves the output
//! directory untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use thrift_codegen::{EPISODE_FILE_NAME, JsOptions, generate};
use thrift_schema::Program;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "thrift-js")]
#[command(about = "Generate JavaScript modules from a Thrift type graph.", long_about = None)]
struct Cli {
    /// JSON type graph produced by the parser.
    #[arg(long)]
    ast: PathBuf,
    /// Output directory. Defaults to gen-nodejs or gen-js.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Generate node.js modules.
    #[arg(long, default_value_t = false)]
    node: bool,
    /// Generate ES6 classes and promises.
    #[arg(long, default_value_t = false)]
    es6: bool,
    /// Keep `namespace js` objects under node.
    #[arg(long, default_value_t = false)]
    with_ns: bool,
    /// Also generate TypeScript declaration files.
    #[arg(long, default_value_t = false)]
    ts: bool,
    /// Root of a previously generated package whose episode file maps
    /// includes onto import paths. Repeatable.
    #[arg(long = "imports", value_name = "DIR")]
    imports: Vec<String>,
    /// Emit an episode file pointing other packages at this directory.
    #[arg(long, value_name = "DIR")]
    package_output_dir: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let options = options(&cli)?;

    let ast = fs::read_to_string(&cli.ast)
        .with_context(|| format!("failed to read {}", cli.ast.display()))?;
    let program: Program = serde_json::from_str(&ast)
        .with_context(|| format!("failed to parse type graph {}", cli.ast.display()))?;

    let files = generate(&program, &options)
        .with_context(|| format!("failed to generate code for {}", program.name))?;

    let out = cli.out.clone().unwrap_or_else(|| {
        PathBuf::from(if options.node { "gen-nodejs" } else { "gen-js" })
    });
    write_all(&out, &files)?;
    tracing::info!(program = %program.name, files = files.len(), out = %out.display(), "generated");
    Ok(())
}

fn options(cli: &Cli) -> Result<JsOptions> {
    let mut options = JsOptions {
        node: cli.node,
        es6: cli.es6,
        with_ns: cli.with_ns,
        ts: cli.ts,
        package_output_dir: cli.package_output_dir.clone(),
        ..JsOptions::default()
    };
    for root in &cli.imports {
        let path = Path::new(root).join(EPISODE_FILE_NAME);
        let episode = fs::read_to_string(&path)
            .with_context(|| format!("failed to read episode file {}", path.display()))?;
        options.add_import(root, &episode)?;
        tracing::debug!(root = %root, "imported episode");
    }
    Ok(options)
}

fn write_all(out: &Path, files: &[thrift_codegen::GeneratedFile]) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    for file in files {
        let path = out.join(&file.name);
        fs::write(&path, &file.contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = file.contents.len(), "wrote");
    }
    Ok(())
}
