use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use docschema_core::{
    backend::memory::MemoryDriver,
    compile::{CompileOptions, SchemaCompiler},
    Db,
};
use docschema_tools::SchemaManifest;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Cmd::Compile(c) => c.run(),
        Cmd::Names(c) => c.run(),
    }
}

#[derive(clap::Parser)]
struct Args {
    #[clap(subcommand)]
    command: Cmd,
}

#[derive(clap::Subcommand)]
enum Cmd {
    /// Compile a manifest against an in-memory database and print the
    /// executed operations.
    Compile(CmdCompile),
    /// Print the effective name of every index.
    Names(CmdNames),
}

#[derive(clap::Args)]
struct OptionArgs {
    /// Skip types without collection metadata.
    #[clap(long)]
    skip_undeclared: bool,
}

impl OptionArgs {
    /// Flags override the manifest options.
    fn apply(&self, mut options: CompileOptions) -> CompileOptions {
        options.skip_undeclared |= self.skip_undeclared;
        options
    }
}

#[derive(clap::Parser)]
struct CmdCompile {
    /// Only compile the direct subtypes of this type.
    #[clap(long)]
    base: Option<String>,

    /// Also compile the base type itself, after its subtypes.
    #[clap(long, requires = "base")]
    include_base: bool,

    #[clap(flatten)]
    options: OptionArgs,

    /// The file to write the operations to.
    /// If not provided they are written to stdout.
    #[clap(short = 'o', long)]
    out_path: Option<PathBuf>,

    /// The path to a YAML or JSON manifest.
    manifest_path: PathBuf,
}

impl CmdCompile {
    fn run(&self) -> Result<(), anyhow::Error> {
        let manifest = SchemaManifest::load(&self.manifest_path)?;
        let mut options = self.options.apply(manifest.options.clone());
        options.include_base |= self.include_base;

        let scope = manifest.to_scope()?;
        let db = Db::new(MemoryDriver::new()).with_options(options);

        let report = match &self.base {
            Some(base) => futures::executor::block_on(db.create_schema_for_base(&scope, base))?,
            None => futures::executor::block_on(db.create_schema(&scope))?,
        };
        tracing::info!(operations = report.len(), "schema compiled");

        let rendered = docschema_tools::render_report(&report);
        let output = serde_json::to_string_pretty(&rendered)?;

        if let Some(path) = &self.out_path {
            let out_extension = path
                .extension()
                .unwrap_or_default()
                .to_str()
                .unwrap_or_default();
            if out_extension != "json" {
                bail!(
                    "Invalid out path {}: expected a .json file extension",
                    path.display(),
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Could not create parent directory {}", parent.display())
                })?;
            }
            std::fs::write(path, output)
                .with_context(|| format!("Could not write operations to file {}", path.display()))?;
        } else {
            println!("{output}");
        }
        Ok(())
    }
}

#[derive(clap::Parser)]
struct CmdNames {
    #[clap(flatten)]
    options: OptionArgs,

    /// The path to a YAML or JSON manifest.
    manifest_path: PathBuf,
}

impl CmdNames {
    fn run(&self) -> Result<(), anyhow::Error> {
        let manifest = SchemaManifest::load(&self.manifest_path)?;
        let options = self.options.apply(manifest.options.clone());
        let scope = manifest.to_scope()?;

        let compiler = SchemaCompiler::with_options(options);
        for (type_name, index_name) in docschema_tools::index_names(&scope, &compiler)? {
            println!("{type_name}\t{index_name}");
        }
        Ok(())
    }
}
