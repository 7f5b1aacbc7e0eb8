//! xmlmap - discover document structure and check configurations
//!
//! `discover` reads sample documents with a catch-all configuration and
//! writes an editable configuration template. `check` loads a configuration
//! and reports how much of a document it would bind.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use xmlmap::{
    discover_all, ConfigTree, CountingTarget, NamespaceScoping, ReaderOptions, TemplateOptions,
    TemplateWriter,
};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Configuration-driven XML mapping tools
#[derive(Parser, Debug)]
#[command(name = "xmlmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Deepest element nesting accepted
    #[arg(long, default_value = "256", global = true)]
    max_depth: usize,

    /// Lifetime of namespace declarations
    #[arg(long, value_enum, default_value = "global", global = true)]
    namespaces: Scoping,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a configuration template describing the given documents
    Discover {
        /// Sample documents; their shapes are merged
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Count the bindings a configuration makes on a document
    Check {
        /// Configuration document
        config: PathBuf,

        /// Document to read
        document: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scoping {
    /// One table for the whole document
    Global,
    /// Declarations end with the declaring element
    Scoped,
}

impl From<Scoping> for NamespaceScoping {
    fn from(scoping: Scoping) -> Self {
        match scoping {
            Scoping::Global => NamespaceScoping::Global,
            Scoping::Scoped => NamespaceScoping::Scoped,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xmlmap={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = ReaderOptions::new()
        .max_depth(cli.max_depth)
        .namespace_scoping(cli.namespaces.into());

    match cli.command {
        Command::Discover { files, output } => {
            let structure = discover_all(&files, options).context("discovery failed")?;
            let writer = TemplateWriter::with_options(TemplateOptions {
                max_depth: cli.max_depth,
                ..TemplateOptions::default()
            });
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("cannot create '{}'", path.display()))?;
                    writer.write_to(&structure, BufWriter::new(file))?;
                    info!("template written to {}", path.display());
                }
                None => writer.write_to(&structure, io::stdout().lock())?,
            }
        }
        Command::Check { config, document } => {
            let tree = ConfigTree::from_file(&config)
                .with_context(|| format!("cannot load configuration '{}'", config.display()))?;
            let mut counts = CountingTarget::default();
            xmlmap::read_file_with_options(&document, &tree, &mut counts, options)
                .with_context(|| format!("cannot read '{}'", document.display()))?;
            println!(
                "{}: {} elements, {} attributes, {} text values bound",
                document.display(),
                counts.elements,
                counts.attributes,
                counts.contents
            );
        }
    }
    Ok(())
}
