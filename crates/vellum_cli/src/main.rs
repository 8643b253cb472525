//! `vellum`: checks interface descriptions and writes bindings for them.
#![allow(clippy::std_instead_of_core, reason = "binary crate")]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use vellum_codegen::{Options, SymbolFormat, Target};
use vellum_ir::Items;

#[derive(Parser, Debug)]
#[command(name = "vellum", version)]
#[command(about = "Bindings generator for the vellum ownership-transfer ABI", long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write bindings for an interface description
    Generate {
        /// JSON interface description
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output language, repeatable: `rust`, `c` or `python`
        #[arg(short, long = "target", value_name = "TARGET", default_value = "rust")]
        targets: Vec<Target>,
        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
        /// Base name of the output files (defaults to the input's)
        #[arg(long)]
        stem: Option<String>,
        /// Shared library the Rust bindings link against
        #[arg(long, value_name = "NAME")]
        lib: Option<String>,
        #[command(flatten)]
        naming: Naming,
        /// Prefix of the C macros and typedefs
        #[arg(long, value_name = "PREFIX")]
        header_prefix: Option<String>,
        /// Path of the runtime crate in the Rust output, e.g. `::vellum::abi`
        #[arg(long, value_name = "PATH")]
        runtime_path: Option<String>,
    },

    /// Validate an interface description
    Check {
        /// JSON interface description
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List the exported symbols
    Symbols {
        /// JSON interface description
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// `list` or `gnu-version-script`
        #[arg(short, long, default_value = "list")]
        format: SymbolFormat,
        #[command(flatten)]
        naming: Naming,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct Naming {
    /// Prepended to every exported symbol
    #[arg(short, long, value_name = "PREFIX", default_value = "")]
    prefix: String,
}

fn read_items(path: &Path) -> Result<Items> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    let items = serde_json::from_str(&text)
        .with_context(|| format!("`{}` is not a valid interface description", path.display()))?;
    log::debug!("read {}", path.display());
    Ok(items)
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
        .with_context(|| format!("cannot derive an output name from `{}`", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write `{}`", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Generate {
            file,
            targets,
            output,
            stem,
            lib,
            naming,
            header_prefix,
            runtime_path,
        } => {
            let items = read_items(&file)?;
            let stem = match stem {
                Some(stem) => stem,
                None => file_stem(&file)?,
            };

            let mut options = Options::new(stem).targets(targets).symbol_prefix(naming.prefix);
            if let Some(lib) = lib {
                options = options.link_name(lib);
            }
            if let Some(prefix) = header_prefix {
                options = options.header_prefix(prefix);
            }
            if let Some(path) = runtime_path {
                options = options.runtime_path(path);
            }

            let files = vellum_codegen::generate(&items, &options)
                .with_context(|| format!("cannot generate bindings for `{}`", file.display()))?;

            fs::create_dir_all(&output)
                .with_context(|| format!("failed to create `{}`", output.display()))?;
            for generated in files {
                write_file(&output.join(&generated.name), &generated.contents)?;
            }
            Ok(())
        }
        Command::Check { file } => {
            let items = read_items(&file)?;
            items.validate()?;
            println!(
                "{}: {} structs, {} abstract structs, {} functions",
                file.display(),
                items.structs.len(),
                items.abstract_structs.len(),
                items.functions.len(),
            );
            Ok(())
        }
        Command::Symbols {
            file,
            format,
            naming,
            output,
        } => {
            let items = read_items(&file)?;
            items.validate()?;
            let options = Options::default().symbol_prefix(naming.prefix);
            let text = vellum_codegen::render_symbols(&items, &options, format);
            match output {
                Some(path) => write_file(&path, &text),
                None => {
                    print!("{text}");
                    Ok(())
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();
    run(cli.command)
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use vellum_codegen::{SymbolFormat, Target};

    use super::{Cli, Command};

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn targets_repeat() {
        let cli = Cli::try_parse_from(["vellum", "generate", "kv.json", "-t", "rust", "--target", "c", "-p", "kv_"])
            .unwrap();
        let Command::Generate { targets, naming, .. } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(targets, [Target::Rust, Target::C]);
        assert_eq!(naming.prefix, "kv_");
    }

    #[test]
    fn symbol_format_names() {
        let cli = Cli::try_parse_from(["vellum", "symbols", "kv.json", "--format", "gnu-version-script"]).unwrap();
        let Command::Symbols { format, .. } = cli.command else {
            panic!("expected symbols");
        };
        assert_eq!(format, SymbolFormat::GnuVersionScript);
        assert!(Cli::try_parse_from(["vellum", "symbols", "kv.json", "--format", "def"]).is_err());
    }
}
