use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use proposal_screens_config::Config;
use proposal_screens_engine::fields::{
    DecomposeOptions, Field, StyleOverrideMap, decompose_with, reconstruct, remove_invalid_breaks,
};
use proposal_screens_engine::io;
use proposal_screens_engine::patch::{PatchRequest, apply_patch};
use proposal_screens_engine::print::{CssLength, PageSize, compose_print_document_with};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Field-level editing of proposal screens")]
struct Cli {
    /// Screens directory (defaults to `screens_path` from the config file)
    #[arg(long, global = true)]
    screens_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a fragment into fields and print them as JSON
    Decompose {
        /// Fragment file, or `-` for stdin
        input: PathBuf,
        /// Treat the fragment as the inner content of a list item
        #[arg(long)]
        list_item: bool,
        /// Decompose whole lists as single fields
        #[arg(long)]
        collapse_lists: bool,
    },
    /// Write edited fields back into a marked fragment
    Reconstruct {
        /// JSON array of fields
        fields: PathBuf,
        /// Marked fragment from `decompose`; fields are rendered flat without it
        #[arg(long)]
        marked: Option<PathBuf>,
        /// JSON object of field id to style
        #[arg(long)]
        overrides: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a JSON patch request to a fragment
    Patch {
        input: PathBuf,
        request: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove structural line breaks from a fragment
    Clean {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compose fragments into one printable document
    Compose {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import an HTML file as a stored screen
    Import {
        file: PathBuf,
        /// Screen name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// List stored screens
    List,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Command::Decompose {
            input,
            list_item,
            collapse_lists,
        } => {
            let options = DecomposeOptions {
                list_item,
                collapse_lists: collapse_lists
                    || config.as_ref().is_some_and(|c| c.collapse_lists),
            };
            let decomposition = decompose_with(&read_input(&input)?, options);
            log::info!("{} fields", decomposition.fields.len());
            println!("{}", serde_json::to_string_pretty(&decomposition)?);
        }
        Command::Reconstruct {
            fields,
            marked,
            overrides,
            output,
        } => {
            let fields: Vec<Field> = serde_json::from_str(&read_input(&fields)?)
                .with_context(|| format!("Invalid fields JSON in {}", fields.display()))?;
            let overrides: Option<StyleOverrideMap> = match overrides {
                Some(path) => Some(
                    serde_json::from_str(&read_input(&path)?)
                        .with_context(|| format!("Invalid overrides JSON in {}", path.display()))?,
                ),
                None => None,
            };
            let marked = marked.map(|path| read_input(&path)).transpose()?;
            if marked.is_none() {
                log::warn!("No marked fragment given; rendering fields without structure");
            }
            let html = reconstruct(marked.as_deref(), &fields, overrides.as_ref());
            write_output(output.as_deref(), &html)?;
        }
        Command::Patch {
            input,
            request,
            output,
        } => {
            let request: PatchRequest = serde_json::from_str(&read_input(&request)?)
                .with_context(|| format!("Invalid patch request in {}", request.display()))?;
            let html = apply_patch(&read_input(&input)?, &request);
            write_output(output.as_deref(), &html)?;
        }
        Command::Clean { input, output } => {
            let html = remove_invalid_breaks(&read_input(&input)?);
            write_output(output.as_deref(), &html)?;
        }
        Command::Compose { inputs, output } => {
            let fragments = inputs
                .iter()
                .map(|path| read_input(path))
                .collect::<Result<Vec<_>>>()?;
            let fallback = config
                .as_ref()
                .and_then(configured_page_size)
                .unwrap_or_default();
            let doc = compose_print_document_with(&fragments, fallback);
            log::info!(
                "Page size {} x {}, viewport {}x{}px",
                doc.page_size.width,
                doc.page_size.height,
                doc.viewport_width,
                doc.viewport_height
            );
            write_output(output.as_deref(), &doc.html)?;
        }
        Command::Import { file, name } => {
            let screens_dir = screens_dir(cli.screens_dir, config.as_ref())?;
            let mut screen = io::import_file(&file)?;
            if let Some(name) = name {
                screen.rename(&name);
            }
            io::save_screen(&screens_dir, &screen)?;
            log::info!(
                "Imported {} as screen {:?} in {}",
                file.display(),
                screen.name(),
                screens_dir.display()
            );
        }
        Command::List => {
            let screens_dir = screens_dir(cli.screens_dir, config.as_ref())?;
            for name in io::scan_screens(&screens_dir)? {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn load_config() -> Result<Option<Config>> {
    let config_path = Config::config_path();
    log::debug!("Config path: {}", config_path.display());
    Config::load_from_path(&config_path).context("Failed to load config")
}

fn configured_page_size(config: &Config) -> Option<PageSize> {
    let (width, height) = config.default_page_size()?;
    match (CssLength::parse(width), CssLength::parse(height)) {
        (Some(width), Some(height)) => Some(PageSize { width, height }),
        _ => {
            log::warn!("Ignoring configured page size {width} x {height}: not absolute CSS lengths");
            None
        }
    }
}

fn screens_dir(flag: Option<PathBuf>, config: Option<&Config>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    match config {
        Some(config) => Ok(config.screens_path.clone()),
        None => bail!(
            "No screens directory: pass --screens-dir or set screens_path in {}",
            Config::config_path().display()
        ),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            print!("{content}");
            Ok(())
        }
    }
}
