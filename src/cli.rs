//! The `deepoverlay` command: inspection and housekeeping for the stored
//! annotation collection, outside of any page.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use deepoverlay_core::PageUrl;
use deepoverlay_storage::{
    default_config_path, default_store_path, format_bytes, group_by_site, parse_backup,
    JsonFileStore, OverlayConfig, PageStore,
};

use crate::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "deepoverlay",
    version,
    about = "Inspect and manage stored DeepOverlay page annotations"
)]
pub struct Cli {
    /// Annotation store file (overrides the configured location)
    #[arg(long, global = true, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Configuration file (.toml or .json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stored pages grouped by site
    List(ListArgs),
    /// Show the boxes stored for one page
    Show {
        /// Page URL; the query string is ignored
        url: String,
    },
    /// Edit the note of one stored box
    Note {
        /// Page URL; the query string is ignored
        url: String,
        /// Position of the box in the page record
        index: usize,
        /// New note text
        text: String,
    },
    /// Delete every box stored for one page
    Delete {
        /// Page URL; the query string is ignored
        url: String,
    },
    /// Delete every stored page
    Clear {
        /// Required to actually clear the store
        #[arg(long)]
        yes: bool,
    },
    /// Write a dated backup of the whole store
    Export(ExportArgs),
    /// Replace the whole store with a backup
    Import {
        /// Backup file written by `export`
        file: PathBuf,
    },
    /// Print the effective configuration, or write the defaults
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only pages whose URL or notes contain this text (case-insensitive)
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory to write the backup into
    #[arg(long, short, default_value = ".")]
    pub out: PathBuf,
}

impl Cli {
    pub fn log_format(&self) -> LogFormat {
        if self.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => default_config_path().context("no configuration directory"),
        }
    }

    fn load_config(&self) -> Result<OverlayConfig> {
        let path = self.config_path()?;
        OverlayConfig::load_or_default(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))
    }

    fn store_path(&self, config: &OverlayConfig) -> Result<PathBuf> {
        if let Some(path) = self.store.clone().or_else(|| config.storage.path.clone()) {
            return Ok(path);
        }
        default_store_path().context("no data directory for the annotation store")
    }

    fn open_store(&self) -> Result<PageStore<JsonFileStore>> {
        let config = self.load_config()?;
        let path = self.store_path(&config)?;
        tracing::debug!("Using store {}", path.display());
        let backend = JsonFileStore::open(&path)
            .with_context(|| format!("failed to open store {}", path.display()))?;
        Ok(PageStore::new(backend))
    }
}

/// Runs `cli`, writing command output to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    run_at(cli, Utc::now(), out)
}

/// Like [`run`] with a fixed clock, for exports.
pub fn run_at(cli: &Cli, now: DateTime<Utc>, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Commands::Config { init } => return config(cli, *init, out),
        Commands::Clear { yes: false } => bail!("refusing to clear the store without --yes"),
        _ => {}
    }

    let mut store = cli.open_store()?;
    match &cli.command {
        Commands::List(args) => list(&store, args, out),
        Commands::Show { url } => show(&store, url, out),
        Commands::Note { url, index, text } => {
            let page = PageUrl::normalize(url);
            if !store.update_note(page.as_str(), *index, text)? {
                bail!("no box {} stored for {}", index, page);
            }
            writeln!(out, "Updated note {} on {}", index, page)?;
            Ok(())
        }
        Commands::Delete { url } => {
            let page = PageUrl::normalize(url);
            if !store.page_urls()?.iter().any(|u| u == page.as_str()) {
                bail!("nothing stored for {}", page);
            }
            store.delete_page(page.as_str())?;
            writeln!(out, "Deleted {}", page)?;
            Ok(())
        }
        Commands::Clear { .. } => {
            store.clear_all()?;
            writeln!(out, "Cleared all stored pages")?;
            Ok(())
        }
        Commands::Export(args) => {
            let path = store.export(now)?.write_to_dir(&args.out)?;
            writeln!(out, "{}", path.display())?;
            Ok(())
        }
        Commands::Import { file } => {
            let pages = import(&mut store, file)?;
            writeln!(out, "Imported {} pages", pages)?;
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn list(store: &PageStore<JsonFileStore>, args: &ListArgs, out: &mut impl Write) -> Result<()> {
    let query = args.search.as_deref().unwrap_or_default();
    let summaries = store.summaries(query)?;

    if summaries.is_empty() {
        if query.is_empty() {
            writeln!(out, "No annotations stored")?;
        } else {
            writeln!(out, "No pages match \"{}\"", query)?;
        }
    }

    for (site, pages) in group_by_site(summaries) {
        writeln!(out, "{}", site)?;
        for page in pages {
            writeln!(out, "  {} ({} boxes)", page.url, page.box_count)?;
            for note in page.notes.iter().filter(|n| !n.is_empty()) {
                writeln!(out, "    - {}", note)?;
            }
        }
    }

    writeln!(out, "Storage used: {}", format_bytes(store.usage_bytes()?))?;
    Ok(())
}

fn show(store: &PageStore<JsonFileStore>, url: &str, out: &mut impl Write) -> Result<()> {
    let page = PageUrl::normalize(url);
    let boxes = store.load_all(&page);
    writeln!(out, "{} ({} boxes)", page, boxes.len())?;

    for (index, b) in boxes.iter().enumerate() {
        let g = b.geometry;
        write!(
            out,
            "  [{}] {:.0},{:.0} {:.0}x{:.0}",
            index, g.left, g.top, g.width, g.height
        )?;
        match &b.anchor {
            Some(anchor) => write!(out, " @ {}", anchor.locator)?,
            None => write!(out, " (floating)")?,
        }
        if b.note.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, " \"{}\"", b.note)?;
        }
    }
    Ok(())
}

fn import(store: &mut PageStore<JsonFileStore>, file: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read backup {}", file.display()))?;
    let mapping =
        parse_backup(&content).with_context(|| format!("{} is not a backup", file.display()))?;
    Ok(store.import(mapping)?)
}

fn config(cli: &Cli, init: bool, out: &mut impl Write) -> Result<()> {
    let path = cli.config_path()?;
    if init {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        OverlayConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writeln!(out, "Wrote {}", path.display())?;
        return Ok(());
    }

    let config = cli.load_config()?;
    writeln!(out, "# {}", path.display())?;
    writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
    Ok(())
}
