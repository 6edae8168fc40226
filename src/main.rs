use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use defpatch::engine::discovery;
use defpatch::{
    AdapterRegistry, DefinitionStore, PatchDocument, PatchEngine, SharedStore, StoreAdapter,
};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "defpatch")]
#[command(about = "Declarative patching of definition data by content packs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply all patches for one target kind against a definition store
    Apply {
        /// Directory whose immediate subdirectories are content-pack roots
        #[arg(short, long)]
        packs: PathBuf,

        /// Target kind to apply, e.g. GlyphDefinition
        #[arg(short, long)]
        target: String,

        /// On-disk category folder (defaults to the target kind)
        #[arg(short, long)]
        category: Option<String>,

        /// Directory of base definition XML files to seed the store with
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Write patched definitions to this directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Show unified diffs of changed definitions
        #[arg(long)]
        diff: bool,
    },

    /// Show the processing order of discovered patch files
    List {
        /// Directory whose immediate subdirectories are content-pack roots
        #[arg(short, long)]
        packs: PathBuf,

        /// On-disk category folder to scan
        #[arg(short, long)]
        category: String,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse every discovered patch file and report malformed ones
    Validate {
        /// Directory whose immediate subdirectories are content-pack roots
        #[arg(short, long)]
        packs: PathBuf,

        /// On-disk category folder to scan
        #[arg(short, long)]
        category: String,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            packs,
            target,
            category,
            data,
            out,
            diff,
        } => cmd_apply(packs, target, category, data, out, diff),

        Commands::List {
            packs,
            category,
            json,
        } => cmd_list(packs, category, json),

        Commands::Validate {
            packs,
            category,
            json,
        } => cmd_validate(packs, category, json),
    }
}

/// Each immediate subdirectory of `packs` is one content-pack root.
fn pack_roots(packs: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(packs)
        .with_context(|| format!("failed to read packs directory {}", packs.display()))?;

    let mut roots = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            roots.push(entry.path());
        }
    }
    roots.sort();

    if roots.is_empty() {
        anyhow::bail!("no content-pack roots found under {}", packs.display());
    }
    Ok(roots)
}

/// Seed the store from `<data>/*.xml`, one definition per file.
fn seed_store(adapter: &mut StoreAdapter, data: &Path) -> Result<usize> {
    let entries = fs::read_dir(data)
        .with_context(|| format!("failed to read data directory {}", data.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("xml"))
        .collect();
    paths.sort();

    let mut seeded = 0;
    for path in paths {
        let input = match fs::read_to_string(&path) {
            Ok(input) => input,
            Err(err) => {
                eprintln!(
                    "{}",
                    format!("Warning: skipping unreadable {}: {err}", path.display()).yellow()
                );
                continue;
            }
        };
        match defpatch::parse_document(&input) {
            Ok(definition) => {
                if adapter.seed(definition) {
                    seeded += 1;
                } else {
                    eprintln!(
                        "{}",
                        format!("Warning: {} has no Id attribute; skipped", path.display())
                            .yellow()
                    );
                }
            }
            Err(err) => eprintln!(
                "{}",
                format!("Warning: skipping malformed {}: {err}", path.display()).yellow()
            ),
        }
    }
    Ok(seeded)
}

/// Stable snapshot of every definition, keyed by id, for diff display.
fn snapshot(store: &SharedStore) -> BTreeMap<String, String> {
    store
        .borrow()
        .iter()
        .map(|(id, def)| (id.to_string(), defpatch::write_document_pretty(def)))
        .collect()
}

fn display_diff(id: &str, original: &str, modified: &str) {
    println!("\n{}", format!("--- {id} (original)").dimmed());
    println!("{}", format!("+++ {id} (patched)").dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

/// Atomic file write: tempfile in the same directory + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn cmd_apply(
    packs: PathBuf,
    target: String,
    category: Option<String>,
    data: Option<PathBuf>,
    out: Option<PathBuf>,
    show_diff: bool,
) -> Result<()> {
    let roots = pack_roots(&packs)?;
    let category = category.unwrap_or_else(|| target.clone());

    let store = DefinitionStore::shared();
    let mut adapter = StoreAdapter::new(target.clone(), category.clone(), Rc::clone(&store));

    if let Some(data) = &data {
        let seeded = seed_store(&mut adapter, data)?;
        println!("Seeded {seeded} definition(s) from {}", data.display());
    }

    let before = if show_diff {
        snapshot(&store)
    } else {
        BTreeMap::new()
    };

    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(adapter));
    let mut engine = PatchEngine::new(registry, roots);

    let dispatched = engine.apply(&target);

    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} patch file(s) dispatched for '{target}'",
        format!("{dispatched}").green()
    );
    println!("  {} definition(s) in store", store.borrow().len());

    if show_diff {
        let after = snapshot(&store);
        for (id, modified) in &after {
            match before.get(id) {
                Some(original) if original != modified => display_diff(id, original, modified),
                None => display_diff(id, "", modified),
                _ => {}
            }
        }
        for (id, original) in &before {
            if !after.contains_key(id) {
                display_diff(id, original, "");
            }
        }
    }

    if let Some(out) = out {
        fs::create_dir_all(&out)
            .with_context(|| format!("failed to create {}", out.display()))?;
        let mut written = 0;
        for (id, definition) in snapshot(&store) {
            let path = out.join(format!("{id}.xml"));
            atomic_write(&path, definition.as_bytes())?;
            written += 1;
        }
        println!("  {} file(s) written to {}", written, out.display());
    }

    Ok(())
}

#[derive(Serialize)]
struct ListedFile {
    order: usize,
    prefix: Option<u32>,
    path: String,
}

fn listed_files(packs: &Path, category: &str) -> Result<Vec<ListedFile>> {
    let roots = pack_roots(packs)?;
    let files = discovery::patch_files(&roots, category);

    Ok(files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let (prefix, _) = discovery::sort_key(path);
            ListedFile {
                order: i + 1,
                prefix: (prefix != u32::MAX).then_some(prefix),
                path: path.display().to_string(),
            }
        })
        .collect())
}

fn cmd_list(packs: PathBuf, category: String, json: bool) -> Result<()> {
    let files = listed_files(&packs, &category)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("No patch files found for category '{category}'");
        return Ok(());
    }

    println!("{}", format!("Processing order for '{category}':").bold());
    for file in &files {
        let prefix = match file.prefix {
            Some(p) => format!("{p:>9}"),
            None => format!("{:>9}", "-"),
        };
        println!("  {:>3}. [{}] {}", file.order, prefix.dimmed(), file.path);
    }
    Ok(())
}

#[derive(Serialize)]
struct ValidationReport {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_validate(packs: PathBuf, category: String, json: bool) -> Result<()> {
    let roots = pack_roots(&packs)?;
    let files = discovery::patch_files(&roots, &category);

    let mut reports = Vec::new();
    let mut failures = 0;

    for path in &files {
        match PatchDocument::load(path) {
            Ok(_) => reports.push(ValidationReport {
                path: path.display().to_string(),
                ok: true,
                error: None,
            }),
            Err(err) => {
                failures += 1;
                reports.push(ValidationReport {
                    path: path.display().to_string(),
                    ok: false,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            if report.ok {
                println!("{} {}", "✓".green(), report.path);
            } else {
                eprintln!("{} {}", "✗".red(), report.path);
                if let Some(error) = &report.error {
                    eprintln!("  {}", error.red());
                }
            }
        }
        println!();
        println!("{}", "Summary:".bold());
        println!(
            "  {} valid",
            format!("{}", reports.len() - failures).green()
        );
        println!("  {} malformed", format!("{failures}").red());
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
