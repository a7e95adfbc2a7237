use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dancedb_convert::convert::convert_with_progress;
use dancedb_convert::ids::{format_ids, is_list_file, parse_ids, read_input, write_output};
use dancedb_convert::loader::{self, load_catalog, LoaderConfig};
use dancedb_convert::models::{CatalogKind, ConversionStats};
use dancedb_convert::normalize::TextOptions;
use dancedb_convert::progress::{create_progress_bar, finish, format_duration, log_progress, set_log_only};
use dancedb_convert::report::{format_outcome, format_summary, header, separator};
use dancedb_convert::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "dancedb-convert")]
#[command(about = "Convert song ID lists between PypyDance and WannaDance by fuzzy name matching")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding pypydance.json / wannadance.json
    #[arg(long, global = true, default_value = ".")]
    cache_dir: PathBuf,

    #[arg(long, global = true, env = "DANCEDB_PYPY_URL", default_value = loader::PYPY_URL)]
    pypy_url: String,

    #[arg(long, global = true, env = "DANCEDB_WD_URL", default_value = loader::WD_URL)]
    wd_url: String,

    /// Re-download catalogs even if cached
    #[arg(long, global = true)]
    refresh: bool,

    /// Never download; fail if a catalog is not cached
    #[arg(long, global = true)]
    offline: bool,

    /// Fold accents and transliterate non-Latin text before matching
    #[arg(long, global = true)]
    fold_ascii: bool,

    #[arg(long, global = true, default_value = "0")]
    workers: usize,

    /// Hide progress bars and log plain lines to stderr
    #[arg(long, global = true)]
    log_only: bool,
}

#[derive(Subcommand)]
enum Command {
    /// PypyDance IDs to a WannaDance favorites list
    PypyToWd(ConvertArgs),
    /// WannaDance favorites to a PypyDance ID list
    WdToPypy(ConvertArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Comma-separated IDs, or a .txt/.json file containing them
    input: String,

    /// Output file (defaults to converted_wd_list.txt / converted_pypy_list.txt)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Write per-run statistics as JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,

    /// Write one status record per requested ID as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,
}

fn run(args: &Args, convert_args: &ConvertArgs, source: CatalogKind) -> Result<()> {
    let target = source.opposite();
    let start = Instant::now();

    let cfg = LoaderConfig {
        cache_dir: args.cache_dir.clone(),
        pypy_url: args.pypy_url.clone(),
        wd_url: args.wd_url.clone(),
        refresh: args.refresh,
        offline: args.offline,
        ..LoaderConfig::default()
    };
    let opts = TextOptions {
        fold_ascii: args.fold_ascii,
    };

    let output = convert_args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(target.default_output_name()));
    let pypy_cache = cfg.cache_path(CatalogKind::PypyDance);
    let wd_cache = cfg.cache_path(CatalogKind::WannaDance);
    let mut protected: Vec<&Path> = vec![pypy_cache.as_path(), wd_cache.as_path()];
    if is_list_file(&convert_args.input) {
        protected.push(Path::new(&convert_args.input));
    }
    validate_output_path(&output, &protected)?;

    let request = parse_ids(&read_input(&convert_args.input)?, source);

    let target_catalog = load_catalog(target, &cfg, opts)?;
    let source_catalog = load_catalog(source, &cfg, opts)?;

    println!("\nStarting conversion ({} -> {})...", source, target);

    let total = request.len() as u64;
    let pb = create_progress_bar(total, "Matching");
    let done = AtomicU64::new(0);
    let conversion = convert_with_progress(&request, &source_catalog, &target_catalog, || {
        pb.inc(1);
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        log_progress("Matching", n, total, 100);
    });
    finish(&pb, format!("Matched {} of {} IDs", conversion.ids.len(), total));

    println!("{}", header(source, target));
    println!("{}", separator());
    for outcome in &conversion.outcomes {
        println!("{}", format_outcome(outcome, source));
    }

    let result = format_ids(&conversion.ids, target);
    println!("\n{:=<50}", "");
    println!("Conversion Result ({} format):", target);
    println!("{}", result);

    write_output(&output, &result)?;
    println!("Saved to {}", output.display());

    let mut stats = ConversionStats::from_outcomes(&conversion.outcomes);
    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    println!("\n{}", format_summary(&stats));
    println!("Elapsed: {}", format_duration(start.elapsed()));

    if args.log_only {
        stats.log_phase("convert");
    }
    if let Some(path) = &convert_args.stats_json {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }
    if let Some(path) = &convert_args.report_json {
        let json = serde_json::to_string_pretty(&conversion.outcomes)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    match &args.command {
        Command::PypyToWd(convert_args) => run(&args, convert_args, CatalogKind::PypyDance),
        Command::WdToPypy(convert_args) => run(&args, convert_args, CatalogKind::WannaDance),
    }
}
