//! Measure round-trip stability of the matcher across a whole catalog.
//!
//! Every song of the origin catalog is converted to the other catalog and
//! back. A stable matcher lands on the same ID, or at least on a song whose
//! normalized name equals the original's.
//!
//! Usage: roundtrip-check [--from pypy|wd] [--limit N] [--cache-dir DIR] [--offline]

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use dancedb_convert::convert::resolve;
use dancedb_convert::loader::{load_catalog, LoaderConfig};
use dancedb_convert::models::{CatalogKind, RequestedId, SongRecord};
use dancedb_convert::normalize::TextOptions;
use dancedb_convert::progress::{create_progress_bar, finish, set_log_only};

#[derive(Clone, Copy, ValueEnum)]
enum Origin {
    Pypy,
    Wd,
}

#[derive(Parser)]
#[command(name = "roundtrip-check")]
#[command(about = "Convert every song to the other catalog and back, and report how many return")]
struct Args {
    #[arg(long, value_enum, default_value = "pypy")]
    from: Origin,

    /// Only check the first N songs of the origin catalog
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, default_value = ".")]
    cache_dir: PathBuf,

    #[arg(long)]
    offline: bool,

    #[arg(long)]
    fold_ascii: bool,

    /// Print up to N songs that came back as a different song
    #[arg(long, default_value = "10")]
    show_drift: usize,

    #[arg(long)]
    log_only: bool,
}

fn pct(n: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * n as f64 / total as f64
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let origin_kind = match args.from {
        Origin::Pypy => CatalogKind::PypyDance,
        Origin::Wd => CatalogKind::WannaDance,
    };
    let cfg = LoaderConfig {
        cache_dir: args.cache_dir.clone(),
        offline: args.offline,
        ..LoaderConfig::default()
    };
    let opts = TextOptions {
        fold_ascii: args.fold_ascii,
    };

    let start = Instant::now();
    let origin = load_catalog(origin_kind, &cfg, opts)?;
    let other = load_catalog(origin_kind.opposite(), &cfg, opts)?;

    let songs: Vec<&SongRecord> = origin
        .songs()
        .iter()
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();
    let total = songs.len();

    let stable = AtomicUsize::new(0);
    let same_name = AtomicUsize::new(0);
    let drifted = AtomicUsize::new(0);
    let lost_forward = AtomicUsize::new(0);
    let lost_back = AtomicUsize::new(0);

    let pb = create_progress_bar(total as u64, "Round trip");

    let drift_examples: Vec<(SongRecord, SongRecord)> = songs
        .par_iter()
        .filter_map(|&song| {
            pb.inc(1);
            let forward = resolve(&RequestedId::Valid(song.id), &origin, &other);
            let Some(mid) = forward.accepted_id() else {
                lost_forward.fetch_add(1, Ordering::Relaxed);
                return None;
            };

            let back = resolve(&RequestedId::Valid(mid), &other, &origin);
            let Some(returned) = back.accepted_id() else {
                lost_back.fetch_add(1, Ordering::Relaxed);
                return None;
            };

            if returned == song.id {
                stable.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            let landed = origin.get(returned)?;
            if landed.name_norm == song.name_norm {
                same_name.fetch_add(1, Ordering::Relaxed);
                None
            } else {
                drifted.fetch_add(1, Ordering::Relaxed);
                Some((song.clone(), landed.clone()))
            }
        })
        .collect();

    finish(&pb, format!("Round trip: checked {} songs", total));

    let st = stable.load(Ordering::Relaxed);
    let sn = same_name.load(Ordering::Relaxed);
    let dr = drifted.load(Ordering::Relaxed);
    let lf = lost_forward.load(Ordering::Relaxed);
    let lb = lost_back.load(Ordering::Relaxed);

    println!(
        "\n=== ROUND TRIP {} -> {} -> {} ({} songs) ===\n",
        origin_kind,
        origin_kind.opposite(),
        origin_kind,
        total
    );
    println!("Outcome                 Count     %");
    println!("─────────────────────────────────────");
    println!("Same ID                {:>6}  {:>5.1}%", st, pct(st, total));
    println!("Same normalized name   {:>6}  {:>5.1}%", sn, pct(sn, total));
    println!("Different song         {:>6}  {:>5.1}%", dr, pct(dr, total));
    println!("No forward match       {:>6}  {:>5.1}%", lf, pct(lf, total));
    println!("No return match        {:>6}  {:>5.1}%", lb, pct(lb, total));
    println!("─────────────────────────────────────");

    if args.show_drift > 0 && !drift_examples.is_empty() {
        println!("\nDrift examples:");
        for (from, to) in drift_examples.iter().take(args.show_drift) {
            println!("  [{}] {}  ->  [{}] {}", from.id, from.label(), to.id, to.label());
        }
    }

    println!("\nElapsed: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
