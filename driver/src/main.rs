use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use trackcore::tables::row;

use generator::{build_event_rows, GeneratorConfig};
use io::loaders;
use io::writers::{self, RunSummary};
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod io;
mod scan;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline track-cleaning and smoothing driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Raw per-detection stats table (CSV)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Frame-to-time lookup table (CSV), merged onto the rows
    #[arg(long)]
    time_table: Option<PathBuf>,
    /// External reference-velocity series (CSV) to align against
    #[arg(long)]
    piv: Option<PathBuf>,
    /// Generate a synthetic event instead of reading --input
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Also run the per-track grain-size pass
    #[arg(long, default_value_t = false)]
    grainsize: bool,
    /// Count detections per frame across a label directory and exit
    #[arg(long)]
    scan: Option<PathBuf>,
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(dir) = args.scan {
        return run_scan(&dir, &args.output_dir);
    }

    let config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::default()
    };

    let mut rows = if args.synthetic {
        build_event_rows(&GeneratorConfig::default())
    } else {
        let input = args
            .input
            .as_ref()
            .context("either --input or --synthetic is required")?;
        loaders::load_detection_rows(input)?
    };
    if let Some(path) = &args.time_table {
        let table = loaders::load_time_table(path)?;
        loaders::merge_time(&mut rows, &table);
    }

    let reference = match &args.piv {
        Some(path) => Some(loaders::load_piv_series(path)?),
        None => None,
    };

    let runner = Runner::new(config.clone());
    let result = runner.execute(&rows, reference.as_ref())?;

    println!("{}", result.summary);
    let first_frame = result.clean_rows.iter().map(|r| r.frame).min();
    let last_frame = result.clean_rows.iter().map(|r| r.frame).max();
    println!(
        "Remaining track IDs: {}\nFrames {:?} to {:?} ({} distinct)",
        row::unique_track_count(&result.clean_rows),
        first_frame,
        last_frame,
        row::unique_frame_count(&result.clean_rows)
    );

    let out = |name: &str| args.output_dir.join(format!("{}_{}.csv", name, config.event));
    writers::write_csv(&out("df_clean"), &result.clean_rows)?;
    writers::write_csv(&out("df_bad"), &result.bad_rows)?;
    writers::write_csv(&out("df_time"), &result.frame_time)?;
    writers::write_csv(&out("yaxis_movement"), &result.track_movement)?;
    writers::write_csv(&out("df_mova"), &result.mova)?;
    writers::write_csv(&out("df_per_track_velocities"), &result.velocity_summaries)?;
    writers::write_csv(&out("df_velocities_lowess"), &result.velocity_lowess)?;
    if let Some(aligned) = &result.aligned {
        writers::write_csv(&out("df_piv_mova"), aligned)?;
    }

    if args.grainsize {
        let grainsize = runner.execute_grainsize(&result.clean_rows)?;
        writers::write_csv(&out("df_per_track_grainsize"), &grainsize.summaries)?;
        writers::write_csv(&out("df_grainsize_lowess"), &grainsize.lowess)?;
    }

    writers::write_run_summary(
        &args.output_dir.join(format!("summary_{}.json", config.event)),
        &RunSummary {
            event: config.event.clone(),
            tracks_total: row::unique_track_count(&rows),
            tracks_remaining: row::unique_track_count(&result.clean_rows),
            rows_remaining: result.clean_rows.len(),
            first_frame,
            last_frame,
            unique_frames: row::unique_frame_count(&result.clean_rows),
        },
    )?;

    println!("--- processing finished, outputs in {} ---", args.output_dir.display());
    Ok(())
}

fn run_scan(dir: &PathBuf, output_dir: &PathBuf) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the detection scan")?;
    let counts = runtime.block_on(scan::detection_counts(dir))?;
    let stats = scan::scan_stats(&counts);
    println!(
        "Scanned {} frames, {} detections ({} frames non-empty)",
        stats.total_frames, stats.total_detections, stats.frames_with_detections
    );
    writers::write_csv(&output_dir.join("detection_counts.csv"), &counts)?;
    writers::write_json(&output_dir.join("detection_stats.json"), &stats)?;
    Ok(())
}
