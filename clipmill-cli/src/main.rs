use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clipmill::{
    Asset, BatchProgress, BatchResult, BatchSession, BatchSessionOpts, DryRunRenderer,
    FfmpegRenderer, JobDef, PackOutcome, ProgressSink, Renderer, SourceDef, ZipArchiver,
    probe_source,
};

#[derive(Parser, Debug)]
#[command(name = "clipmill", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe a source video and print its metadata as JSON.
    Probe(ProbeArgs),
    /// Run a batch job: plan, audit, render, and package.
    Generate(GenerateArgs),
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Source video path.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the job's output directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Plan and "render" without invoking ffmpeg; outputs are placeholder
    /// manifests. Sources must carry a duration_s in the job file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Skip packaging the outputs into an archive.
    #[arg(long, default_value_t = false)]
    no_archive: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Probe(args) => cmd_probe(args),
        Command::Generate(args) => cmd_generate(args),
    }
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let info = probe_source(&args.in_path)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let job = JobDef::from_path(&args.in_path)?;
    job.validate()?;

    let out_dir = args.out_dir.unwrap_or_else(|| job.output_dir.clone());
    let mut session = BatchSession::new(BatchSessionOpts {
        seed: job.seed,
        out_dir: out_dir.clone(),
        archive_name: job.archive.clone(),
        ..BatchSessionOpts::default()
    });

    for (idx, group) in job.groups.iter().enumerate() {
        let name = group.display_name(idx);
        let mut assets = Vec::with_capacity(group.sources.len());
        for source in &group.sources {
            let asset = match source {
                SourceDef::Probed { path, duration_s } => Asset::new(path.clone(), *duration_s)?,
                SourceDef::Path(path) => {
                    if args.dry_run {
                        anyhow::bail!(
                            "dry-run requires a duration_s for source '{}'",
                            path.display()
                        );
                    }
                    let info = probe_source(path)?;
                    Asset::new(path.clone(), info.duration_s)?
                }
            };
            assets.push(asset);
        }
        session.add_group(name.clone(), assets)?;

        if let Some(text) = &group.timings {
            session.edit_timings(&name, text)?;
        }
        if let Some(text) = &group.speeds {
            session.edit_speeds(&name, text)?;
        }
        if let Some(text) = &group.captions {
            session.edit_captions(&name, text)?;
        }
    }

    session.ensure_plans(job.count, job.mode)?;
    let audit = session.selection_audit()?;

    eprintln!("selection audit:");
    eprintln!("{:>5}  {:<20} {:<30} {:>10}", "index", "group", "asset", "duration");
    for row in &audit.rows {
        let duration = row
            .duration_s
            .map(|d| format!("{d:.2}s"))
            .unwrap_or_else(|| "?".to_owned());
        eprintln!(
            "{:>5}  {:<20} {:<30} {:>10}",
            row.index + 1,
            row.group,
            row.asset_file,
            duration
        );
    }

    let mut renderer: Box<dyn Renderer> = if args.dry_run {
        Box::new(DryRunRenderer::new())
    } else {
        Box::new(FfmpegRenderer::new(out_dir.join("work"))?)
    };

    let mut progress = StderrProgress;
    let result = session.execute(renderer.as_mut(), &mut progress)?;
    report_batch(&result);

    if !args.no_archive {
        match session.package(&ZipArchiver, &result)? {
            PackOutcome::Archive(path) => eprintln!("wrote {}", path.display()),
            PackOutcome::NothingToPackage => eprintln!("nothing to package"),
        }
    }

    Ok(())
}

struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn on_progress(&mut self, progress: &BatchProgress) {
        let eta = progress
            .eta
            .map(|d| format!("{}s", format_secs(d)))
            .unwrap_or_else(|| "unknown".to_owned());
        eprintln!(
            "rendered {}/{} ({:.0}%), elapsed {}s, eta {}",
            progress.completed,
            progress.total,
            100.0 * progress.completed as f64 / progress.total.max(1) as f64,
            format_secs(progress.elapsed),
            eta
        );
    }
}

fn format_secs(d: Duration) -> String {
    format!("{:.1}", d.as_secs_f64())
}

fn report_batch(result: &BatchResult) {
    for failure in &result.failures {
        eprintln!("output {} failed: {}", failure.index + 1, failure.reason);
    }
    eprintln!(
        "generated {} clip(s), {} failed",
        result.successes.len(),
        result.failures.len()
    );
}
