use crate::{
    batch::Batch,
    config::Config,
    enhance::{self, Enhancer},
    error::LayoutError,
    font::FontBook,
    naming,
    pipeline::Pipeline,
    report::RunReport,
    util::{ensure_dir, now_rfc3339, run_id},
};
use anyhow::{Context, Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sheetbinder")]
#[command(about = "Deterministic answer-sheet paginator (numbering + strip redaction + watermark)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./sheetbinder.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ExamArgs {
    /// Overrides `exam.exam_type`.
    #[arg(long)]
    pub exam_type: Option<String>,
    /// Overrides `exam.exam_date`.
    #[arg(long)]
    pub exam_date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Doctor {},
    Plan {
        #[arg(long)]
        input: PathBuf,
    },
    Document {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        exam: ExamArgs,
    },
    Export {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        exam: ExamArgs,
    },
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        exam: ExamArgs,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let mut cfg = Config::load(&cfg_path)?;

    match &args.cmd {
        Command::Doctor {} => {
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, None).as_deref())?;
            doctor(&cfg)
        }
        Command::Plan { input } => {
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, None).as_deref())?;
            plan(&cfg, input)
        }
        Command::Document {
            input,
            out_dir,
            exam,
        } => {
            apply_exam_args(&mut cfg, exam);
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, None).as_deref())?;
            let out = out_root(&cfg, out_dir.as_deref());
            document(&cfg, input, &out).map(|_| ())
        }
        Command::Export {
            input,
            out_dir,
            exam,
        } => {
            apply_exam_args(&mut cfg, exam);
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, None).as_deref())?;
            let out = out_root(&cfg, out_dir.as_deref());
            export(&cfg, input, &out).map(|_| ())
        }
        Command::Run {
            input,
            out_dir,
            exam,
        } => {
            apply_exam_args(&mut cfg, exam);
            run(&args, &cfg, input, out_dir.as_deref())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("sheetbinder.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("sheetbinder.example.toml"))
    }
}

fn apply_exam_args(cfg: &mut Config, exam: &ExamArgs) {
    if let Some(t) = &exam.exam_type {
        cfg.exam.exam_type = t.clone();
    }
    if let Some(d) = &exam.exam_date {
        cfg.exam.exam_date = d.clone();
    }
}

fn out_root(cfg: &Config, out_override: Option<&Path>) -> PathBuf {
    out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir))
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn pipeline(cfg: &Config) -> Pipeline<Box<dyn Enhancer>> {
    let fonts = FontBook::load(&cfg.fonts.candidates);
    Pipeline::new(cfg, fonts, enhance::from_config(cfg))
}

fn load_batch(cfg: &Config, input: &Path) -> Result<Batch> {
    if !input.is_dir() {
        return Err(anyhow!("input is not a directory: {}", input.display()));
    }
    Batch::from_dir(cfg, input).with_context(|| format!("loading images from {}", input.display()))
}

/// Logs what loading left out. Call once a subscriber is installed.
fn log_batch(batch: &Batch, input: &Path) {
    for issue in batch.skipped() {
        warn!("skipping {}: {}", issue.file, issue.message);
    }
    if batch.is_empty() {
        warn!("no png/jpg/jpeg images found in {}", input.display());
    }
}

fn doctor(cfg: &Config) -> Result<()> {
    let fonts = FontBook::load(&cfg.fonts.candidates);
    let enhancer = enhance::from_config(cfg);
    let validation = match cfg.validate() {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "font": fonts.source(),
            "font_px": {
                "header": cfg.fonts.header_px,
                "subheader": cfg.fonts.subheader_px,
                "question": cfg.fonts.question_px,
                "page_number": cfg.fonts.page_number_px,
                "watermark": cfg.fonts.watermark_px,
            },
            "enhancer": enhancer.name(),
            "config": validation,
        }))?
    );
    Ok(())
}

fn plan(cfg: &Config, input: &Path) -> Result<()> {
    let batch = load_batch(cfg, input)?;
    log_batch(&batch, input);
    let (_, plan) = pipeline(cfg).plan(&batch)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn require_exam_details(cfg: &Config) -> Result<()> {
    if cfg.exam.exam_type.trim().is_empty() || cfg.exam.exam_date.trim().is_empty() {
        return Err(anyhow!(
            "exam.exam_type and exam.exam_date are required (set them in the config or pass --exam-type/--exam-date)"
        ));
    }
    Ok(())
}

fn document(cfg: &Config, input: &Path, out_dir: &Path) -> Result<PathBuf> {
    require_exam_details(cfg)?;
    let batch = load_batch(cfg, input)?;
    log_batch(&batch, input);
    let output = pipeline(cfg).build_document(&batch)?;
    for issue in &output.report.issues {
        warn!("{}: {}", issue.file, issue.message);
    }
    ensure_dir(out_dir)?;
    let path = out_dir.join(naming::document_filename(&cfg.exam.exam_type, &cfg.exam.exam_date));
    std::fs::write(&path, &output.pdf).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} ({} pages)", path.display(), output.report.page_count);
    Ok(path)
}

fn export(cfg: &Config, input: &Path, out_dir: &Path) -> Result<PathBuf> {
    let batch = load_batch(cfg, input)?;
    log_batch(&batch, input);
    let output = pipeline(cfg).build_archive(&batch)?;
    for issue in &output.report.issues {
        warn!("{}: {}", issue.file, issue.message);
    }
    ensure_dir(out_dir)?;
    let path = out_dir.join(naming::archive_filename(&cfg.exam.exam_type, &cfg.exam.exam_date));
    std::fs::write(&path, &output.bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} ({} images)", path.display(), output.report.entries.len());
    Ok(path)
}

/// The run id depends on the loaded batch, so logging starts after loading;
/// anything loading wants to report is kept on the batch until then.
fn run(args: &Args, cfg: &Config, input: &Path, out_override: Option<&Path>) -> Result<()> {
    if cfg.output.write_pdf {
        require_exam_details(cfg)?;
    }
    cfg.validate()?;
    let batch = load_batch(cfg, input)?;

    let job_id = run_id(cfg, &batch);
    let job_dir = out_root(cfg, out_override).join(&job_id);
    ensure_dir(&job_dir.join("final"))?;
    ensure_dir(&job_dir.join("logs"))?;

    let log_path = resolve_log_path(cfg, Some(&job_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    info!("run_id={job_id} out={} images={}", job_dir.display(), batch.len());
    log_batch(&batch, input);

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(job_dir.join("effective-config.toml"), raw)?;
    }

    let started = now_rfc3339();
    let pipeline = pipeline(cfg);
    let mut report = RunReport {
        run_id: job_id.clone(),
        input_count: batch.len(),
        skipped: batch.skipped().to_vec(),
        ..RunReport::default()
    };
    let mut final_files = Vec::new();

    if cfg.output.write_pdf {
        match pipeline.build_document(&batch) {
            Ok(out) => {
                let name = naming::document_filename(&cfg.exam.exam_type, &cfg.exam.exam_date);
                std::fs::write(job_dir.join("final").join(&name), &out.pdf)?;
                final_files.push(format!("final/{name}"));
                report.document = Some(out.report);
            }
            Err(err @ LayoutError::Serialization(_)) => {
                error!("{err}");
                report.errors.push(err.to_string());
            }
            Err(err) => return Err(err.into()),
        }
    }

    if cfg.output.write_archive {
        match pipeline.build_archive(&batch) {
            Ok(out) => {
                let name = naming::archive_filename(&cfg.exam.exam_type, &cfg.exam.exam_date);
                std::fs::write(job_dir.join("final").join(&name), &out.bytes)?;
                final_files.push(format!("final/{name}"));
                report.archive = Some(out.report);
            }
            Err(err @ LayoutError::Serialization(_)) => {
                error!("{err}");
                report.errors.push(err.to_string());
            }
            Err(err) => return Err(err.into()),
        }
    }

    if cfg.output.write_report_json {
        std::fs::write(
            job_dir.join("final").join(&cfg.output.report_filename),
            serde_json::to_string_pretty(&report)?,
        )?;
    }

    if cfg.output.write_index_json {
        let index = serde_json::json!({
            "run_id": job_id,
            "started": started,
            "finished": now_rfc3339(),
            "outputs": final_files,
            "report": format!("final/{}", cfg.output.report_filename),
        });
        std::fs::write(job_dir.join("index.json"), serde_json::to_string_pretty(&index)?)?;
    }

    let status = if report.errors.is_empty() { "ok" } else { "partial" };
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "run_id": job_id,
            "job_dir": job_dir,
            "status": status,
        }))?
    );

    if !report.errors.is_empty() {
        return Err(anyhow!("{} artifact(s) not produced", report.errors.len()));
    }
    Ok(())
}

fn resolve_log_path(cfg: &Config, job_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    if let Some(job_dir) = job_dir {
        return Some(job_dir.join("logs").join("sheetbinder.log"));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("sheetbinder.log"))
}
