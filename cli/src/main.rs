//! pdfgeom CLI - build and query PDF page geometry

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfgeom::build::PrecomputedExtractor;
use pdfgeom::incremental::{dirty_pages, load_page_map, page_map_from_geometry};
use pdfgeom::query::select_text_with;
use pdfgeom::render::{geometry_summary, layout_report, to_json};
use pdfgeom::session::TokenProvider;
use pdfgeom::{
    check_staleness, write_geometry, BuildOptions, Bounds, ChangeTracker, GeometryBuilder,
    GeometryDocument, GroupingMode, HitOptions, IdQueues, Job, JsonFormat, LineOptions, PageLayout, Point,
    SpacingOptions, TokenDump, ViewerSession,
};

#[derive(Parser)]
#[command(name = "pdfgeom")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Build and query page geometry for typeset PDFs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a geometry file from a compile job's position events
    Build {
        /// Job name (the source file stem)
        #[arg(value_name = "JOB")]
        job: String,

        /// Directory holding the compiler outputs
        #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Directory the compiler ran in (defaults to the output directory)
        #[arg(long, value_name = "DIR")]
        working_dir: Option<PathBuf>,

        /// Compiled PDF (defaults to <OUT_DIR>/<JOB>.pdf)
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,

        /// Geometry output file (defaults to <OUT_DIR>/<JOB>-geometry.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Language tag written on every element
        #[arg(long, env = "PDFGEOM_LANG", default_value = "en")]
        lang: String,

        /// Left text margin in points
        #[arg(long, default_value = "72")]
        margin_left: f64,

        /// Right text margin in points
        #[arg(long, default_value = "72")]
        margin_right: f64,

        /// Abort on the first malformed or unpaired record
        #[arg(long)]
        strict: bool,

        /// Markup source to collect element ids from
        #[arg(long, value_name = "FILE")]
        tex: Option<PathBuf>,

        /// Existing geometry file used when no position events are found
        #[arg(long, value_name = "FILE")]
        fallback: Option<PathBuf>,

        /// Grouping mode passed to the structural fallback
        #[arg(long, value_enum, default_value = "default")]
        geometry_grouping: Grouping,
    },

    /// Show a geometry file summary
    Info {
        /// Geometry file
        #[arg(value_name = "FILE")]
        geometry: PathBuf,

        /// Compiled PDF to check the fingerprint against
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,

        /// Print the document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve what lies under a point on a page
    Hit {
        /// Token dump (JSON) produced by a page renderer
        #[arg(value_name = "TOKENS")]
        tokens: PathBuf,

        /// X coordinate
        x: f64,

        /// Y coordinate
        y: f64,

        /// Geometry file with element quads
        #[arg(short, long, value_name = "FILE")]
        geometry: Option<PathBuf>,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Coordinates are device pixels (top-left origin) instead of points
        #[arg(long)]
        device: bool,

        /// Render scale
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Page height in points
        #[arg(long, default_value = "792")]
        page_height: f64,

        /// Match elements against paragraph quads instead of line quads
        #[arg(long)]
        paragraph_quads: bool,

        /// Output compact JSON
        #[arg(long)]
        json: bool,
    },

    /// Group a page's words into lines and flag irregular spacing
    Lines {
        /// Token dump (JSON) produced by a page renderer
        #[arg(value_name = "TOKENS")]
        tokens: PathBuf,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Baseline tolerance in points
        #[arg(long, default_value = "4")]
        tolerance: f64,

        /// Spacing deviation from the median, in percent
        #[arg(long, default_value = "15")]
        threshold: f64,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the text of words inside a rectangle
    Select {
        /// Token dump (JSON) produced by a page renderer
        #[arg(value_name = "TOKENS")]
        tokens: PathBuf,

        /// Rectangle as LEFT,BOTTOM,RIGHT,TOP in points
        #[arg(value_name = "RECT", value_delimiter = ',', num_args = 4)]
        rect: Vec<f64>,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Detect changed elements in a structured source and the pages they touch
    Changes {
        /// XML source with id'd elements
        #[arg(value_name = "FILE")]
        xml: PathBuf,

        /// Hash database
        #[arg(long, value_name = "FILE", default_value = "build/page_hashes.json")]
        db: PathBuf,

        /// Page map (JSON object of page number to element ids)
        #[arg(long, value_name = "FILE", conflicts_with = "geometry")]
        page_map: Option<PathBuf>,

        /// Geometry file to derive the page map from
        #[arg(short, long, value_name = "FILE")]
        geometry: Option<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Grouping {
    /// Extractor's own grouping
    Default,
    /// Only what the markup's element ids account for
    Strict,
}

impl From<Grouping> for GroupingMode {
    fn from(grouping: Grouping) -> Self {
        match grouping {
            Grouping::Default => GroupingMode::Default,
            Grouping::Strict => GroupingMode::Strict,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Build {
            job,
            out_dir,
            working_dir,
            pdf,
            output,
            lang,
            margin_left,
            margin_right,
            strict,
            tex,
            fallback,
            geometry_grouping,
        }) => {
            let options = BuildOptions::new()
                .with_language(lang)
                .with_margins(margin_left, margin_right)
                .with_grouping(geometry_grouping.into());
            let options = if strict { options.strict() } else { options };
            let mut job = Job::new(job, out_dir);
            if let Some(dir) = working_dir {
                job = job.with_working_dir(dir);
            }
            if let Some(pdf) = pdf {
                job = job.with_pdf_path(pdf);
            }
            cmd_build(
                job,
                options,
                output.as_deref(),
                tex.as_deref(),
                fallback.as_deref(),
            )
        }
        Some(Commands::Info {
            geometry,
            pdf,
            json,
        }) => cmd_info(&geometry, pdf.as_deref(), json),
        Some(Commands::Hit {
            tokens,
            x,
            y,
            geometry,
            page,
            device,
            scale,
            page_height,
            paragraph_quads,
            json,
        }) => cmd_hit(
            &tokens,
            geometry.as_deref(),
            page,
            Point::new(x, y),
            device,
            scale,
            page_height,
            paragraph_quads,
            json,
        ),
        Some(Commands::Lines {
            tokens,
            page,
            tolerance,
            threshold,
            json,
        }) => cmd_lines(&tokens, page, tolerance, threshold, json),
        Some(Commands::Select { tokens, rect, page }) => cmd_select(&tokens, &rect, page),
        Some(Commands::Changes {
            xml,
            db,
            page_map,
            geometry,
            json,
        }) => cmd_changes(&xml, &db, page_map.as_deref(), geometry.as_deref(), json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: pdfgeom <COMMAND>".yellow());
            println!("       pdfgeom --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_build(
    job: Job,
    options: BuildOptions,
    output: Option<&Path>,
    tex: Option<&Path>,
    fallback: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let job = match tex {
        Some(path) => {
            let source = fs::read_to_string(path)?;
            job.with_id_queues(IdQueues::extract(&source))
        }
        None => job,
    };

    let mut builder = GeometryBuilder::new(options);
    if let Some(path) = fallback {
        builder = builder.with_structural(Box::new(PrecomputedExtractor::new(path)));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Building geometry for '{}'...", job.name));

    let build = match builder.build(&job) {
        Ok(build) => build,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| job.geometry_path());
    write_geometry(&path, &build.document)?;
    pb.finish_with_message("Done!");

    println!("\n{}", "Geometry".green().bold());
    println!(
        "  {} source: {}",
        "├─".dimmed(),
        build.source.as_deref().unwrap_or("none")
    );
    println!(
        "  {} {} elements on {} pages",
        "├─".dimmed(),
        build.document.element_count(),
        build.document.page_count()
    );
    println!(
        "  {} {} marks read, {} anchors",
        "├─".dimmed(),
        build.report.marks_read,
        build.report.anchors
    );
    println!("  {} {}", "└─".dimmed(), path.display());

    if build.report.has_warnings() {
        println!(
            "\n{} ({})",
            "Warnings".yellow().bold(),
            build.report.warnings.len()
        );
        for warning in &build.report.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }

    Ok(())
}

fn cmd_info(
    geometry: &Path,
    pdf: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = GeometryDocument::load(geometry)?;

    if json {
        println!("{}", to_json(&doc, JsonFormat::Pretty)?);
        return Ok(());
    }

    println!("{}", "Geometry Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), geometry.display());
    print!("{}", geometry_summary(&doc));

    if let Some(pdf) = pdf {
        let compiled = fs::read(pdf)?;
        println!();
        if check_staleness(&doc, &compiled).is_stale() {
            println!(
                "{} geometry does not match {}",
                "Stale:".yellow().bold(),
                pdf.display()
            );
        } else {
            println!("{} matches {}", "Fresh:".green().bold(), pdf.display());
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_hit(
    tokens: &Path,
    geometry: Option<&Path>,
    page: u32,
    point: Point,
    device: bool,
    scale: f64,
    page_height: f64,
    paragraph_quads: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dump = TokenDump::load(tokens)?;

    let mut session = ViewerSession::new(scale)?
        .with_hit_options(HitOptions::new().with_paragraph_quads(paragraph_quads));
    if let Some(path) = geometry {
        session.set_document(Arc::new(GeometryDocument::load(path)?));
    }
    session.open_page(&dump, page, page_height)?;

    let device_point = if device {
        point
    } else {
        session.viewport().to_device(point)
    };

    let Some(target) = session.resolve_target(device_point) else {
        if json {
            println!("null");
        } else {
            println!("{}", "Nothing under this point".dimmed());
        }
        return Ok(());
    };

    if json {
        println!("{}", to_json(&target, JsonFormat::Compact)?);
        return Ok(());
    }

    println!("{}: {:?}", "Target".bold(), target.kind);
    println!("{}: {}", "Reference".bold(), target.reference);
    println!(
        "{}: ({:.2}, {:.2}) pt, ({:.1}, {:.1}) px",
        "Position".bold(),
        target.pdf.x,
        target.pdf.y,
        target.device.x,
        target.device.y
    );
    if let Some(index) = target.char_index {
        println!("{}: {}", "Character".bold(), index);
    }
    match target.line_number {
        Some(number) => println!("{}: {} \"{}\"", "Line".bold(), number, target.line_text),
        None => println!("{}: {}", "Line".bold(), "none".dimmed()),
    }

    Ok(())
}

fn cmd_lines(
    tokens: &Path,
    page: u32,
    tolerance: f64,
    threshold: f64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dump = TokenDump::load(tokens)?;
    let page_tokens = dump.page_tokens(page)?;

    let line_options = LineOptions::new().with_tolerance(tolerance);
    let spacing_options = SpacingOptions::new().with_threshold_pct(threshold);
    let layout = PageLayout::analyze_with(&page_tokens, &line_options, &spacing_options);

    if json {
        println!("{}", to_json(&layout, JsonFormat::Pretty)?);
        return Ok(());
    }

    print!("{}", layout_report(&layout));
    let mismatched = layout.spacing.mismatched.len();
    if mismatched > 0 {
        println!(
            "\n{} {} lines with irregular spacing",
            "!".yellow().bold(),
            mismatched
        );
    }

    Ok(())
}

fn cmd_select(tokens: &Path, rect: &[f64], page: u32) -> Result<(), Box<dyn std::error::Error>> {
    let [left, bottom, right, top] = rect else {
        return Err("Rectangle needs exactly four values: LEFT,BOTTOM,RIGHT,TOP".into());
    };

    let dump = TokenDump::load(tokens)?;
    let page_tokens = dump.page_tokens(page)?;
    let bounds = Bounds::new(*left, *right, *top, *bottom);
    let selection = select_text_with(&page_tokens.words, &bounds, &LineOptions::default());

    if selection.is_empty() {
        println!("{}", "No words in selection".dimmed());
    } else {
        println!("{}", selection.text);
        log::info!(
            "Selected {} words on {} lines",
            selection.word_count,
            selection.line_count
        );
    }

    Ok(())
}

fn cmd_changes(
    xml: &Path,
    db: &Path,
    page_map: Option<&Path>,
    geometry: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = ChangeTracker::new(db);
    let changes = tracker.detect_changes_in_xml(xml)?;

    let map = match (page_map, geometry) {
        (Some(path), _) => Some(load_page_map(path)?),
        (None, Some(path)) => Some(page_map_from_geometry(&GeometryDocument::load(path)?)),
        (None, None) => None,
    };
    let pages = map
        .as_ref()
        .map(|map| dirty_pages(&changes.changed, map))
        .unwrap_or_default();

    if json {
        let value = serde_json::json!({
            "changed": changes.changed,
            "removed": changes.removed,
            "dirtyPages": pages,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if changes.is_empty() {
        println!("{}", "No changes".green());
        return Ok(());
    }

    println!("{} ({})", "Changed".yellow().bold(), changes.changed.len());
    for id in &changes.changed {
        println!("  {} {}", "~".yellow(), id);
    }
    if !changes.removed.is_empty() {
        println!("{} ({})", "Removed".red().bold(), changes.removed.len());
        for id in &changes.removed {
            println!("  {} {}", "-".red(), id);
        }
    }
    if map.is_some() {
        let list: Vec<String> = pages.iter().map(u32::to_string).collect();
        println!("{}: {}", "Dirty pages".bold(), list.join(", "));
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfgeom".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Page geometry for typeset PDFs");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdfgeom".dimmed());
    println!("License: MIT");
}
