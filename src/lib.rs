//! Annocompare: reconcile bounding-box annotations from multiple annotators.
//!
//! Several people (or several sessions of one person) label the same images
//! independently. Annocompare loads all of their boxes into one store and
//! measures how well they agree, so disagreements and likely class
//! mislabels can be reviewed.
//!
//! # Modules
//!
//! - [`ir`]: Annotation records, boxes, label normalization and the VOC loader
//! - [`naming`]: Short unique annotator names from directory paths
//! - [`store`]: The annotation store, its indices, stats and typed queries
//! - [`reconcile`]: Association, reference selection, IoU and mislabel stages
//! - [`error`]: Error types for annocompare operations

pub mod error;
pub mod ir;
pub mod naming;
pub mod reconcile;
pub mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

pub use error::AnnocompareError;

/// The annocompare CLI application.
#[derive(Parser)]
#[command(name = "annocompare")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Reconcile the annotations found under one or more directories.
    Compare(CompareArgs),
    /// Print the annotator name derived for each directory.
    Names(NamesArgs),
}

/// Arguments for the compare subcommand.
#[derive(clap::Args)]
struct CompareArgs {
    /// Directories searched recursively for VOC XML files.
    #[arg(required = true)]
    roots: Vec<PathBuf>,

    /// Only keep images annotated in more than one XML file.
    #[arg(long)]
    prune: bool,

    /// Collapse class names onto carrot, spinach, unknown and weed.
    #[arg(long)]
    relaxed: bool,

    /// Flag boxes whose best same-class IoU is below this.
    #[arg(long, env = "ANNOCOMPARE_SAME_CLASS_THRESHOLD", default_value_t = 0.2)]
    same_class_threshold: f64,

    /// ...and whose best IoU against another class is above this.
    #[arg(long, env = "ANNOCOMPARE_CROSS_CLASS_THRESHOLD", default_value_t = 0.5)]
    cross_class_threshold: f64,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,

    /// Include references and a per-annotation listing.
    #[arg(long)]
    detail: bool,

    /// Maximum number of annotations listed with --detail.
    #[arg(long, default_value_t = 20)]
    max_items: usize,

    /// Exit non-zero if any potential mislabel was found.
    #[arg(long)]
    strict: bool,
}

/// Arguments for the names subcommand.
#[derive(clap::Args)]
struct NamesArgs {
    /// Annotator directories.
    #[arg(required = true)]
    dirs: Vec<String>,
}

/// Run the annocompare CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AnnocompareError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Compare(args)) => run_compare(args),
        Some(Commands::Names(args)) => run_names(args),
        None => {
            println!("annocompare {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Reconcile bounding-box annotations from multiple annotators.");
            println!();
            println!("Run 'annocompare --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // A logger may already be installed when run() is called more than once
    // in the same process.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

/// Execute the compare subcommand.
fn run_compare(args: CompareArgs) -> Result<(), AnnocompareError> {
    if !matches!(args.output.as_str(), "text" | "json") {
        return Err(AnnocompareError::UnsupportedFormat(format!(
            "report output '{}' (supported: text, json)",
            args.output
        )));
    }

    let opts = reconcile::ReconcileOptions {
        thresholds: reconcile::MislabelThresholds {
            same_class: args.same_class_threshold,
            cross_class: args.cross_class_threshold,
        },
        detail: args.detail,
        max_items: args.max_items,
    };
    opts.thresholds.validate()?;

    let load_opts = ir::io_voc_xml::LoadOptions {
        prune: args.prune,
        relaxed: args.relaxed,
    };
    let raw = ir::io_voc_xml::load_annotation_dirs(&args.roots, &load_opts)?;
    let mut store = store::AnnotationStore::from_raw(raw);
    let report = reconcile::reconcile(&mut store, &opts)?;

    if args.output == "json" {
        let json =
            serde_json::to_string_pretty(&report).map_err(AnnocompareError::ReportJsonWrite)?;
        println!("{json}");
    } else {
        print!("{report}");
    }

    if args.strict && report.has_mislabels() {
        Err(AnnocompareError::MislabelsFound {
            count: report.mislabels.len(),
        })
    } else {
        Ok(())
    }
}

/// Execute the names subcommand.
fn run_names(args: NamesArgs) -> Result<(), AnnocompareError> {
    let names = naming::name_annotators(&args.dirs)?;
    for (dir, name) in &names {
        println!("{name}\t{dir}");
    }
    Ok(())
}
