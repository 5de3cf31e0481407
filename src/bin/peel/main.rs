//! Peel CLI - UV unwrapping command-line tool.
//!
//! Usage: peel <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `peel --help` for available commands.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use peel::io;
use peel::island::segment_islands;
use peel::metrics::compute_quality_metrics;
use peel::prelude::*;
use peel::seam::detect_seams;
use peel::topology::{build_topology, validate_topology};

#[derive(Parser)]
#[command(name = "peel")]
#[command(author, version, about = "UV unwrapping CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unwrap a mesh and write the result with UVs
    Unwrap {
        /// Input mesh file (OBJ)
        input: PathBuf,

        /// Output mesh file (OBJ)
        output: PathBuf,

        /// Seam angle threshold in degrees
        #[arg(short, long, default_value = "30.0")]
        angle_threshold: f64,

        /// Margin around and between packed islands
        #[arg(short, long, default_value = "0.02")]
        margin: f32,

        /// Skip island packing (each island spans [0,1] on its own)
        #[arg(long)]
        no_pack: bool,

        /// Solve islands in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Report quality metrics for a mesh that already has UVs
    Analyze {
        /// Input mesh file
        input: PathBuf,

        /// Seam angle threshold used to reconstruct the island layout
        #[arg(short, long, default_value = "30.0")]
        angle_threshold: f64,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Unwrap {
            input,
            output,
            angle_threshold,
            margin,
            no_pack,
            parallel,
        } => cmd_unwrap(&input, &output, angle_threshold, margin, no_pack, parallel),
        Commands::Info { input } => cmd_info(&input),
        Commands::Analyze { input, angle_threshold } => cmd_analyze(&input, angle_threshold),
    }
}

fn cmd_unwrap(
    input: &PathBuf,
    output: &PathBuf,
    angle_threshold: f64,
    margin: f32,
    no_pack: bool,
    parallel: bool,
) -> Result<()> {
    let mut mesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let options = UnwrapOptions::default()
        .with_angle_threshold(angle_threshold)
        .with_margin(margin)
        .with_pack(!no_pack)
        .with_parallel(parallel);

    let start = Instant::now();
    let result = unwrap(&mut mesh, &options)?;
    let elapsed = start.elapsed();

    println!("Unwrapped in {:.2?}", elapsed);
    println!("  Seams: {}", result.seams.len());
    println!("  Islands: {}", result.islands.num_islands());
    if !result.failed_islands.is_empty() {
        println!("  Failed islands: {:?}", result.failed_islands);
    }
    print_metrics(&result.metrics);

    io::save(&mesh, output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

fn cmd_info(input: &PathBuf) -> Result<()> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());

    let topo = build_topology(&mesh)?;
    validate_topology(&mesh, &topo);
    println!("Edges: {}", topo.num_edges());
    println!("Euler characteristic: {}", topo.euler_characteristic(&mesh));

    let boundary = (0..topo.num_edges())
        .filter(|&e| topo.is_boundary_edge(e))
        .count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary edges)", boundary);
    }

    let mut total_area = 0.0;
    for f in 0..mesh.num_faces() {
        total_area += mesh.face_area(f);
    }
    println!("Surface area: {:.6}", total_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    Ok(())
}

fn cmd_analyze(input: &PathBuf, angle_threshold: f64) -> Result<()> {
    let mesh = io::load(input)?;

    let topo = build_topology(&mesh)?;
    let seams = detect_seams(&mesh, &topo, angle_threshold);
    let islands = segment_islands(&mesh, &topo, &seams);

    println!("Analyzing: {}", input.display());
    println!("  Islands: {}", islands.num_islands());
    print_metrics(&compute_quality_metrics(&mesh, &islands));

    Ok(())
}

fn print_metrics(metrics: &QualityMetrics) {
    println!("  Avg stretch: {:.3}", metrics.avg_stretch);
    println!("  Max stretch: {:.3}", metrics.max_stretch);
    println!("  Coverage: {:.1}%", metrics.coverage * 100.0);
    println!("  Angle distortion: {:.3} rad", metrics.angle_distortion);
}
