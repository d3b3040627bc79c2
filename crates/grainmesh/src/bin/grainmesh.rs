//! GRAINMESH command line.
//!
//! - `mesh`: mesh a VTK label volume into node and triangle record files
//! - `inspect`: check and summarise a pair of record files

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use grainmesh::{AnomalyNeighborhood, MeshReport, MesherConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grainmesh")]
#[command(about = "Surface meshes for segmented label volumes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mesh a label volume into node and triangle record files
    Mesh(MeshArgs),
    /// Check a pair of record files and summarise the mesh
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct MeshArgs {
    /// TOML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input label volume (legacy VTK STRUCTURED_POINTS)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Node record output file
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Triangle record output file
    #[arg(long)]
    triangles: Option<PathBuf>,

    /// Score checkerboard corners using in-plane neighbours only
    #[arg(long)]
    in_plane_anomaly: bool,

    /// Write records on the meshing thread
    #[arg(long)]
    no_pipeline: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Node record file
    #[arg(long)]
    nodes: PathBuf,

    /// Triangle record file
    #[arg(long)]
    triangles: PathBuf,
}

fn resolve_config(args: MeshArgs) -> Result<MesherConfig> {
    let mut config = match &args.config {
        Some(path) => MesherConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let (Some(input), Some(nodes), Some(triangles)) =
                (&args.input, &args.nodes, &args.triangles)
            else {
                bail!("either --config or all of --input, --nodes and --triangles are required");
            };
            MesherConfig::new(input, nodes, triangles)
        }
    };

    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(nodes) = args.nodes {
        config.nodes_file = nodes;
    }
    if let Some(triangles) = args.triangles {
        config.triangles_file = triangles;
    }
    if args.in_plane_anomaly {
        config.meshing.anomaly_neighborhood = AnomalyNeighborhood::InPlane;
    }
    if args.no_pipeline {
        config.pipelined = false;
    }
    config.validate().context("Invalid run configuration")?;
    Ok(config)
}

fn mesh(args: MeshArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let stats = grainmesh::run(&config)
        .with_context(|| format!("Failed to mesh {}", config.input.display()))?;

    println!("slices:     {}", stats.slices);
    println!("nodes:      {}", stats.nodes);
    println!("triangles:  {}", stats.triangles);
    println!(
        "segments:   {} lower, {} mid, {} upper",
        stats.segments[0], stats.segments[1], stats.segments[2]
    );
    println!(
        "cells:      {} closed, {} two-centre, {} body-centre",
        stats.cells.closed, stats.cells.two_centers, stats.cells.body_center
    );
    println!("resolved:   {} checkerboard squares", stats.resolved_checkerboards);
    for (kind, count) in &stats.node_kinds {
        println!("  kind {kind:>2}: {count}");
    }
    Ok(())
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let report = MeshReport::from_files(&args.nodes, &args.triangles)
        .context("Failed to read record files")?;
    println!("{report}");
    if !report.is_consistent() {
        bail!("{} defect(s) found", report.defect_count);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Mesh(args) => mesh(args),
        Commands::Inspect(args) => inspect(&args),
    }
}
