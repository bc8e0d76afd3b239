// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ifc_binary_cache::{BinaryCacheReader, ReadOptions};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Inspect IFC binary cache blobs
#[derive(Parser)]
#[command(name = "ifc-cache-inspect", version)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print header and section directory as JSON
    Header { blob: PathBuf },
    /// Check the blob against its source model; exits 1 when stale
    Validate { blob: PathBuf, source: PathBuf },
    /// Decode the blob and print table and geometry counts
    Stats {
        blob: PathBuf,
        /// Do not decode the geometry section
        #[arg(long)]
        skip_geometry: bool,
    },
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Header { blob } => {
            let data = read_file(&blob)?;
            let info = BinaryCacheReader::read_header(&data)
                .with_context(|| format!("{} is not a readable cache", blob.display()))?;
            let stats = BinaryCacheReader::stats(&data)?;
            let out = json!({
                "header": info.header,
                "source_hash": info.source_hash().to_hex(),
                "schema": info.schema_version().map(|s| s.name()),
                "sections": info.sections,
                "total_size": stats.total_size,
                "compression_ratio": stats.compression_ratio(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Validate { blob, source } => {
            let data = read_file(&blob)?;
            let source_bytes = read_file(&source)?;
            let fresh = BinaryCacheReader::validate(&data, &source_bytes)
                .with_context(|| format!("{} is not a usable cache", blob.display()))?;
            println!("{}", if fresh { "fresh" } else { "stale" });
            if !fresh {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Stats {
            blob,
            skip_geometry,
        } => {
            let data = read_file(&blob)?;
            let mut options = ReadOptions::from_env();
            options.skip_geometry |= skip_geometry;
            let result = BinaryCacheReader::with_options(options)
                .read(&data)
                .with_context(|| format!("failed to decode {}", blob.display()))?;

            let store = &result.data_store;
            let spatial = store.spatial_hierarchy();
            let out = json!({
                "schema": store.schema().name(),
                "entities": store.entity_count(),
                "strings": store.strings().len(),
                "properties": store.property_table().len(),
                "quantities": store.quantity_table().len(),
                "relationships": store.relationships().len(),
                "spatial_nodes": spatial.len(),
                "meshes": result.geometry.as_ref().map(|g| g.mesh_count()),
                "total_vertices": result.header.total_vertices,
                "total_triangles": result.header.total_triangles,
                "coordinate_info": result.geometry.as_ref().map(|g| g.coordinate_info),
                "skipped_sections": result.skipped_sections.len(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
