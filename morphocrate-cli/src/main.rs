use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use morphocrate_algorithms::{map_control_points, EmptyMeshPolicy};
use morphocrate_cli::{run_batch, BatchConfig};
use morphocrate_io::{
    convert_directory, manifest_for_directory, read_control_points, read_manifest_filenames,
    write_filename_table, write_points_txt, ConversionTarget, IoRegistry, DEFAULT_OBJECT_ID,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "morpho", version, about = "Batch shape statistics for 3D meshes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the centroid size of every mesh in a directory to a CSV table
    CentroidSize(CentroidSizeArgs),
    /// Convert every PLY file in a directory
    Convert {
        /// Directory holding the PLY files
        input: PathBuf,
        /// Output directory [default: <input>/VTK Files]
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Target::Vtk)]
        to: Target,
    },
    /// Write the data_set.xml subject manifest for a directory of meshes
    Manifest {
        dir: PathBuf,
        #[arg(long, default_value = "vtk")]
        extension: String,
        /// Output file [default: <dir>/data_set.xml]
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_OBJECT_ID)]
        object_id: String,
    },
    /// List the filenames of a manifest in a one-column CSV
    ManifestCsv {
        manifest: PathBuf,
        /// Output file [default: data.csv next to the manifest]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Snap control points onto the nearest vertex of a mesh
    MapControlPoints {
        mesh: PathBuf,
        control_points: PathBuf,
        #[arg(short, long, default_value = "mapped_points.txt")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CentroidSizeArgs {
    /// TOML batch configuration; flags given here override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the meshes
    source_dir: Option<PathBuf>,
    /// Result table
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// File-name suffix of the meshes to measure
    #[arg(long)]
    extension: Option<String>,
    /// `skip` or `fail` on meshes without points or that cannot be read
    #[arg(long)]
    on_empty_mesh: Option<EmptyMeshPolicy>,
    /// Decimal places of the centroid sizes
    #[arg(long)]
    precision: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Vtk,
    AsciiPly,
}

impl From<Target> for ConversionTarget {
    fn from(target: Target) -> Self {
        match target {
            Target::Vtk => ConversionTarget::Vtk,
            Target::AsciiPly => ConversionTarget::AsciiPly,
        }
    }
}

impl CentroidSizeArgs {
    fn into_config(self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => BatchConfig::default(),
        };
        if let Some(source_dir) = self.source_dir {
            config.source_dir = source_dir;
        }
        if let Some(output) = self.output {
            config.dest_path = output;
        }
        if let Some(extension) = self.extension {
            config.extension_filter = extension;
        }
        if let Some(policy) = self.on_empty_mesh {
            config.on_empty_mesh = policy;
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::CentroidSize(args) => {
            let config = args.into_config()?;
            let registry = IoRegistry::with_defaults();
            let report = run_batch(&config, &registry).context("Centroid size batch failed")?;
            info!(
                "{} meshes measured, {} skipped",
                report.records.len(),
                report.skipped.len()
            );
        }
        Command::Convert { input, output, to } => {
            let output = output.unwrap_or_else(|| input.join("VTK Files"));
            let written = convert_directory(&input, &output, to.into())
                .with_context(|| format!("Failed to convert meshes in {}", input.display()))?;
            for path in &written {
                println!("{}", path.display());
            }
        }
        Command::Manifest { dir, extension, output, object_id } => {
            let output = output.unwrap_or_else(|| dir.join("data_set.xml"));
            manifest_for_directory(&dir, &extension, &output, &object_id)
                .with_context(|| format!("Failed to write manifest {}", output.display()))?;
        }
        Command::ManifestCsv { manifest, output } => {
            let output = output.unwrap_or_else(|| manifest.with_file_name("data.csv"));
            let names = read_manifest_filenames(&manifest)
                .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
            write_filename_table(&names, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Filenames have been written to {}", output.display());
        }
        Command::MapControlPoints { mesh, control_points, output } => {
            let registry = IoRegistry::with_defaults();
            let mesh = registry
                .read_mesh(&mesh)
                .with_context(|| format!("Failed to read mesh {}", mesh.display()))?;
            let points = read_control_points(&control_points).with_context(|| {
                format!("Failed to read control points {}", control_points.display())
            })?;
            let mapped = map_control_points(&mesh.vertices, &points)?;
            write_points_txt(&mapped, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Mapped {} control points to {}", mapped.len(), output.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config_defaults() {
        let cli = Cli::try_parse_from([
            "morpho",
            "centroid-size",
            "meshes",
            "-o",
            "sizes.csv",
            "--on-empty-mesh",
            "fail",
            "--precision",
            "3",
        ])
        .unwrap();
        let Command::CentroidSize(args) = cli.command else {
            panic!("expected centroid-size");
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.source_dir, PathBuf::from("meshes"));
        assert_eq!(config.dest_path, PathBuf::from("sizes.csv"));
        assert_eq!(config.on_empty_mesh, EmptyMeshPolicy::Fail);
        assert_eq!(config.precision, 3);
        assert_eq!(config.extension_filter, "vtk");
    }

    #[test]
    fn test_rejects_unknown_policy_and_target() {
        assert!(Cli::try_parse_from(["morpho", "centroid-size", "d", "--on-empty-mesh", "retry"]).is_err());
        assert!(Cli::try_parse_from(["morpho", "convert", "d", "--to", "obj"]).is_err());
        let cli = Cli::try_parse_from(["morpho", "convert", "d", "--to", "ascii-ply"]).unwrap();
        assert!(matches!(cli.command, Command::Convert { to: Target::AsciiPly, .. }));
    }
}
