use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use sift_data::{Dataset, DatasetBuilder};
use sift_io::{export_vtk, read_dataset, read_state, write_dataset, write_state};
use sift_pipeline::{
    DataSource, FilterType, Pipeline, ThresholdFilter, ThresholdState, data_range,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Threshold pipeline for mesh scalar data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Generate {
        #[command(subcommand)]
        command: GenerateCommand,
    },
    Range(RangeArgs),
    Threshold(ThresholdArgs),
}

#[derive(Subcommand)]
enum GenerateCommand {
    Grid(GridArgs),
}

#[derive(Args)]
struct GridArgs {
    #[arg(long, default_value_t = 11)]
    nx: usize,
    #[arg(long, default_value_t = 11)]
    ny: usize,
    #[arg(long, default_value_t = 1.0)]
    spacing: f64,
    /// Scalar value range along x, e.g. 0,100
    #[arg(long, default_value = "0,100", allow_hyphen_values = true)]
    values: String,
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args)]
struct RangeArgs {
    #[arg(long = "in")]
    input: PathBuf,
}

#[derive(Args)]
struct ThresholdArgs {
    #[arg(long = "in")]
    input: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// `cells` or `points`
    #[arg(long)]
    mode: Option<FilterType>,
    #[arg(long, allow_hyphen_values = true)]
    lower: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    upper: Option<f64>,
    /// Keep a cell when any of its points passes
    #[arg(long)]
    any_scalars: bool,
    /// Filter state to start from
    #[arg(long)]
    state: Option<PathBuf>,
    #[arg(long)]
    save_state: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            command: GenerateCommand::Grid(args),
        } => generate_grid(args),
        Command::Range(args) => range(args),
        Command::Threshold(args) => threshold(args),
    }
}

fn generate_grid(args: GridArgs) -> Result<()> {
    let (lo, hi) = parse_pair(&args.values)?;
    let width = (args.nx.saturating_sub(1)) as f64 * args.spacing;
    let cells = args.nx.saturating_sub(1) * args.ny.saturating_sub(1);

    let grid = DatasetBuilder::structured_grid(args.nx, args.ny, args.spacing)
        .context("failed to build grid")?
        .point_scalars_from("field", |p| lo + (hi - lo) * p.x / width)
        .cell_array("index", (0..cells).map(|i| i as f64).collect())
        .build()
        .context("failed to build grid")?;

    write_dataset(&grid, &args.out).context("dataset export failed")?;
    info!(
        path = %args.out.display(),
        points = grid.point_count(),
        cells = grid.cell_count(),
        "grid written"
    );
    Ok(())
}

fn range(args: RangeArgs) -> Result<()> {
    let dataset = read_dataset(&args.input)?;
    let show = |range: Option<sift_base::ScalarRange>| match range {
        Some(range) => range.to_string(),
        None => "none".to_string(),
    };
    println!("kind:          {}", dataset.kind());
    println!("points:        {}", dataset.point_count());
    println!("cells:         {}", dataset.cell_count());
    println!("point scalars: {}", show(dataset.point_scalar_range()));
    println!("cell scalars:  {}", show(dataset.cell_scalar_range()));
    println!("threshold on:  {}", show(data_range(&dataset)));
    Ok(())
}

fn threshold(args: ThresholdArgs) -> Result<()> {
    let dataset = read_dataset(&args.input)?;
    let state = match &args.state {
        Some(path) => Some(read_state(path)?),
        None => None,
    };

    let (pipeline, filter) = run_threshold(dataset, state.as_ref(), &args)?;
    let node = pipeline.node::<ThresholdFilter>(filter)?;
    let outputs = pipeline.outputs(filter)?;
    let Some(output) = outputs.first() else {
        bail!("threshold produced no output");
    };

    write_output(output, &args.out)?;
    info!(
        path = %args.out.display(),
        mode = %node.filter_type(),
        lower = node.lower_threshold(),
        upper = node.upper_threshold(),
        points = output.point_count(),
        cells = output.cell_count(),
        "threshold output written"
    );

    if let Some(path) = &args.save_state {
        write_state(&node.state(), path).context("state export failed")?;
        info!(path = %path.display(), "threshold state written");
    }
    Ok(())
}

fn run_threshold(
    dataset: Dataset,
    state: Option<&ThresholdState>,
    args: &ThresholdArgs,
) -> Result<(Pipeline, sift_pipeline::NodeId)> {
    let mut pipeline = Pipeline::new();
    let source = pipeline.add(DataSource::new("input", dataset));
    let filter = match state {
        Some(state) => ThresholdFilter::from_state("threshold", state),
        None => ThresholdFilter::new("threshold"),
    };
    let filter = pipeline.add(filter);
    pipeline.connect(source, filter)?;

    pipeline.edit::<ThresholdFilter, _>(filter, |f| {
        if args.any_scalars {
            f.configure_cells(|config| config.all_scalars = false);
        }
        if let Some(mode) = args.mode {
            f.set_filter_type(mode);
        }
        if let Some(lower) = args.lower {
            f.set_auto_reset_lower(false);
            f.set_lower_threshold(lower);
        }
        if let Some(upper) = args.upper {
            f.set_auto_reset_upper(false);
            f.set_upper_threshold(upper);
        }
    })?;
    Ok((pipeline, filter))
}

fn write_output(dataset: &Dataset, path: &Path) -> Result<()> {
    let is_vtk = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vtk"));
    if is_vtk {
        export_vtk(dataset, path).context("VTK export failed")
    } else {
        write_dataset(dataset, path).context("dataset export failed")
    }
}

fn parse_pair(text: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 2 {
        bail!("--values expects two comma-separated numbers, e.g. 0,100");
    }

    let lo: f64 = parts[0].trim().parse().context("invalid lower value")?;
    let hi: f64 = parts[1].trim().parse().context("invalid upper value")?;
    Ok((lo, hi))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_pairs() -> Result<()> {
        assert_eq!(parse_pair("0,100")?, (0.0, 100.0));
        assert_eq!(parse_pair(" -5 , 2.5 ")?, (-5.0, 2.5));
        Ok(())
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(parse_pair("1").is_err());
        assert!(parse_pair("1,2,3").is_err());
        assert!(parse_pair("a,2").is_err());
    }
}
