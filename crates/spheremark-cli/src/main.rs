//! spheremark CLI — angular measurement on hemispherical (fisheye) images.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use spheremark_core::render::{angle_label, pair_angle_deg};
use spheremark_core::{DrawPoint, Point2d, Point3d, RenderModel, Workspace};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "spheremark")]
#[command(
    about = "Measure true angular separations between directions marked on a fisheye image"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full load → align → mark session on an image and report angles.
    Measure(CliMeasureArgs),

    /// Compute a single angular separation from logical disk coordinates.
    Angle(CliAngleArgs),
}

#[derive(Debug, Clone, Args)]
struct CliMeasureArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Measurement widget width in pixels.
    #[arg(long, default_value = "920.0")]
    width: f64,

    /// Measurement widget height in pixels.
    #[arg(long, default_value = "680.0")]
    height: f64,

    /// Image offset applied during alignment, as DX,DY.
    #[arg(long, value_name = "DX,DY")]
    align_offset: Option<String>,

    /// Zoom factor applied during alignment (baked in at confirm).
    #[arg(long, default_value = "1.0")]
    align_zoom: f64,

    /// Marked point in widget pixels, as X,Y. Repeat to mark several;
    /// consecutive pairs are measured.
    #[arg(long = "point", value_name = "X,Y")]
    points: Vec<String>,

    /// Path to write the measurement report (JSON). Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliAngleArgs {
    /// Disk radius the coordinates are expressed against.
    #[arg(long, default_value = "1.0")]
    radius: f64,

    /// First point, logical disk coordinates X,Y (origin at disk center).
    #[arg(long, value_name = "X,Y")]
    p1: String,

    /// Second point, logical disk coordinates X,Y.
    #[arg(long, value_name = "X,Y")]
    p2: String,
}

// ── report ─────────────────────────────────────────────────────────────────

#[derive(serde::Serialize)]
struct PairReport {
    start_px: [f64; 2],
    end_px: [f64; 2],
    angle_deg: Option<f64>,
    angle_rad: Option<f64>,
    label: Option<String>,
}

#[derive(serde::Serialize)]
struct MeasureReport {
    image: String,
    image_size: [u32; 2],
    disk_radius: f64,
    pairs: Vec<PairReport>,
    rejected_points: Vec<[f64; 2]>,
    render: RenderModel,
}

// ── measure ────────────────────────────────────────────────────────────────

fn run_measure(args: &CliMeasureArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());

    let img = image::open(&args.image)
        .map_err(|e| -> CliError {
            format!("Failed to open image {}: {}", args.image.display(), e).into()
        })?
        .to_rgba8();
    let (w, h) = img.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let mut workspace = Workspace::new(0.0, 0.0, args.width, args.height);
    workspace.load_image(img);

    // Alignment stage: offset and zoom, then confirm.
    if let Some(ref offset) = args.align_offset {
        let (dx, dy) = parse_xy(offset)?;
        workspace.pan(Point2d::new(dx, dy), 1.0);
    }
    if args.align_zoom != 1.0 {
        workspace
            .change_scale(args.align_zoom)
            .map_err(|e| -> CliError { format!("bad --align-zoom: {}", e).into() })?;
    }
    workspace.confirm_alignment();

    // Measurement stage: mark the requested pixels.
    let mut rejected = Vec::new();
    for raw in &args.points {
        let (x, y) = parse_xy(raw)?;
        if let Err(err) = workspace.add_point_at(Point2d::new(x, y)) {
            tracing::warn!("{}: {}", raw, err);
            rejected.push([x, y]);
        }
    }
    if workspace.points().len() % 2 == 1 {
        tracing::warn!("odd number of accepted points; the last one is unpaired");
    }

    let render = workspace.render_model();
    let pairs: Vec<PairReport> = render
        .pairs
        .iter()
        .map(|p| PairReport {
            start_px: p.start,
            end_px: p.end,
            angle_deg: p.angle_deg,
            angle_rad: p.angle_deg.map(f64::to_radians),
            label: p.label.clone(),
        })
        .collect();

    tracing::info!(
        "Measured {} pairs ({} points accepted, {} rejected)",
        pairs.len(),
        workspace.points().len(),
        rejected.len(),
    );

    let report = MeasureReport {
        image: args.image.display().to_string(),
        image_size: [w, h],
        disk_radius: workspace.frame().radius(),
        pairs,
        rejected_points: rejected,
        render,
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

// ── angle ──────────────────────────────────────────────────────────────────

fn run_angle(args: &CliAngleArgs) -> CliResult<()> {
    if !(args.radius.is_finite() && args.radius > 0.0) {
        return Err(format!("invalid disk radius: {}", args.radius).into());
    }

    let (x1, y1) = parse_xy(&args.p1)?;
    let (x2, y2) = parse_xy(&args.p2)?;
    let a = Point2d::new(x1, y1);
    let b = Point2d::new(x2, y2);

    for (name, p) in [("p1", a), ("p2", b)] {
        if p.norm() > args.radius {
            return Err(format!(
                "{} is outside the disk: distance {:.3} > radius {:.3}",
                name,
                p.norm(),
                args.radius
            )
            .into());
        }
    }

    let sphere_a = Point3d::from_disk(a, args.radius);
    let sphere_b = Point3d::from_disk(b, args.radius);
    let deg = pair_angle_deg(
        DrawPoint::from_cartesian(a),
        DrawPoint::from_cartesian(b),
        args.radius,
    )
    .ok_or("degenerate direction; no angle defined")?;

    println!("Disk radius:  {}", args.radius);
    println!(
        "P1:           ({}, {}) -> sphere ({:.6}, {:.6}, {:.6})",
        x1, y1, sphere_a.x, sphere_a.y, sphere_a.z
    );
    println!(
        "P2:           ({}, {}) -> sphere ({:.6}, {:.6}, {:.6})",
        x2, y2, sphere_b.x, sphere_b.y, sphere_b.z
    );
    println!("Separation:   {:.9} rad", deg.to_radians());
    println!("              {}", angle_label(deg));

    Ok(())
}

// ── helpers ────────────────────────────────────────────────────────────────

/// Parse a "X,Y" coordinate pair.
fn parse_xy(s: &str) -> CliResult<(f64, f64)> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| -> CliError { format!("expected X,Y, got {:?}", s).into() })?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|e| -> CliError { format!("bad x in {:?}: {}", s, e).into() })?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|e| -> CliError { format!("bad y in {:?}: {}", s, e).into() })?;
    Ok((x, y))
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Measure(args) => run_measure(&args),
        Commands::Angle(args) => run_angle(&args),
    }
}
