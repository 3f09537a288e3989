//! CLI application for inspecting and sampling morphable models.
//!
//! Usage:
//!   morph-face -m model.bin                          # Human-readable summary
//!   morph-face -m model.bin -b expressions.bin --json
//!   morph-face -m model.scm --random --seed 7 -o sample.obj

use clap::Parser;
use log::{debug, info};
use morph_face::{
    load_morphable_model, reconstruct, sampler, Coefficients, FileStore, ModelStore,
    MorphableModel, Spread,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "morph-face")]
#[command(author, version, about = "3D morphable model inspection and sampling", long_about = None)]
struct Args {
    /// Morphable model file (.bin or .scm, optionally .bz2-compressed)
    #[arg(short, long, required = true)]
    model: PathBuf,

    /// Blendshape set to merge into the model (.bin)
    #[arg(short, long)]
    blendshapes: Option<PathBuf>,

    /// Draw a random instance instead of using the mean
    #[arg(long)]
    random: bool,

    /// Seed for --random (default: from entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Standard deviation of shape coefficients
    #[arg(long, default_value = "1.0")]
    shape_spread: f32,

    /// Upper bound of blendshape weights, or standard deviation of PCA expression coefficients
    #[arg(long, default_value = "1.0")]
    expression_spread: f32,

    /// Standard deviation of color coefficients
    #[arg(long, default_value = "1.0")]
    color_spread: f32,

    /// Write the instance as a Wavefront OBJ file
    #[arg(short, long)]
    obj: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    model: String,
    vertices: usize,
    triangles: usize,
    has_texcoords: bool,
    shape_components: usize,
    color_components: usize,
    expression: Option<ExpressionOutput>,
    /// Coefficients of the drawn instance, if --random was given
    coefficients: Option<Coefficients>,
    obj: Option<String>,
}

#[derive(Serialize)]
struct ExpressionOutput {
    kind: &'static str,
    components: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore;

    debug!("Loading model from {:?}", args.model);
    let mut model = load_morphable_model(&store, &args.model)?;
    if let Some(ref path) = args.blendshapes {
        debug!("Loading blendshapes from {:?}", path);
        model = model.with_blendshapes(store.load_blendshapes(path)?)?;
    }

    let coefficients = if args.random {
        let mut rng = match args.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let spread = Spread {
            shape: args.shape_spread,
            expression: args.expression_spread,
            color: args.color_spread,
        };
        Some(sampler::draw(&model, &mut rng, spread)?)
    } else {
        None
    };

    if let Some(ref path) = args.obj {
        let mesh = match coefficients {
            Some(ref c) => reconstruct(&model, c)?,
            None => model.mean_mesh(),
        };
        morph_face::obj::save_obj(path, &mesh)?;
        info!("Wrote {} vertices to {:?}", mesh.num_vertices(), path);
    }

    let output = summarize(args, &model, coefficients);
    let output_str = if args.json {
        serde_json::to_string_pretty(&output)?
    } else {
        format_human_readable(&output)
    };
    println!("{}", output_str);

    Ok(())
}

fn summarize(args: &Args, model: &MorphableModel, coefficients: Option<Coefficients>) -> Output {
    let expression = model.expression().map(|e| ExpressionOutput {
        kind: match e.as_ref() {
            morph_face::ExpressionModel::Blendshapes(_) => "blendshapes",
            morph_face::ExpressionModel::Pca(_) => "pca",
        },
        components: e.component_names(),
    });

    Output {
        model: args.model.display().to_string(),
        vertices: model.num_vertices(),
        triangles: model.topology().num_triangles(),
        has_texcoords: model.topology().has_texcoords(),
        shape_components: model.num_shape_components(),
        color_components: model.num_color_components(),
        expression,
        coefficients,
        obj: args.obj.as_ref().map(|p| p.display().to_string()),
    }
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();

    s.push_str(&format!("Model: {}\n", output.model));
    s.push_str(&format!(
        "Mesh: {} vertices, {} triangles{}\n",
        output.vertices,
        output.triangles,
        if output.has_texcoords { ", textured" } else { "" }
    ));

    s.push_str("\nComponents:\n");
    s.push_str(&format!("  Shape:      {}\n", output.shape_components));
    if output.color_components > 0 {
        s.push_str(&format!("  Color:      {}\n", output.color_components));
    } else {
        s.push_str("  Color:      none\n");
    }
    match output.expression {
        Some(ref e) => {
            s.push_str(&format!("  Expression: {} ({})\n", e.components.len(), e.kind));
            if e.kind == "blendshapes" {
                for name in &e.components {
                    s.push_str(&format!("    - {}\n", name));
                }
            }
        }
        None => s.push_str("  Expression: none\n"),
    }

    if let Some(ref c) = output.coefficients {
        s.push_str("\nRandom instance:\n");
        s.push_str(&format!("  Shape:      {}\n", format_coefficients(&c.shape)));
        s.push_str(&format!("  Expression: {}\n", format_coefficients(&c.expression)));
        s.push_str(&format!("  Color:      {}\n", format_coefficients(&c.color)));
    }

    if let Some(ref path) = output.obj {
        s.push_str(&format!("\nOBJ written to {}\n", path));
    }

    s
}

/// Show at most the first few coefficients.
fn format_coefficients(values: &[f32]) -> String {
    const SHOWN: usize = 8;
    if values.is_empty() {
        return "-".to_string();
    }
    let mut s = values
        .iter()
        .take(SHOWN)
        .map(|v| format!("{:+.3}", v))
        .collect::<Vec<_>>()
        .join(" ");
    if values.len() > SHOWN {
        s.push_str(&format!(" ... ({} total)", values.len()));
    }
    s
}
