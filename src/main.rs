use std::env;

use anyhow::{Context, Result, anyhow, bail};
use log::info;

use lightbox::{
    AppConfig, AppError, MaterialEdit, RecordingRasterizer, RenderOption, RenderOptions, SceneRenderer,
    SceneState,
};

const USAGE: &str = "Usage: lightbox [--object NAME] [--lights N] [--shininess S] [--size WxH] \
[--wireframe] [--normals] [--no-cull] [--no-depth] [--no-gizmos] [--summary-only]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Some(options) = CliOptions::parse(env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };
    let scene = options.scene();

    if options.summary_only {
        return run_headless(scene, options.size);
    }

    let (width, height) = options.size;
    let config = AppConfig::new().size(width, height).scene(scene.clone());
    match lightbox::run(config) {
        Ok(()) => Ok(()),
        Err(err @ (AppError::EventLoop(_) | AppError::Window(_))) => {
            eprintln!("{err}. Falling back to --summary-only mode.");
            run_headless(scene, options.size)
        }
        Err(err) => Err(err).context("viewer stopped"),
    }
}

/// Renders one frame into a recorder and prints the parameters and the trace.
fn run_headless(mut scene: SceneState, (width, height): (u32, u32)) -> Result<()> {
    scene.camera.resize(width, height);

    let mut raster = RecordingRasterizer::new();
    let mut renderer =
        SceneRenderer::new(&mut raster).context("failed to link the shader programs")?;
    renderer
        .render_frame(&scene, &mut raster)
        .context("failed to render the frame")?;

    println!("{}", scene.summary());
    for command in raster.commands() {
        println!("{command}");
    }
    info!("recorded {} draws", raster.draws().len());
    Ok(())
}

#[derive(Debug)]
struct CliOptions {
    object: lightbox::Primitive,
    lights: Option<usize>,
    shininess: Option<f32>,
    size: (u32, u32),
    toggles: Vec<RenderOption>,
    summary_only: bool,
}

impl CliOptions {
    /// Returns `None` when help was requested. Each render flag moves its
    /// option away from the default, so repeating a flag changes nothing.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>> {
        let mut options = Self {
            object: lightbox::Primitive::default(),
            lights: None,
            shininess: None,
            size: (800, 600),
            toggles: Vec::new(),
            summary_only: false,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--object" => {
                    let name = value(&mut args, "--object")?;
                    options.object = name
                        .parse()
                        .with_context(|| format!("invalid --object {name}"))?;
                }
                "--lights" => {
                    let count = value(&mut args, "--lights")?;
                    options.lights = Some(
                        count
                            .parse()
                            .with_context(|| format!("invalid --lights {count}"))?,
                    );
                }
                "--shininess" => {
                    let shininess = value(&mut args, "--shininess")?;
                    options.shininess = Some(
                        shininess
                            .parse()
                            .with_context(|| format!("invalid --shininess {shininess}"))?,
                    );
                }
                "--size" => options.size = parse_size(&value(&mut args, "--size")?)?,
                "--wireframe" => options.toggles.push(RenderOption::Wireframe),
                "--normals" => options.toggles.push(RenderOption::ShowNormals),
                "--no-cull" => options.toggles.push(RenderOption::BackfaceCulling),
                "--no-depth" => options.toggles.push(RenderOption::DepthTest),
                "--no-gizmos" => options.toggles.push(RenderOption::ShowLights),
                "--summary-only" => options.summary_only = true,
                "-h" | "--help" => return Ok(None),
                other => bail!("Unknown argument: {other}\n{USAGE}"),
            }
        }
        Ok(Some(options))
    }

    fn scene(&self) -> SceneState {
        let mut scene = SceneState::new().with_primitive(self.object);
        if let Some(count) = self.lights {
            scene = scene.with_light_count(count);
        }
        if let Some(shininess) = self.shininess {
            scene.object_material.apply(MaterialEdit::Shininess(shininess));
        }
        let defaults = RenderOptions::default();
        for &option in &self.toggles {
            scene.options.set(option, !defaults.get(option));
        }
        scene
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next().ok_or_else(|| anyhow!("{flag} expects a value"))
}

fn parse_size(text: &str) -> Result<(u32, u32)> {
    let (width, height) = text
        .split_once('x')
        .ok_or_else(|| anyhow!("--size expects WIDTHxHEIGHT, got {text}"))?;
    let width: u32 = width.parse().with_context(|| format!("invalid width {width}"))?;
    let height: u32 = height
        .parse()
        .with_context(|| format!("invalid height {height}"))?;
    if width == 0 || height == 0 {
        bail!("--size must be non-zero, got {text}");
    }
    Ok((width, height))
}
