/// meshview terminal viewer
///
/// Renders a mesh in the terminal with the CPU renderer.
/// Controls:
///   - Arrows / WASD / mouse drag: rotate
///   - +/- or scroll: zoom
///   - T: toggle texture, M: switch render mode, R: reset view
///   - Q/ESC: Quit
use anyhow::{bail, Context};
use log::info;
use meshview_core::{Mesh, RenderConfig, RenderMode};
use meshview_terminal::{spawn_texture_loader, TerminalApp};
use std::path::PathBuf;

const USAGE: &str = "usage: meshview-terminal [MESH] [--texture IMAGE] [--config CONFIG.json] \
                     [--wait-for-texture] [--log FILE]";

#[derive(Debug, Default)]
struct Args {
    mesh: Option<PathBuf>,
    texture: Option<PathBuf>,
    config: Option<PathBuf>,
    log: Option<PathBuf>,
    wait_for_texture: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--texture" => {
                args.texture = Some(iter.next().context("--texture needs a path")?.into())
            }
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--log" => args.log = Some(iter.next().context("--log needs a path")?.into()),
            "--wait-for-texture" => args.wait_for_texture = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown option '{}'\n{}", flag, USAGE),
            path if args.mesh.is_none() => args.mesh = Some(path.into()),
            extra => bail!("unexpected argument '{}'\n{}", extra, USAGE),
        }
    }
    Ok(args)
}

fn init_logging(log: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder
            .format_timestamp_micros()
            .target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    init_logging(args.log.as_ref())?;

    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if args.wait_for_texture {
        config.mode = RenderMode::WaitForTexture;
    }

    let mesh = match &args.mesh {
        Some(path) => {
            Mesh::load(path).with_context(|| format!("Failed to load mesh {}", path.display()))?
        }
        None => Mesh::relief_grid(20),
    };
    info!(
        "Starting viewer: {} vertices, {} faces",
        mesh.vertices.len(),
        mesh.faces.len()
    );

    let mut app = TerminalApp::new(mesh, config);
    if let Some(path) = args.texture {
        app = app.with_texture_loader(spawn_texture_loader(path));
    }

    app.run().context("Terminal viewer failed")?;
    Ok(())
}
