use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sprite_stage_core::{default_output, AppConfig, Application, Scene};
use tracing_subscriber::EnvFilter;

fn main() -> sprite_stage_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { stage, frames } => run(&stage, frames),
        Commands::Snapshot { stage, output } => snapshot(&stage, &output),
    }
}

fn run(stage: &StageArgs, frames: u64) -> sprite_stage_core::Result<()> {
    let (mut app, _scene) = build_stage(stage)?;
    app.run(frames)
}

fn snapshot(stage: &StageArgs, output: &Path) -> sprite_stage_core::Result<()> {
    let (mut app, _scene) = build_stage(stage)?;
    app.render()?;
    app.surface().save(output)?;
    tracing::info!(?output, "wrote snapshot");
    Ok(())
}

/// Creates the shell, builds the demo scene at the shell's logical size and
/// attaches it to the stage.
fn build_stage(args: &StageArgs) -> sprite_stage_core::Result<(Application, Scene)> {
    let config = args.load_config()?;
    let mut app = Application::from_config(&config, default_output())?;

    let screen = app.screen();
    let scene = Scene::new(
        app.scene_context(&config.scene),
        screen.width,
        screen.height,
    )?;
    app.attach(&scene)?;

    Ok((app, scene))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Sprite and sound demo scene", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the scene and drive the frame loop.
    Run {
        #[command(flatten)]
        stage: StageArgs,
        /// Number of frames to render before exiting. At 60 fps the default
        /// gives the sound clip about ten seconds to play.
        #[arg(short, long, default_value_t = 600)]
        frames: u64,
    },
    /// Build the scene, render a single frame and save it as an image.
    Snapshot {
        #[command(flatten)]
        stage: StageArgs,
        /// Output image path, e.g. `frame.png`.
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct StageArgs {
    /// Optional JSON config file; missing fields use the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory the scene's image and sound are loaded from.
    #[arg(short, long)]
    assets: Option<PathBuf>,
    /// Device pixel ratio to render at.
    #[arg(short, long)]
    resolution: Option<f32>,
}

impl StageArgs {
    fn load_config(&self) -> sprite_stage_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_path(path)?,
            None => AppConfig::default(),
        };
        if let Some(assets) = &self.assets {
            config.assets.base_path = assets.clone();
        }
        if let Some(resolution) = self.resolution {
            config.shell.resolution = Some(resolution);
        }
        Ok(config)
    }
}
