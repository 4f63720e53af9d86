use std::{thread, time::Instant};

use crate::{
    assets::AssetStore,
    audio::AudioOutput,
    config::{AppConfig, SceneConfig, ShellConfig},
    geometry::Rectangle,
    graph::{NodeId, SceneGraph},
    render::{Renderer, Surface},
    scene::{Scene, SceneContext},
    timeline::Ticker,
    Result,
};

/// Top-level object that owns the surface, the scene graph and the frame loop.
/// Scenes are attached below [`Application::stage`].
pub struct Application {
    graph: SceneGraph,
    stage: NodeId,
    surface: Surface,
    renderer: Renderer,
    ticker: Ticker,
    last_tick: Option<Instant>,
    assets: AssetStore,
    audio: Box<dyn AudioOutput>,
}

impl Application {
    /// Fails when the surface cannot be allocated at the requested size and
    /// resolution.
    pub fn new(
        options: &ShellConfig,
        assets: AssetStore,
        audio: Box<dyn AudioOutput>,
    ) -> Result<Self> {
        let resolution = options.effective_resolution();
        let surface = Surface::new(options.view.clone(), options.width, options.height, resolution)?;
        let mut graph = SceneGraph::new();
        let stage = graph.create_container();

        tracing::info!(
            view = %options.view,
            width = options.width,
            height = options.height,
            resolution,
            background = %format!("{:#08x}", options.background_color),
            "shell created"
        );

        Ok(Self {
            graph,
            stage,
            surface,
            renderer: Renderer::new(options.background_rgb()),
            ticker: Ticker::default(),
            last_tick: None,
            assets,
            audio,
        })
    }

    /// Builds a shell from a full application config, resolving assets from
    /// the configured base path.
    pub fn from_config(config: &AppConfig, audio: Box<dyn AudioOutput>) -> Result<Self> {
        let assets = AssetStore::new(config.assets.base_path.clone());
        Self::new(&config.shell, assets, audio)
    }

    /// Root container of the display tree.
    pub fn stage(&self) -> NodeId {
        self.stage
    }

    /// Logical screen rectangle.
    pub fn screen(&self) -> Rectangle {
        Rectangle::new(
            0.0,
            0.0,
            self.surface.width() as f32,
            self.surface.height() as f32,
        )
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Lends the graph, assets and audio output to a scene under construction.
    pub fn scene_context<'a>(&'a mut self, settings: &'a SceneConfig) -> SceneContext<'a> {
        SceneContext {
            graph: &mut self.graph,
            assets: &mut self.assets,
            audio: self.audio.as_ref(),
            settings,
        }
    }

    pub fn attach(&mut self, scene: &Scene) -> Result<()> {
        scene.attach_to(&mut self.graph, self.stage)
    }

    pub fn detach(&mut self, scene: &Scene) -> Result<()> {
        scene.detach(&mut self.graph)
    }

    /// Draws the stage into the surface.
    pub fn render(&mut self) -> Result<()> {
        self.renderer.draw(&self.graph, self.stage, &mut self.surface)
    }

    /// Renders one frame and records the wall-clock time since the previous
    /// frame ended on the ticker. The first frame counts its render time only.
    pub fn tick(&mut self) -> Result<u64> {
        let started = Instant::now();
        self.render()?;
        let finished = Instant::now();
        let delta = finished.duration_since(self.last_tick.unwrap_or(started));
        self.last_tick = Some(finished);
        Ok(self.ticker.advance(delta))
    }

    /// Runs the frame loop for `frames` frames, sleeping between frames to
    /// hold the ticker's target rate.
    pub fn run(&mut self, frames: u64) -> Result<()> {
        let interval = self.ticker.frame_interval();
        tracing::info!(frames, fps = self.ticker.target_fps(), "entering frame loop");

        for _ in 0..frames {
            let started = Instant::now();
            self.tick()?;
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        tracing::info!(
            frames = self.ticker.frame_count(),
            elapsed = ?self.ticker.elapsed(),
            "frame loop finished"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("stage", &self.stage)
            .field("nodes", &self.graph.len())
            .field("view", &self.surface.view())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::{
        assets::{SoundClip, Texture},
        audio::SilentOutput,
        geometry::Point,
        StageError,
    };

    fn app_with_demo_assets(resolution: Option<f32>) -> Application {
        let settings = SceneConfig::default();
        let mut assets = AssetStore::new("unused");
        assets.insert_texture(
            settings.texture.clone(),
            Texture::from_image(
                settings.texture.clone(),
                RgbaImage::from_pixel(8, 8, Rgba([255, 255, 0, 255])),
            ),
        );
        assets.insert_sound(
            settings.sound.clone(),
            SoundClip {
                name: settings.sound,
                channels: 1,
                sample_rate: 8_000,
                samples: vec![0.0; 16],
            },
        );

        let options = ShellConfig {
            resolution,
            ..Default::default()
        };
        Application::new(&options, assets, Box::new(SilentOutput)).unwrap()
    }

    fn demo_scene(app: &mut Application) -> Scene {
        let settings = SceneConfig::default();
        let screen = app.screen();
        Scene::new(app.scene_context(&settings), screen.width, screen.height).unwrap()
    }

    #[test]
    fn exposes_logical_screen_and_physical_surface() {
        let app = app_with_demo_assets(Some(2.0));

        assert_eq!(app.screen(), Rectangle::new(0.0, 0.0, 640.0, 480.0));
        assert_eq!(app.surface().frame().dimensions(), (1280, 960));
        assert_eq!(app.surface().view(), "stage-canvas");
    }

    #[test]
    fn oversized_resolution_is_an_error() {
        let options = ShellConfig {
            resolution: Some(1.0e9),
            ..Default::default()
        };
        let err = Application::new(&options, AssetStore::new("unused"), Box::new(SilentOutput))
            .unwrap_err();

        assert!(matches!(err, StageError::SurfaceTooLarge { .. }));
    }

    #[test]
    fn ticker_counts_time_spent_between_frames() {
        let mut app = app_with_demo_assets(None);
        let interval = app.ticker().frame_interval();

        app.run(3).unwrap();

        assert_eq!(app.ticker().frame_count(), 3);
        assert!(app.ticker().elapsed() >= interval * 2);
    }

    #[test]
    fn missing_resolution_defaults_to_one() {
        let app = app_with_demo_assets(None);
        assert_eq!(app.surface().resolution(), 1.0);
        assert_eq!(app.surface().frame().dimensions(), (640, 480));
    }

    #[test]
    fn attached_scene_is_rendered() {
        let mut app = app_with_demo_assets(None);
        let scene = demo_scene(&mut app);

        app.render().unwrap();
        assert_eq!(*app.surface().frame().get_pixel(0, 0), Rgba([0x64, 0x95, 0xed, 255]));

        app.attach(&scene).unwrap();
        app.render().unwrap();
        assert_eq!(*app.surface().frame().get_pixel(0, 0), Rgba([255, 255, 0, 255]));
        assert_eq!(*app.surface().frame().get_pixel(8, 8), Rgba([0x64, 0x95, 0xed, 255]));

        app.detach(&scene).unwrap();
        app.render().unwrap();
        assert_eq!(*app.surface().frame().get_pixel(0, 0), Rgba([0x64, 0x95, 0xed, 255]));
    }

    #[test]
    fn attaching_keeps_scene_children() {
        let mut app = app_with_demo_assets(None);
        let scene = demo_scene(&mut app);
        let before = scene.children(app.graph()).unwrap().to_vec();

        app.attach(&scene).unwrap();

        assert_eq!(app.graph().children(app.stage()).unwrap(), &[scene.root()]);
        assert_eq!(scene.children(app.graph()).unwrap(), before.as_slice());
    }

    #[test]
    fn frames_never_move_the_sprite() {
        let mut app = app_with_demo_assets(None);
        let scene = demo_scene(&mut app);
        app.attach(&scene).unwrap();

        for _ in 0..5 {
            app.tick().unwrap();
        }
        app.run(2).unwrap();

        assert_eq!(app.ticker().frame_count(), 7);
        assert_eq!(app.graph().position(scene.sprite()).unwrap(), Point::ORIGIN);
        assert_eq!(app.graph().world_position(scene.sprite()).unwrap(), Point::ORIGIN);
    }
}
