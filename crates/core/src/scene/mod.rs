use crate::{
    assets::AssetStore,
    audio::{AudioOutput, PlaybackRequest},
    config::SceneConfig,
    geometry::Point,
    graph::{NodeId, SceneGraph},
    Result,
};

/// Everything a scene needs while it builds its node tree.
pub struct SceneContext<'a> {
    pub graph: &'a mut SceneGraph,
    pub assets: &'a mut AssetStore,
    pub audio: &'a dyn AudioOutput,
    pub settings: &'a SceneConfig,
}

/// One screen of content: a container holding a single sprite.
///
/// The scene does not own the graph; it keeps handles to its root container
/// and sprite, and attaching or detaching the scene moves the root container.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    screen_width: f32,
    screen_height: f32,
    root: NodeId,
    sprite: NodeId,
}

impl Scene {
    /// Builds the scene tree, logs the sprite's bounds and starts the scene's
    /// sound once at the configured volume.
    ///
    /// The screen size is passed in by the caller so the scene never has to
    /// query the shell.
    pub fn new(ctx: SceneContext<'_>, screen_width: f32, screen_height: f32) -> Result<Self> {
        let SceneContext {
            graph,
            assets,
            audio,
            settings,
        } = ctx;

        let texture = assets.load_texture(&settings.texture)?;
        let clip = assets.load_sound(&settings.sound)?;

        let root = graph.create_container();
        let sprite = graph.create_sprite(texture);
        graph.set_position(sprite, Point::ORIGIN)?;
        graph.add_child(root, sprite)?;

        let bounds = graph.bounds(sprite)?;
        let local_bounds = graph.local_bounds(sprite)?;
        tracing::info!(?bounds, ?local_bounds, "sprite placed");

        audio.play(PlaybackRequest::new(clip, settings.volume)?)?;

        Ok(Self {
            screen_width,
            screen_height,
            root,
            sprite,
        })
    }

    pub fn screen_width(&self) -> f32 {
        self.screen_width
    }

    pub fn screen_height(&self) -> f32 {
        self.screen_height
    }

    /// Container node the scene's content hangs off.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn sprite(&self) -> NodeId {
        self.sprite
    }

    pub fn children<'g>(&self, graph: &'g SceneGraph) -> Result<&'g [NodeId]> {
        graph.children(self.root)
    }

    pub fn attach_to(&self, graph: &mut SceneGraph, parent: NodeId) -> Result<()> {
        graph.add_child(parent, self.root)
    }

    /// Unlinks the scene from whatever it is attached to. Detaching a scene
    /// that is not attached does nothing.
    pub fn detach(&self, graph: &mut SceneGraph) -> Result<()> {
        match graph.parent(self.root)? {
            Some(parent) => graph.remove_child(parent, self.root),
            None => Ok(()),
        }
    }
}
