//! Core library for the Sprite Stage demo.
//!
//! An [`Application`] owns the drawing surface, the scene graph and the frame
//! loop. A [`Scene`] builds its own subtree (one sprite), logs its bounds and
//! fires a single sound on construction, then gets attached to the
//! application's stage.

pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod render;
pub mod scene;
pub mod shell;
pub mod timeline;

pub use assets::{AssetStore, SoundClip, Texture};
pub use audio::{default_output, AudioOutput, PlaybackRequest, SilentOutput};
pub use config::{AppConfig, AssetConfig, SceneConfig, ShellConfig};
pub use error::{Result, StageError};
pub use geometry::{Point, Rectangle};
pub use graph::{NodeId, NodeKind, SceneGraph};
pub use render::{Renderer, Surface};
pub use scene::{Scene, SceneContext};
pub use shell::Application;
pub use timeline::Ticker;

#[cfg(feature = "playback")]
pub use audio::CpalOutput;
