use std::{
    collections::HashMap,
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use image::RgbaImage;
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

use crate::{Result, StageError};

/// Bitmap decoded to straight RGBA8, ready to be composited.
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    image: RgbaImage,
}

impl Texture {
    pub fn from_image(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Fully decoded sound clip with interleaved samples.
#[derive(Debug, Clone)]
pub struct SoundClip {
    pub name: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl SoundClip {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Loads and caches every asset referenced by scenes. Names are resolved
/// relative to the store's base path.
#[derive(Debug, Default)]
pub struct AssetStore {
    base_path: PathBuf,
    textures: HashMap<String, Arc<Texture>>,
    sounds: HashMap<String, Arc<SoundClip>>,
}

impl AssetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            textures: HashMap::new(),
            sounds: HashMap::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Registers an in-memory texture under `name`, replacing any cached one.
    pub fn insert_texture(&mut self, name: impl Into<String>, texture: Texture) -> Arc<Texture> {
        let texture = Arc::new(texture);
        self.textures.insert(name.into(), texture.clone());
        texture
    }

    /// Registers an in-memory sound clip under `name`, replacing any cached one.
    pub fn insert_sound(&mut self, name: impl Into<String>, clip: SoundClip) -> Arc<SoundClip> {
        let clip = Arc::new(clip);
        self.sounds.insert(name.into(), clip.clone());
        clip
    }

    pub fn load_texture(&mut self, name: &str) -> Result<Arc<Texture>> {
        if let Some(texture) = self.textures.get(name) {
            return Ok(texture.clone());
        }

        let path = self.existing_path(name)?;
        let image = image::open(&path)?.to_rgba8();
        tracing::debug!(
            ?path,
            width = image.width(),
            height = image.height(),
            "loaded texture"
        );

        Ok(self.insert_texture(name, Texture::from_image(name, image)))
    }

    pub fn load_sound(&mut self, name: &str) -> Result<Arc<SoundClip>> {
        if let Some(clip) = self.sounds.get(name) {
            return Ok(clip.clone());
        }

        let path = self.existing_path(name)?;
        let clip = decode_sound(name, &path)?;
        tracing::debug!(
            ?path,
            channels = clip.channels,
            sample_rate = clip.sample_rate,
            duration = ?clip.duration(),
            "decoded sound"
        );

        Ok(self.insert_sound(name, clip))
    }

    fn existing_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.resolve(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StageError::AssetNotFound(path.display().to_string()))
        }
    }
}

fn decode_sound(name: &str, path: &Path) -> Result<SoundClip> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| StageError::decode(name, err))?;
    let mut format_reader = probed.format;

    let track = format_reader
        .default_track()
        .ok_or_else(|| StageError::decode(name, "no default audio track"))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| StageError::decode(name, err))?;

    let mut samples = Vec::<f32>::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(StageError::decode(name, err)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let signal = *decoded.spec();
                sample_rate = sample_rate.or(Some(signal.rate));
                channels = channels.or(Some(signal.channels.count() as u16));

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, signal);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            // A corrupt packet is skipped; the rest of the stream may be fine.
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::warn!(asset = name, reason, "skipping undecodable packet");
            }
            Err(err) => return Err(StageError::decode(name, err)),
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| StageError::decode(name, "unknown sample rate"))?;
    let channels = channels.ok_or_else(|| StageError::decode(name, "unknown channel layout"))?;

    Ok(SoundClip {
        name: name.to_string(),
        channels,
        sample_rate,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn loads_textures_relative_to_base_path() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "sprite.png", 4, 3);

        let mut store = AssetStore::new(dir.path());
        let texture = store.load_texture("sprite.png").unwrap();

        assert_eq!(texture.name(), "sprite.png");
        assert_eq!((texture.width(), texture.height()), (4, 3));
        assert_eq!(texture.image().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn caches_loaded_textures() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "sprite.png", 2, 2);

        let mut store = AssetStore::new(dir.path());
        let first = store.load_texture("sprite.png").unwrap();
        std::fs::remove_file(dir.path().join("sprite.png")).unwrap();
        let second = store.load_texture("sprite.png").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn errors_on_missing_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AssetStore::new(dir.path());

        let err = store.load_texture("missing.png").unwrap_err();
        assert!(matches!(err, StageError::AssetNotFound(_)));
        assert!(format!("{err}").contains("missing.png"));

        let err = store.load_sound("missing.mp3").unwrap_err();
        assert!(matches!(err, StageError::AssetNotFound(_)));
    }

    /// 16-bit PCM WAV with `frames` frames of a ramp on every channel.
    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: u32) {
        let block_align = channels * 2;
        let data_len = frames * u32::from(block_align);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for frame in 0..frames {
            let value = (frame % 1000) as i16 * 16;
            for _ in 0..channels {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }

        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn decodes_pcm_audio_to_interleaved_samples() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("tone.wav"), 2, 8_000, 1_000);

        let mut store = AssetStore::new(dir.path());
        let clip = store.load_sound("tone.wav").unwrap();

        assert_eq!(clip.name, "tone.wav");
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.sample_rate, 8_000);
        assert_eq!(clip.samples.len(), 2_000);
        assert_eq!(clip.frames(), 1_000);
        assert_eq!(clip.duration(), Duration::from_millis(125));
        assert!(clip.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(clip.samples[2], clip.samples[3]);
        assert!(clip.samples[2] > 0.0);
    }

    #[test]
    fn rejects_undecodable_sound_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("noise.mp3"), b"definitely not audio").unwrap();

        let mut store = AssetStore::new(dir.path());
        let err = store.load_sound("noise.mp3").unwrap_err();

        assert!(matches!(err, StageError::Decode { .. }));
    }

    #[test]
    fn serves_registered_sounds_without_touching_disk() {
        let mut store = AssetStore::new("does-not-exist");
        store.insert_sound(
            "beep.mp3",
            SoundClip {
                name: "beep.mp3".to_string(),
                channels: 2,
                sample_rate: 10,
                samples: vec![0.0; 40],
            },
        );

        let clip = store.load_sound("beep.mp3").unwrap();
        assert_eq!(clip.frames(), 20);
        assert_eq!(clip.duration(), Duration::from_secs(2));
    }
}
