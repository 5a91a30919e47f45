//! Session recording: every screenshot a test takes becomes a frame of an
//! animated GIF written next to the report when the test ends.
//!
//! With the `media` feature disabled the recorder keeps the same API and
//! records nothing.

use crate::driver::Screenshot;
use std::path::{Path, PathBuf};

/// Configuration for session recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// How long each frame stays on screen, in centiseconds
    pub frame_delay_cs: u16,
    /// Quality level (1-100, affects palette quantization)
    pub quality: u8,
    /// Loop count (0 = infinite)
    pub loop_count: u16,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            frame_delay_cs: 100,
            quality: 80,
            loop_count: 0,
        }
    }
}

impl RecordingConfig {
    /// Recording at a given output size
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..Default::default()
        }
    }

    /// Set quality (1-100)
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Set per-frame delay in centiseconds
    #[must_use]
    pub fn with_frame_delay(mut self, centiseconds: u16) -> Self {
        self.frame_delay_cs = centiseconds.max(1);
        self
    }

    /// Convert quality (1-100) to GIF encoder speed (1-30)
    #[must_use]
    pub fn encoder_speed(&self) -> i32 {
        let normalized = i32::from(100 - self.quality.min(100));
        (normalized * 29 / 100 + 1).clamp(1, 30)
    }
}

/// File a recording for `test_name` is written to
#[must_use]
pub fn recording_path(video_dir: &Path, test_name: &str) -> PathBuf {
    let file: String = test_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    video_dir.join(format!("{file}.gif"))
}

#[cfg(feature = "media")]
mod gif_session {
    use super::{recording_path, RecordingConfig};
    use crate::driver::Screenshot;
    use crate::result::{StoreError, StoreResult};
    use gif::{Encoder, Frame, Repeat};
    use image::imageops::FilterType;
    use image::ImageFormat;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use tracing::{debug, warn};

    /// Collects screenshots of one test and encodes them as a GIF
    #[derive(Debug, Clone, Default)]
    pub struct SessionRecorder {
        config: RecordingConfig,
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl SessionRecorder {
        /// Create an empty recorder
        #[must_use]
        pub fn new(config: RecordingConfig) -> Self {
            Self {
                config,
                frames: Arc::default(),
            }
        }

        fn frames(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
            self.frames.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Get the recording configuration
        #[must_use]
        pub const fn config(&self) -> &RecordingConfig {
            &self.config
        }

        /// Number of frames captured so far
        #[must_use]
        pub fn frame_count(&self) -> usize {
            self.frames().len()
        }

        /// Decode a PNG screenshot and keep it as a frame
        pub fn capture(&self, screenshot: &Screenshot) -> StoreResult<()> {
            let img = image::load_from_memory_with_format(&screenshot.data, ImageFormat::Png)
                .map_err(|e| StoreError::Recording {
                    message: format!("Failed to decode screenshot: {e}"),
                })?;
            let resized = img.resize_exact(self.config.width, self.config.height, FilterType::Triangle);
            self.frames().push(resized.to_rgba8().into_raw());
            Ok(())
        }

        /// Encode all frames as an animated GIF
        pub fn encode(&self) -> StoreResult<Vec<u8>> {
            let frames = self.frames();
            let mut output = Vec::new();
            let width = self.config.width as u16;
            let height = self.config.height as u16;

            {
                let mut encoder = Encoder::new(&mut output, width, height, &[]).map_err(|e| {
                    StoreError::Recording {
                        message: format!("Failed to create GIF encoder: {e}"),
                    }
                })?;

                let repeat = if self.config.loop_count == 0 {
                    Repeat::Infinite
                } else {
                    Repeat::Finite(self.config.loop_count)
                };
                encoder
                    .set_repeat(repeat)
                    .map_err(|e| StoreError::Recording {
                        message: format!("Failed to set GIF repeat: {e}"),
                    })?;

                for rgba in frames.iter() {
                    let mut pixels = rgba.clone();
                    let mut frame =
                        Frame::from_rgba_speed(width, height, &mut pixels, self.config.encoder_speed());
                    frame.delay = self.config.frame_delay_cs;
                    encoder
                        .write_frame(&frame)
                        .map_err(|e| StoreError::Recording {
                            message: format!("Failed to write GIF frame: {e}"),
                        })?;
                }
            }

            Ok(output)
        }

        /// Write `<video_dir>/<test_name>.gif`; `None` when nothing was captured
        pub fn save(&self, video_dir: &Path, test_name: &str) -> StoreResult<Option<PathBuf>> {
            if self.frame_count() == 0 {
                return Ok(None);
            }
            let data = self.encode()?;
            std::fs::create_dir_all(video_dir)?;
            let path = recording_path(video_dir, test_name);
            std::fs::write(&path, data)?;
            debug!(path = %path.display(), frames = self.frame_count(), "recording saved");
            Ok(Some(path))
        }

        /// Like [`SessionRecorder::save`] but never fails the caller
        pub fn finish(&self, video_dir: &Path, test_name: &str) -> Option<PathBuf> {
            match self.save(video_dir, test_name) {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, test = test_name, "recording not saved");
                    None
                }
            }
        }
    }
}

#[cfg(not(feature = "media"))]
mod noop_session {
    use super::RecordingConfig;
    use crate::driver::Screenshot;
    use crate::result::StoreResult;
    use std::path::{Path, PathBuf};

    /// Recorder stand-in when the `media` feature is disabled
    #[derive(Debug, Clone, Default)]
    pub struct SessionRecorder {
        config: RecordingConfig,
    }

    impl SessionRecorder {
        /// Create a recorder that records nothing
        #[must_use]
        pub fn new(config: RecordingConfig) -> Self {
            Self { config }
        }

        /// Get the recording configuration
        #[must_use]
        pub const fn config(&self) -> &RecordingConfig {
            &self.config
        }

        /// Always zero
        #[must_use]
        pub fn frame_count(&self) -> usize {
            0
        }

        /// Ignore the screenshot
        pub fn capture(&self, _screenshot: &Screenshot) -> StoreResult<()> {
            Ok(())
        }

        /// Nothing is ever saved
        pub fn save(&self, _video_dir: &Path, _test_name: &str) -> StoreResult<Option<PathBuf>> {
            Ok(None)
        }

        /// Nothing is ever saved
        pub fn finish(&self, _video_dir: &Path, _test_name: &str) -> Option<PathBuf> {
            None
        }
    }
}

#[cfg(feature = "media")]
pub use gif_session::SessionRecorder;

#[cfg(not(feature = "media"))]
pub use noop_session::SessionRecorder;

/// Feed a screenshot to the recorder, logging instead of failing
pub fn record_frame(recorder: &SessionRecorder, screenshot: &Screenshot) {
    if let Err(e) = recorder.capture(screenshot) {
        tracing::warn!(error = %e, "frame dropped from recording");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod config_tests {
        use super::*;

        #[test]
        fn test_default_config() {
            let config = RecordingConfig::default();
            assert_eq!((config.width, config.height), (960, 540));
            assert_eq!(config.frame_delay_cs, 100);
            assert_eq!(config.loop_count, 0);
        }

        #[test]
        fn test_quality_to_speed() {
            assert_eq!(RecordingConfig::default().with_quality(100).encoder_speed(), 1);
            assert_eq!(RecordingConfig::default().with_quality(1).encoder_speed(), 29);
            assert_eq!(RecordingConfig::default().with_quality(0).quality, 1);
        }

        #[test]
        fn test_recording_path_is_sanitised() {
            let path = recording_path(Path::new("reports/videos"), "complete purchase/flow");
            assert_eq!(path, Path::new("reports/videos/complete_purchase_flow.gif"));
        }
    }

    #[cfg(feature = "media")]
    mod recorder_tests {
        use super::*;
        use crate::driver::BLANK_PNG;

        fn blank() -> Screenshot {
            Screenshot::new(BLANK_PNG.to_vec(), 1, 1)
        }

        #[test]
        fn test_capture_and_encode() {
            let recorder = SessionRecorder::new(RecordingConfig::new(4, 3));
            recorder.capture(&blank()).unwrap();
            recorder.capture(&blank()).unwrap();
            assert_eq!(recorder.frame_count(), 2);

            let gif = recorder.encode().unwrap();
            assert!(gif.starts_with(b"GIF89a"));
        }

        #[test]
        fn test_invalid_png_is_rejected() {
            let recorder = SessionRecorder::new(RecordingConfig::new(4, 3));
            let err = recorder
                .capture(&Screenshot::new(vec![1, 2, 3], 1, 1))
                .unwrap_err();
            assert!(err.to_string().contains("decode"));
            record_frame(&recorder, &Screenshot::new(vec![1], 1, 1));
            assert_eq!(recorder.frame_count(), 0);
        }

        #[test]
        fn test_save_writes_named_gif() {
            let dir = tempfile::tempdir().unwrap();
            let recorder = SessionRecorder::new(RecordingConfig::new(2, 2));
            assert!(recorder.save(dir.path(), "empty").unwrap().is_none());

            recorder.capture(&blank()).unwrap();
            let path = recorder.finish(dir.path(), "user_registration").unwrap();
            assert_eq!(path, dir.path().join("user_registration.gif"));
            assert!(path.exists());
        }

        #[test]
        fn test_clones_share_frames() {
            let recorder = SessionRecorder::new(RecordingConfig::new(2, 2));
            let other = recorder.clone();
            other.capture(&blank()).unwrap();
            assert_eq!(recorder.frame_count(), 1);
        }
    }
}
