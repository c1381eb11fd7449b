//! # Replay detection source
//!
//! Plays back a recorded detection stream. The stream is a JSON lines file with one frame per
//! line:
//!
//! ```text
//! {"frame": {"width": 1280, "height": 720}, "detections": [{"class_id": 1, "confidence": 0.9, "bbox": {"left": 600, "top": 100, "right": 700, "bottom": 500}}]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. The end of the file is the end of the
//! stream.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use comms_if::eqpt::det::{DetFrame, Detection};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{DetSource, DetSourceError, DetectConfig};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One line of a recorded detection stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: DetFrame,

    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Detection source reading a recorded stream.
pub struct ReplaySource<R> {
    reader: R,
    config: DetectConfig,

    /// Number of the last line read, starting at 1
    line_num: usize,

    /// Detections of the last captured frame, not yet handed out
    pending: Option<Vec<Detection>>,

    streaming: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReplaySource<BufReader<File>> {
    /// Open a recorded stream file.
    pub fn open<P: AsRef<Path>>(path: P, config: DetectConfig) -> Result<Self, DetSourceError> {
        let file = File::open(path.as_ref())
            .map_err(|e| DetSourceError::OpenError(path.as_ref().to_path_buf(), e))?;

        info!("Replaying detection stream from {:?}", path.as_ref());

        Self::from_reader(BufReader::new(file), config)
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R, config: DetectConfig) -> Result<Self, DetSourceError> {
        config.validate()?;

        info!(
            "Detection network: {}, threshold: {}, overlay: {}",
            config.network, config.threshold, config.overlay
        );

        Ok(Self {
            reader,
            config,
            line_num: 0,
            pending: None,
            streaming: true,
        })
    }

    /// Read the next frame record, or `None` at the end of the file.
    fn next_record(&mut self) -> Result<Option<FrameRecord>, DetSourceError> {
        let mut line = String::new();

        loop {
            line.clear();

            let n = self
                .reader
                .read_line(&mut line)
                .map_err(DetSourceError::ReadError)?;
            if n == 0 {
                return Ok(None);
            }
            self.line_num += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|e| DetSourceError::ParseError(self.line_num, e));
        }
    }
}

impl<R: BufRead> DetSource for ReplaySource<R> {
    fn capture(&mut self) -> Result<Option<DetFrame>, DetSourceError> {
        if !self.streaming {
            return Ok(None);
        }

        match self.next_record()? {
            Some(rec) => {
                self.pending = Some(rec.detections);
                Ok(Some(rec.frame))
            }
            None => {
                debug!("End of detection stream after {} lines", self.line_num);
                self.streaming = false;
                self.pending = None;
                Ok(None)
            }
        }
    }

    fn detect(&mut self, _frame: &DetFrame) -> Result<Vec<Detection>, DetSourceError> {
        let detections = self.pending.take().ok_or(DetSourceError::NoFrameCaptured)?;
        let threshold = self.config.threshold;

        Ok(detections
            .into_iter()
            .filter(|d| d.confidence >= threshold)
            .collect())
    }

    fn is_streaming(&self) -> bool {
        self.streaming
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
