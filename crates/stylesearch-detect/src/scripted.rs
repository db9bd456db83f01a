//! Deterministic detector for tests: replays pre-built region lists.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use image::DynamicImage;

use stylesearch_core::traits::Detector;
use stylesearch_core::types::DetectedRegion;

/// Replays queued outcomes in order, then falls back to a fixed default
/// (empty unless one is supplied).
pub struct ScriptedDetector {
    queue: Mutex<VecDeque<Vec<DetectedRegion>>>,
    default: Vec<DetectedRegion>,
}

impl ScriptedDetector {
    /// Always returns `regions`, for every call.
    pub fn fixed(regions: Vec<DetectedRegion>) -> Self {
        Self { queue: Mutex::new(VecDeque::new()), default: regions }
    }

    /// Returns each queued outcome once, in order, then empty results.
    pub fn sequence(outcomes: Vec<Vec<DetectedRegion>>) -> Self {
        Self { queue: Mutex::new(outcomes.into()), default: Vec::new() }
    }
}

impl Detector for ScriptedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<DetectedRegion>> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| anyhow::anyhow!("scripted detector lock poisoned"))?;
        Ok(queue.pop_front().unwrap_or_else(|| self.default.clone()))
    }
}

/// Always fails, for exercising degraded paths.
pub struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<DetectedRegion>> {
        anyhow::bail!("detector unavailable")
    }
}
