use crate::registry::ViewerRegistry;

/// Counters for one scheduler pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub dt: f32,
    pub drawn: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drives every visible viewer once per display frame.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    last_frame: Option<f64>,
    frames: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// `now` is in seconds on a monotonic clock. Hidden viewers are skipped
    /// without any state change.
    pub fn frame(&mut self, now: f64, registry: &mut ViewerRegistry) -> FrameStats {
        let dt = self
            .last_frame
            .map(|last| (now - last).max(0.0) as f32)
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.frames += 1;

        let mut stats = FrameStats {
            dt,
            ..FrameStats::default()
        };
        for viewer in registry.iter_mut() {
            if !viewer.is_visible() {
                stats.skipped += 1;
                continue;
            }
            viewer.poll_resume(now);
            viewer.advance_stars(dt);
            viewer.advance_mixer(dt);
            viewer.advance_auto_rotate(dt);
            viewer.run_tickers(dt);
            viewer.update_controls();
            match viewer.draw() {
                Ok(()) => stats.drawn += 1,
                Err(e) => {
                    stats.failed += 1;
                    if viewer.render_failures() == 1 {
                        log::error!("[panel3d] viewer {} render failed: {}", viewer.id().0, e);
                    } else {
                        log::debug!("[panel3d] viewer {} render failed: {}", viewer.id().0, e);
                    }
                }
            }
        }
        stats
    }
}
