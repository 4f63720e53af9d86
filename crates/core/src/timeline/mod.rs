use std::time::Duration;

pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Frame clock for the shell's render loop.
#[derive(Debug, Clone)]
pub struct Ticker {
    target_fps: u32,
    elapsed: Duration,
    frame_count: u64,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_FPS)
    }
}

impl Ticker {
    /// A target of zero frames per second is treated as one.
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps: target_fps.max(1),
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Records one frame that took `delta` and returns the new frame number.
    pub fn advance(&mut self, delta: Duration) -> u64 {
        self.elapsed += delta;
        self.frame_count += 1;
        self.frame_count
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_and_resets() {
        let mut ticker = Ticker::new(50);
        assert_eq!(ticker.frame_interval(), Duration::from_millis(20));

        ticker.advance(ticker.frame_interval());
        assert_eq!(ticker.advance(Duration::from_millis(30)), 2);
        assert_eq!(ticker.elapsed(), Duration::from_millis(50));

        ticker.reset();
        assert_eq!(ticker.frame_count(), 0);
        assert_eq!(ticker.elapsed(), Duration::ZERO);
    }

    #[test]
    fn clamps_zero_fps() {
        assert_eq!(Ticker::new(0).target_fps(), 1);
    }
}
