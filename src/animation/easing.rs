use std::time::Duration;

use crate::traits::Lerp;

/// Convenience functions for common animations
pub fn ease_out_cubic(t: f64) -> f64 {
    EasingType::EaseOut.apply(t)
}

/// Easing curves for view transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EasingType {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Smooth,
}

impl EasingType {
    /// Apply easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::Linear => t,
            EasingType::EaseIn => t * t * t,
            EasingType::EaseOut => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
            EasingType::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            // Smooth step (3t^2 - 2t^3)
            EasingType::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Time-driven zoom transition between two zoom levels
#[derive(Debug, Clone)]
pub struct ZoomAnimation {
    from_zoom: f64,
    to_zoom: f64,
    duration: Duration,
    elapsed: Duration,
    easing: EasingType,
}

impl ZoomAnimation {
    pub fn new(from_zoom: f64, to_zoom: f64, duration: Duration) -> Self {
        Self::with_easing(from_zoom, to_zoom, duration, EasingType::EaseOut)
    }

    pub fn with_easing(
        from_zoom: f64,
        to_zoom: f64,
        duration: Duration,
        easing: EasingType,
    ) -> Self {
        Self {
            from_zoom,
            to_zoom,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    pub fn target_zoom(&self) -> f64 {
        self.to_zoom
    }

    /// Normalized progress in [0, 1]; zero-length animations are complete
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Zoom level at the current progress
    pub fn current_zoom(&self) -> f64 {
        self.from_zoom
            .lerp(&self.to_zoom, self.easing.apply(self.progress()))
    }

    /// Advance by `dt` and return the zoom level to display
    pub fn advance(&mut self, dt: Duration) -> f64 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.current_zoom()
    }
}
