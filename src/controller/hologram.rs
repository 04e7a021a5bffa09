use crate::config;
use crate::controller::tween::{lerp_points, TweenClock};
use crate::model::particles::HologramCloud;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Scattering(TweenClock),
    Returning(TweenClock),
}

/// One-shot "burst": the points fall apart towards their scatter pose, then reassemble.
#[derive(Debug, Clone)]
pub struct HologramAnimator {
    phase: Phase,
}

impl Default for HologramAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl HologramAnimator {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn is_animating(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Start the burst. Ignored while one is already running.
    pub fn trigger(&mut self) -> bool {
        if self.is_animating() {
            return false;
        }
        self.phase = Phase::Scattering(TweenClock::new(config::HOLOGRAM_SCATTER_SECS));
        true
    }

    /// Advance by `dt` seconds. Returns true when point positions changed.
    pub fn update(&mut self, dt: f32, cloud: &mut HologramCloud) -> bool {
        match &mut self.phase {
            Phase::Idle => false,
            Phase::Scattering(clock) => {
                let t = clock.advance(dt);
                lerp_points(&cloud.original, &cloud.scatter, t, &mut cloud.current);
                if clock.is_finished() {
                    self.phase = Phase::Returning(TweenClock::new(config::HOLOGRAM_RETURN_SECS));
                }
                true
            }
            Phase::Returning(clock) => {
                let t = clock.advance(dt);
                lerp_points(&cloud.scatter, &cloud.original, t, &mut cloud.current);
                if clock.is_finished() {
                    tracing::debug!("hologram reassembled");
                    self.phase = Phase::Idle;
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn cloud() -> HologramCloud {
        HologramCloud {
            original: vec![Vec3::ZERO, Vec3::ONE],
            scatter: vec![Vec3::new(0.0, -100.0, 0.0), Vec3::new(3.0, -50.0, 1.0)],
            current: vec![Vec3::ZERO, Vec3::ONE],
        }
    }

    #[test]
    fn scatters_then_returns() {
        let mut anim = HologramAnimator::new();
        let mut cloud = cloud();
        assert!(!anim.update(0.5, &mut cloud));

        assert!(anim.trigger());
        anim.update(1.0, &mut cloud);
        assert!(cloud.current[0].y < 0.0 && cloud.current[0].y > -100.0);

        anim.update(1.0, &mut cloud);
        assert_eq!(cloud.current, cloud.scatter);
        assert!(anim.is_animating());

        anim.update(1.0, &mut cloud);
        assert_eq!(cloud.current, cloud.original);
        assert!(!anim.is_animating());
    }

    #[test]
    fn retrigger_while_running_is_ignored() {
        let mut anim = HologramAnimator::new();
        let mut cloud = cloud();
        assert!(anim.trigger());
        anim.update(1.5, &mut cloud);
        let before = cloud.current.clone();
        assert!(!anim.trigger());
        // still on the original schedule: 0.5 s later the scatter pose is reached
        anim.update(0.5, &mut cloud);
        assert_ne!(cloud.current, before);
        assert_eq!(cloud.current, cloud.scatter);
    }

    #[test]
    fn can_run_again_after_finishing() {
        let mut anim = HologramAnimator::new();
        let mut cloud = cloud();
        anim.trigger();
        anim.update(2.0, &mut cloud);
        anim.update(1.0, &mut cloud);
        assert!(anim.trigger());
    }
}
