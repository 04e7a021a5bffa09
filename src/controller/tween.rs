use glam::Vec3;

/// Quadratic ease-out, `1 - (1 - t)^2`, used by every tween.
pub fn power1_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Elapsed-time bookkeeping shared by every tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenClock {
    elapsed: f32,
    duration: f32,
}

impl TweenClock {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    /// Move the clock forward and return the eased progress.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.eased()
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }

    pub fn eased(&self) -> f32 {
        power1_out(self.progress())
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3Tween {
    pub from: Vec3,
    pub to: Vec3,
    clock: TweenClock,
}

impl Vec3Tween {
    pub fn new(from: Vec3, to: Vec3, duration: f32) -> Self {
        Self { from, to, clock: TweenClock::new(duration) }
    }

    pub fn advance(&mut self, dt: f32) -> Vec3 {
        let t = self.clock.advance(dt);
        self.from.lerp(self.to, t)
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }
}

/// Interpolate a flat list of points towards `to`, writing into `out`.
pub fn lerp_points(from: &[Vec3], to: &[Vec3], t: f32, out: &mut [Vec3]) {
    for ((o, a), b) in out.iter_mut().zip(from).zip(to) {
        *o = a.lerp(*b, t);
    }
}
