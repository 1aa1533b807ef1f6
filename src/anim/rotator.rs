use crate::rng::Random;

const MIN_SPEED: f32 = 1.0;
const MAX_SPEED: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Continuous spin, degrees per frame on each axis.
    FreeSpin { velocity: [f32; 3] },
    /// Timed blend towards `end`. Stays parked on `end` once `frame == duration`.
    TurnTo {
        start: [f32; 3],
        end: [f32; 3],
        frame: u32,
        duration: u32,
    },
}

/// Three-axis rotation state in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotator {
    angles: [f32; 3],
    motion: Motion,
}

impl Rotator {
    /// Random start orientation and a random spin.
    pub fn new(rng: &mut Random) -> Self {
        let angles = [
            rng.random(0.0, 360.0),
            rng.random(0.0, 360.0),
            rng.random(0.0, 360.0),
        ];
        let mut r = Self::spinning(angles, [0.0; 3]);
        r.change(rng);
        r
    }

    pub fn spinning(angles: [f32; 3], velocity: [f32; 3]) -> Self {
        Self {
            angles: angles.map(wrap_degrees),
            motion: Motion::FreeSpin { velocity },
        }
    }

    pub fn angles(&self) -> [f32; 3] {
        self.angles
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn is_turning(&self) -> bool {
        matches!(self.motion, Motion::TurnTo { .. })
    }

    /// True once a turn has reached its target. Free spin never finishes.
    pub fn turn_done(&self) -> bool {
        matches!(self.motion, Motion::TurnTo { frame, duration, .. } if frame == duration)
    }

    /// Drops any running turn and picks a fresh random spin.
    pub fn change(&mut self, rng: &mut Random) {
        let mut velocity = [0.0f32; 3];
        for v in &mut velocity {
            *v = rng.random(MIN_SPEED, MAX_SPEED) * rng.sign();
        }
        self.angles = self.angles.map(wrap_degrees);
        self.motion = Motion::FreeSpin { velocity };
    }

    pub fn set_velocity(&mut self, velocity: [f32; 3]) {
        self.motion = Motion::FreeSpin { velocity };
    }

    /// Turns to `target` over exactly `frames` updates, then holds there.
    pub fn turn_to(&mut self, target: [f32; 3], frames: u32) {
        self.motion = Motion::TurnTo {
            start: self.angles,
            end: target.map(wrap_degrees),
            frame: 0,
            duration: frames.max(1),
        };
    }

    pub fn update(&mut self) {
        match &mut self.motion {
            Motion::FreeSpin { velocity } => {
                for (a, v) in self.angles.iter_mut().zip(velocity.iter()) {
                    *a = wrap_degrees(*a + *v);
                }
            }
            Motion::TurnTo {
                start,
                end,
                frame,
                duration,
            } => {
                if *frame >= *duration {
                    return;
                }
                *frame += 1;
                if *frame == *duration {
                    self.angles = *end;
                } else {
                    let t = *frame as f32 / *duration as f32;
                    for i in 0..3 {
                        self.angles[i] = wrap_degrees(start[i] + (end[i] - start[i]) * t);
                    }
                }
            }
        }
    }

    /// Row-major rotation matrix, applied X then Y then Z.
    pub fn matrix(&self) -> [[f32; 3]; 3] {
        let [ax, ay, az] = self.angles.map(f32::to_radians);
        let (sx, cx) = ax.sin_cos();
        let (sy, cy) = ay.sin_cos();
        let (sz, cz) = az.sin_cos();
        [
            [cy * cz, sx * sy * cz - cx * sz, cx * sy * cz + sx * sz],
            [cy * sz, sx * sy * sz + cx * cz, cx * sy * sz - sx * cz],
            [-sy, sx * cy, cx * cy],
        ]
    }

    pub fn rotate(&self, v: [f32; 3]) -> [f32; 3] {
        apply(&self.matrix(), v)
    }
}

pub fn apply(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn wrap_degrees(a: f32) -> f32 {
    let w = a.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if w >= 360.0 { 0.0 } else { w }
}
