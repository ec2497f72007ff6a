//! tasrig Reference Simulation
//!
//! A small deterministic world standing in for the game engine the harness
//! normally drives. One avatar moves on a flat floor under the control of a
//! single pad: the stick sets horizontal velocity, A jumps, B dashes and the
//! Z trigger crouches. The run is won once the avatar is far enough from
//! where it started.
//!
//! # Constraints
//!
//! The simulation MUST NOT:
//! - Perform I/O operations
//! - Read wall-clock time
//! - Use ambient/unseeded randomness
//! - Depend on frame rate or variable delta time
//!
//! All arithmetic uses constants that are exact in `f32`, so positions are
//! reproducible bit for bit.

#![deny(unsafe_code)]

use tasrig_wire::{Frame, Pad, buttons};

// ============================================================================
// Movement Constants (per frame)
// ============================================================================

/// Horizontal speed per unit of stick deflection.
pub const RUN_SPEED: f32 = 0.25;

/// Vertical velocity applied on the frame a jump starts.
pub const JUMP_VELOCITY: f32 = 16.0;

/// Vertical acceleration applied every frame.
pub const GRAVITY: f32 = -2.0;

/// Height of the floor plane.
pub const FLOOR_Y: f32 = 0.0;

/// Horizontal speed multiplier while B is held.
pub const DASH_FACTOR: f32 = 2.0;

/// Horizontal speed multiplier while Z is held.
pub const CROUCH_FACTOR: f32 = 0.5;

/// Default horizontal distance from the origin that wins the run.
pub const GOAL_DISTANCE: f32 = 4000.0;

// ============================================================================
// StateDigest
// ============================================================================

/// FNV-1a 64-bit offset basis.
const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
const FNV1A_PRIME: u64 = 0x100000001b3;

#[derive(Debug, Clone)]
struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn finish(self) -> u64 {
        self.state
    }
}

/// Canonicalize an f32 for hashing: `-0.0` → `+0.0`, any NaN → quiet NaN.
fn canonicalize_f32(value: f32) -> u32 {
    const QUIET_NAN_BITS: u32 = 0x7fc0_0000;

    if value.is_nan() {
        QUIET_NAN_BITS
    } else if value == 0.0 {
        0u32
    } else {
        value.to_bits()
    }
}

/// Fold a coordinate into a reseed word: truncate toward zero, keep the
/// two's complement bits.
fn entropy_word(value: f32) -> u32 {
    value as i32 as u32
}

// ============================================================================
// World
// ============================================================================

/// Post-step state after a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Frames advanced so far.
    pub frame: Frame,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub digest: u64,
}

/// Single-avatar world. Axis 1 is vertical.
#[derive(Debug, Clone)]
pub struct World {
    frame: Frame,
    position: [f32; 3],
    velocity: [f32; 3],
    on_ground: bool,
    /// A must be released between jumps.
    jump_latched: bool,
    goal_distance: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::with_goal(GOAL_DISTANCE)
    }

    /// World won once the avatar is `goal_distance` away from the origin on
    /// the floor plane.
    pub fn with_goal(goal_distance: f32) -> Self {
        Self {
            frame: 0,
            position: [0.0, FLOOR_Y, 0.0],
            velocity: [0.0; 3],
            on_ground: true,
            jump_latched: false,
            goal_distance,
        }
    }

    pub fn goal_distance(&self) -> f32 {
        self.goal_distance
    }

    pub fn reached_goal(&self) -> bool {
        let [x, _, z] = self.position;
        x * x + z * z >= self.goal_distance * self.goal_distance
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn velocity(&self) -> [f32; 3] {
        self.velocity
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Advance one frame with `pad` applied.
    pub fn advance(&mut self, pad: &Pad) -> Snapshot {
        let mut factor = 1.0;
        if pad.is_held(buttons::B_BUTTON) {
            factor *= DASH_FACTOR;
        }
        if pad.is_held(buttons::Z_TRIG) {
            factor *= CROUCH_FACTOR;
        }

        // Stick up moves away from the camera (negative z).
        self.velocity[0] = f32::from(pad.stick_x) * RUN_SPEED * factor;
        self.velocity[2] = -f32::from(pad.stick_y) * RUN_SPEED * factor;

        let jump_held = pad.is_held(buttons::A_BUTTON);
        if jump_held && self.on_ground && !self.jump_latched {
            self.velocity[1] = JUMP_VELOCITY;
            self.on_ground = false;
        }
        self.jump_latched = jump_held;

        if !self.on_ground {
            self.velocity[1] += GRAVITY;
        }

        for axis in 0..3 {
            self.position[axis] += self.velocity[axis];
        }

        if self.position[1] <= FLOOR_Y {
            self.position[1] = FLOOR_Y;
            self.velocity[1] = 0.0;
            self.on_ground = true;
        }

        self.frame += 1;

        Snapshot {
            frame: self.frame,
            position: self.position,
            velocity: self.velocity,
            digest: self.state_digest(),
        }
    }

    /// Position then velocity components as reseed words, in the order the
    /// driver feeds them to the PRNG.
    pub fn entropy_words(&self) -> [u32; 6] {
        [
            entropy_word(self.position[0]),
            entropy_word(self.position[1]),
            entropy_word(self.position[2]),
            entropy_word(self.velocity[0]),
            entropy_word(self.velocity[1]),
            entropy_word(self.velocity[2]),
        ]
    }

    /// FNV-1a 64 over frame, position and velocity (little-endian,
    /// canonicalized floats).
    pub fn state_digest(&self) -> u64 {
        let mut hasher = Fnv1a64::new();
        hasher.update(&self.frame.to_le_bytes());
        for value in self.position.iter().chain(self.velocity.iter()) {
            hasher.update(&canonicalize_f32(*value).to_le_bytes());
        }
        hasher.finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
