//! Fixed timestep simulation tick
//!
//! Advances one level by one tick. Gravity, the jump impulse and the walk
//! step are all expressed per tick, so the caller is responsible for
//! running ticks at `SIM_DT`.

use super::collision::{Ray, intersects_any};
use super::level::Level;
use crate::consts::*;

/// What happened during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The ground ray touched an object
    pub on_object: bool,
    /// The player fell out of the world and was put back
    pub reset: bool,
}

/// Advance a level by one fixed timestep
pub fn tick(level: &mut Level) -> TickReport {
    // Ground sensor from the eye straight down
    let ray = Ray::downward(level.player.position, GROUND_RAY_LENGTH);
    let on_object = intersects_any(&ray, level.colliders());

    // Constant gravity (per tick, not per second)
    level.fall -= level.fall_speed;

    let movement = level.movement;
    if movement.forward {
        level.player.move_forward(MOVE_STEP);
    }
    if movement.backward {
        level.player.move_forward(-MOVE_STEP);
    }
    if movement.left {
        level.player.move_right(-MOVE_STEP);
    }
    if movement.right {
        level.player.move_right(MOVE_STEP);
    }

    if on_object {
        // Stop sinking, but keep a jump that is still rising
        level.fall = level.fall.max(0.0);
        level.can_jump = true;
        level.readout = Some(level.height_readout());
    } else {
        // No double jumps
        level.can_jump = false;
    }

    level.player.position.y += level.fall;

    let reset = level.player.position.y < FALL_FLOOR;
    if reset {
        level.reset();
    }

    TickReport { on_object, reset }
}
