//! Keyboard mapping and movement intent
//!
//! Keys set and clear held flags on a level; the tick reads them. Jump is
//! applied immediately on key-down rather than queued.

use super::level::Level;

/// Game actions bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

impl Key {
    /// Map a `KeyboardEvent.code` value
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" | "KeyW" => Some(Key::Forward),
            "ArrowDown" | "KeyS" => Some(Key::Backward),
            "ArrowLeft" | "KeyA" => Some(Key::Left),
            "ArrowRight" | "KeyD" => Some(Key::Right),
            "Space" => Some(Key::Jump),
            _ => None,
        }
    }
}

/// Key pressed
pub fn key_down(level: &mut Level, key: Key) {
    match key {
        Key::Forward => level.movement.forward = true,
        Key::Backward => level.movement.backward = true,
        Key::Left => level.movement.left = true,
        Key::Right => level.movement.right = true,
        Key::Jump => {
            jump(level);
        }
    }
}

/// Key released (releasing jump does nothing)
pub fn key_up(level: &mut Level, key: Key) {
    match key {
        Key::Forward => level.movement.forward = false,
        Key::Backward => level.movement.backward = false,
        Key::Left => level.movement.left = false,
        Key::Right => level.movement.right = false,
        Key::Jump => {}
    }
}

/// Launch upward if standing on something. Returns whether a jump happened.
pub fn jump(level: &mut Level) -> bool {
    if !level.can_jump {
        return false;
    }
    level.fall = level.jump_speed;
    level.can_jump = false;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LevelConfig;
    use crate::sim::level::LevelId;

    fn level() -> Level {
        Level::new(LevelId::One, &LevelConfig::level_one())
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("KeyW"), Some(Key::Forward));
        assert_eq!(Key::from_code("ArrowUp"), Some(Key::Forward));
        assert_eq!(Key::from_code("KeyA"), Some(Key::Left));
        assert_eq!(Key::from_code("ArrowDown"), Some(Key::Backward));
        assert_eq!(Key::from_code("KeyD"), Some(Key::Right));
        assert_eq!(Key::from_code("Space"), Some(Key::Jump));
        assert_eq!(Key::from_code("KeyQ"), None);
    }

    #[test]
    fn test_flags_follow_held_keys() {
        let mut level = level();
        key_down(&mut level, Key::Forward);
        key_down(&mut level, Key::Left);
        assert!(level.movement.forward && level.movement.left);
        key_up(&mut level, Key::Forward);
        assert!(!level.movement.forward);
        assert!(level.movement.left);
    }

    #[test]
    fn test_jump_sets_exact_impulse_regardless_of_velocity() {
        for start in [-2.0, 0.0, 0.4] {
            let mut level = level();
            level.can_jump = true;
            level.fall = start;
            key_down(&mut level, Key::Jump);
            assert_eq!(level.fall, level.jump_speed);
            assert!(!level.can_jump);
        }
    }

    #[test]
    fn test_no_jump_while_airborne() {
        let mut level = level();
        level.can_jump = false;
        level.fall = -0.3;
        assert!(!jump(&mut level));
        assert_eq!(level.fall, -0.3);
    }
}
