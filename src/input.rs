use log::debug;

use crate::effects::EffectMode;
use crate::panel::PanelValues;

/// Speed change per arrow key press.
pub const SPEED_STEP: f32 = 0.1;
/// Distortion change per arrow key press.
pub const DISTORTION_STEP: f32 = 0.05;

/// A bound keyboard key, as mapped from the platform's physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Digit(u8),
}

/// Bound keys other than digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// A panel edit triggered from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    Select(EffectMode),
    CycleMode,
    AdjustSpeed(f32),
    AdjustDistortion(f32),
}

impl PanelCommand {
    pub fn apply(self, values: &mut PanelValues) {
        match self {
            Self::Select(mode) => values.effect_mode = mode,
            Self::CycleMode => values.effect_mode = values.effect_mode.next(),
            Self::AdjustSpeed(step) => {
                if let Some(speed) = values.nudge_speed(step) {
                    debug!("{} speed {speed:.2}", values.effect_mode);
                }
            }
            Self::AdjustDistortion(step) => {
                let distortion = values.nudge_distortion(step);
                debug!("slime distortion {distortion:.2}");
            }
        }
    }
}

/// Keyboard bindings: `1`-`4` pick a mode, `Tab` cycles, up/down change
/// speed, right/left change slime distortion.
pub fn command_for_key(key: KeyCode) -> Option<PanelCommand> {
    Some(match key {
        KeyCode::Digit(digit @ 1..=4) => {
            PanelCommand::Select(EffectMode::ALL[digit as usize - 1])
        }
        KeyCode::Named(NamedKey::Tab) => PanelCommand::CycleMode,
        KeyCode::Named(NamedKey::Up) => PanelCommand::AdjustSpeed(SPEED_STEP),
        KeyCode::Named(NamedKey::Down) => PanelCommand::AdjustSpeed(-SPEED_STEP),
        KeyCode::Named(NamedKey::Right) => PanelCommand::AdjustDistortion(DISTORTION_STEP),
        KeyCode::Named(NamedKey::Left) => PanelCommand::AdjustDistortion(-DISTORTION_STEP),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_select_modes() {
        assert_eq!(
            command_for_key(KeyCode::Digit(2)),
            Some(PanelCommand::Select(EffectMode::BlackHole))
        );
        assert_eq!(command_for_key(KeyCode::Digit(5)), None);
        assert_eq!(command_for_key(KeyCode::Digit(0)), None);
    }

    #[test]
    fn commands_edit_panel_values() {
        let mut values = PanelValues::default();
        PanelCommand::Select(EffectMode::Slime).apply(&mut values);
        PanelCommand::AdjustSpeed(SPEED_STEP).apply(&mut values);
        PanelCommand::AdjustDistortion(-DISTORTION_STEP).apply(&mut values);
        assert_eq!(values.effect_mode, EffectMode::Slime);
        assert!((values.slime.speed - 1.1).abs() < 1e-6);
        assert!((values.slime.distortion - 0.25).abs() < 1e-6);

        PanelCommand::CycleMode.apply(&mut values);
        assert_eq!(values.effect_mode, EffectMode::Normal);
    }
}
