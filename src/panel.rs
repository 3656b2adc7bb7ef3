//! Parameter panel: control schema, current values and the shared store the
//! input handlers write into and the frame loop reads from.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::color::{ColorError, Rgb};
use crate::effects::{BlackHoleParams, EffectMode, HurricaneParams, SlimeParams, UnknownEffectMode};

pub const SPEED_RANGE: (f32, f32) = (0.0, 5.0);
pub const DISTORTION_RANGE: (f32, f32) = (0.0, 1.0);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("unknown panel folder `{0}`")]
    UnknownFolder(String),
    #[error("folder `{folder}` has no control `{key}`")]
    UnknownKey { folder: Folder, key: String },
    #[error("`{value}` is not a number (control `{key}`)")]
    InvalidNumber { key: &'static str, value: String },
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    EffectMode(#[from] UnknownEffectMode),
}

/// A titled group of controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    Orb,
    BlackHole,
    Hurricane,
    Slime,
}

impl Folder {
    pub const ALL: [Self; 4] = [Self::Orb, Self::BlackHole, Self::Hurricane, Self::Slime];

    pub fn id(self) -> &'static str {
        match self {
            Self::Orb => "orb",
            Self::BlackHole => "blackHole",
            Self::Hurricane => "hurricane",
            Self::Slime => "slime",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Orb => "Orb Settings",
            Self::BlackHole => "Black Hole",
            Self::Hurricane => "Hurricane",
            Self::Slime => "Slime",
        }
    }

    /// Folder holding the controls of an effect, if it has any.
    pub fn for_mode(mode: EffectMode) -> Option<Self> {
        match mode {
            EffectMode::Normal => None,
            EffectMode::BlackHole => Some(Self::BlackHole),
            EffectMode::Hurricane => Some(Self::Hurricane),
            EffectMode::Slime => Some(Self::Slime),
        }
    }

    pub fn controls(self) -> &'static [ControlSpec] {
        match self {
            Self::Orb => ORB_CONTROLS,
            Self::BlackHole => BLACK_HOLE_CONTROLS,
            Self::Hurricane => HURRICANE_CONTROLS,
            Self::Slime => SLIME_CONTROLS,
        }
    }
}

impl FromStr for Folder {
    type Err = ParameterError;

    /// Accepts folder ids and titles.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|folder| folder.id() == s || folder.title().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParameterError::UnknownFolder(s.to_string()))
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Select(&'static [&'static str]),
    Color,
    Number { min: f32, max: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub key: &'static str,
    pub kind: ControlKind,
}

const MODE_OPTIONS: &[&str] = &["Normal", "Black Hole", "Hurricane", "Slime"];

const SPEED: ControlSpec = ControlSpec {
    key: "speed",
    kind: ControlKind::Number {
        min: SPEED_RANGE.0,
        max: SPEED_RANGE.1,
    },
};

const ORB_CONTROLS: &[ControlSpec] = &[ControlSpec {
    key: "effectMode",
    kind: ControlKind::Select(MODE_OPTIONS),
}];

const BLACK_HOLE_CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        key: "innerColor",
        kind: ControlKind::Color,
    },
    ControlSpec {
        key: "outerColor",
        kind: ControlKind::Color,
    },
    SPEED,
];

const HURRICANE_CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        key: "highColor",
        kind: ControlKind::Color,
    },
    ControlSpec {
        key: "lowColor",
        kind: ControlKind::Color,
    },
    SPEED,
];

const SLIME_CONTROLS: &[ControlSpec] = &[
    ControlSpec {
        key: "color",
        kind: ControlKind::Color,
    },
    ControlSpec {
        key: "rimColor",
        kind: ControlKind::Color,
    },
    SPEED,
    ControlSpec {
        key: "distortion",
        kind: ControlKind::Number {
            min: DISTORTION_RANGE.0,
            max: DISTORTION_RANGE.1,
        },
    },
];

/// Controls shown while `mode` is active: the orb folder followed by the
/// active effect's folder.
pub fn schema(mode: EffectMode) -> Vec<(Folder, ControlSpec)> {
    std::iter::once(Folder::Orb)
        .chain(Folder::for_mode(mode))
        .flat_map(|folder| folder.controls().iter().map(move |spec| (folder, *spec)))
        .collect()
}

fn find_control(folder: Folder, key: &str) -> Result<ControlSpec, ParameterError> {
    folder
        .controls()
        .iter()
        .find(|spec| spec.key == key.trim())
        .copied()
        .ok_or_else(|| ParameterError::UnknownKey {
            folder,
            key: key.trim().to_string(),
        })
}

/// Every value the panel holds. Effect blocks keep their values while the
/// effect is not mounted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelValues {
    pub effect_mode: EffectMode,
    pub black_hole: BlackHoleParams,
    pub hurricane: HurricaneParams,
    pub slime: SlimeParams,
}

impl PanelValues {
    /// Parses `value` and stores it. Numbers are clamped into the control's
    /// range.
    pub fn set(&mut self, folder: Folder, key: &str, value: &str) -> Result<(), ParameterError> {
        let spec = find_control(folder, key)?;
        let value = value.trim();
        match spec.kind {
            ControlKind::Select(_) => {
                self.effect_mode = value.parse()?;
            }
            ControlKind::Color => {
                let color: Rgb = value.parse()?;
                *self.color_mut(folder, spec.key)? = color;
            }
            ControlKind::Number { min, max } => {
                let number = value
                    .parse::<f32>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| ParameterError::InvalidNumber {
                        key: spec.key,
                        value: value.to_string(),
                    })?;
                *self.number_mut(folder, spec.key)? = number.clamp(min, max);
            }
        }
        Ok(())
    }

    /// Current value of a control, formatted the way `set` accepts it.
    pub fn get(&self, folder: Folder, key: &str) -> Result<String, ParameterError> {
        let spec = find_control(folder, key)?;
        Ok(match spec.kind {
            ControlKind::Select(_) => self.effect_mode.to_string(),
            ControlKind::Color => self.color(folder, spec.key)?.to_hex(),
            ControlKind::Number { .. } => self.number(folder, spec.key)?.to_string(),
        })
    }

    /// `(folder, key, value)` for every control currently on screen.
    pub fn describe(&self) -> Vec<(Folder, &'static str, String)> {
        schema(self.effect_mode)
            .into_iter()
            .filter_map(|(folder, spec)| {
                self.get(folder, spec.key)
                    .ok()
                    .map(|value| (folder, spec.key, value))
            })
            .collect()
    }

    /// Speed of the active effect; the plain sphere has none.
    pub fn active_speed_mut(&mut self) -> Option<&mut f32> {
        match self.effect_mode {
            EffectMode::Normal => None,
            EffectMode::BlackHole => Some(&mut self.black_hole.speed),
            EffectMode::Hurricane => Some(&mut self.hurricane.speed),
            EffectMode::Slime => Some(&mut self.slime.speed),
        }
    }

    pub fn nudge_speed(&mut self, step: f32) -> Option<f32> {
        let speed = self.active_speed_mut()?;
        *speed = (*speed + step).clamp(SPEED_RANGE.0, SPEED_RANGE.1);
        Some(*speed)
    }

    pub fn nudge_distortion(&mut self, step: f32) -> f32 {
        let distortion = &mut self.slime.distortion;
        *distortion = (*distortion + step).clamp(DISTORTION_RANGE.0, DISTORTION_RANGE.1);
        *distortion
    }

    fn color(&self, folder: Folder, key: &'static str) -> Result<Rgb, ParameterError> {
        Ok(match (folder, key) {
            (Folder::BlackHole, "innerColor") => self.black_hole.inner_color,
            (Folder::BlackHole, "outerColor") => self.black_hole.outer_color,
            (Folder::Hurricane, "highColor") => self.hurricane.high_color,
            (Folder::Hurricane, "lowColor") => self.hurricane.low_color,
            (Folder::Slime, "color") => self.slime.color,
            (Folder::Slime, "rimColor") => self.slime.rim_color,
            _ => {
                return Err(ParameterError::UnknownKey {
                    folder,
                    key: key.to_string(),
                })
            }
        })
    }

    fn number(&self, folder: Folder, key: &'static str) -> Result<f32, ParameterError> {
        Ok(match (folder, key) {
            (Folder::BlackHole, "speed") => self.black_hole.speed,
            (Folder::Hurricane, "speed") => self.hurricane.speed,
            (Folder::Slime, "speed") => self.slime.speed,
            (Folder::Slime, "distortion") => self.slime.distortion,
            _ => {
                return Err(ParameterError::UnknownKey {
                    folder,
                    key: key.to_string(),
                })
            }
        })
    }

    fn color_mut(&mut self, folder: Folder, key: &'static str) -> Result<&mut Rgb, ParameterError> {
        Ok(match (folder, key) {
            (Folder::BlackHole, "innerColor") => &mut self.black_hole.inner_color,
            (Folder::BlackHole, "outerColor") => &mut self.black_hole.outer_color,
            (Folder::Hurricane, "highColor") => &mut self.hurricane.high_color,
            (Folder::Hurricane, "lowColor") => &mut self.hurricane.low_color,
            (Folder::Slime, "color") => &mut self.slime.color,
            (Folder::Slime, "rimColor") => &mut self.slime.rim_color,
            _ => {
                return Err(ParameterError::UnknownKey {
                    folder,
                    key: key.to_string(),
                })
            }
        })
    }

    fn number_mut(&mut self, folder: Folder, key: &'static str) -> Result<&mut f32, ParameterError> {
        Ok(match (folder, key) {
            (Folder::BlackHole, "speed") => &mut self.black_hole.speed,
            (Folder::Hurricane, "speed") => &mut self.hurricane.speed,
            (Folder::Slime, "speed") => &mut self.slime.speed,
            (Folder::Slime, "distortion") => &mut self.slime.distortion,
            _ => {
                return Err(ParameterError::UnknownKey {
                    folder,
                    key: key.to_string(),
                })
            }
        })
    }
}

/// Panel values shared between input handlers and the frame loop.
#[derive(Debug, Default)]
pub struct ParameterStore {
    values: Arc<RwLock<PanelValues>>,
}

impl Clone for ParameterStore {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

impl ParameterStore {
    pub fn new(values: PanelValues) -> Self {
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }

    /// Copy of the current values, taken once per frame.
    pub fn snapshot(&self) -> PanelValues {
        *self.values.read()
    }

    pub fn update<F, R>(&self, updater: F) -> R
    where
        F: FnOnce(&mut PanelValues) -> R,
    {
        updater(&mut self.values.write())
    }

    pub fn set(&self, folder: Folder, key: &str, value: &str) -> Result<(), ParameterError> {
        self.update(|values| values.set(folder, key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_shows_orb_and_active_folder() {
        let normal = schema(EffectMode::Normal);
        assert_eq!(normal.len(), 1);
        assert_eq!(normal[0].1.key, "effectMode");

        let slime = schema(EffectMode::Slime);
        let keys: Vec<&str> = slime.iter().map(|(_, spec)| spec.key).collect();
        assert_eq!(keys, ["effectMode", "color", "rimColor", "speed", "distortion"]);
        assert!(slime[1..].iter().all(|(folder, _)| *folder == Folder::Slime));
    }

    #[test]
    fn defaults_match_the_panel() {
        let values = PanelValues::default();
        assert_eq!(values.effect_mode, EffectMode::Normal);
        assert_eq!(values.get(Folder::BlackHole, "innerColor").unwrap(), "#ff6600");
        assert_eq!(values.get(Folder::BlackHole, "outerColor").unwrap(), "#000000");
        assert_eq!(values.get(Folder::Hurricane, "highColor").unwrap(), "#ffffff");
        assert_eq!(values.get(Folder::Slime, "color").unwrap(), "#00ff44");
        assert_eq!(values.get(Folder::Slime, "rimColor").unwrap(), "#ccff00");
        assert_eq!(values.get(Folder::Slime, "distortion").unwrap(), "0.3");
        assert_eq!(values.get(Folder::Hurricane, "speed").unwrap(), "1");
    }

    #[test]
    fn set_parses_and_clamps() {
        let mut values = PanelValues::default();
        values.set(Folder::Orb, "effectMode", "Black Hole").unwrap();
        values.set(Folder::BlackHole, "speed", "9").unwrap();
        values.set(Folder::Slime, "distortion", "-1").unwrap();
        values.set(Folder::Hurricane, "lowColor", "#123").unwrap();
        assert_eq!(values.effect_mode, EffectMode::BlackHole);
        assert_eq!(values.black_hole.speed, 5.0);
        assert_eq!(values.slime.distortion, 0.0);
        assert_eq!(values.hurricane.low_color.to_hex(), "#112233");
    }

    #[test]
    fn set_rejects_malformed_input() {
        let mut values = PanelValues::default();
        assert!(matches!(
            values.set(Folder::Slime, "speed", "fast"),
            Err(ParameterError::InvalidNumber { .. })
        ));
        assert!(matches!(
            values.set(Folder::Slime, "speed", "NaN"),
            Err(ParameterError::InvalidNumber { .. })
        ));
        assert!(matches!(
            values.set(Folder::Hurricane, "distortion", "0.5"),
            Err(ParameterError::UnknownKey { .. })
        ));
        assert!(matches!(
            values.set(Folder::Slime, "color", "green"),
            Err(ParameterError::Color(_))
        ));
        assert!(matches!(
            values.set(Folder::Orb, "effectMode", "Tornado"),
            Err(ParameterError::EffectMode(_))
        ));
        assert_eq!(values, PanelValues::default());
    }

    #[test]
    fn folders_parse_from_id_or_title() {
        assert_eq!("blackHole".parse::<Folder>(), Ok(Folder::BlackHole));
        assert_eq!("Orb Settings".parse::<Folder>(), Ok(Folder::Orb));
        assert!("tornado".parse::<Folder>().is_err());
    }

    #[test]
    fn speed_nudges_follow_the_active_effect() {
        let mut values = PanelValues::default();
        assert_eq!(values.nudge_speed(0.1), None);
        values.effect_mode = EffectMode::Hurricane;
        values.hurricane.speed = 4.95;
        assert_eq!(values.nudge_speed(0.1), Some(5.0));
        assert_eq!(values.black_hole.speed, 1.0);
    }

    #[test]
    fn store_clones_share_values() {
        let store = ParameterStore::new(PanelValues::default());
        let writer = store.clone();
        writer.set(Folder::Slime, "speed", "2.5").unwrap();
        assert_eq!(store.snapshot().slime.speed, 2.5);
    }

    #[test]
    fn describe_lists_visible_controls() {
        let mut values = PanelValues::default();
        values.effect_mode = EffectMode::Hurricane;
        let described = values.describe();
        assert_eq!(described[0], (Folder::Orb, "effectMode", "Hurricane".to_string()));
        assert_eq!(described[2], (Folder::Hurricane, "lowColor", "#0044aa".to_string()));
    }

    #[test]
    fn get_reads_back_every_control_set_writes() {
        for mode in EffectMode::ALL {
            let mut values = PanelValues::default();
            values.effect_mode = mode;
            for (folder, spec) in schema(mode) {
                match spec.kind {
                    ControlKind::Select(_) => {
                        assert_eq!(values.get(folder, spec.key).unwrap(), mode.to_string());
                    }
                    ControlKind::Color => {
                        values.set(folder, spec.key, "#123456").unwrap();
                        assert_eq!(values.get(folder, spec.key).unwrap(), "#123456");
                    }
                    ControlKind::Number { min, max } => {
                        let mid = (min + max) / 2.0;
                        values.set(folder, spec.key, &mid.to_string()).unwrap();
                        let read: f32 = values.get(folder, spec.key).unwrap().parse().unwrap();
                        assert_eq!(read, mid, "{folder}.{}", spec.key);
                    }
                }
            }
        }
    }
}
