//! The effect selector: exactly one effect is mounted at a time.

use log::{debug, info};

use crate::app::FrameState;
use crate::effects::{BlackHole, EffectMode, Hurricane, MeshInstance, NormalSphere, Slime};
use crate::panel::PanelValues;

/// The mounted effect together with everything it owns.
#[derive(Debug, Clone)]
pub enum ActiveEffect {
    Normal(NormalSphere),
    BlackHole(BlackHole),
    Hurricane(Hurricane),
    Slime(Slime),
}

impl ActiveEffect {
    /// Builds geometry and programs for `mode` from the current panel values.
    pub fn mount(mode: EffectMode, panel: &PanelValues) -> Self {
        match mode {
            EffectMode::Normal => Self::Normal(NormalSphere::mount()),
            EffectMode::BlackHole => Self::BlackHole(BlackHole::mount(&panel.black_hole)),
            EffectMode::Hurricane => Self::Hurricane(Hurricane::mount(&panel.hurricane)),
            EffectMode::Slime => Self::Slime(Slime::mount(&panel.slime)),
        }
    }

    pub fn mode(&self) -> EffectMode {
        match self {
            Self::Normal(_) => EffectMode::Normal,
            Self::BlackHole(_) => EffectMode::BlackHole,
            Self::Hurricane(_) => EffectMode::Hurricane,
            Self::Slime(_) => EffectMode::Slime,
        }
    }

    pub fn meshes(&self) -> &[MeshInstance] {
        match self {
            Self::Normal(effect) => effect.meshes(),
            Self::BlackHole(effect) => effect.meshes(),
            Self::Hurricane(effect) => effect.meshes(),
            Self::Slime(effect) => effect.meshes(),
        }
    }

    /// Re-applies time and panel values to the mounted programs.
    pub fn sync_uniforms(&mut self, frame: &FrameState, panel: &PanelValues) {
        match self {
            Self::Normal(effect) => effect.sync_uniforms(frame),
            Self::BlackHole(effect) => effect.sync_uniforms(frame, &panel.black_hole),
            Self::Hurricane(effect) => effect.sync_uniforms(frame, &panel.hurricane),
            Self::Slime(effect) => effect.sync_uniforms(frame, &panel.slime),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Orb {
    active: ActiveEffect,
    generation: u64,
}

impl Orb {
    /// Mounts the effect selected in `panel`.
    pub fn new(panel: &PanelValues) -> Self {
        let active = ActiveEffect::mount(panel.effect_mode, panel);
        debug!("mounted {} with {} mesh(es)", active.mode(), active.meshes().len());
        Self {
            active,
            generation: 0,
        }
    }

    pub fn mode(&self) -> EffectMode {
        self.active.mode()
    }

    pub fn active(&self) -> &ActiveEffect {
        &self.active
    }

    pub fn meshes(&self) -> &[MeshInstance] {
        self.active.meshes()
    }

    /// Incremented on every mount; GPU resources built for an older
    /// generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the mounted effect. Returns false when `mode` is already
    /// mounted, in which case nothing changes.
    pub fn select(&mut self, mode: EffectMode, panel: &PanelValues) -> bool {
        if mode == self.mode() {
            return false;
        }
        info!("switching effect {} -> {}", self.mode(), mode);
        self.active = ActiveEffect::mount(mode, panel);
        self.generation += 1;
        debug!("mounted {} with {} mesh(es)", mode, self.active.meshes().len());
        true
    }

    /// The per-frame callback: follow the panel's mode, then sync uniforms.
    pub fn on_frame(&mut self, frame: &FrameState, panel: &PanelValues) {
        self.select(panel.effect_mode, panel);
        self.active.sync_uniforms(frame, panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(elapsed: f32) -> FrameState {
        FrameState {
            elapsed,
            delta: 1.0 / 60.0,
        }
    }

    #[test]
    fn starts_on_the_plain_sphere() {
        let orb = Orb::new(&PanelValues::default());
        assert_eq!(orb.mode(), EffectMode::Normal);
        assert_eq!(orb.meshes().len(), 1);
        assert_eq!(orb.generation(), 0);
    }

    #[test]
    fn every_switch_leaves_exactly_one_effect() {
        let mut panel = PanelValues::default();
        let mut orb = Orb::new(&panel);
        for from in EffectMode::ALL {
            for to in EffectMode::ALL {
                panel.effect_mode = from;
                orb.on_frame(&frame(1.0), &panel);
                panel.effect_mode = to;
                let before = orb.generation();
                orb.on_frame(&frame(2.0), &panel);
                if from != to {
                    assert_eq!(orb.generation(), before + 1);
                }
                assert_eq!(orb.mode(), to);

                let names: Vec<&str> = orb.meshes().iter().map(|mesh| mesh.name).collect();
                let fresh: Vec<&str> = ActiveEffect::mount(to, &panel)
                    .meshes()
                    .iter()
                    .map(|mesh| mesh.name)
                    .collect();
                assert_eq!(names, fresh, "{from} -> {to}");
                for mesh in orb.meshes() {
                    assert!(mesh.program.validate().is_ok());
                }
            }
        }
    }

    #[test]
    fn reselecting_the_active_mode_is_a_no_op() {
        let mut panel = PanelValues::default();
        panel.effect_mode = EffectMode::Slime;
        let mut orb = Orb::new(&panel);
        assert!(!orb.select(EffectMode::Slime, &panel));
        assert_eq!(orb.generation(), 0);
        assert!(orb.select(EffectMode::Hurricane, &panel));
        assert_eq!(orb.generation(), 1);
    }

    #[test]
    fn remount_starts_from_fresh_state() {
        let mut panel = PanelValues::default();
        let mut orb = Orb::new(&panel);
        for i in 0..30 {
            orb.on_frame(&frame(i as f32 / 60.0), &panel);
        }
        assert!(orb.meshes()[0].transform.rotation.y > 0.0);

        panel.effect_mode = EffectMode::Hurricane;
        orb.on_frame(&frame(1.0), &panel);
        panel.effect_mode = EffectMode::Normal;
        orb.select(EffectMode::Normal, &panel);
        assert_eq!(orb.meshes()[0].transform.rotation.y, 0.0);
    }

    #[test]
    fn time_keeps_running_across_switches() {
        let mut panel = PanelValues::default();
        panel.effect_mode = EffectMode::Hurricane;
        let mut orb = Orb::new(&panel);
        orb.on_frame(&frame(3.0), &panel);
        panel.effect_mode = EffectMode::Slime;
        orb.on_frame(&frame(4.0), &panel);
        let uniforms = &orb.meshes()[0].program.uniforms;
        assert_eq!(uniforms.float("uTime"), Some(4.0));
    }

    fn validate_wgsl(label: &str, source: &str, entry_point: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|err| panic!("{label}: {}", err.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .unwrap_or_else(|err| panic!("{label}: {}", err.emit_to_string(source)));
        assert!(
            module.entry_points.iter().any(|ep| ep.name == entry_point),
            "{label} has no {entry_point}"
        );
    }

    #[test]
    fn every_mode_compiles_to_valid_wgsl() {
        let panel = PanelValues::default();
        for mode in EffectMode::ALL {
            let effect = ActiveEffect::mount(mode, &panel);
            for mesh in effect.meshes() {
                let program = &mesh.program;
                validate_wgsl(
                    &format!("{mode}/{} vertex", mesh.name),
                    &program.vertex_source,
                    "vs_main",
                );
                validate_wgsl(
                    &format!("{mode}/{} fragment", mesh.name),
                    &program.fragment_source,
                    "fs_main",
                );
            }
        }
    }
}
