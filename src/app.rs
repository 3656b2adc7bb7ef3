use std::fmt::Write as _;

use crate::orb::Orb;

/// Clock values handed to the per-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameState {
    /// Seconds since the first frame of the session.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

/// Session clock shared by the windowed, web and headless loops.
///
/// The first sample fixes the origin. Elapsed time never decreases and is
/// never reset, including across effect switches.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    origin: Option<f64>,
    elapsed: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to `now`, a timestamp in seconds from any monotonic source.
    pub fn advance_to(&mut self, now: f64) -> FrameState {
        let origin = *self.origin.get_or_insert(now);
        let elapsed = (now - origin).max(self.elapsed);
        let delta = elapsed - self.elapsed;
        self.elapsed = elapsed;
        FrameState {
            elapsed: elapsed as f32,
            delta: delta as f32,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }
}

/// Human readable dump of the mounted effect: one line per mesh with its
/// raster state and current uniform values.
pub fn summary_lines(orb: &Orb) -> Vec<String> {
    let mut lines = vec![format!("Effect: {}", orb.mode())];
    for mesh in orb.meshes() {
        let mut line = format!(
            " - {} [{} vertices, {}]",
            mesh.name,
            mesh.geometry.vertex_count(),
            mesh.program.blending.label()
        );
        for (name, value) in mesh.program.uniforms.iter() {
            let _ = write!(line, " {name}={value}");
        }
        lines.push(line);
    }
    lines
}

pub fn print_summary(orb: &Orb) {
    for line in summary_lines(orb) {
        println!("{line}");
    }
}
