use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use orb_effects::{
    print_summary, EffectMode, Folder, FrameClock, Orb, PanelValues, ParameterStore, Preset,
    Viewer,
};

const USAGE: &str = "Usage: orb-effects [--effect <mode>] [--preset <file.xml>] \
[--set <folder>.<key>=<value>]... [--summary-only] [--duration <seconds>] [--fps <rate>]";

/// Upper bound on frames a headless run may step through.
const MAX_HEADLESS_FRAMES: f64 = 1_000_000.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let panel = options.panel_values()?;

    if options.summary_only {
        return run_headless(panel, options.last_frame(), options.fps);
    }
    match run_interactive(panel) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
            );
            run_headless(panel, options.last_frame(), options.fps)
        }
        Err(err) => Err(err),
    }
}

/// Steps the orb at a fixed rate without a GPU and prints the final state.
/// Frame `i` sees `elapsed = i / fps`; the last frame lands on `duration`.
fn run_headless(panel: PanelValues, frames: u64, fps: f64) -> Result<()> {
    let mut orb = Orb::new(&panel);
    let mut clock = FrameClock::new();
    for index in 0..=frames {
        let frame = clock.advance_to(index as f64 / fps);
        orb.on_frame(&frame, &panel);
    }
    info!("simulated {} frame(s) over {:.3}s", frames + 1, clock.elapsed());
    print_summary(&orb);
    Ok(())
}

fn run_interactive(panel: PanelValues) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Orb Effects")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let store = ParameterStore::new(panel);
    let mut viewer = block_on(Viewer::new(window, store))?;
    println!("Keys: 1-4 select effect, Tab cycles, Up/Down speed, Left/Right distortion, Esc quits");

    let mut last_error = None;
    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            if let Err(err) = viewer.handle_event(&event, elwt) {
                last_error = Some(err);
                elwt.exit();
            }
        })
        .context("event loop terminated abnormally")?;

    print_summary(viewer.orb());
    match last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

#[derive(Debug)]
struct CliOptions {
    effect: Option<EffectMode>,
    preset: Option<PathBuf>,
    overrides: Vec<(Folder, String, String)>,
    summary_only: bool,
    duration: f64,
    fps: f64,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            effect: None,
            preset: None,
            overrides: Vec::new(),
            summary_only: false,
            duration: 1.0,
            fps: 60.0,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--effect" => {
                    let value = expect_value(&mut args, &arg)?;
                    options.effect = Some(value.parse()?);
                }
                "--preset" => options.preset = Some(expect_value(&mut args, &arg)?.into()),
                "--set" => {
                    let value = expect_value(&mut args, &arg)?;
                    options.overrides.push(parse_override(&value)?);
                }
                "--duration" => options.duration = parse_seconds(&mut args, &arg)?,
                "--fps" => {
                    options.fps = parse_seconds(&mut args, &arg)?;
                    if options.fps == 0.0 {
                        bail!("--fps must be greater than zero");
                    }
                }
                "--help" | "-h" => bail!("{USAGE}"),
                other => bail!("Unknown argument: {other}. {USAGE}"),
            }
        }
        let frames = (options.duration * options.fps).round();
        if frames > MAX_HEADLESS_FRAMES {
            bail!(
                "--duration {} at --fps {} is {frames} frames; at most {MAX_HEADLESS_FRAMES} are allowed",
                options.duration,
                options.fps
            );
        }
        Ok(options)
    }

    /// Index of the last simulated frame.
    fn last_frame(&self) -> u64 {
        (self.duration * self.fps).round() as u64
    }

    /// Defaults, then the preset, then `--set` overrides, then `--effect`.
    fn panel_values(&self) -> Result<PanelValues> {
        let mut values = PanelValues::default();
        if let Some(path) = &self.preset {
            Preset::load(path)?.apply(&mut values)?;
        }
        for (folder, key, value) in &self.overrides {
            values
                .set(*folder, key, value)
                .with_context(|| format!("invalid --set {}.{key}={value}", folder.id()))?;
        }
        if let Some(mode) = self.effect {
            values.effect_mode = mode;
        }
        Ok(values)
    }
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}

fn parse_seconds(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<f64> {
    let raw = expect_value(args, flag)?;
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| anyhow!("{flag} expects a non-negative number, got `{raw}`"))
}

fn parse_override(raw: &str) -> Result<(Folder, String, String)> {
    let (path, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--set expects <folder>.<key>=<value>, got `{raw}`"))?;
    let (folder, key) = path
        .split_once('.')
        .ok_or_else(|| anyhow!("--set expects <folder>.<key>=<value>, got `{raw}`"))?;
    let folder: Folder = folder.parse()?;
    Ok((folder, key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn effect_flag_wins_over_overrides() {
        let options = parse(&[
            "--set",
            "orb.effectMode=Slime",
            "--effect",
            "Hurricane",
            "--set",
            "hurricane.speed=3",
        ])
        .unwrap();
        let values = options.panel_values().unwrap();
        assert_eq!(values.effect_mode, EffectMode::Hurricane);
        assert_eq!(values.hurricane.speed, 3.0);
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--set", "speed=2"]).is_err());
        assert!(parse(&["--duration", "-1"]).is_err());
        assert!(parse(&["--fps", "0"]).is_err());
        assert!(parse(&["--effect"]).is_err());
    }

    #[test]
    fn defaults_to_one_second_at_sixty_fps() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.duration, 1.0);
        assert_eq!(options.fps, 60.0);
        assert!(!options.summary_only);
        assert_eq!(options.last_frame(), 60);
    }

    #[test]
    fn rejects_runs_with_too_many_frames() {
        let err = parse(&["--duration", "1e12"]).unwrap_err();
        assert!(err.to_string().contains("frames"), "{err}");
        assert!(parse(&["--duration", "100", "--fps", "1e9"]).is_err());
        let options = parse(&["--duration", "600", "--fps", "120"]).unwrap();
        assert_eq!(options.last_frame(), 72_000);
    }
}
