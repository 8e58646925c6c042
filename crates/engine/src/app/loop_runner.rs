use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::input::InputSource;
use super::scene::{SceneError, SceneMachine, SceneRegistryError};
use super::{Scene, SceneCommand, SceneKey};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub start_scene: SceneKey,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    /// Simulated wall-clock time per frame fed into the accumulator.
    pub frame_delta: Duration,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub max_ticks: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            start_scene: SceneKey::new("start"),
            window_width: 1024,
            window_height: 768,
            target_tps: 60,
            frame_delta: Duration::from_secs_f64(1.0 / 60.0),
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_ticks: 600,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] SceneRegistryError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_scene: SceneKey,
    pub scene_switches: u32,
    pub quit_requested: bool,
    pub dropped_backlog: Duration,
}

/// Runs the fixed-step simulation headlessly until `max_ticks` or a quit
/// request, then unloads every scene.
pub fn run_app(
    config: LoopConfig,
    scenes: Vec<(SceneKey, Box<dyn Scene>)>,
    input: &mut dyn InputSource,
) -> Result<RunSummary, AppError> {
    let mut scenes = SceneMachine::new(scenes, &config.start_scene)?;

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let frame_delta = normalize_non_zero_duration(config.frame_delta, fixed_dt);
    let window_size = (config.window_width, config.window_height);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        max_ticks = config.max_ticks,
        "loop_config"
    );

    if let Err(error) = scenes.load_active() {
        scenes.shutdown_all();
        return Err(error.into());
    }
    scenes.apply_pending_active();
    info!(
        scene = %scenes.active_scene(),
        character_count = scenes.active_world().character_count(),
        "scene_loaded"
    );

    let mut summary = RunSummary {
        ticks_run: 0,
        final_scene: scenes.active_scene().clone(),
        scene_switches: 0,
        quit_requested: false,
        dropped_backlog: Duration::ZERO,
    };
    let mut accumulator = Duration::ZERO;
    let mut last_title: Option<String> = None;

    let result = 'frames: loop {
        if summary.ticks_run >= config.max_ticks {
            break Ok(());
        }
        accumulator = accumulator.saturating_add(clamp_frame_delta(frame_delta, max_frame_delta));
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        accumulator = step_plan.remaining_accumulator;
        if step_plan.dropped_backlog > Duration::ZERO {
            summary.dropped_backlog = summary
                .dropped_backlog
                .saturating_add(step_plan.dropped_backlog);
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        for _ in 0..step_plan.ticks_to_run {
            if summary.ticks_run >= config.max_ticks {
                break;
            }
            let snapshot = input.snapshot_for_tick(summary.ticks_run, window_size);
            if snapshot.quit_requested() {
                info!(reason = "input", tick = summary.ticks_run, "shutdown_requested");
                summary.quit_requested = true;
                break 'frames Ok(());
            }

            let command = scenes.update_active(fixed_dt_seconds, &snapshot);
            scenes.apply_pending_active();
            summary.ticks_run += 1;

            let switched = match command {
                SceneCommand::SwitchTo(next_scene) => scenes.switch_to(&next_scene),
                SceneCommand::HardResetTo(next_scene) => scenes.hard_reset_to(&next_scene),
                SceneCommand::None => Ok(false),
            };
            match switched {
                Ok(true) => {
                    scenes.apply_pending_active();
                    summary.scene_switches += 1;
                    info!(
                        scene = %scenes.active_scene(),
                        character_count = scenes.active_world().character_count(),
                        "scene_switched"
                    );
                }
                Ok(false) => {}
                Err(error) => break 'frames Err(AppError::from(error)),
            }

            let title = scenes.debug_title_active();
            if title != last_title {
                if let Some(title) = &title {
                    debug!(title = title.as_str(), "scene_title_changed");
                }
                last_title = title;
            }
        }
    };

    summary.final_scene = scenes.active_scene().clone();
    scenes.shutdown_all();
    info!(
        ticks_run = summary.ticks_run,
        scene_switches = summary.scene_switches,
        scene = %summary.final_scene,
        "shutdown"
    );
    result.map(|()| summary)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
