use std::process::ExitCode;

use adventure_engine::run_app;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        scenes,
        mut input,
    } = app;

    match run_app(config, scenes, &mut input) {
        Ok(summary) => {
            info!(
                ticks = summary.ticks_run,
                final_scene = %summary.final_scene,
                scene_switches = summary.scene_switches,
                quit_requested = summary.quit_requested,
                unplayed_script_events = input.remaining_events(),
                "run_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}
