//! Asterad - headless entry point
//!
//! Loads settings, wires the logging collaborators and the autopilot into
//! the game loop, and runs until the autopilot quits.
//!
//! Usage: `asterad [settings.json] [ticks]`

use asterad::Settings;
use asterad::app::App;
use asterad::audio::LogAudio;
use asterad::consts::TICKS_PER_SECOND;
use asterad::persistence::JsonFileStore;
use asterad::platform::DemoInput;
use asterad::renderer::LogRenderer;

const DEFAULT_SETTINGS_PATH: &str = "asterad.json";

fn main() {
    env_logger::init();
    log::info!("Asterad starting...");

    let mut args = std::env::args().skip(1);
    let settings_path = args.next().unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let max_ticks = args
        .next()
        .and_then(|t| t.parse().ok())
        .unwrap_or(120 * TICKS_PER_SECOND as u64);

    let settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Bad settings file {}: {}", settings_path, e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Display {}x{}x{}{}",
        settings.h_res,
        settings.v_res,
        settings.bitdepth,
        if settings.fullscreen { " fullscreen" } else { "" }
    );

    let store = JsonFileStore::new(settings.high_score_path.clone());
    let mut app = App::new(
        settings,
        LogRenderer::default(),
        LogAudio,
        DemoInput::new(max_ticks),
        store,
    );
    app.run();
}
