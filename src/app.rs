//! Fixed-timestep game loop
//!
//! `App` owns the game and its collaborators. Each frame it accumulates
//! wall time, runs up to `MAX_SUBSTEPS` ticks of `SIM_DT`, forwards events to
//! audio, saves the high score table when it changed, and renders once.
//! Collaborator failures are reported, never fatal.

use std::thread;
use std::time::{Duration, Instant};

use crate::audio::{AudioManager, AudioSink, SoundEffect};
use crate::consts::*;
use crate::persistence::ScoreStore;
use crate::platform::InputSource;
use crate::renderer::{Frame, Renderer};
use crate::settings::Settings;
use crate::sim::{Game, tick};
use crate::{Error, HighScores};

/// Longest frame the accumulator will absorb, in seconds
const MAX_FRAME_TIME: f32 = 0.25;

/// What happened during one `App::frame`
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Simulation ticks run
    pub ticks: u32,
    /// Collaborator failures, in the order they happened
    pub diagnostics: Vec<Error>,
}

pub struct App<R, A, I, S> {
    pub game: Game,
    pub renderer: R,
    pub audio: AudioManager<A>,
    pub input: I,
    pub store: S,
    accumulator: f32,
}

impl<R, A, I, S> App<R, A, I, S>
where
    R: Renderer,
    A: AudioSink,
    I: InputSource,
    S: ScoreStore,
{
    /// Build the game, loading the high score table from `store`. A table
    /// that cannot be loaded is replaced with an empty one.
    pub fn new(settings: Settings, renderer: R, audio: A, input: I, mut store: S) -> Self {
        let high_scores = store.load().unwrap_or_else(|e| {
            log::warn!("Could not load high scores: {}", e);
            HighScores::new()
        });
        let audio = AudioManager::from_settings(audio, &settings);
        let game = Game::new(settings, high_scores);
        log::info!("Game initialized with seed: {:#x}", game.seed());
        Self {
            game,
            renderer,
            audio,
            input,
            store,
            accumulator: 0.0,
        }
    }

    /// Advance by `elapsed` seconds of wall time and draw once
    pub fn frame(&mut self, elapsed: f32) -> FrameReport {
        let mut report = FrameReport::default();
        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_TIME);

        while self.accumulator >= SIM_DT && report.ticks < MAX_SUBSTEPS && !self.game.quit {
            let input = match self.input.poll(&self.game) {
                Ok(input) => input,
                Err(e) => {
                    report.diagnostics.push(e);
                    Default::default()
                }
            };
            tick(&mut self.game, &input);
            self.accumulator -= SIM_DT;
            report.ticks += 1;

            for event in self.game.drain_events() {
                if let Err(e) = self.audio.play(SoundEffect::from(event)) {
                    report.diagnostics.push(e);
                }
            }
        }
        // Past the substep cap the backlog is dropped, not replayed
        if report.ticks == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        if self.game.high_scores_dirty {
            match self.store.save(&self.game.high_scores) {
                Ok(()) => self.game.high_scores_dirty = false,
                Err(e) => report.diagnostics.push(e),
            }
        }

        let frame = Frame::capture(&self.game);
        if let Err(e) = self.renderer.render(&frame) {
            report.diagnostics.push(e);
        }

        for e in &report.diagnostics {
            log::warn!("{}", e);
        }
        report
    }

    /// Run in real time until the game quits
    pub fn run(&mut self) {
        let frame_budget = Duration::from_secs_f32(SIM_DT);
        let mut last = Instant::now();
        while !self.game.quit {
            let now = Instant::now();
            let elapsed = now.duration_since(last).as_secs_f32();
            last = now;
            self.frame(elapsed);

            let spent = now.elapsed();
            if spent < frame_budget {
                thread::sleep(frame_budget - spent);
            }
        }
        self.renderer.shutdown();
        log::info!("Exiting after {} ticks", self.game.ticks);
    }
}
