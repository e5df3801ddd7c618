//! Sound effects
//!
//! The simulation raises `GameEvent`s; this module maps them onto
//! `SoundEffect`s and hands them to an `AudioSink` at the mixed volume.
//! How an effect sounds is up to the sink.

use crate::Result;
use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player shot
    ShipFire,
    /// UFO shot
    UfoFire,
    /// Engine kick when thrust starts
    Thrust,
    ExplosionSmall,
    ExplosionMedium,
    ExplosionLarge,
    /// UFO enters the screen
    UfoAppear,
    ExtraLife,
    GameOver,
}

impl From<GameEvent> for SoundEffect {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::ShipFire => SoundEffect::ShipFire,
            GameEvent::UfoFire => SoundEffect::UfoFire,
            GameEvent::Thrust => SoundEffect::Thrust,
            GameEvent::ExplosionSmall => SoundEffect::ExplosionSmall,
            GameEvent::ExplosionMedium => SoundEffect::ExplosionMedium,
            GameEvent::ExplosionLarge => SoundEffect::ExplosionLarge,
            GameEvent::UfoAppear => SoundEffect::UfoAppear,
            GameEvent::ExtraLife => SoundEffect::ExtraLife,
            GameEvent::GameOver => SoundEffect::GameOver,
        }
    }
}

/// Audio backend collaborator
pub trait AudioSink {
    /// Play `effect` at `volume` (0.0 - 1.0, already mixed)
    fn play(&mut self, effect: SoundEffect, volume: f32) -> Result<()>;
}

/// Sink that only logs; for headless runs
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect, volume: f32) -> Result<()> {
        log::trace!("sfx {:?} at {:.2}", effect, volume);
        Ok(())
    }
}

/// Audio manager for the game
pub struct AudioManager<S> {
    sink: S,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl<S: AudioSink> AudioManager<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    pub fn from_settings(sink: S, settings: &Settings) -> Self {
        let mut audio = Self::new(sink);
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);
        audio
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect; silent volume skips the sink entirely
    pub fn play(&mut self, effect: SoundEffect) -> Result<()> {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return Ok(());
        }
        self.sink.play(effect, vol)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
