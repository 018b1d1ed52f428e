//! Software Amplitude Envelope
//!
//! Two independently enabled linear stages, Attack and Decay, run at the
//! modulation tick rate. A stage length of 0 ticks means the stage is
//! skipped (instantaneous). Attack ramps from silence to the target level;
//! Decay ramps from the target down to the sustain floor and holds there.
//! Levels are kept in 8.8 fixed point so multi-tick ramps move smoothly
//! through the 4-bit amplitude range.

use crate::constants::MAX_AMPLITUDE;
use crate::presets::EnvelopeConfig;

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStage {
    /// Not triggered (silent)
    #[default]
    Idle,
    /// Ramping up to the target level
    Attack,
    /// Ramping down to the sustain floor
    Decay,
    /// Holding the sustain floor
    Sustain,
}

/// Per-voice envelope state machine
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeState {
    stage: EnvelopeStage,
    /// Current level, 8.8 fixed point (0 .. 15<<8)
    level: u16,
    /// Ramp target, 8.8 fixed point
    target: u16,
    /// Ticks left in the current stage
    ticks_left: u8,
    /// Per-tick level change for the current stage
    step: i16,
}

impl EnvelopeState {
    /// Trigger the envelope toward `target` (0-15)
    pub fn note_on(&mut self, target: u8, config: &EnvelopeConfig) {
        let target = target.min(MAX_AMPLITUDE) as u16;
        self.target = target << 8;
        if config.attack_ticks == 0 {
            self.level = self.target;
            self.enter_decay(config);
        } else {
            self.stage = EnvelopeStage::Attack;
            self.level = 0;
            self.ticks_left = config.attack_ticks;
            self.step = (self.target / config.attack_ticks as u16) as i16;
        }
    }

    /// Advance one modulation tick; returns the amplitude (0-15)
    pub fn tick(&mut self, config: &EnvelopeConfig) -> u8 {
        match self.stage {
            EnvelopeStage::Idle | EnvelopeStage::Sustain => {}
            EnvelopeStage::Attack => {
                self.level = self.level.saturating_add(self.step as u16);
                self.ticks_left -= 1;
                if self.ticks_left == 0 {
                    self.level = self.target;
                    self.enter_decay(config);
                }
            }
            EnvelopeStage::Decay => {
                self.level = self.level.saturating_add_signed(self.step);
                self.ticks_left -= 1;
                if self.ticks_left == 0 {
                    self.level = self.sustain_level(config);
                    self.stage = EnvelopeStage::Sustain;
                }
            }
        }
        self.amplitude()
    }

    /// Current amplitude register value (0-15)
    pub fn amplitude(&self) -> u8 {
        ((self.level >> 8) as u8).min(MAX_AMPLITUDE)
    }

    /// Current stage (observability for tests and composition)
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    fn sustain_level(&self, config: &EnvelopeConfig) -> u16 {
        ((config.sustain.min(MAX_AMPLITUDE) as u16) << 8).min(self.target)
    }

    fn enter_decay(&mut self, config: &EnvelopeConfig) {
        let sustain = self.sustain_level(config);
        if config.decay_ticks == 0 || sustain >= self.level {
            self.level = sustain;
            self.stage = EnvelopeStage::Sustain;
        } else {
            self.stage = EnvelopeStage::Decay;
            self.ticks_left = config.decay_ticks;
            let drop = (self.level - sustain) as i32;
            self.step = -((drop / config.decay_ticks as i32) as i16);
        }
    }
}
