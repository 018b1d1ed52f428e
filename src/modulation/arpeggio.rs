//! Arpeggiator
//!
//! Cycles a voice through one of 16 fixed 3-step semitone patterns at a
//! controller-set rate (ticks per step). Rate 0 disables the arpeggiator
//! and the voice plays its root note only. An additional octave shift from
//! the octave controller is applied on top of the pattern offset.

use crate::constants::ARP_PATTERNS;

/// Per-voice arpeggiator state machine
///
/// `step` indexes the 3-note pattern; `ticks_remaining` counts down to the
/// next advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArpState {
    step: u8,
    ticks_remaining: u8,
}

impl ArpState {
    /// Advance one modulation tick at the given rate
    ///
    /// Rate 0 resets to the root step so re-enabling starts the pattern
    /// from the beginning.
    pub fn tick(&mut self, rate: u8) {
        if rate == 0 {
            self.step = 0;
            self.ticks_remaining = 0;
            return;
        }
        if self.ticks_remaining == 0 {
            self.ticks_remaining = rate;
        }
        self.ticks_remaining -= 1;
        if self.ticks_remaining == 0 {
            self.step = (self.step + 1) % 3;
        }
    }

    /// Semitone offset for the current tick
    ///
    /// Pattern offset plus the octave shift; with rate 0 only the octave
    /// shift remains.
    pub fn offset(&self, rate: u8, pattern: u8, octave_shift: i8) -> i8 {
        let pattern_offset = if rate == 0 {
            0
        } else {
            ARP_PATTERNS[(pattern & 0x0F) as usize][self.step as usize]
        };
        pattern_offset.saturating_add(octave_shift)
    }

    /// Current pattern step (0-2)
    pub fn step(&self) -> u8 {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collect the offset seen on each of `n` consecutive ticks
    fn run(rate: u8, pattern: u8, octave: i8, n: usize) -> Vec<i8> {
        let mut arp = ArpState::default();
        (0..n)
            .map(|_| {
                let offset = arp.offset(rate, pattern, octave);
                arp.tick(rate);
                offset
            })
            .collect()
    }

    #[test]
    fn test_rate_zero_plays_root_only() {
        assert!(run(0, 1, 0, 50).iter().all(|&o| o == 0));
    }

    #[test]
    fn test_pattern_one_cycles_root_fifth_octave() {
        // Rate 4: each step held for 4 ticks, repeating indefinitely
        let offsets = run(4, 1, 0, 24);
        let expected: Vec<i8> = [0, 0, 0, 0, 7, 7, 7, 7, 12, 12, 12, 12]
            .iter()
            .cycle()
            .take(24)
            .copied()
            .collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn test_rate_one_advances_every_tick() {
        let offsets = run(1, 1, 0, 6);
        assert_eq!(offsets, vec![0, 7, 12, 0, 7, 12]);
    }

    #[test]
    fn test_octave_shift_applies_on_top() {
        let offsets = run(1, 1, 12, 3);
        assert_eq!(offsets, vec![12, 19, 24]);
    }

    #[test]
    fn test_octave_shift_without_pattern() {
        assert!(run(0, 1, -12, 10).iter().all(|&o| o == -12));
    }

    #[test]
    fn test_disabling_resets_to_root_step() {
        let mut arp = ArpState::default();
        for _ in 0..5 {
            arp.tick(1);
        }
        assert_ne!(arp.step(), 0);
        arp.tick(0);
        assert_eq!(arp.step(), 0);
    }
}
