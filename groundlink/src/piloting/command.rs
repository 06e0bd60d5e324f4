use std::sync::{Mutex, MutexGuard};

use crate::core::io::NoAckEncoder;
use crate::protocol::PilotingMessage;

use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Piloting command values, in percent of their configured maximum.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PilotingCommand {
    roll: i8,
    pitch: i8,
    yaw: i8,
    gaz: i8,
}

impl PilotingCommand {
    /// Creates piloting command from its values.
    pub fn new(roll: i8, pitch: i8, yaw: i8, gaz: i8) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            gaz,
        }
    }

    /// Roll.
    #[inline(always)]
    pub fn roll(&self) -> i8 {
        self.roll
    }

    /// Pitch.
    #[inline(always)]
    pub fn pitch(&self) -> i8 {
        self.pitch
    }

    /// Yaw.
    #[inline(always)]
    pub fn yaw(&self) -> i8 {
        self.yaw
    }

    /// Gaz.
    #[inline(always)]
    pub fn gaz(&self) -> i8 {
        self.gaz
    }

    /// `1` if roll and pitch have to be applied by the drone, `0` otherwise.
    pub fn flag(&self) -> u8 {
        if self.roll == 0 && self.pitch == 0 {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Default)]
struct EncoderState {
    command: PilotingCommand,
    seq: u8,
}

/// Piloting command encoder registered in the unacknowledged command loop.
///
/// Setters return `true` only when the value actually changed.
#[derive(Debug, Default)]
pub struct PilotingCommandEncoder {
    state: Mutex<EncoderState>,
}

impl PilotingCommandEncoder {
    /// Creates an encoder with all values at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current piloting command.
    pub fn command(&self) -> PilotingCommand {
        self.lock().command
    }

    /// Sets roll.
    pub fn set_roll(&self, roll: i8) -> bool {
        Self::update(&mut self.lock().command.roll, roll)
    }

    /// Sets pitch.
    pub fn set_pitch(&self, pitch: i8) -> bool {
        Self::update(&mut self.lock().command.pitch, pitch)
    }

    /// Sets yaw.
    pub fn set_yaw(&self, yaw: i8) -> bool {
        Self::update(&mut self.lock().command.yaw, yaw)
    }

    /// Sets gaz.
    pub fn set_gaz(&self, gaz: i8) -> bool {
        Self::update(&mut self.lock().command.gaz, gaz)
    }

    /// Zeroes all values and restarts the sequence.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.command = PilotingCommand::default();
        state.seq = 0;
    }

    fn update(slot: &mut i8, value: i8) -> bool {
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    fn lock(&self) -> MutexGuard<'_, EncoderState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl NoAckEncoder for PilotingCommandEncoder {
    fn encode(&self) -> Option<Command> {
        let mut state = self.lock();
        state.seq = state.seq.wrapping_add(1);
        let command = state.command;

        Some(Command::Piloting(PilotingMessage::Pcmd {
            flag: command.flag(),
            roll: command.roll,
            pitch: command.pitch.saturating_neg(),
            yaw: command.yaw,
            gaz: command.gaz,
            seq: state.seq,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_report_changes() {
        let encoder = PilotingCommandEncoder::new();

        assert!(encoder.set_roll(10));
        assert!(!encoder.set_roll(10));
        assert!(encoder.set_gaz(-5));
        assert_eq!(encoder.command().flag(), 1);

        encoder.reset();
        assert_eq!(encoder.command(), PilotingCommand::default());
        assert_eq!(encoder.command().flag(), 0);
    }

    #[test]
    fn encodes_with_sequence_and_inverted_pitch() {
        let encoder = PilotingCommandEncoder::new();
        encoder.set_pitch(20);

        let first = encoder.encode();
        let second = encoder.encode();

        assert_eq!(
            first,
            Some(Command::Piloting(PilotingMessage::Pcmd {
                flag: 1,
                roll: 0,
                pitch: -20,
                yaw: 0,
                gaz: 0,
                seq: 1,
            }))
        );
        assert!(matches!(
            second,
            Some(Command::Piloting(PilotingMessage::Pcmd { seq: 2, .. }))
        ));

        encoder.reset();
        assert!(matches!(
            encoder.encode(),
            Some(Command::Piloting(PilotingMessage::Pcmd { seq: 1, pitch: 0, .. }))
        ));
    }
}
