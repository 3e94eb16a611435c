use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::constants::KEY_COUNT;
use crate::error::{Error, Result};
use crate::instruction;
use crate::operations::ProgramCounter;
use crate::state::{FrameBuffer, State, Status};

/// The outcome of a single CPU cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An instruction ran; `redraw` is set if it changed the frame buffer
    Executed { redraw: bool },
    /// An `FX0A` is holding the pc until some key is pressed
    WaitingForKey { register: u8 },
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Owns:
///  - the machine `state`
///  - the random number generator behind `CXKK`
///
/// Supplies interfaces for:
/// - resetting and loading roms
/// - pressing and releasing keys
/// - advancing the CPU one instruction at a time
/// - ticking its timers, which the host should do at 60Hz
/// - inspecting its frame buffer for rendering by some display
/// - dumping its registers for debugging
pub struct Chip8<R = StdRng> {
    state: State,
    rng: R,
}

impl Chip8<StdRng> {
    /// A machine whose random numbers come from the OS's entropy source
    pub fn new() -> Self {
        Chip8::with_rng(StdRng::from_entropy())
    }

    /// A machine whose random numbers are reproducible
    pub fn seeded(seed: u64) -> Self {
        Chip8::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Chip8<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> Chip8<R> {
    /// A machine drawing random numbers from `rng`
    pub fn with_rng(rng: R) -> Self {
        Chip8 {
            state: State::new(),
            rng,
        }
    }

    /// Return to power-on state; the loaded rom is lost
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Load a rom into memory at 0x200
    ///
    /// # Arguments
    /// * `rom` the raw program bytes
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.state.load(rom)?;
        log::info!("loaded {} byte ROM", rom.len());
        Ok(())
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the key index, 0x0..=0xF
    /// * `pressed` whether the key is down
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        match self.state.pressed_keys.get_mut(key as usize) {
            Some(status) => *status = pressed,
            None => log::warn!("ignoring key {:#04X}, only {} exist", key, KEY_COUNT),
        }
    }

    /// Advances the CPU by a single cycle
    /// - fetches the opcode at the pc
    /// - executes it, or reports it unknown and steps over it
    /// - moves the pc as the instruction directs
    pub fn cycle(&mut self) -> Result<Step> {
        let address = self.state.pc;
        let op = self.state.fetch().map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        log::trace!(
            "{:04X} v{:02X?} i{:04X} pc{:04X}",
            op,
            self.state.v,
            self.state.i,
            address
        );

        let operation = match instruction::from_op(&op) {
            Some(operation) => operation,
            None => {
                self.state.pc = address.wrapping_add(0x2);
                let e = Error::UnknownOpcode {
                    opcode: op,
                    address,
                };
                log::warn!("{}", e);
                return Err(e);
            }
        };

        let was_drawn = self.state.draw_flag;
        self.state.draw_flag = false;
        let result = operation(&op, &mut self.state, &mut self.rng);
        let redraw = self.state.draw_flag;
        self.state.draw_flag |= was_drawn;

        match result {
            Ok(ProgramCounter::Next) => self.state.pc = address.wrapping_add(0x2),
            Ok(ProgramCounter::Skip) => self.state.pc = address.wrapping_add(0x4),
            Ok(ProgramCounter::Jump(target)) => self.state.pc = target,
            Ok(ProgramCounter::Wait(register)) => {
                log::debug!("waiting for a key for v{:X}", register);
                return Ok(Step::WaitingForKey { register });
            }
            Err(e) => {
                log::error!("{}", e);
                return Err(e);
            }
        }

        Ok(Step::Executed { redraw })
    }

    /// Runs up to `cycles` instructions, stopping early on a key wait or an error.
    /// Returns the last step taken.
    pub fn run(&mut self, cycles: usize) -> Result<Step> {
        let mut redraw = false;
        for _ in 0..cycles {
            match self.cycle()? {
                Step::Executed { redraw: drew } => redraw |= drew,
                waiting => return Ok(waiting),
            }
        }
        Ok(Step::Executed { redraw })
    }

    /// Decrements both timers, stopping at 0
    pub fn tick(&mut self) {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }

    /// The frame buffer as it currently stands
    pub fn display(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Whether the frame buffer changed since this was last called
    pub fn consume_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.state.draw_flag, false)
    }

    /// Returns the FrameBuffer if the display should be redrawn
    pub fn get_frame(&mut self) -> Option<FrameBuffer> {
        if self.consume_redraw() {
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// Whether the host should be producing a tone
    pub fn is_sounding(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// Whether an `FX0A` is holding up execution
    pub fn is_waiting_for_key(&self) -> bool {
        self.state.register_needing_key.is_some()
    }

    /// Registers, stack, timers and keys for debugging
    pub fn status(&self) -> Status {
        self.state.status()
    }
}
