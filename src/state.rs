use std::fmt;

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, KEY_COUNT, MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET,
    STACK_DEPTH,
};
use crate::error::{Error, Result};
use crate::opcode;

/// The FrameBuffer is indexed as [y][x]; every cell is 0 or 1
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// The complete Chip-8 machine state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) doubles as the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Stack
/// - 16 return addresses
/// - (sp) the number of addresses currently on the stack
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented by the host's 60Hz tick
///
/// ## Memory
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet
///     - 0x200.. holds the loaded ROM
/// - 32x64 frame buffer and a flag raised whenever it changes
///
/// ## Input
/// - the pressed status of keys 0..F, written only by the host
/// - emulation halts while an `FX0A` waits for a key to land in some register
/// - the keys held when that wait began, so only fresh presses answer it
#[derive(Clone, PartialEq, Eq)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub pressed_keys: [bool; KEY_COUNT],
    pub register_needing_key: Option<u8>,
    pub keys_at_wait: [bool; KEY_COUNT],
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[0..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            pressed_keys: [false; KEY_COUNT],
            register_needing_key: None,
            keys_at_wait: [false; KEY_COUNT],
        }
    }

    /// Zero everything, reinstall the sprite sheet and point the pc at 0x200
    pub fn reset(&mut self) {
        *self = State::new();
    }

    /// Copy a ROM into memory starting at 0x200.
    /// Memory outside of the ROM's footprint is left as it was.
    pub fn load(&mut self, rom: &[u8]) -> Result<()> {
        let start = PROGRAM_START as usize;
        let max = MEMORY_SIZE - start;
        if rom.len() > max {
            return Err(Error::OutOfRange {
                size: rom.len(),
                max,
            });
        }
        self.memory[start..start + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    /// The opcode at the pc
    pub fn fetch(&self) -> Result<u16> {
        let bytes = self.read(self.pc, 2)?;
        Ok(opcode::from_bytes(bytes[0], bytes[1]))
    }

    /// `len` bytes of memory starting at `address`
    pub fn read(&self, address: u16, len: usize) -> Result<&[u8]> {
        let range = Self::range(address, len)?;
        Ok(&self.memory[range])
    }

    /// `len` bytes of mutable memory starting at `address`
    pub fn read_mut(&mut self, address: u16, len: usize) -> Result<&mut [u8]> {
        let range = Self::range(address, len)?;
        Ok(&mut self.memory[range])
    }

    fn range(address: u16, len: usize) -> Result<std::ops::Range<usize>> {
        let start = address as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(Error::MemoryOutOfRange {
                address: start.max(MEMORY_SIZE),
            });
        }
        Ok(start..end)
    }

    /// Vx
    pub fn register(&self, x: usize) -> u8 {
        self.v[x]
    }

    /// Set VF
    pub fn set_flag(&mut self, flag: bool) {
        self.v[0xF] = flag as u8;
    }

    /// Whether key (which may be any byte a program put in a register) is held down
    pub fn is_pressed(&self, key: u8) -> bool {
        self.pressed_keys
            .get(key as usize)
            .copied()
            .unwrap_or(false)
    }

    /// The lowest key held down now that wasn't when `keys_at_wait` was taken
    pub fn first_newly_pressed(&self) -> Option<u8> {
        self.pressed_keys
            .iter()
            .zip(self.keys_at_wait.iter())
            .position(|(&now, &before)| now && !before)
            .map(|key| key as u8)
    }

    /// A read-only snapshot of everything but memory and the frame buffer
    pub fn status(&self) -> Status {
        Status {
            v: self.v,
            i: self.i,
            pc: self.pc,
            sp: self.sp,
            stack: self.stack,
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            pressed_keys: self.pressed_keys,
            register_needing_key: self.register_needing_key,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.status(), f)
    }
}

/// # Status
/// Diagnostic dump of the registers, stack, timers and keyboard latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub stack: [u16; STACK_DEPTH],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub pressed_keys: [bool; KEY_COUNT],
    pub register_needing_key: Option<u8>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pc {:04X}  i {:04X}  sp {:02}  dt {:02X}  st {:02X}",
            self.pc, self.i, self.sp, self.delay_timer, self.sound_timer
        )?;
        for (x, value) in self.v.iter().enumerate() {
            write!(f, "v{:X} {:02X}", x, value)?;
            f.write_str(if x % 8 == 7 { "\n" } else { "  " })?;
        }
        write!(f, "stack")?;
        for address in &self.stack[..self.sp as usize] {
            write!(f, " {:04X}", address)?;
        }
        write!(f, "\nkeys ")?;
        for pressed in &self.pressed_keys {
            f.write_str(if *pressed { "1" } else { "0" })?;
        }
        if let Some(x) = self.register_needing_key {
            write!(f, "\nwaiting for key -> v{:X}", x)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_zeroed() {
        let state = State::new();
        assert_eq!(state.v, [0; 16]);
        assert_eq!(state.i, 0);
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
        assert_eq!(state.stack, [0; 16]);
        assert_eq!(state.delay_timer, 0);
        assert_eq!(state.sound_timer, 0);
        assert!(!state.draw_flag);
        assert!(state.frame_buffer.iter().flatten().all(|&p| p == 0));
        assert!(state.memory[SPRITE_SHEET.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_new_state_has_sprite_sheet() {
        let state = State::new();
        assert_eq!(state.memory[0x000..0x050], SPRITE_SHEET[..]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = State::new();
        state.v[0x3] = 0x42;
        state.i = 0x300;
        state.pc = 0x404;
        state.sp = 2;
        state.stack[0] = 0x220;
        state.memory[0x300] = 0xFF;
        state.memory[0x000] = 0x00;
        state.frame_buffer[4][4] = 1;
        state.delay_timer = 9;
        state.sound_timer = 9;
        state.pressed_keys[0x2] = true;
        state.register_needing_key = Some(0x1);

        state.reset();

        assert_eq!(state, State::new());
    }

    #[test]
    fn test_load_copies_rom_to_program_start() {
        let mut state = State::new();
        state.load(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(state.memory[0x200..0x203], [0x12, 0x34, 0x56]);
        assert_eq!(state.memory[0x203], 0x00);
        assert_eq!(state.memory[0x000..0x050], SPRITE_SHEET[..]);
    }

    #[test]
    fn test_load_leaves_other_memory_alone() {
        let mut state = State::new();
        state.memory[0x300] = 0xAB;
        state.load(&[0x01, 0x02]).unwrap();
        assert_eq!(state.memory[0x300], 0xAB);
    }

    #[test]
    fn test_load_accepts_rom_filling_memory() {
        let mut state = State::new();
        let rom = vec![0xAA; 0x1000 - 0x200];
        state.load(&rom).unwrap();
        assert_eq!(state.memory[0xFFF], 0xAA);
    }

    #[test]
    fn test_load_rejects_oversized_rom() {
        let mut state = State::new();
        let rom = vec![0xAA; 0x1000 - 0x200 + 1];
        assert_eq!(
            state.load(&rom),
            Err(Error::OutOfRange {
                size: 0xE01,
                max: 0xE00
            })
        );
        assert_eq!(state.memory[0x200], 0x00);
    }

    #[test]
    fn test_fetch_combines_bytes() {
        let mut state = State::new();
        state.memory[0x200..0x202].copy_from_slice(&[0xAA, 0xBB]);
        assert_eq!(state.fetch(), Ok(0xAABB));
    }

    #[test]
    fn test_fetch_past_end_of_memory() {
        let mut state = State::new();
        state.pc = 0xFFF;
        assert_eq!(
            state.fetch(),
            Err(Error::MemoryOutOfRange { address: 0x1000 })
        );
    }

    #[test]
    fn test_read_at_top_of_memory() {
        let state = State::new();
        assert!(state.read(0xFFD, 3).is_ok());
        assert!(state.read(0xFFD, 4).is_err());
    }

    #[test]
    fn test_is_pressed_ignores_out_of_range_keys() {
        let mut state = State::new();
        state.pressed_keys[0xF] = true;
        assert!(state.is_pressed(0xF));
        assert!(!state.is_pressed(0x1F));
    }

    #[test]
    fn test_first_newly_pressed_is_lowest_fresh_key() {
        let mut state = State::new();
        assert_eq!(state.first_newly_pressed(), None);
        state.pressed_keys[0x2] = true;
        state.keys_at_wait = state.pressed_keys;
        assert_eq!(state.first_newly_pressed(), None);
        state.pressed_keys[0xC] = true;
        state.pressed_keys[0x5] = true;
        assert_eq!(state.first_newly_pressed(), Some(0x5));
    }

    #[test]
    fn test_status_reflects_registers() {
        let mut state = State::new();
        state.v[0xA] = 0x12;
        state.i = 0x345;
        state.delay_timer = 7;
        state.pressed_keys[0x1] = true;
        let status = state.status();
        assert_eq!(status.v[0xA], 0x12);
        assert_eq!(status.i, 0x345);
        assert_eq!(status.pc, 0x200);
        assert_eq!(status.delay_timer, 7);
        assert!(status.pressed_keys[0x1]);
    }

    #[test]
    fn test_status_display_lists_stack() {
        let mut state = State::new();
        state.sp = 2;
        state.stack[0] = 0x222;
        state.stack[1] = 0x468;
        state.stack[2] = 0x999;
        let dump = state.status().to_string();
        assert!(dump.contains("stack 0222 0468\n"));
        assert!(dump.starts_with("pc 0200"));
    }
}
