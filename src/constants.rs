/// Width of the frame buffer in pixels
pub const DISPLAY_WIDTH: usize = 64;

/// Height of the frame buffer in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Bytes of addressable memory (0x000..=0xFFF)
pub const MEMORY_SIZE: usize = 4096;

/// ROMs are loaded (and execution starts) here
pub const PROGRAM_START: u16 = 0x200;

/// Levels of nested subroutines
pub const STACK_DEPTH: usize = 16;

/// Number of keys on the hexadecimal keypad
pub const KEY_COUNT: usize = 16;

/// Bytes per glyph in the sprite sheet
pub const SPRITE_HEIGHT: u16 = 5;

/// Rate at which the host is expected to call `Chip8::tick`
pub const TIMER_HZ: u32 = 60;

/// Nanoseconds per CPU cycle for a host pacing `Chip8::cycle` at ~500Hz.
/// The core never sleeps or reads a clock; this is only a suggestion for hosts
pub const CLOCK_SPEED: u64 = 2_000_000;

/// # Sprite Sheet
/// The hexadecimal digits 0..F, each 5 rows tall and 4 pixels wide.
/// Lives at 0x000..0x050 so that `FX29` can find digit `d` at `d * 5`.
///
/// ```text
/// 0xF0  ####
/// 0x90  #  #
/// 0x90  #  #
/// 0x90  #  #
/// 0xF0  ####
/// ```
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
