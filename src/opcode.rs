/// # Opcodes
///
/// Chip-8 opcodes are 16 bits, stored big-endian across two bytes of memory.
/// Dispatch is cased on some combination of nibbles:
/// - `(n, _, _, _)` the instruction family; applies to all opcodes
/// - `(_, _, _, n)` a sub-operation within families 5, 8 and 9
/// - `(_, _, n, n)` a sub-operation within families 0, E and F
///
/// The remaining nibbles carry operands.
/// - `[_nnn]` a 12-bit address
/// - `[__kk]` an 8-bit immediate
/// - `[___n]` a 4-bit immediate, the height of a sprite
/// - `[_x__]` the register Vx, or the upper bound of V0..=Vx
/// - `[__y_]` the register Vy
pub trait Opcode {
    /// The Opcode's four nibbles, most significant first.
    fn nibbles(&self) -> (u8, u8, u8, u8);

    /// `[_x__]` as a register index
    fn x(&self) -> usize;

    /// `[__y_]` as a register index
    fn y(&self) -> usize;

    /// `[___n]`
    fn n(&self) -> u8;

    /// `[__kk]`
    fn kk(&self) -> u8;

    /// `[_nnn]`
    fn addr(&self) -> u16;
}

impl Opcode for u16 {
    fn nibbles(&self) -> (u8, u8, u8, u8) {
        (
            ((self & 0xF000) >> 12) as u8,
            ((self & 0x0F00) >> 8) as u8,
            ((self & 0x00F0) >> 4) as u8,
            self.n(),
        )
    }

    fn x(&self) -> usize {
        ((self & 0x0F00) >> 8) as usize
    }

    fn y(&self) -> usize {
        ((self & 0x00F0) >> 4) as usize
    }

    fn n(&self) -> u8 {
        (self & 0x000F) as u8
    }

    fn kk(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn addr(&self) -> u16 {
        self & 0x0FFF
    }
}

/// Joins the two bytes of an instruction into an opcode.
pub fn from_bytes(high: u8, low: u8) -> u16 {
    u16::from(high) << 8 | u16::from(low)
}
