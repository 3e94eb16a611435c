use rand::{Rng, RngCore};

use crate::constants::{SPRITE_HEIGHT, STACK_DEPTH};
use crate::display;
use crate::error::{Error, Result};
use crate::opcode::Opcode;
use crate::state::State;

/// What the cycle should do with the pc once an operation has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramCounter {
    /// pc += 2
    Next,
    /// pc += 4
    Skip,
    /// pc = addr
    Jump(u16),
    /// pc stays put until a key lands in Vx
    Wait(u8),
}

impl ProgramCounter {
    fn skip_if(condition: bool) -> Self {
        if condition {
            ProgramCounter::Skip
        } else {
            ProgramCounter::Next
        }
    }
}

/// Every operation shares this signature so the instruction table can hold them all
pub type Operation =
    fn(op: &dyn Opcode, state: &mut State, rng: &mut dyn RngCore) -> Result<ProgramCounter>;

/// clear
pub fn clr(_op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    display::clear(&mut state.frame_buffer);
    state.draw_flag = true;
    Ok(ProgramCounter::Next)
}

/// PC = STACK.pop() + 2
pub fn rts(_op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    if state.sp == 0 {
        return Err(Error::StackUnderflow { address: state.pc });
    }
    state.sp -= 1;
    Ok(ProgramCounter::Jump(state.stack[state.sp as usize].wrapping_add(0x2)))
}

/// PC = addr
pub fn jump(op: &dyn Opcode, _state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::Jump(op.addr()))
}

/// STACK.push(PC); PC = addr
pub fn call(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    if state.sp as usize >= STACK_DEPTH {
        return Err(Error::StackOverflow { address: state.pc });
    }
    state.stack[state.sp as usize] = state.pc;
    state.sp += 1;
    Ok(ProgramCounter::Jump(op.addr()))
}

/// if Vx == kk then pc += 2
pub fn ske(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::skip_if(state.register(op.x()) == op.kk()))
}

/// if Vx != kk then pc += 2
pub fn skne(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::skip_if(state.register(op.x()) != op.kk()))
}

/// if Vx == Vy then pc += 2
pub fn skre(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::skip_if(
        state.register(op.x()) == state.register(op.y()),
    ))
}

/// Vx = kk
pub fn load(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.v[op.x()] = op.kk();
    Ok(ProgramCounter::Next)
}

/// Vx += kk
/// Overflow wraps and VF is left alone
pub fn add(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.v[op.x()] = state.register(op.x()).wrapping_add(op.kk());
    Ok(ProgramCounter::Next)
}

/// Vx = Vy
pub fn mv(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.v[op.x()] = state.register(op.y());
    Ok(ProgramCounter::Next)
}

/// Vx |= Vy
pub fn or(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.v[op.x()] |= state.register(op.y());
    Ok(ProgramCounter::Next)
}

/// Vx &= Vy
pub fn and(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.v[op.x()] &= state.register(op.y());
    Ok(ProgramCounter::Next)
}

/// Vx ^= Vy
pub fn xor(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.v[op.x()] ^= state.register(op.y());
    Ok(ProgramCounter::Next)
}

/// Vx += Vy; VF = overflow
pub fn addr(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let (res, over) = state
        .register(op.x())
        .overflowing_add(state.register(op.y()));
    state.v[op.x()] = res;
    state.set_flag(over);
    Ok(ProgramCounter::Next)
}

/// VF = Vx > Vy; Vx -= Vy
pub fn sub(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let (vx, vy) = (state.register(op.x()), state.register(op.y()));
    state.set_flag(vx > vy);
    state.v[op.x()] = vx.wrapping_sub(vy);
    Ok(ProgramCounter::Next)
}

/// VF = Vx & 1; Vx >>= 1
pub fn shr(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let vx = state.register(op.x());
    state.set_flag(vx & 0x1 == 0x1);
    state.v[op.x()] = vx >> 1;
    Ok(ProgramCounter::Next)
}

/// VF = Vy > Vx; Vx = Vy - Vx
pub fn subn(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let (vx, vy) = (state.register(op.x()), state.register(op.y()));
    state.set_flag(vy > vx);
    state.v[op.x()] = vy.wrapping_sub(vx);
    Ok(ProgramCounter::Next)
}

/// VF = Vx >> 7; Vx <<= 1
pub fn shl(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let vx = state.register(op.x());
    state.set_flag((vx >> 7) & 0x1 == 0x1);
    state.v[op.x()] = vx << 1;
    Ok(ProgramCounter::Next)
}

/// if Vx != Vy then pc += 2
pub fn skrne(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::skip_if(
        state.register(op.x()) != state.register(op.y()),
    ))
}

/// I = addr
pub fn loadi(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.i = op.addr();
    Ok(ProgramCounter::Next)
}

/// PC = V0 + addr
pub fn jumpi(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::Jump(
        u16::from(state.register(0x0)) + op.addr(),
    ))
}

/// Vx = rand_byte & kk
pub fn rnd(op: &dyn Opcode, state: &mut State, rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let rand_byte: u8 = rng.gen();
    state.v[op.x()] = rand_byte & op.kk();
    Ok(ProgramCounter::Next)
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite at memory i..i+n onto the FrameBuffer at Vx, Vy.
/// VF is set if any pixels were erased
pub fn draw(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let height = op.n() as usize;
    let mut sprite = [0; 15];
    sprite[..height].copy_from_slice(state.read(state.i, height)?);

    let (x, y) = (state.register(op.x()), state.register(op.y()));
    let collision = display::draw(&mut state.frame_buffer, x, y, &sprite[..height]);
    state.set_flag(collision);
    state.draw_flag = true;
    Ok(ProgramCounter::Next)
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::skip_if(state.is_pressed(state.register(op.x()))))
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    Ok(ProgramCounter::skip_if(!state.is_pressed(state.register(op.x()))))
}

/// Vx = DT
pub fn moved(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.v[op.x()] = state.delay_timer;
    Ok(ProgramCounter::Next)
}

/// await keypress for Vx
/// The first run only snapshots the keyboard and suspends. Later runs complete
/// on a key that has gone from released to pressed since then; the lowest one wins
pub fn keyd(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let register = op.x() as u8;
    if state.register_needing_key != Some(register) {
        state.register_needing_key = Some(register);
        state.keys_at_wait = state.pressed_keys;
        return Ok(ProgramCounter::Wait(register));
    }

    match state.first_newly_pressed() {
        Some(key) => {
            state.v[op.x()] = key;
            state.register_needing_key = None;
            Ok(ProgramCounter::Next)
        }
        None => {
            // a key released while waiting may be pressed again to answer
            state.keys_at_wait = state.pressed_keys;
            Ok(ProgramCounter::Wait(register))
        }
    }
}

/// DT = Vx
pub fn loads(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.delay_timer = state.register(op.x());
    Ok(ProgramCounter::Next)
}

/// ST = Vx
pub fn ld(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.sound_timer = state.register(op.x());
    Ok(ProgramCounter::Next)
}

/// I += Vx, wrapping at 0xFFFF; VF = I + Vx >= 0xFFF
pub fn addi(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let (sum, carry) = state.i.overflowing_add(u16::from(state.register(op.x())));
    state.i = sum;
    state.set_flag(carry || sum >= 0xFFF);
    Ok(ProgramCounter::Next)
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    state.i = u16::from(state.register(op.x())) * SPRITE_HEIGHT;
    Ok(ProgramCounter::Next)
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let vx = state.register(op.x());
    let digits = [vx / 100, vx / 10 % 10, vx % 10];
    let i = state.i;
    state.read_mut(i, 3)?.copy_from_slice(&digits);
    Ok(ProgramCounter::Next)
}

/// mem[I..=I+x] = V0..=Vx
pub fn stor(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let (i, v) = (state.i, state.v);
    state.read_mut(i, op.x() + 1)?.copy_from_slice(&v[..=op.x()]);
    Ok(ProgramCounter::Next)
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(op: &dyn Opcode, state: &mut State, _rng: &mut dyn RngCore) -> Result<ProgramCounter> {
    let mut v = state.v;
    v[..=op.x()].copy_from_slice(state.read(state.i, op.x() + 1)?);
    state.v = v;
    Ok(ProgramCounter::Next)
}
