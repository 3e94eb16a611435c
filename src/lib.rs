pub use chip8::{Chip8, Step};
pub use constants::{CLOCK_SPEED, TIMER_HZ};
pub use error::{Error, Result};
pub use state::{FrameBuffer, Status};

mod chip8;
pub mod constants;
pub mod display;
mod error;
mod instruction;
pub mod opcode;
mod operations;
pub mod state;
