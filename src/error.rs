/// Everything that can go wrong while loading or running a ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The ROM doesn't fit between 0x200 and the top of memory
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    OutOfRange { size: usize, max: usize },

    /// A call was made with all 16 stack levels in use
    #[error("stack overflow: call at {address:#06X} with a full stack")]
    StackOverflow { address: u16 },

    /// A return was made with an empty stack
    #[error("stack underflow: return at {address:#06X} with an empty stack")]
    StackUnderflow { address: u16 },

    /// No instruction matches the opcode; the program counter has already moved past it
    #[error("unknown opcode {opcode:#06X} at {address:#06X}")]
    UnknownOpcode { opcode: u16, address: u16 },

    /// An instruction fetch or memory access reached past 0xFFF
    #[error("memory access out of range at {address:#06X}")]
    MemoryOutOfRange { address: usize },
}

impl Error {
    /// Whether the running program can't sensibly continue.
    /// Only unknown opcodes are safe to step past.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::UnknownOpcode { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_opcode_is_not_fatal() {
        let err = Error::UnknownOpcode {
            opcode: 0xFFFF,
            address: 0x200,
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_stack_faults_are_fatal() {
        assert!(Error::StackOverflow { address: 0x200 }.is_fatal());
        assert!(Error::StackUnderflow { address: 0x200 }.is_fatal());
        assert!(Error::OutOfRange { size: 4000, max: 3584 }.is_fatal());
    }

    #[test]
    fn test_error_messages_carry_the_opcode() {
        let err = Error::UnknownOpcode {
            opcode: 0x5AB1,
            address: 0x204,
        };
        assert_eq!(err.to_string(), "unknown opcode 0x5AB1 at 0x0204");
    }
}
