use std::io;
use std::path::PathBuf;

/// Fatal problems getting a program into memory. Nothing has been executed
/// when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("can't open program {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    TooLarge { size: usize, max: usize },
}

/// Faults raised while executing. The instruction at `pc` was not executed
/// and machine state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("stack overflow: CALL at {pc:#05X} with all 16 frames in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: RET at {pc:#05X} with empty call stack")]
    StackUnderflow { pc: u16 },
}
