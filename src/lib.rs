//! CHIP-8 virtual machine.
//!
//! `Chip8` holds all architectural state. A front-end owns one, loads a
//! program with `load_image` (or `loader::load_file`), sets keypad state
//! and calls `step` in its own run loop, drawing `framebuffer` whenever
//! `draw_flag` is set.

pub mod chip8;
pub mod error;
pub mod loader;

pub use crate::chip8::opcode::{Instruction, Opcode};
pub use crate::chip8::quirks::{LoadStoreQuirk, Quirks, ShiftQuirk, TimerClock};
pub use crate::chip8::{Chip8, Cycle, HEIGHT, MAX_IMAGE_SIZE, WIDTH};
pub use crate::error::{ExecError, LoadError};
