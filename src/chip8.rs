pub mod opcode;
pub mod quirks;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ExecError, LoadError};
use opcode::{Instruction, Opcode};
use quirks::{LoadStoreQuirk, Quirks, ShiftQuirk, TimerClock};

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200;
/// largest program image that fits between 0x200 and the top of memory
pub const MAX_IMAGE_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub const STACK_DEPTH: usize = 16;

// the address space is 12 bits
const ADDR_MASK: usize = 0x0FFF;

const FONT_SPRITE_BYTES: u16 = 5;
const FONTSET: [u8; 80] = [
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

/// What a single `step` did, for the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub instruction: Instruction,
    /// sound timer was about to expire; the buzzer should sound
    pub beep: bool,
    /// FX0A found no key down and will run again next step
    pub waiting: bool,
}

// how the program counter moves after an instruction
enum Flow {
    Next,
    Skip,
    Jump(u16),
    Wait,
}

impl Flow {
    fn skip_if(cond: bool) -> Self {
        if cond {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

pub struct Chip8 {
    // CHIP-8 VM
    memory: [u8; MEMORY_SIZE],
    v: [u8; 16], // registers V0-VE (VF is flag for some instructions)
    i: u16,      // address register
    pc: u16,
    gfx: [bool; WIDTH * HEIGHT], // pixels state, row-major
    delay_timer: u8,
    sound_timer: u8,
    stack: [u16; STACK_DEPTH],
    sp: u16,
    key: [bool; 16], // hex keypad state

    // emulator resources
    draw_flag: bool,
    rng: StdRng,
    quirks: Quirks,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        Self::with_rng(quirks, StdRng::from_entropy())
    }

    /// Machine whose CXNN sequence is reproducible.
    pub fn with_seed(quirks: Quirks, seed: u64) -> Self {
        Self::with_rng(quirks, StdRng::seed_from_u64(seed))
    }

    fn with_rng(quirks: Quirks, rng: StdRng) -> Self {
        let mut chip8 = Self {
            memory: [0; MEMORY_SIZE],
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            gfx: [false; WIDTH * HEIGHT],
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            sp: 0,
            key: [false; 16],

            draw_flag: false,
            rng,
            quirks,
        };
        chip8.reset();
        chip8
    }

    /// Zero all machine state and put the font back at 0x000.
    pub fn reset(&mut self) {
        self.memory = [0; MEMORY_SIZE];
        // CHIP-8 systems had the interpreter in the first 512 bytes of memory
        // since we're emulating that we can just store the fontset there
        self.memory[..FONTSET.len()].copy_from_slice(&FONTSET);
        self.v = [0; 16];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.gfx = [false; WIDTH * HEIGHT];
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.key = [false; 16];
        self.draw_flag = false;
        log::debug!("machine reset");
    }

    /// Copy a raw program image to 0x200. Memory is untouched if it doesn't fit.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() > MAX_IMAGE_SIZE {
            return Err(LoadError::TooLarge {
                size: image.len(),
                max: MAX_IMAGE_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + image.len()].copy_from_slice(image);
        log::debug!("loaded {} byte program at {:#05X}", image.len(), start);
        Ok(())
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    /// Register V(x & 0xF).
    pub fn v(&self, x: usize) -> u8 {
        self.v[x & 0xF]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn framebuffer(&self) -> &[bool; WIDTH * HEIGHT] {
        &self.gfx
    }

    /// Pixel at (x, y), wrapping coordinates off the edge the same way
    /// sprites do.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.gfx[WIDTH * (y % HEIGHT) + x % WIDTH]
    }

    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    /// Called by the renderer once it has presented the framebuffer.
    pub fn clear_draw_flag(&mut self) {
        self.draw_flag = false;
    }

    pub fn set_key(&mut self, key: usize, pressed: bool) {
        self.key[key & 0xF] = pressed;
    }

    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.key = keys;
    }

    pub fn clear_keys(&mut self) {
        self.key = [false; 16];
    }

    /// Decrement both timers if they're running. Returns true when the sound
    /// timer was on its last tick.
    pub fn tick_timers(&mut self) -> bool {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }
        let beep = self.sound_timer == 1;
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
        beep
    }

    /// Fetch, decode and execute one instruction, then run the timers if
    /// they're clocked per step.
    pub fn step(&mut self) -> Result<Cycle, ExecError> {
        let opcode = self.fetch();
        let instruction = Instruction::decode(opcode);
        log::trace!("{:03X}: {} {}", self.pc, opcode, instruction);

        let waiting = match self.execute(instruction)? {
            Flow::Next => {
                self.pc = self.pc.wrapping_add(2);
                false
            }
            Flow::Skip => {
                self.pc = self.pc.wrapping_add(4);
                false
            }
            Flow::Jump(addr) => {
                self.pc = addr;
                false
            }
            Flow::Wait => true,
        };

        let beep = match self.quirks.timers {
            TimerClock::PerStep => self.tick_timers(),
            TimerClock::External => false,
        };

        Ok(Cycle {
            instruction,
            beep,
            waiting,
        })
    }

    fn fetch(&self) -> Opcode {
        // two-byte opcodes, high byte first
        let pc = self.pc as usize & ADDR_MASK;
        Opcode::from_bytes(self.memory[pc], self.memory[(pc + 1) & ADDR_MASK])
    }

    fn mem_index(&self, offset: usize) -> usize {
        (self.i as usize + offset) & ADDR_MASK
    }

    fn execute(&mut self, instruction: Instruction) -> Result<Flow, ExecError> {
        use Instruction::*;

        let flow = match instruction {
            Cls => {
                self.gfx = [false; WIDTH * HEIGHT];
                self.draw_flag = true;
                Flow::Next
            }
            Ret => {
                if self.sp == 0 {
                    log::error!("RET with empty stack at {:03X}", self.pc);
                    return Err(ExecError::StackUnderflow { pc: self.pc });
                }
                self.sp -= 1;
                let sp = self.sp as usize;
                let addr = self.stack[sp];
                self.stack[sp] = 0;
                Flow::Jump(addr.wrapping_add(2))
            }
            Jp { addr } => Flow::Jump(addr),
            Call { addr } => {
                if self.sp as usize >= STACK_DEPTH {
                    log::error!("CALL with full stack at {:03X}", self.pc);
                    return Err(ExecError::StackOverflow { pc: self.pc });
                }
                self.stack[self.sp as usize] = self.pc;
                self.sp += 1;
                Flow::Jump(addr)
            }
            SeByte { x, byte } => Flow::skip_if(self.v[x] == byte),
            SneByte { x, byte } => Flow::skip_if(self.v[x] != byte),
            SeReg { x, y } => Flow::skip_if(self.v[x] == self.v[y]),
            LdByte { x, byte } => {
                self.v[x] = byte;
                Flow::Next
            }
            AddByte { x, byte } => {
                // no carry
                self.v[x] = self.v[x].wrapping_add(byte);
                Flow::Next
            }
            // VF is written last so it holds the flag even when X is F
            LdReg { x, y } => {
                self.v[x] = self.v[y];
                Flow::Next
            }
            Or { x, y } => {
                self.v[x] |= self.v[y];
                Flow::Next
            }
            And { x, y } => {
                self.v[x] &= self.v[y];
                Flow::Next
            }
            Xor { x, y } => {
                self.v[x] ^= self.v[y];
                Flow::Next
            }
            AddReg { x, y } => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[0xF] = carry as u8;
                Flow::Next
            }
            Sub { x, y } => {
                // VF = NOT borrow
                let no_borrow = self.v[x] > self.v[y];
                self.v[x] = self.v[x].wrapping_sub(self.v[y]);
                self.v[0xF] = no_borrow as u8;
                Flow::Next
            }
            Subn { x, y } => {
                let no_borrow = self.v[y] > self.v[x];
                self.v[x] = self.v[y].wrapping_sub(self.v[x]);
                self.v[0xF] = no_borrow as u8;
                Flow::Next
            }
            Shr { x, y } => {
                let src = self.shift_source(x, y);
                self.v[x] = src >> 1;
                self.v[0xF] = src & 0x1;
                Flow::Next
            }
            Shl { x, y } => {
                let src = self.shift_source(x, y);
                self.v[x] = src << 1;
                self.v[0xF] = src >> 7;
                Flow::Next
            }
            SneReg { x, y } => Flow::skip_if(self.v[x] != self.v[y]),
            LdI { addr } => {
                self.i = addr;
                Flow::Next
            }
            JpV0 { addr } => Flow::Jump(addr + self.v[0] as u16),
            Rnd { x, mask } => {
                self.v[x] = self.rng.gen::<u8>() & mask;
                Flow::Next
            }
            Drw { x, y, height } => {
                self.draw(x, y, height);
                Flow::Next
            }
            Skp { x } => Flow::skip_if(self.key[self.v[x] as usize & 0xF]),
            Sknp { x } => Flow::skip_if(!self.key[self.v[x] as usize & 0xF]),
            LdVxDt { x } => {
                self.v[x] = self.delay_timer;
                Flow::Next
            }
            LdKey { x } => match self.key.iter().position(|&pressed| pressed) {
                Some(key) => {
                    self.v[x] = key as u8;
                    Flow::Next
                }
                // repeat this instruction until a key is down
                None => Flow::Wait,
            },
            LdDtVx { x } => {
                self.delay_timer = self.v[x];
                Flow::Next
            }
            LdStVx { x } => {
                self.sound_timer = self.v[x];
                Flow::Next
            }
            AddI { x } => {
                self.i = self.i.wrapping_add(self.v[x] as u16);
                Flow::Next
            }
            LdFont { x } => {
                self.i = self.v[x] as u16 * FONT_SPRITE_BYTES;
                Flow::Next
            }
            Bcd { x } => {
                // so 193 becomes [1, 9, 3] in memory at I
                let vx = self.v[x];
                let digits = [vx / 100, (vx / 10) % 10, vx % 10];
                for (offset, digit) in digits.iter().enumerate() {
                    let addr = self.mem_index(offset);
                    self.memory[addr] = *digit;
                }
                Flow::Next
            }
            Store { x } => {
                for offset in 0..=x {
                    let addr = self.mem_index(offset);
                    self.memory[addr] = self.v[offset];
                }
                self.advance_i_after_load_store(x);
                Flow::Next
            }
            Load { x } => {
                for offset in 0..=x {
                    self.v[offset] = self.memory[self.mem_index(offset)];
                }
                self.advance_i_after_load_store(x);
                Flow::Next
            }
            Unknown(op) => {
                log::warn!("unknown opcode {} at {:03X}, skipping", op, self.pc);
                Flow::Next
            }
        };
        Ok(flow)
    }

    fn shift_source(&self, x: usize, y: usize) -> u8 {
        match self.quirks.shift {
            ShiftQuirk::Legacy => self.v[y],
            ShiftQuirk::Modern => self.v[x],
        }
    }

    fn advance_i_after_load_store(&mut self, x: usize) {
        if self.quirks.load_store == LoadStoreQuirk::Increment {
            self.i = self.i.wrapping_add(x as u16 + 1);
        }
    }

    // draw a sprite at VX,VY with a width of 8 pixels and a height of N pixels
    // each row of 8 pixels is bit-coded in memory starting at I
    // currently drawn pixels are XORd with pixels in memory, wrapping at the edges
    fn draw(&mut self, x: usize, y: usize, height: u8) {
        let vx = self.v[x] as usize;
        let vy = self.v[y] as usize;

        let mut collision = false;
        for row in 0..height as usize {
            let sprite = self.memory[self.mem_index(row)];
            for col in 0..8 {
                if sprite & (0x80 >> col) == 0 {
                    continue;
                }
                let offset = WIDTH * ((vy + row) % HEIGHT) + (vx + col) % WIDTH;
                collision |= self.gfx[offset];
                self.gfx[offset] ^= true;
            }
        }

        self.v[0xF] = collision as u8;
        self.draw_flag = true;
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(program: &[u8]) -> Chip8 {
        machine_with(Quirks::default(), program)
    }

    fn machine_with(quirks: Quirks, program: &[u8]) -> Chip8 {
        let mut c = Chip8::with_seed(quirks, 8);
        c.load_image(program).unwrap();
        c
    }

    fn run(c: &mut Chip8, steps: usize) {
        for _ in 0..steps {
            c.step().unwrap();
        }
    }

    #[test]
    fn test_reset_state() {
        let mut c = machine(&[0x6A, 0x42, 0xA1, 0x23]);
        run(&mut c, 2);
        c.reset();
        assert_eq!(c.pc(), 0x200);
        assert_eq!(c.i(), 0);
        assert_eq!(c.registers(), &[0; 16]);
        assert_eq!(&c.memory()[..80], &FONTSET[..]);
        assert!(c.memory()[0x200..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_too_large() {
        let mut c = Chip8::with_seed(Quirks::default(), 0);
        let err = c.load_image(&[0xAA; MAX_IMAGE_SIZE + 1]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TooLarge {
                size: 3585,
                max: 3584
            }
        ));
        assert!(c.memory()[0x200..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_jump() {
        let mut c = machine(&[0x13, 0x00]);
        run(&mut c, 1);
        assert_eq!(c.pc(), 0x300);
    }

    #[test]
    fn test_jump_v0() {
        let mut c = machine(&[0x60, 0x04, 0xB3, 0x00]);
        run(&mut c, 2);
        assert_eq!(c.pc(), 0x304);
    }

    #[test]
    fn test_skips() {
        // SE V0, 0 skips; SNE V0, 0 doesn't
        let mut c = machine(&[0x30, 0x00, 0x00, 0x00, 0x40, 0x00]);
        run(&mut c, 1);
        assert_eq!(c.pc(), 0x204);
        run(&mut c, 1);
        assert_eq!(c.pc(), 0x206);

        // SE V1, V2 / SNE V1, V2 with V1 != V2
        let mut c = machine(&[0x61, 0x01, 0x51, 0x20, 0x91, 0x20]);
        run(&mut c, 2);
        assert_eq!(c.pc(), 0x204);
        run(&mut c, 1);
        assert_eq!(c.pc(), 0x208);
    }

    #[test]
    fn test_add_byte_wraps_without_flag() {
        let mut c = machine(&[0x65, 0xFF, 0x75, 0x02]);
        run(&mut c, 2);
        assert_eq!(c.v(5), 0x01);
        assert_eq!(c.v(0xF), 0);
    }

    #[test]
    fn test_logic_ops() {
        let mut c = machine(&[
            0x60, 0b1100, 0x61, 0b1010, // V0, V1
            0x82, 0x00, 0x82, 0x11, // V2 = V0 | V1
            0x83, 0x00, 0x83, 0x12, // V3 = V0 & V1
            0x84, 0x00, 0x84, 0x13, // V4 = V0 ^ V1
        ]);
        run(&mut c, 8);
        assert_eq!(c.v(2), 0b1110);
        assert_eq!(c.v(3), 0b1000);
        assert_eq!(c.v(4), 0b0110);
    }

    #[test]
    fn test_subn() {
        let mut c = machine(&[0x60, 0x05, 0x61, 0x07, 0x80, 0x17]);
        run(&mut c, 3);
        assert_eq!(c.v(0), 2);
        assert_eq!(c.v(0xF), 1);

        let mut c = machine(&[0x60, 0x07, 0x61, 0x05, 0x80, 0x17]);
        run(&mut c, 3);
        assert_eq!(c.v(0), 0xFE);
        assert_eq!(c.v(0xF), 0);
    }

    #[test]
    fn test_flag_wins_when_x_is_vf() {
        // ADD VF, V0 with carry leaves the flag, not the sum
        let mut c = machine(&[0x6F, 0xFF, 0x60, 0x02, 0x8F, 0x04]);
        run(&mut c, 3);
        assert_eq!(c.v(0xF), 1);
    }

    #[test]
    fn test_shift_legacy() {
        let mut c = machine(&[0x60, 0x00, 0x61, 0x81, 0x80, 0x16, 0x82, 0x1E]);
        run(&mut c, 4);
        assert_eq!(c.v(0), 0x40);
        assert_eq!(c.v(2), 0x02);
        assert_eq!(c.v(1), 0x81);
        assert_eq!(c.v(0xF), 1);
    }

    #[test]
    fn test_shift_modern() {
        let mut c = machine_with(
            Quirks::modern(),
            &[0x60, 0x03, 0x61, 0xFF, 0x80, 0x16],
        );
        run(&mut c, 3);
        assert_eq!(c.v(0), 0x01);
        assert_eq!(c.v(0xF), 1);

        let mut c = machine_with(
            Quirks::modern(),
            &[0x60, 0x40, 0x61, 0xFF, 0x80, 0x1E],
        );
        run(&mut c, 3);
        assert_eq!(c.v(0), 0x80);
        assert_eq!(c.v(0xF), 0);
    }

    #[test]
    fn test_random_masked() {
        let mut c = machine(&[0xC0, 0x0F, 0xC1, 0x00]);
        run(&mut c, 2);
        assert_eq!(c.v(0) & 0xF0, 0);
        assert_eq!(c.v(1), 0);
    }

    #[test]
    fn test_random_seeded() {
        let program = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];
        let mut a = machine(&program);
        let mut b = machine(&program);
        run(&mut a, 3);
        run(&mut b, 3);
        assert_eq!(a.registers(), b.registers());
    }

    #[test]
    fn test_draw_font_glyph() {
        // LD V0, 0xA; LD F, V0; DRW V1, V1, 5
        let mut c = machine(&[0x60, 0x0A, 0xF0, 0x29, 0xD1, 0x15]);
        run(&mut c, 3);
        assert_eq!(c.i(), 50);
        // top row of A is 0xF0
        assert!((0..4).all(|x| c.pixel(x, 0)));
        assert!(!c.pixel(4, 0));
        assert_eq!(c.v(0xF), 0);
        assert!(c.draw_flag());
    }

    #[test]
    fn test_draw_wraps() {
        // sprite 0xFF at (60, 31) wraps to the left edge and the top row
        let mut c = machine(&[
            0x60, 60, 0x61, 31, 0xA2, 0x0A, 0xD0, 0x12, 0x00, 0x00, 0xFF, 0xFF,
        ]);
        run(&mut c, 4);
        assert!(c.pixel(63, 31));
        assert!(c.pixel(0, 31));
        assert!(c.pixel(3, 31));
        assert!(!c.pixel(4, 31));
        assert!(c.pixel(0, 0));
        assert!(c.pixel(60, 0));
    }

    #[test]
    fn test_draw_flag_cleared_only_by_renderer() {
        let mut c = machine(&[0x00, 0xE0, 0x60, 0x01]);
        run(&mut c, 1);
        assert!(c.draw_flag());
        run(&mut c, 1);
        assert!(c.draw_flag());
        c.clear_draw_flag();
        assert!(!c.draw_flag());
    }

    #[test]
    fn test_key_skips() {
        let mut c = machine(&[0x60, 0x05, 0xE0, 0x9E, 0x00, 0x00, 0xE0, 0xA1]);
        c.set_key(5, true);
        run(&mut c, 2);
        assert_eq!(c.pc(), 0x206);
        run(&mut c, 1);
        assert_eq!(c.pc(), 0x208);
    }

    #[test]
    fn test_timers_per_step() {
        let mut c = machine(&[0x60, 0x03, 0xF0, 0x15, 0xF0, 0x18, 0xF1, 0x07]);
        run(&mut c, 3);
        // set on step 2, ticked at the end of steps 2 and 3
        assert_eq!(c.delay_timer(), 1);
        assert_eq!(c.sound_timer(), 2);
        run(&mut c, 1);
        assert_eq!(c.v(1), 1);
    }

    #[test]
    fn test_beep_edge() {
        let mut c = machine(&[0x60, 0x02, 0xF0, 0x18, 0x00, 0x00, 0x00, 0x00]);
        let beeps: Vec<bool> = (0..4).map(|_| c.step().unwrap().beep).collect();
        assert_eq!(beeps, vec![false, false, true, false]);
        assert!(!c.sound_active());
    }

    #[test]
    fn test_timers_external() {
        let quirks = Quirks {
            timers: TimerClock::External,
            ..Quirks::default()
        };
        let mut c = machine_with(quirks, &[0x60, 0x02, 0xF0, 0x15, 0x00, 0x00]);
        run(&mut c, 3);
        assert_eq!(c.delay_timer(), 2);
        assert!(!c.tick_timers());
        assert_eq!(c.delay_timer(), 1);
    }

    #[test]
    fn test_add_i_and_bcd() {
        let mut c = machine(&[0xA3, 0x00, 0x60, 193, 0xF0, 0x1E, 0xF0, 0x33]);
        run(&mut c, 4);
        assert_eq!(c.i(), 0x300 + 193);
        let i = c.i() as usize;
        assert_eq!(&c.memory()[i..i + 3], &[1, 9, 3]);
    }

    #[test]
    fn test_store_unchanged_index() {
        let mut c = machine_with(
            Quirks::modern(),
            &[0x60, 0x11, 0x61, 0x22, 0xA3, 0x00, 0xF1, 0x55],
        );
        run(&mut c, 4);
        assert_eq!(c.i(), 0x300);
        assert_eq!(&c.memory()[0x300..0x303], &[0x11, 0x22, 0x00]);
    }

    #[test]
    fn test_store_increments_index() {
        let mut c = machine(&[0x60, 0x11, 0x61, 0x22, 0xA3, 0x00, 0xF1, 0x55]);
        run(&mut c, 4);
        assert_eq!(c.i(), 0x302);
    }

    #[test]
    fn test_stack_underflow() {
        let mut c = machine(&[0x00, 0xEE]);
        assert_eq!(c.step(), Err(ExecError::StackUnderflow { pc: 0x200 }));
        assert_eq!(c.pc(), 0x200);
    }

    #[test]
    fn test_stack_overflow() {
        // CALL 0x200 recursing forever
        let mut c = machine(&[0x22, 0x00]);
        run(&mut c, STACK_DEPTH);
        assert_eq!(c.sp(), 16);
        assert_eq!(c.step(), Err(ExecError::StackOverflow { pc: 0x200 }));
        assert_eq!(c.sp(), 16);
        assert_eq!(c.stack().len(), 16);
    }

    #[test]
    fn test_unknown_opcode_advances() {
        let mut c = machine(&[0x01, 0x23, 0xF1, 0xFF]);
        let cycle = c.step().unwrap();
        assert_eq!(cycle.instruction, Instruction::Unknown(Opcode(0x0123)));
        assert_eq!(c.pc(), 0x202);
        run(&mut c, 1);
        assert_eq!(c.pc(), 0x204);
    }

    #[test]
    fn test_index_wraps_at_top_of_memory() {
        let mut c = machine_with(
            Quirks::modern(),
            &[
                0xAF, 0xFF, // LD I, 0xFFF
                0x60, 0xFF, 0x61, 0xAB, // V0, V1
                0xF0, 0x33, // BCD of 255
                0xF1, 0x55, // LD [I], V1
                0x60, 0x00, 0x61, 0x00, // clobber V0, V1
                0xF1, 0x65, // LD V1, [I]
                0xD2, 0x23, // DRW V2, V2, 3
            ],
        );
        run(&mut c, 4);
        assert_eq!(c.memory()[0xFFF], 2);
        assert_eq!(&c.memory()[..2], &[5, 5]);

        run(&mut c, 4);
        assert_eq!(c.memory()[0xFFF], 0xFF);
        assert_eq!(&c.memory()[..2], &[0xAB, 5]);
        assert_eq!(c.v(0), 0xFF);
        assert_eq!(c.v(1), 0xAB);

        // sprite rows come from 0xFFF, 0x000 and 0x001
        run(&mut c, 1);
        assert!((0..8).all(|x| c.pixel(x, 0)));
        assert!(c.pixel(0, 1) && !c.pixel(1, 1) && c.pixel(2, 1));
        assert!(!c.pixel(0, 2) && c.pixel(5, 2) && c.pixel(7, 2));
        assert_eq!(c.i(), 0xFFF);
    }

    #[test]
    fn test_add_i_wraps_at_16_bits() {
        // LD I, 0xFFF; LD V0, 0xFF; loop: ADD I, V0; JP loop
        let mut c = machine(&[0xAF, 0xFF, 0x60, 0xFF, 0xF0, 0x1E, 0x12, 0x04]);
        run(&mut c, 2 + 240 * 2);
        assert_eq!(c.i(), 0xFF0F);
        run(&mut c, 2);
        assert_eq!(c.i(), 0x000E);
    }

    #[test]
    fn test_accessors_wrap() {
        // LD I, font 0; DRW V0, V0, 5
        let mut c = machine(&[0xA0, 0x00, 0xD0, 0x05]);
        run(&mut c, 2);
        assert!(c.pixel(0, 0));
        assert!(c.pixel(64, 0));
        assert!(c.pixel(0, 32));
        assert!(!c.pixel(68, 0));
        assert_eq!(c.v(0x10), c.v(0));
    }

    #[test]
    fn test_fetch_wraps_at_top_of_memory() {
        let mut c = machine(&[0x1F, 0xFF]);
        run(&mut c, 1);
        assert_eq!(c.pc(), 0xFFF);
        // 0xFFF, 0x000 = 0x00F0, not a known opcode
        let cycle = c.step().unwrap();
        assert_eq!(cycle.instruction, Instruction::Unknown(Opcode(0x00F0)));
    }
}
