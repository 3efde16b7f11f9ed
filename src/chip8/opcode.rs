use std::fmt;

/// A raw two-byte instruction word, fetched big-endian from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Opcode((hi as u16) << 8 | lo as u16)
    }

    /// high nibble, the instruction class
    pub fn class(self) -> u8 {
        ((self.0 & 0xF000) >> 12) as u8
    }

    pub fn x(self) -> usize {
        ((self.0 & 0x0F00) >> 8) as usize
    }

    pub fn y(self) -> usize {
        ((self.0 & 0x00F0) >> 4) as usize
    }

    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    pub fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// Every instruction the interpreter understands. Register operands are
/// indexes into V0-VF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Cls,                                   // 00E0
    Ret,                                   // 00EE
    Jp { addr: u16 },                      // 1NNN
    Call { addr: u16 },                    // 2NNN
    SeByte { x: usize, byte: u8 },         // 3XNN
    SneByte { x: usize, byte: u8 },        // 4XNN
    SeReg { x: usize, y: usize },          // 5XY0
    LdByte { x: usize, byte: u8 },         // 6XNN
    AddByte { x: usize, byte: u8 },        // 7XNN
    LdReg { x: usize, y: usize },          // 8XY0
    Or { x: usize, y: usize },             // 8XY1
    And { x: usize, y: usize },            // 8XY2
    Xor { x: usize, y: usize },            // 8XY3
    AddReg { x: usize, y: usize },         // 8XY4
    Sub { x: usize, y: usize },            // 8XY5
    Shr { x: usize, y: usize },            // 8XY6
    Subn { x: usize, y: usize },           // 8XY7
    Shl { x: usize, y: usize },            // 8XYE
    SneReg { x: usize, y: usize },         // 9XY0
    LdI { addr: u16 },                     // ANNN
    JpV0 { addr: u16 },                    // BNNN
    Rnd { x: usize, mask: u8 },            // CXNN
    Drw { x: usize, y: usize, height: u8 }, // DXYN
    Skp { x: usize },                      // EX9E
    Sknp { x: usize },                     // EXA1
    LdVxDt { x: usize },                   // FX07
    LdKey { x: usize },                    // FX0A
    LdDtVx { x: usize },                   // FX15
    LdStVx { x: usize },                   // FX18
    AddI { x: usize },                     // FX1E
    LdFont { x: usize },                   // FX29
    Bcd { x: usize },                      // FX33
    Store { x: usize },                    // FX55
    Load { x: usize },                     // FX65
    Unknown(Opcode),
}

impl Instruction {
    pub fn decode(op: Opcode) -> Self {
        use Instruction::*;

        let (x, y) = (op.x(), op.y());
        match op.class() {
            0x0 => match op.0 {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => Unknown(op),
            },
            0x1 => Jp { addr: op.nnn() },
            0x2 => Call { addr: op.nnn() },
            0x3 => SeByte { x, byte: op.nn() },
            0x4 => SneByte { x, byte: op.nn() },
            0x5 if op.n() == 0 => SeReg { x, y },
            0x6 => LdByte { x, byte: op.nn() },
            0x7 => AddByte { x, byte: op.nn() },
            0x8 => match op.n() {
                0x0 => LdReg { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddReg { x, y },
                0x5 => Sub { x, y },
                0x6 => Shr { x, y },
                0x7 => Subn { x, y },
                0xE => Shl { x, y },
                _ => Unknown(op),
            },
            0x9 if op.n() == 0 => SneReg { x, y },
            0xA => LdI { addr: op.nnn() },
            0xB => JpV0 { addr: op.nnn() },
            0xC => Rnd { x, mask: op.nn() },
            0xD => Drw {
                x,
                y,
                height: op.n(),
            },
            0xE => match op.nn() {
                0x9E => Skp { x },
                0xA1 => Sknp { x },
                _ => Unknown(op),
            },
            0xF => match op.nn() {
                0x07 => LdVxDt { x },
                0x0A => LdKey { x },
                0x15 => LdDtVx { x },
                0x18 => LdStVx { x },
                0x1E => AddI { x },
                0x29 => LdFont { x },
                0x33 => Bcd { x },
                0x55 => Store { x },
                0x65 => Load { x },
                _ => Unknown(op),
            },
            _ => Unknown(op),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp { addr } => write!(f, "JP 0x{:03X}", addr),
            Call { addr } => write!(f, "CALL 0x{:03X}", addr),
            SeByte { x, byte } => write!(f, "SE V{:X}, 0x{:02X}", x, byte),
            SneByte { x, byte } => write!(f, "SNE V{:X}, 0x{:02X}", x, byte),
            SeReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte { x, byte } => write!(f, "LD V{:X}, 0x{:02X}", x, byte),
            AddByte { x, byte } => write!(f, "ADD V{:X}, 0x{:02X}", x, byte),
            LdReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI { addr } => write!(f, "LD I, 0x{:03X}", addr),
            JpV0 { addr } => write!(f, "JP V0, 0x{:03X}", addr),
            Rnd { x, mask } => write!(f, "RND V{:X}, 0x{:02X}", x, mask),
            Drw { x, y, height } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, height),
            Skp { x } => write!(f, "SKP V{:X}", x),
            Sknp { x } => write!(f, "SKNP V{:X}", x),
            LdVxDt { x } => write!(f, "LD V{:X}, DT", x),
            LdKey { x } => write!(f, "LD V{:X}, K", x),
            LdDtVx { x } => write!(f, "LD DT, V{:X}", x),
            LdStVx { x } => write!(f, "LD ST, V{:X}", x),
            AddI { x } => write!(f, "ADD I, V{:X}", x),
            LdFont { x } => write!(f, "LD F, V{:X}", x),
            Bcd { x } => write!(f, "LD B, V{:X}", x),
            Store { x } => write!(f, "LD [I], V{:X}", x),
            Load { x } => write!(f, "LD V{:X}, [I]", x),
            Unknown(op) => write!(f, "??? {}", op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields() {
        let op = Opcode::from_bytes(0xD1, 0x2F);
        assert_eq!(op.0, 0xD12F);
        assert_eq!(op.class(), 0xD);
        assert_eq!(op.x(), 0x1);
        assert_eq!(op.y(), 0x2);
        assert_eq!(op.n(), 0xF);
        assert_eq!(op.nn(), 0x2F);
        assert_eq!(op.nnn(), 0x12F);
    }

    #[test]
    fn test_decode_families() {
        assert_eq!(Instruction::decode(Opcode(0x00E0)), Instruction::Cls);
        assert_eq!(Instruction::decode(Opcode(0x00EE)), Instruction::Ret);
        assert_eq!(
            Instruction::decode(Opcode(0x1ABC)),
            Instruction::Jp { addr: 0xABC }
        );
        assert_eq!(
            Instruction::decode(Opcode(0x8AB6)),
            Instruction::Shr { x: 0xA, y: 0xB }
        );
        assert_eq!(
            Instruction::decode(Opcode(0x8ABE)),
            Instruction::Shl { x: 0xA, y: 0xB }
        );
        assert_eq!(
            Instruction::decode(Opcode(0xE39E)),
            Instruction::Skp { x: 3 }
        );
        assert_eq!(
            Instruction::decode(Opcode(0xF565)),
            Instruction::Load { x: 5 }
        );
    }

    #[test]
    fn test_decode_unknown() {
        // machine code routines (0NNN) aren't supported
        for word in &[0x0123u16, 0x5121, 0x8128, 0x912F, 0xE100, 0xF1FF] {
            assert_eq!(
                Instruction::decode(Opcode(*word)),
                Instruction::Unknown(Opcode(*word))
            );
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::decode(Opcode(0x6A10)).to_string(), "LD VA, 0x10");
        assert_eq!(Instruction::decode(Opcode(0x22A0)).to_string(), "CALL 0x2A0");
        assert_eq!(Instruction::decode(Opcode(0xD125)).to_string(), "DRW V1, V2, 5");
        assert_eq!(Instruction::decode(Opcode(0xF1FF)).to_string(), "??? F1FF");
    }
}
