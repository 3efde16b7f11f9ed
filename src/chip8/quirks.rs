/// Which register 8XY6 and 8XYE shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftQuirk {
    /// COSMAC VIP: VX = VY shifted, VF from VY's outgoing bit
    Legacy,
    /// CHIP-48 and later: VX shifted in place, VF from VX's outgoing bit
    Modern,
}

/// What FX55 and FX65 leave in I.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStoreQuirk {
    /// I += X + 1
    Increment,
    Unchanged,
}

/// Who decrements the delay and sound timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerClock {
    /// once at the end of every step
    PerStep,
    /// only on `Chip8::tick_timers`, which the caller drives at 60Hz
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub shift: ShiftQuirk,
    pub load_store: LoadStoreQuirk,
    pub timers: TimerClock,
}

impl Quirks {
    /// behaviour most programs written after the HP-48 ports expect
    pub fn modern() -> Self {
        Self {
            shift: ShiftQuirk::Modern,
            load_store: LoadStoreQuirk::Unchanged,
            ..Self::default()
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Self {
            shift: ShiftQuirk::Legacy,
            load_store: LoadStoreQuirk::Increment,
            timers: TimerClock::PerStep,
        }
    }
}
