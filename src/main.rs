use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use sdl2::event::Event;
use sdl2::gfx::primitives::DrawRenderer;
use sdl2::keyboard::{Keycode, Scancode};
use sdl2::pixels;

use chip8::{loader, Chip8, LoadStoreQuirk, Quirks, ShiftQuirk, TimerClock, HEIGHT, WIDTH};

static FRAME: Duration = Duration::from_micros(16_667); // 60Hz
// keeps 64 * scale inside the i16 coordinates SDL2_gfx draws with
const MAX_SCALE: u32 = 64;

// hex keypad laid over the left-hand side of a qwerty keyboard
//   1 2 3 C      1 2 3 4
//   4 5 6 D      Q W E R
//   7 8 9 E      A S D F
//   A 0 B F      Z X C V
const KEYMAP: [Scancode; 16] = [
    Scancode::X,    // 0
    Scancode::Num1, // 1
    Scancode::Num2, // 2
    Scancode::Num3, // 3
    Scancode::Q,    // 4
    Scancode::W,    // 5
    Scancode::E,    // 6
    Scancode::A,    // 7
    Scancode::S,    // 8
    Scancode::D,    // 9
    Scancode::Z,    // A
    Scancode::C,    // B
    Scancode::Num4, // C
    Scancode::R,    // D
    Scancode::F,    // E
    Scancode::V,    // F
];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shift {
    Legacy,
    Modern,
}

#[derive(Parser, Debug)]
struct Args {
    /// instructions executed per second
    #[arg(long, default_value_t = 500)]
    hz: u32,

    /// window pixels per CHIP-8 pixel (1 to 64)
    #[arg(long, default_value_t = 10)]
    scale: u32,

    /// which register 8XY6/8XYE shift
    #[arg(long, value_enum, default_value_t = Shift::Legacy)]
    shift: Shift,

    /// leave I unchanged after FX55/FX65
    #[arg(long)]
    keep_index: bool,

    /// seed for CXNN, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    rom: PathBuf,
}

fn window_scale(requested: u32) -> u32 {
    let scale = requested.clamp(1, MAX_SCALE);
    if scale != requested {
        log::warn!("scale {} out of range, using {}", requested, scale);
    }
    scale
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    let quirks = Quirks {
        shift: match args.shift {
            Shift::Legacy => ShiftQuirk::Legacy,
            Shift::Modern => ShiftQuirk::Modern,
        },
        load_store: if args.keep_index {
            LoadStoreQuirk::Unchanged
        } else {
            LoadStoreQuirk::Increment
        },
        // instructions run faster than the timers; we tick them once a frame
        timers: TimerClock::External,
    };
    let mut emu = match args.seed {
        Some(seed) => Chip8::with_seed(quirks, seed),
        None => Chip8::with_quirks(quirks),
    };
    loader::load_file(&mut emu, &args.rom)?;

    let sdl_ctx = sdl2::init()?;
    let video = sdl_ctx.video()?;

    let scale = window_scale(args.scale);
    let window = video
        .window("CHIP-8", WIDTH as u32 * scale, HEIGHT as u32 * scale)
        .position_centered()
        .build()?;
    let mut canvas = window.into_canvas().build()?;

    let black = pixels::Color::RGB(0, 0, 0);
    let white = pixels::Color::RGB(255, 255, 255);
    canvas.set_draw_color(black);
    canvas.clear();
    canvas.present();

    let mut event_pump = sdl_ctx.event_pump()?;
    let steps_per_frame = (args.hz / 60).max(1);
    log::info!("running at {} instructions per frame", steps_per_frame);

    'main: loop {
        let frame_start = Instant::now();

        for e in event_pump.poll_iter() {
            match e {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'main,
                _ => {}
            }
        }

        let keyboard = event_pump.keyboard_state();
        let mut keys = [false; 16];
        for (key, scancode) in keys.iter_mut().zip(KEYMAP.iter()) {
            *key = keyboard.is_scancode_pressed(*scancode);
        }
        emu.set_keys(keys);

        for _ in 0..steps_per_frame {
            let cycle = emu.step()?;
            if cycle.waiting {
                break;
            }
        }

        if emu.tick_timers() {
            log::info!("BEEP!");
        }

        if emu.draw_flag() {
            canvas.set_draw_color(black);
            canvas.clear();
            let s = scale as i16;
            for (i, p) in emu.framebuffer().iter().enumerate() {
                if !*p {
                    continue;
                }
                let i = i as i16;
                let x = (i % WIDTH as i16) * s;
                let y = (i / WIDTH as i16) * s;
                canvas.box_(x, y, x + s - 1, y + s - 1, white)?;
            }
            canvas.present();
            emu.clear_draw_flag();
        }

        if let Some(rest) = FRAME.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}
