use clap::Parser;
use dotmatrix::gb::bus::MainBus;
use dotmatrix::gb::cartridge::Cartridge;
use dotmatrix::gb::cpu::instruction::DispatchTable;
use dotmatrix::gb::ppu::PPU;
use dotmatrix::gb::{DISPLAY_REFRESH_RATE, EmulatorConfig, GBResult, GameBoy};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

/// Headless Game Boy (DMG) emulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the ROM to load
    #[arg(value_name = "ROM")]
    rom: PathBuf,

    /// Boot image which runs before the cartridge, skipped if absent
    #[arg(long, value_name = "PATH")]
    boot_rom: Option<PathBuf>,

    /// Trace every executed instruction
    #[arg(long)]
    debug: bool,

    /// Print serial output to stdout
    #[arg(long)]
    print_serial: bool,

    /// Disable fps limit for debugging purposes
    #[arg(long)]
    no_fps_limit: bool,

    /// Stop after the given number of frames
    #[arg(long, value_name = "N")]
    frames: Option<u64>,
}

impl From<Args> for EmulatorConfig {
    fn from(args: Args) -> Self {
        Self {
            rom: args.rom,
            boot_rom: args.boot_rom,
            debug: args.debug,
            print_serial: args.print_serial,
            frame_limit: !args.no_fps_limit,
            frames: args.frames,
        }
    }
}

fn main() -> ExitCode {
    let config = EmulatorConfig::from(Args::parse());
    let level = match config.debug {
        true => "trace",
        false => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match emulate(&config) {
        Ok(frames) => {
            log::info!("Stopped after {frames} frames");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the emulation loop until the configured frame count is reached.
/// Returns the number of completed frames.
fn emulate(config: &EmulatorConfig) -> GBResult<u64> {
    let mut cartridge = Cartridge::try_from(config.rom.as_path())?;
    log::info!("Loaded {}: {cartridge}", config.rom.display());

    let table = DispatchTable::new();
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, config.print_serial);
    if let Some(path) = &config.boot_rom {
        let image = std::fs::read(path)?;
        bus = bus.with_boot_rom(&image)?;
    }
    let mut gb = GameBoy::new(&table, bus);

    let mut limiter = config
        .frame_limit
        .then(|| FrameLimiter::new(DISPLAY_REFRESH_RATE));
    let mut frames = 0;
    while config.frames.is_none_or(|max| frames < max) {
        gb.run_frame()?;
        frames += 1;
        if let Some(limiter) = &mut limiter {
            limiter.wait();
        }
    }
    Ok(frames)
}

/// Limits FPS with the configured refresh rate.
struct FrameLimiter {
    frame_duration: Duration,
    last_call: Instant,
}

impl FrameLimiter {
    /// Creates a new frame limiter with the given refresh rate.
    #[inline]
    pub fn new(refresh_rate: f64) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / refresh_rate),
            last_call: Instant::now(),
        }
    }

    /// Blocks the current thread until the allotted frame time has passed.
    #[inline]
    pub fn wait(&mut self) {
        let elapsed = self.last_call.elapsed();
        if elapsed < self.frame_duration {
            spin_sleep::sleep(self.frame_duration - elapsed);
        }
        self.last_call = Instant::now();
    }
}
