pub mod cpu;
pub mod memory;

use std::error::Error;

use sha1::{Digest, Sha1};
use tracing::{error, info};

use cpu::utils::FatalError;
use cpu::Cpu;
use memory::Bus;

/// Placeholder framebuffer dimensions until a video core exists.
pub const FB_WIDTH: usize = 640;
pub const FB_HEIGHT: usize = 480;

pub struct Config {
    pub bios_path: String,
    pub breakpoint: Option<u32>,
}

impl Config {
    pub fn build() -> Result<Config, Box<dyn Error>> {
        let args: Vec<String> = std::env::args().collect();

        let bios_path = match args.get(1) {
            Some(x) => x.clone(),
            None => return Err("missing bios path".into()),
        };
        let breakpoint = match args.get(2) {
            Some(x) => Some(u32::from_str_radix(x.trim_start_matches("0x"), 16)?),
            None => None,
        };

        Ok(Config {
            bios_path,
            breakpoint,
        })
    }
}

/// Top-level owner of one bus and one execution core, plus the pieces a
/// front end consumes: framebuffer, running flag, breakpoint.
pub struct Emulator {
    cpu: Cpu,
    bus: Bus,

    /// RGBA bytes, unpopulated until a video core fills them
    framebuffer: Box<[u8]>,

    pub running: bool,
    breakpoint: Option<u32>,
    bios_loaded: bool,
    frames: u64,
}

impl Default for Emulator {
    fn default() -> Self {
        Emulator {
            cpu: Cpu::default(),
            bus: Bus::default(),
            framebuffer: vec![0xFF; FB_WIDTH * FB_HEIGHT * 4].into_boxed_slice(),
            running: false,
            breakpoint: None,
            bios_loaded: false,
            frames: 0,
        }
    }
}

impl Emulator {
    pub fn build(config: &Config) -> Result<Self, Box<dyn Error>> {
        let mut emu = Emulator {
            breakpoint: config.breakpoint,
            ..Emulator::default()
        };
        emu.load_bios(&config.bios_path)?;
        Ok(emu)
    }

    /// Read a BIOS image from disk into the ROM and restart the CPU at the
    /// boot vector. An unreadable or invalid file is fatal.
    pub fn load_bios(&mut self, path: &str) -> Result<(), Box<dyn Error>> {
        info!("loading bios from {path}");
        let image = std::fs::read(path)?;
        self.load_bios_bytes(&image)
    }

    /// Slice-based BIOS load, for tests and embedding hosts.
    pub fn load_bios_bytes(&mut self, image: &[u8]) -> Result<(), Box<dyn Error>> {
        self.bus.load_bios(image)?;

        let hash = Sha1::digest(image);
        info!("bios size: {}kb", image.len() / 1024);
        info!("bios sha1: {}", hex::encode(hash));

        self.cpu.reset();
        self.cpu.fetch(&self.bus);
        self.bios_loaded = true;
        self.running = true;
        Ok(())
    }

    /// Execute one instruction. Halts the run loop at the breakpoint; a
    /// fatal core error stops the session and is handed to the caller.
    pub fn step(&mut self) -> Result<(), FatalError> {
        if !self.bios_loaded {
            return Ok(());
        }

        if let Err(fatal) = self.cpu.step(&mut self.bus) {
            error!("{fatal}");
            self.running = false;
            return Err(fatal);
        }

        if self.breakpoint == Some(self.cpu.regs.pc) {
            info!("breakpoint hit at {:#010x}", self.cpu.regs.pc);
            self.running = false;
        }
        Ok(())
    }

    /// One instruction per host frame until a video core sets a real
    /// per-frame budget.
    pub fn run_frame(&mut self) -> Result<(), FatalError> {
        self.frames += 1;
        self.step()
    }

    /// Re-initialise the bus and CPU in place. Backing storage is reused
    /// and the BIOS image survives.
    pub fn reset(&mut self) {
        self.running = false;
        self.bus.reset();
        self.cpu.reset();
        if self.bios_loaded {
            self.cpu.fetch(&self.bus);
            self.running = true;
        }
    }

    // Inspection surface for front ends.

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn set_breakpoint(&mut self, addr: Option<u32>) {
        self.breakpoint = addr;
    }
}
