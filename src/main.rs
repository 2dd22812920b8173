use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ironpsx::{Config, Emulator};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    let config = Config::build().unwrap_or_else(|err| {
        error!(%err, "failed to parse command-line arguments");
        eprintln!("usage: ironpsx <bios-path> [breakpoint-hex]");
        std::process::exit(1);
    });

    let mut emu = Emulator::build(&config).unwrap_or_else(|err| {
        error!(%err, "failed to start the emulator");
        std::process::exit(1);
    });

    while emu.running {
        if let Err(fatal) = emu.run_frame() {
            error!(%fatal, "emulation halted");
            std::process::exit(1);
        }
    }

    info!(
        "halted after {} instructions at pc {:#010x}",
        emu.cpu().regs.count,
        emu.cpu().regs.pc
    );
}
