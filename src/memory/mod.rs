mod regions;
pub mod utils;

use tracing::{trace, warn};

use crate::cpu::utils::Exception;
use regions::{Bios, HwRegs, Parallel, Ram, Scratch};
use utils::{BusWidth, map, mask_region};

/// GPU register offsets inside the hardware block. The GPU itself is not
/// modeled; reads are stubbed so the BIOS can poll past them.
const GPUREAD: u32 = 0x810;
const GPUSTAT: u32 = 0x814;

/// GPUSTAT with the ready bits raised: idle, ready for commands and DMA.
const GPUSTAT_READY: u32 = 0x1C00_0000;

/// The memory bus. Sole owner of every backing region; resolves a masked
/// physical address to exactly one of them.
#[derive(Default)]
pub struct Bus {
    bios: Bios,
    ram: Ram,
    scratch: Scratch,
    hwregs: HwRegs,
    parallel: Parallel,

    /// Cache control register, matched on the raw unmasked address and
    /// stored as a plain scalar rather than inside a backing array.
    cache_ctl: u32,
}

impl Bus {
    /// Read an aligned value. Unmapped reads log and return 0; only
    /// misalignment is an error, and it is the CPU's to deliver.
    pub fn read<T: BusWidth>(&self, addr: u32) -> Result<T, Exception> {
        if addr % T::LEN as u32 != 0 {
            return Err(Exception::LoadAddressError(addr));
        }

        if let Some(offset) = map::CACHECTL.contains(addr) {
            return Ok(T::from_u32(self.cache_ctl >> (offset * 8)));
        }

        let addr = mask_region(addr);

        let data = if let Some(offset) = map::BIOS.contains(addr) {
            self.bios.read(offset)
        } else if let Some(offset) = map::RAM.contains(addr) {
            self.ram.read(offset)
        } else if let Some(offset) = map::SCRATCH.contains(addr) {
            self.scratch.read(offset)
        } else if let Some(offset) = map::HWREGS.contains(addr) {
            self.hwregs_read(offset)
        } else if map::PARALLEL.contains(addr).is_some() {
            // Nothing attached to the expansion port
            T::from_u32(0xFFFF_FFFF)
        } else {
            warn!("unmapped read{} at {addr:#010x}", T::LEN * 8);
            T::from_u32(0)
        };

        Ok(data)
    }

    /// Write an aligned value. Unmapped writes log and drop.
    pub fn write<T: BusWidth + Copy>(&mut self, addr: u32, data: T) -> Result<(), Exception> {
        if addr % T::LEN as u32 != 0 {
            return Err(Exception::StoreAddressError(addr));
        }

        if map::CACHECTL.contains(addr).is_some() {
            trace!("cache control <- {:#010x}", data.to_u32());
            self.cache_ctl = data.to_u32();
            return Ok(());
        }

        let addr = mask_region(addr);

        if let Some(offset) = map::RAM.contains(addr) {
            self.ram.write(offset, data);
        } else if let Some(offset) = map::SCRATCH.contains(addr) {
            self.scratch.write(offset, data);
        } else if let Some(offset) = map::HWREGS.contains(addr) {
            trace!("hwregs write at {offset:#x} <- {:#x}", data.to_u32());
            self.hwregs.write(offset, data);
        } else if let Some(offset) = map::PARALLEL.contains(addr) {
            self.parallel.write(offset, data);
        } else if let Some(offset) = map::BIOS.contains(addr) {
            // Read-only in intent only
            warn!("write into bios rom at {offset:#x}");
            self.bios.write(offset, data);
        } else {
            warn!("unmapped write{} at {addr:#010x}", T::LEN * 8);
        }

        Ok(())
    }

    fn hwregs_read<T: BusWidth>(&self, offset: u32) -> T {
        match offset & !3 {
            GPUREAD => {
                trace!("stubbed gpuread");
                T::from_u32(0)
            }
            GPUSTAT => {
                trace!("stubbed gpustat");
                T::from_u32(GPUSTAT_READY)
            }
            _ => self.hwregs.read(offset),
        }
    }

    /// Populate the BIOS ROM from an image.
    pub fn load_bios(&mut self, image: &[u8]) -> Result<(), String> {
        self.bios.load(image)
    }

    /// Zero every writable region. The BIOS image survives a reset.
    pub fn reset(&mut self) {
        self.ram.clear();
        self.scratch.clear();
        self.hwregs.clear();
        self.parallel.clear();
        self.cache_ctl = 0;
    }

    // Raw views for the inspection surface.

    pub fn bios_bytes(&self) -> &[u8] {
        self.bios.bytes()
    }

    pub fn ram_bytes(&self) -> &[u8] {
        self.ram.bytes()
    }

    pub fn scratch_bytes(&self) -> &[u8] {
        self.scratch.bytes()
    }

    pub fn hwregs_bytes(&self) -> &[u8] {
        self.hwregs.bytes()
    }

    pub fn parallel_bytes(&self) -> &[u8] {
        self.parallel.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_round_trip_through_the_bus() {
        let mut bus = Bus::default();
        bus.write::<u32>(0x100, 0xCAFEBABE).unwrap();
        assert_eq!(bus.read::<u32>(0x100).unwrap(), 0xCAFEBABE);
    }

    #[test]
    fn mirror_segments_reach_the_same_ram() {
        let mut bus = Bus::default();
        bus.write::<u32>(0x8000_0100, 0x12345678).unwrap();
        assert_eq!(bus.read::<u32>(0xA000_0100).unwrap(), 0x12345678);
        assert_eq!(bus.read::<u32>(0x0000_0100).unwrap(), 0x12345678);
    }

    #[test]
    fn misaligned_accesses_are_address_errors() {
        let mut bus = Bus::default();
        assert_eq!(
            bus.read::<u32>(0x0000_0001),
            Err(Exception::LoadAddressError(1))
        );
        assert_eq!(
            bus.read::<u16>(0x0000_0003),
            Err(Exception::LoadAddressError(3))
        );
        assert_eq!(
            bus.write::<u32>(0x0000_0002, 0),
            Err(Exception::StoreAddressError(2))
        );
        // Bytes are always aligned
        assert!(bus.read::<u8>(0x0000_0001).is_ok());
    }

    #[test]
    fn unmapped_reads_return_zero() {
        let bus = Bus::default();
        assert_eq!(bus.read::<u32>(0x1F80_4000).unwrap(), 0);
    }

    #[test]
    fn expansion_port_reads_all_ones() {
        let bus = Bus::default();
        assert_eq!(bus.read::<u8>(0x1F00_0000).unwrap(), 0xFF);
        assert_eq!(bus.read::<u32>(0x1F00_0004).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn cache_control_bypasses_segment_masking() {
        let mut bus = Bus::default();
        bus.write::<u32>(0xFFFE_0130, 0x0001_E988).unwrap();
        assert_eq!(bus.read::<u32>(0xFFFE_0130).unwrap(), 0x0001_E988);
        // The masked alias of that address is ordinary unmapped space
        assert_eq!(bus.read::<u32>(0x1FFE_0130).unwrap(), 0);
    }

    #[test]
    fn gpu_status_reads_ready_placeholder() {
        let bus = Bus::default();
        assert_eq!(bus.read::<u32>(0x1F80_1814).unwrap(), 0x1C00_0000);
        assert_eq!(bus.read::<u32>(0x1F80_1810).unwrap(), 0);
    }

    #[test]
    fn reset_preserves_the_bios_image() {
        let mut bus = Bus::default();
        bus.load_bios(&[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        bus.write::<u32>(0x200, 0x55555555).unwrap();
        bus.reset();
        assert_eq!(bus.read::<u32>(0x200).unwrap(), 0);
        assert_eq!(bus.read::<u32>(0xBFC0_0000).unwrap(), 0xDDCCBBAA);
    }
}
