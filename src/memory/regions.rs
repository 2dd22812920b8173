use super::utils::BusWidth;

pub const BIOS_SIZE: usize = 512 * 1024;
pub const RAM_SIZE: usize = 0x200000;
pub const SCRATCH_SIZE: usize = 0x400;
pub const HWREGS_SIZE: usize = 0x2000;
pub const PARALLEL_SIZE: usize = 0x10000;

macro_rules! region {
    ($(#[$doc:meta])* $name:ident, $size:expr) => {
        $(#[$doc])*
        pub struct $name {
            bytes: Box<[u8; $size]>,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    bytes: vec![0u8; $size].into_boxed_slice().try_into().unwrap(),
                }
            }
        }

        impl $name {
            pub fn read<T: BusWidth>(&self, offset: u32) -> T {
                let offset = offset as usize;
                T::from_le_bytes(self.bytes[offset..offset + T::LEN].try_into().unwrap())
            }

            pub fn write<T: BusWidth>(&mut self, offset: u32, val: T) {
                let offset = offset as usize;
                self.bytes[offset..offset + T::LEN].copy_from_slice(val.to_le_bytes().as_ref());
            }

            pub fn bytes(&self) -> &[u8] {
                &self.bytes[..]
            }

            pub fn clear(&mut self) {
                self.bytes.fill(0);
            }
        }
    };
}

region!(
    /// BIOS ROM. Read-only in intent, but writes are not enforced against.
    Bios, BIOS_SIZE
);
region!(
    /// 2 MiB of main RAM.
    Ram, RAM_SIZE
);
region!(
    /// 1 KiB of scratchpad (the data cache in fast-SRAM mode).
    Scratch, SCRATCH_SIZE
);
region!(
    /// Memory control and hardware registers. Raw storage for everything no
    /// device claims yet.
    HwRegs, HWREGS_SIZE
);
region!(
    /// Expansion 1 / parallel port. Backing bytes exist for inspection, but
    /// reads report nothing attached.
    Parallel, PARALLEL_SIZE
);

impl Bios {
    /// Copy an image into the ROM. Anything up to the ROM size is accepted;
    /// the remainder stays zeroed.
    pub fn load(&mut self, image: &[u8]) -> Result<(), String> {
        if image.is_empty() || image.len() > BIOS_SIZE {
            return Err(format!("invalid bios image size {}", image.len()));
        }
        self.bytes.fill(0);
        self.bytes[..image.len()].copy_from_slice(image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_word_round_trip() {
        let mut ram = Ram::default();
        ram.write::<u32>(0x100, 0xDEADBEEF);
        assert_eq!(ram.read::<u32>(0x100), 0xDEADBEEF);
        // Little endian byte order
        assert_eq!(ram.read::<u8>(0x100), 0xEF);
        assert_eq!(ram.read::<u16>(0x102), 0xDEAD);
    }

    #[test]
    fn bios_load_rejects_oversized_image() {
        let mut bios = Bios::default();
        assert!(bios.load(&vec![0u8; BIOS_SIZE + 1]).is_err());
        assert!(bios.load(&[]).is_err());
        assert!(bios.load(&[0x13, 0x37]).is_ok());
        assert_eq!(bios.read::<u16>(0), 0x3713);
    }
}
