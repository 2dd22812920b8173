/// The physical address map. Ranges are disjoint by construction; every
/// masked address resolves to at most one region.
pub mod map {
    pub struct Range(u32, u32);
    impl Range {
        pub fn contains(&self, addr: u32) -> Option<u32> {
            (self.0..self.0 + self.1)
                .contains(&addr)
                .then(|| addr - self.0)
        }
    }

    pub const RAM: Range = Range(0x00000000, 0x200000);
    pub const SCRATCH: Range = Range(0x1F800000, 0x400);
    pub const HWREGS: Range = Range(0x1F801000, 0x2000);
    pub const PARALLEL: Range = Range(0x1F000000, 0x10000);
    pub const BIOS: Range = Range(0x1FC00000, 0x80000);

    /// Matched against the raw address, outside the masked space.
    pub const CACHECTL: Range = Range(0xFFFE0130, 4);
}

/// Clear the segment select bits so that KUSEG/KSEG0/KSEG1 mirrors of the
/// same physical region resolve identically.
pub const fn mask_region(addr: u32) -> u32 {
    addr & 0x1FFF_FFFF
}

/// An access width the bus can carry: u8, u16 or u32. Multi-byte values are
/// assembled little-endian from the backing bytes so reads stay portable
/// across host endianness.
pub trait BusWidth {
    const LEN: usize;
    type Bytes: for<'a> TryFrom<&'a [u8], Error: core::fmt::Debug> + AsRef<[u8]>;
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    fn to_le_bytes(self) -> Self::Bytes;
    fn from_u32(val: u32) -> Self;
    fn to_u32(self) -> u32;
}

macro_rules! width_impl {
    ($int:ty) => {
        impl BusWidth for $int {
            const LEN: usize = size_of::<Self>();
            type Bytes = [u8; Self::LEN];
            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                <$int>::from_le_bytes(bytes)
            }
            fn to_le_bytes(self) -> Self::Bytes {
                self.to_le_bytes()
            }
            fn from_u32(val: u32) -> Self {
                val as Self
            }
            fn to_u32(self) -> u32 {
                self as u32
            }
        }
    };
}

width_impl!(u8);
width_impl!(u16);
width_impl!(u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_segments_resolve_identically() {
        let phys = 0x1FC00000;
        assert_eq!(mask_region(0x9FC00000), phys);
        assert_eq!(mask_region(0xBFC00000), phys);
        assert_eq!(mask_region(phys), phys);
    }

    #[test]
    fn ranges_do_not_overlap() {
        let probe = [
            (map::RAM.contains(0x001FFFFF), Some(0x1FFFFF)),
            (map::RAM.contains(0x00200000), None),
            (map::SCRATCH.contains(0x1F800000), Some(0)),
            (map::HWREGS.contains(0x1F802FFF), Some(0x1FFF)),
            (map::PARALLEL.contains(0x1F010000), None),
            (map::BIOS.contains(0x1FC7FFFF), Some(0x7FFFF)),
            (map::CACHECTL.contains(0xFFFE0130), Some(0)),
        ];
        for (got, want) in probe {
            assert_eq!(got, want);
        }
    }
}
