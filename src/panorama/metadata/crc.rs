//! CRC-32 as used by PNG chunk trailers (reflected, polynomial `0xEDB88320`).

const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Precomputed byte table. Build once and share; it is read-only after
/// construction.
#[derive(Clone)]
pub struct Crc32 {
    table: [u32; 256],
}

impl Crc32 {
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (n, entry) in table.iter_mut().enumerate() {
            let mut c = n as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            }
            *entry = c;
        }
        Self { table }
    }

    /// Feeds `data` into a running register (start from `0xFFFF_FFFF`).
    pub fn update(&self, mut crc: u32, data: &[u8]) -> u32 {
        for &byte in data {
            crc = self.table[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
        }
        crc
    }

    /// CRC of the concatenation of `parts`.
    pub fn checksum_parts(&self, parts: &[&[u8]]) -> u32 {
        parts
            .iter()
            .fold(0xFFFF_FFFF, |crc, part| self.update(crc, part))
            ^ 0xFFFF_FFFF
    }

    pub fn checksum(&self, data: &[u8]) -> u32 {
        self.checksum_parts(&[data])
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32").finish_non_exhaustive()
    }
}
