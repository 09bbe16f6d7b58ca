//! CRC-8 used by the serial link (polynomial 0x9B, init 0, MSB first,
//! no reflection, no final XOR).

/// Generator polynomial.
pub const POLYNOMIAL: u8 = 0x9B;

static TABLE: [u8; 256] = build_table(POLYNOMIAL);

const fn build_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ poly } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Checksum of `data`.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0, |crc, &b| TABLE[usize::from(crc ^ b)])
}
