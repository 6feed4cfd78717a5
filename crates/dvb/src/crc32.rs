//! PSIセクションで用いられるCRC32（ISO/IEC 13818-1 付属書B）。

const POLY: u32 = 0x04C1_1DB7;

const TABLE: [u32; 256] = {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// `data`のCRC32を計算する。
pub fn checksum(data: &[u8]) -> u32 {
    data.iter().fold(0xFFFF_FFFF, |crc, &b| {
        (crc << 8) ^ TABLE[((crc >> 24) as u8 ^ b) as usize]
    })
}

/// CRC32を末尾に含む`data`が正しいかどうかを返す。
#[inline]
pub fn calc(data: &[u8]) -> bool {
    checksum(data) == 0
}
