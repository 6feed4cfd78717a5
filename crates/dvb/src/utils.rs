/// バイト列用拡張トレイト。
pub trait BytesExt {
    /// 先頭2バイトをビッグエンディアンの16ビット符号無し整数として読み込む。
    ///
    /// 事前に長さが2以上あると分かるようなコードであれば最適化が期待できる。
    fn read_be_16(&self) -> u16;

    /// 先頭4バイトをビッグエンディアンの32ビット符号無し整数として読み込む。
    ///
    /// 事前に長さが4以上あると分かるようなコードであれば最適化が期待できる。
    fn read_be_32(&self) -> u32;

    /// 先頭から`digits`桁のBCDを読み込む。
    ///
    /// 各桁は上位ニブルから順に並ぶ。10以上のニブルはそのまま桁として扱う。
    fn read_bcd(&self, digits: usize) -> u32;
}

impl BytesExt for [u8] {
    #[inline]
    fn read_be_16(&self) -> u16 {
        u16::from_be_bytes([self[0], self[1]])
    }

    #[inline]
    fn read_be_32(&self) -> u32 {
        u32::from_be_bytes([self[0], self[1], self[2], self[3]])
    }

    fn read_bcd(&self, digits: usize) -> u32 {
        (0..digits).fold(0, |acc, i| {
            let byte = self[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            acc * 10 + nibble as u32
        })
    }
}

/// `{:02X}`形式で`Debug`出力する。
pub struct UpperHex(pub u8);

impl std::fmt::Debug for UpperHex {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be() {
        assert_eq!(b"\x12\x34\x56\x78"[..].read_be_16(), 0x1234);
        assert_eq!(b"\x12\x34\x56\x78\x9A\xBC\xDE"[..].read_be_32(), 0x12345678);
    }

    #[test]
    fn test_read_bcd() {
        assert_eq!(b"\x01\x17\x49\x37"[..].read_bcd(8), 1174937);
        assert_eq!(b"\x00\x27\x50\x03"[..].read_bcd(7), 27500);
        assert_eq!(b"\x01\x92"[..].read_bcd(4), 192);
        assert_eq!(b"\x99"[..].read_bcd(1), 9);
    }
}
