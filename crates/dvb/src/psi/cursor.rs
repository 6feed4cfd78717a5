//! 長さの決まったバイト列を先頭から読み進めるカーソル。

use crate::utils::BytesExt;

use super::DecodeError;

/// 長さの決まったバイト列を先頭から読み進めるカーソル。
///
/// 入れ子になったループは[`Cursor::sub`]で切り出したカーソルで読むため、
/// ループ長を超えて読み進めることはない。
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// `data`全体を読むカーソルを生成する。
    #[inline]
    pub fn new(data: &'a [u8]) -> Cursor<'a> {
        Cursor { data, offset: 0 }
    }

    /// 最初に生成したカーソルの先頭からの、現在位置のバイト数。
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 残りのバイト数。
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// 読み終えたかどうかを返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 未読のバイト列を返す。カーソルは進めない。
    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// 現在位置で不正な長さを検出したことを示すエラーを返す。
    #[inline]
    pub fn malformed(&self) -> DecodeError {
        DecodeError::MalformedDescriptor {
            offset: self.offset,
        }
    }

    /// `len`バイトを読み取り、カーソルを進める。
    ///
    /// 残りが足りない場合はカーソルを進めずにエラーを返す。
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.data.len() {
            return Err(self.malformed());
        }

        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        self.offset += len;
        Ok(head)
    }

    /// 1バイトを読み取る。
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.take(1).map(|b| b[0])
    }

    /// ビッグエンディアンの16ビット符号無し整数を読み取る。
    #[inline]
    pub fn read_be_16(&mut self) -> Result<u16, DecodeError> {
        self.take(2).map(|b| b.read_be_16())
    }

    /// 上位4ビットが予約された12ビットの長さを読み取る。
    #[inline]
    pub fn read_length_12(&mut self) -> Result<u16, DecodeError> {
        self.read_be_16().map(|n| n & 0b0000_1111_1111_1111)
    }

    /// `len`バイトの領域を読むカーソルを切り出し、自身はその後ろまで進める。
    ///
    /// 残りが足りない場合はカーソルを進めずにエラーを返す。
    pub fn sub(&mut self, len: usize) -> Result<Cursor<'a>, DecodeError> {
        let offset = self.offset;
        let data = self.take(len)?;
        Ok(Cursor { data, offset })
    }

    /// 12ビットの長さと、その長さの領域を読むカーソルを読み取る。
    ///
    /// 長さが残りのバイト数を超える場合は長さの位置を示すエラーを返し、カーソルは進めない。
    pub fn sub_with_length_12(&mut self) -> Result<Cursor<'a>, DecodeError> {
        let start = self.clone();
        let len = self.read_length_12()?;
        self.sub(len as usize).map_err(|_| {
            *self = start;
            self.malformed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_take() {
        let mut cur = Cursor::new(&[1, 2, 3, 4, 5]);
        assert_eq!(cur.read_u8(), Ok(1));
        assert_eq!(cur.read_be_16(), Ok(0x0203));
        assert_eq!(cur.offset(), 3);
        assert_matches!(
            cur.take(3),
            Err(DecodeError::MalformedDescriptor { offset: 3 })
        );
        assert_eq!(cur.remaining(), 2);
        assert_eq!(cur.take(2), Ok(&[4, 5][..]));
        assert!(cur.is_empty());
    }

    #[test]
    fn test_sub() {
        let mut cur = Cursor::new(&[0xF0, 0x02, 0xAA, 0xBB, 0xCC]);
        let mut sub = cur.sub_with_length_12().unwrap();
        assert_eq!(sub.offset(), 2);
        assert_eq!(sub.remaining(), 2);
        assert_eq!(sub.read_be_16(), Ok(0xAABB));
        assert_matches!(
            sub.read_u8(),
            Err(DecodeError::MalformedDescriptor { offset: 4 })
        );
        assert_eq!(cur.offset(), 4);
        assert_eq!(cur.as_slice(), &[0xCC]);
    }

    #[test]
    fn test_sub_overrun() {
        let mut cur = Cursor::new(&[0x00, 0x04, 0xAA, 0xBB, 0xCC]);
        assert_matches!(
            cur.sub_with_length_12(),
            Err(DecodeError::MalformedDescriptor { offset: 0 })
        );
        assert_eq!(cur.offset(), 0);
        assert_eq!(cur.remaining(), 5);
    }
}
