//! PSI用のモジュール。

pub mod cursor;
pub mod desc;
pub mod table;

use thiserror::Error;

use crate::utils::BytesExt;

/// [`PsiSection::parse`]で発生するエラー。
///
/// セクション長が確定したあとで発生するエラーにはセクション長が付随する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PsiError {
    /// PSIセクションの長さが足りない。
    #[error("insufficient length of a PSI section")]
    InsufficientLength,

    /// PSIの終端に到達した。
    #[error("reached to end of PSI sections")]
    EndOfPsi,

    /// PSIセクションに最低限必要なバイト数がなく、壊れたセクションである。
    ///
    /// 内包する`usize`にはPSIのセクション長が入る。
    #[error("corrupt section")]
    Corrupted(usize),

    /// PSIセクションのCRC32が一致しない。
    ///
    /// 内包する`usize`にはPSIのセクション長が入る。
    #[error("crc32 error")]
    Crc32(usize),
}

/// 記述子やテーブルの読み取りで発生するエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// 記述子やループの長さが、それを囲む領域の終端を超えている。
    ///
    /// `offset`は読み取りを開始した位置からのバイト数。
    #[error("malformed descriptor at offset {offset}")]
    MalformedDescriptor {
        /// 不正な長さを読み取った位置。
        offset: usize,
    },

    /// 期待したテーブルではない。
    #[error("unexpected table id 0x{0:02X}")]
    UnexpectedTable(u8),

    /// セクションの構造が壊れている。
    #[error("invalid section: {0}")]
    Section(#[from] PsiError),
}

/// PSIのセクション。
#[derive(Debug)]
pub struct PsiSection<'a> {
    /// テーブル識別。
    pub table_id: u8,
    /// セクションシンタクス。
    pub syntax: Option<PsiSectionSyntax>,
    /// PSIのデータ。
    pub data: &'a [u8],
    /// CRC。
    pub crc32: u32,
}

impl<'a> PsiSection<'a> {
    /// PSIセクションをパースし、[`PsiSection`]とセクション長を返す。
    pub fn parse(buf: &'a [u8]) -> Result<(PsiSection<'a>, usize), PsiError> {
        if buf.len() < 3 {
            return Err(PsiError::InsufficientLength);
        }

        let table_id = buf[0];
        if table_id == 0xFF {
            return Err(PsiError::EndOfPsi);
        }
        let section_syntax_indicator = buf[1] & 0b10000000 != 0;
        let section_length = buf[1..=2].read_be_16() & 0b0000_1111_1111_1111;

        let Some(psi) = buf.get(..3 + section_length as usize) else {
            return Err(PsiError::InsufficientLength);
        };

        if psi.len() < 3 + 4 {
            return Err(PsiError::Corrupted(psi.len()));
        }
        if !crate::crc32::calc(psi) {
            return Err(PsiError::Crc32(psi.len()));
        }

        let (syntax, data) = if section_syntax_indicator {
            if psi.len() < 3 + 4 + 5 {
                return Err(PsiError::Corrupted(psi.len()));
            }

            let table_id_extension = psi[3..=4].read_be_16();
            let version_number = (psi[5] & 0b00111110) >> 1;
            let current_next_indicator = psi[5] & 0b00000001 != 0;
            let section_number = psi[6];
            let last_section_number = psi[7];

            let ss = PsiSectionSyntax {
                table_id_extension,
                version_number,
                current_next_indicator,
                section_number,
                last_section_number,
            };
            (Some(ss), &psi[8..psi.len() - 4])
        } else {
            (None, &psi[3..psi.len() - 4])
        };

        let crc32 = psi[psi.len() - 4..].read_be_32();

        Ok((
            PsiSection {
                table_id,
                syntax,
                data,
                crc32,
            },
            psi.len(),
        ))
    }

    /// `buf`に連続して格納されたPSIセクションを順に読み取るイテレーターを返す。
    ///
    /// 終端を示す`0xFF`のテーブル識別、または最初のエラーで終了する。
    #[inline]
    pub fn iter(buf: &'a [u8]) -> PsiSectionIter<'a> {
        PsiSectionIter(buf)
    }
}

/// PSIセクションのシンタクス。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsiSectionSyntax {
    /// テーブル識別拡張。
    pub table_id_extension: u16,
    /// バージョン番号（5ビット）。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
}

/// [`PsiSection::iter`]のイテレーター。
#[derive(Debug, Clone)]
pub struct PsiSectionIter<'a>(&'a [u8]);

impl<'a> Iterator for PsiSectionIter<'a> {
    type Item = Result<PsiSection<'a>, PsiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }

        match PsiSection::parse(self.0) {
            Ok((psi, len)) => {
                self.0 = &self.0[len..];
                Some(Ok(psi))
            }
            Err(PsiError::EndOfPsi) => {
                self.0 = &[];
                None
            }
            Err(e) => {
                self.0 = &[];
                Some(Err(e))
            }
        }
    }
}

impl<'a> std::iter::FusedIterator for PsiSectionIter<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn section(table_id: u8, body: &[u8]) -> Vec<u8> {
        let len = (body.len() + 4) as u16;
        let mut buf = vec![table_id, 0xB0 | (len >> 8) as u8, len as u8];
        buf.extend_from_slice(body);
        let crc = crate::crc32::checksum(&buf);
        buf.extend_from_slice(&crc.to_be_bytes());
        buf
    }

    #[test]
    fn test_parse() {
        let buf = section(0x40, &[0x12, 0x34, 0xC5, 0x01, 0x02, 0xAA, 0xBB]);
        let (psi, len) = PsiSection::parse(&buf).unwrap();
        assert_eq!(len, buf.len());
        assert_eq!(psi.table_id, 0x40);
        assert_eq!(
            psi.syntax,
            Some(PsiSectionSyntax {
                table_id_extension: 0x1234,
                version_number: 2,
                current_next_indicator: true,
                section_number: 1,
                last_section_number: 2,
            })
        );
        assert_eq!(psi.data, &[0xAA, 0xBB]);
    }

    #[test]
    fn test_parse_err() {
        assert_matches!(PsiSection::parse(&[0x40, 0xB0]), Err(PsiError::InsufficientLength));
        assert_matches!(PsiSection::parse(&[0xFF, 0xFF, 0xFF]), Err(PsiError::EndOfPsi));

        let mut buf = section(0x40, &[0x12, 0x34, 0xC5, 0x01, 0x02]);
        assert_matches!(
            PsiSection::parse(&buf[..buf.len() - 1]),
            Err(PsiError::InsufficientLength)
        );
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        assert_matches!(PsiSection::parse(&buf), Err(PsiError::Crc32(12)));

        let buf = section(0x40, &[0x12, 0x34]);
        assert_matches!(PsiSection::parse(&buf), Err(PsiError::Corrupted(9)));
    }

    #[test]
    fn test_iter() {
        let mut buf = section(0x40, &[0x00, 0x01, 0xC1, 0x00, 0x01]);
        buf.extend(section(0x40, &[0x00, 0x01, 0xC1, 0x01, 0x01]));
        buf.extend([0xFF; 8]);

        let sections = PsiSection::iter(&buf).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].syntax.as_ref().unwrap().section_number, 0);
        assert_eq!(sections[1].syntax.as_ref().unwrap().section_number, 1);
    }
}
