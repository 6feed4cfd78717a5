//! 記述子に関する基礎の型。

use std::fmt;

use crate::psi::cursor::Cursor;
use crate::psi::DecodeError;
use crate::transponder::Transponder;

use super::dvb::{
    CableDeliverySystemDescriptor, SatelliteDeliverySystemDescriptor,
    StreamIdentifierDescriptor, TerrestrialDeliverySystemDescriptor,
};

/// 記述子を表すトレイト。
pub trait Descriptor<'a>: Sized {
    /// この記述子のタグ。
    const TAG: u8;

    /// `data`から記述子を読み取る。
    ///
    /// `data`には`descriptor_tag`と`descriptor_length`は含まない。
    fn read(data: &'a [u8]) -> Option<Self>;
}

/// パース前の記述子。
#[derive(Clone, PartialEq, Eq)]
pub struct RawDescriptor<'a> {
    /// 記述子のタグ。
    pub tag: u8,

    /// 記述子の長さ。
    pub length: u8,

    /// 記述子の内容。
    pub data: &'a [u8],
}

impl<'a> RawDescriptor<'a> {
    /// `cur`から記述子を1つ読み取り、カーソルを記述子の後ろまで進める。
    ///
    /// ヘッダーの2バイトがない場合や、`descriptor_length`が残りのバイト数を超える場合は
    /// カーソルを進めずにエラーを返す。
    pub fn next(cur: &mut Cursor<'a>) -> Result<RawDescriptor<'a>, DecodeError> {
        let start = cur.clone();
        let [tag, length, ..] = *cur.as_slice() else {
            log::debug!("invalid RawDescriptor::descriptor_length");
            return Err(cur.malformed());
        };
        cur.take(2)?;
        let Ok(data) = cur.take(length as usize) else {
            log::debug!("invalid RawDescriptor::data");
            *cur = start;
            return Err(cur.malformed());
        };

        Ok(RawDescriptor { tag, length, data })
    }
}

impl<'a> fmt::Debug for RawDescriptor<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawDescriptor")
            .field("tag", &crate::utils::UpperHex(self.tag))
            .field("length", &self.length)
            .finish()
    }
}

/// ループ内の記述子を順に読み取るイテレーター。
///
/// 不正な記述子を読み取った場合はエラーを返し、以降は何も返さない。
#[derive(Debug, Clone)]
pub struct DescriptorIter<'a> {
    cur: Cursor<'a>,
    failed: bool,
}

impl<'a> DescriptorIter<'a> {
    /// `cur`の残り全体を記述子ループとして読み取るイテレーターを生成する。
    #[inline]
    pub fn new(cur: Cursor<'a>) -> DescriptorIter<'a> {
        DescriptorIter { cur, failed: false }
    }
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = Result<RawDescriptor<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cur.is_empty() {
            return None;
        }

        let result = RawDescriptor::next(&mut self.cur);
        self.failed = result.is_err();
        Some(result)
    }
}

impl<'a> std::iter::FusedIterator for DescriptorIter<'a> {}

/// タグごとに読み分けた記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyDescriptor {
    /// 有線分配システム記述子。
    Cable(CableDeliverySystemDescriptor),
    /// 地上分配システム記述子。
    Terrestrial(TerrestrialDeliverySystemDescriptor),
    /// 衛星分配システム記述子。
    Satellite(SatelliteDeliverySystemDescriptor),
    /// ストリーム識別記述子。
    StreamIdentifier(StreamIdentifierDescriptor),
    /// このクレートでは解釈しない記述子。
    Opaque {
        /// 記述子のタグ。
        tag: u8,
        /// 記述子の長さ。
        length: u8,
    },
}

impl AnyDescriptor {
    /// `raw`のタグに応じて記述子を読み取る。
    ///
    /// 未知のタグは[`AnyDescriptor::Opaque`]となる。
    /// 既知のタグで内容の長さが足りない場合は`None`を返す。
    pub fn decode(raw: &RawDescriptor) -> Option<AnyDescriptor> {
        match raw.tag {
            CableDeliverySystemDescriptor::TAG => {
                CableDeliverySystemDescriptor::read(raw.data).map(AnyDescriptor::Cable)
            }
            TerrestrialDeliverySystemDescriptor::TAG => {
                TerrestrialDeliverySystemDescriptor::read(raw.data).map(AnyDescriptor::Terrestrial)
            }
            SatelliteDeliverySystemDescriptor::TAG => {
                SatelliteDeliverySystemDescriptor::read(raw.data).map(AnyDescriptor::Satellite)
            }
            StreamIdentifierDescriptor::TAG => {
                StreamIdentifierDescriptor::read(raw.data).map(AnyDescriptor::StreamIdentifier)
            }
            tag => Some(AnyDescriptor::Opaque {
                tag,
                length: raw.length,
            }),
        }
    }

    /// `cur`から記述子を1つ読み取ってタグに応じて読み分け、カーソルを記述子の後ろまで進める。
    ///
    /// 既知のタグでも内容が短く読み取れない場合は[`AnyDescriptor::Opaque`]として読み飛ばす。
    /// 記述子が領域の終端を超える場合はカーソルを進めず、記述子の先頭位置を示すエラーを返す。
    pub fn next(cur: &mut Cursor) -> Result<AnyDescriptor, DecodeError> {
        let raw = RawDescriptor::next(cur)?;
        Ok(AnyDescriptor::decode(&raw).unwrap_or(AnyDescriptor::Opaque {
            tag: raw.tag,
            length: raw.length,
        }))
    }

    /// 記述子のタグを返す。
    pub fn tag(&self) -> u8 {
        match self {
            AnyDescriptor::Cable(_) => CableDeliverySystemDescriptor::TAG,
            AnyDescriptor::Terrestrial(_) => TerrestrialDeliverySystemDescriptor::TAG,
            AnyDescriptor::Satellite(_) => SatelliteDeliverySystemDescriptor::TAG,
            AnyDescriptor::StreamIdentifier(_) => StreamIdentifierDescriptor::TAG,
            AnyDescriptor::Opaque { tag, .. } => *tag,
        }
    }

    /// 分配システム記述子であれば選局パラメータに変換する。
    pub fn to_transponder(&self) -> Option<Transponder> {
        match self {
            AnyDescriptor::Cable(d) => Some(d.to_transponder()),
            AnyDescriptor::Terrestrial(d) => Some(d.to_transponder()),
            AnyDescriptor::Satellite(d) => Some(d.to_transponder()),
            AnyDescriptor::StreamIdentifier(_) | AnyDescriptor::Opaque { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use hex_literal::hex;

    #[test]
    fn test_raw_descriptor() {
        let data = hex!("52 01 0A 80 00 44");
        let mut cur = Cursor::new(&data);
        assert_matches!(RawDescriptor::next(&mut cur), Ok(RawDescriptor {
            tag: 0x52,
            length: 1,
            data: &[0x0A],
        }));
        assert_matches!(RawDescriptor::next(&mut cur), Ok(RawDescriptor {
            tag: 0x80,
            length: 0,
            data: &[],
        }));

        // ヘッダーが途中で切れている
        assert_matches!(
            RawDescriptor::next(&mut cur),
            Err(DecodeError::MalformedDescriptor { offset: 5 })
        );
        assert_eq!(cur.offset(), 5);
    }

    #[test]
    fn test_raw_descriptor_overrun() {
        let data = hex!("44 0B 03 46 00");
        let mut cur = Cursor::new(&data);
        assert_matches!(
            RawDescriptor::next(&mut cur),
            Err(DecodeError::MalformedDescriptor { offset: 0 })
        );
        assert_eq!(cur.offset(), 0);
        assert_eq!(cur.remaining(), 5);
    }

    #[test]
    fn test_any_descriptor() {
        let data = hex!(
            "
            52 01 0A
            C0 03 AA BB CC
            44 0B 03 46 00 00 FF F2 05 00 69 00 03
            "
        );
        let mut cur = Cursor::new(&data);

        let desc = AnyDescriptor::next(&mut cur).unwrap();
        assert_eq!(
            desc,
            AnyDescriptor::StreamIdentifier(StreamIdentifierDescriptor { component_tag: 0x0A })
        );
        assert_eq!(desc.tag(), 0x52);
        assert!(desc.to_transponder().is_none());

        let desc = AnyDescriptor::next(&mut cur).unwrap();
        assert_eq!(desc, AnyDescriptor::Opaque { tag: 0xC0, length: 3 });
        assert!(desc.to_transponder().is_none());

        let desc = AnyDescriptor::next(&mut cur).unwrap();
        assert_matches!(desc, AnyDescriptor::Cable(_));
        assert_eq!(desc.to_transponder().map(|t| t.frequency()), Some(346_000_000));
        assert!(cur.is_empty());
    }

    #[test]
    fn test_any_descriptor_short_payload() {
        // 長さは領域内に収まるが、有線分配システム記述子としては短い
        let data = hex!("52 01 0A 44 02 03 46 52 01 0B");
        let mut cur = Cursor::new(&data);
        assert!(AnyDescriptor::next(&mut cur).is_ok());

        let desc = AnyDescriptor::next(&mut cur).unwrap();
        assert_eq!(desc, AnyDescriptor::Opaque { tag: 0x44, length: 2 });
        assert!(desc.to_transponder().is_none());
        assert_eq!(cur.offset(), 7);

        assert_eq!(
            AnyDescriptor::next(&mut cur),
            Ok(AnyDescriptor::StreamIdentifier(StreamIdentifierDescriptor { component_tag: 0x0B }))
        );
        assert!(cur.is_empty());
    }

    #[test]
    fn test_descriptor_iter() {
        let data = hex!("52 01 0A 52 05 0B");
        let mut iter = DescriptorIter::new(Cursor::new(&data));
        assert_matches!(iter.next(), Some(Ok(RawDescriptor { tag: 0x52, .. })));
        assert_matches!(
            iter.next(),
            Some(Err(DecodeError::MalformedDescriptor { offset: 3 }))
        );
        assert_matches!(iter.next(), None);

        assert_eq!(DescriptorIter::new(Cursor::new(&[])).count(), 0);
    }
}
