//! ETSI EN 300 468で規定されるNITの定義。

use fxhash::FxHashSet;

use crate::observe::{LoopKind, Observer};
use crate::psi::cursor::Cursor;
use crate::psi::desc::AnyDescriptor;
use crate::psi::{DecodeError, PsiSection};
use crate::transponder::Transponder;

/// NITのセクションヘッダーから得られる情報。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NitHeader {
    /// テーブル識別（自ネットワークは`0x40`、他ネットワークは`0x41`）。
    pub table_id: u8,
    /// ネットワーク識別。
    pub network_id: u16,
    /// バージョン番号。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
}

/// NITにおける1つのトランスポートストリーム。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportStream {
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// 分配システム記述子から得た選局パラメータ。記述子の出現順に並ぶ。
    pub transponders: Vec<Transponder>,
}

/// NIT（Network Information Table）の1セクション分。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NitSegment {
    /// セクションから読み取った場合はそのヘッダー。
    pub header: Option<NitHeader>,
    /// ネットワーク記述子ループの生のバイト列。
    pub network_descriptors: Vec<u8>,
    /// トランスポートストリームのループ。
    pub transport_streams: Vec<TransportStream>,
}

impl NitSegment {
    /// 自ネットワークのNITのテーブル識別。
    pub const TABLE_ID_ACTUAL: u8 = 0x40;
    /// 他ネットワークのNITのテーブル識別。
    pub const TABLE_ID_OTHER: u8 = 0x41;

    /// セクションヘッダーの後ろ、CRCの前までのバイト列から`NitSegment`を読み取る。
    ///
    /// 宣言された長さが、それを囲む領域の終端を超える場合は
    /// [`DecodeError::MalformedDescriptor`]を返す。途中まで読んだ結果は返さない。
    /// トランスポートストリームのループより後ろのバイト列は無視する。
    #[inline]
    pub fn read(data: &[u8]) -> Result<NitSegment, DecodeError> {
        NitSegment::read_with(data, &mut ())
    }

    /// [`NitSegment::read`]と同様だが、読み取りの経過を`observer`に通知する。
    pub fn read_with<O: Observer>(
        data: &[u8],
        observer: &mut O,
    ) -> Result<NitSegment, DecodeError> {
        let mut cur = Cursor::new(data);

        let mut network = cur.sub_with_length_12().map_err(|e| {
            log::debug!("invalid NitSegment::network_descriptors_length");
            e
        })?;
        let network_descriptors = network.as_slice().to_vec();
        observer.loop_entered(LoopKind::Network, network.offset(), network.remaining());
        while !network.is_empty() {
            let offset = network.offset();
            let desc = AnyDescriptor::next(&mut network)?;
            observer.descriptor_decoded(offset, &desc);
        }
        observer.loop_exited(LoopKind::Network);

        let mut streams = cur.sub_with_length_12().map_err(|e| {
            log::debug!("invalid NitSegment::transport_stream_loop_length");
            e
        })?;
        observer.loop_entered(
            LoopKind::TransportStreams,
            streams.offset(),
            streams.remaining(),
        );

        let mut transport_streams = Vec::new();
        while !streams.is_empty() {
            if streams.remaining() < 6 {
                log::debug!("invalid TransportStream");
                return Err(streams.malformed());
            }

            let transport_stream_id = streams.read_be_16()?;
            let original_network_id = streams.read_be_16()?;
            let mut descriptors = streams.sub_with_length_12().map_err(|e| {
                log::debug!("invalid TransportStream::transport_descriptors_length");
                e
            })?;

            let kind = LoopKind::Transport {
                transport_stream_id,
                original_network_id,
            };
            observer.loop_entered(kind, descriptors.offset(), descriptors.remaining());

            let mut transponders = Vec::new();
            while !descriptors.is_empty() {
                let offset = descriptors.offset();
                let desc = AnyDescriptor::next(&mut descriptors)?;
                observer.descriptor_decoded(offset, &desc);
                transponders.extend(desc.to_transponder());
            }
            observer.loop_exited(kind);

            transport_streams.push(TransportStream {
                transport_stream_id,
                original_network_id,
                transponders,
            });
        }
        observer.loop_exited(LoopKind::TransportStreams);

        Ok(NitSegment {
            header: None,
            network_descriptors,
            transport_streams,
        })
    }

    /// `psi`から`NitSegment`を読み取る。
    ///
    /// エラーの位置はセクションヘッダーの後ろからのバイト数となる。
    #[inline]
    pub fn from_section(psi: &PsiSection) -> Result<NitSegment, DecodeError> {
        NitSegment::from_section_with(psi, &mut ())
    }

    /// [`NitSegment::from_section`]と同様だが、読み取りの経過を`observer`に通知する。
    pub fn from_section_with<O: Observer>(
        psi: &PsiSection,
        observer: &mut O,
    ) -> Result<NitSegment, DecodeError> {
        if psi.table_id != Self::TABLE_ID_ACTUAL && psi.table_id != Self::TABLE_ID_OTHER {
            return Err(DecodeError::UnexpectedTable(psi.table_id));
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid NitSegment::syntax");
            return Err(DecodeError::UnexpectedTable(psi.table_id));
        };

        let mut segment = NitSegment::read_with(psi.data, observer)?;
        segment.header = Some(NitHeader {
            table_id: psi.table_id,
            network_id: syntax.table_id_extension,
            version_number: syntax.version_number,
            current_next_indicator: syntax.current_next_indicator,
            section_number: syntax.section_number,
            last_section_number: syntax.last_section_number,
        });
        Ok(segment)
    }

    /// すべてのトランスポートストリームの選局パラメータを順に返す。
    pub fn transponders(&self) -> impl Iterator<Item = &Transponder> + '_ {
        self.transport_streams
            .iter()
            .flat_map(|ts| ts.transponders.iter())
    }
}

/// 複数の`NitSegment`から選局パラメータを集める。
///
/// セグメント順、その中ではトランスポートストリーム順に並べる。
/// 重複の除去やバージョンの確認は行わない。
pub fn merge_segments<'a, I>(segments: I) -> Vec<Transponder>
where
    I: IntoIterator<Item = &'a NitSegment>,
{
    segments
        .into_iter()
        .flat_map(|segment| segment.transponders())
        .cloned()
        .collect()
}

/// 受信した順に並べた`NitSegment`の集まり。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NitSegmentSet {
    segments: Vec<NitSegment>,
}

impl NitSegmentSet {
    /// 空の`NitSegmentSet`を生成する。
    #[inline]
    pub fn new() -> NitSegmentSet {
        NitSegmentSet::default()
    }

    /// 連続して格納されたPSIセクションからNITのセクションを読み取る。
    ///
    /// NIT以外のテーブルは読み飛ばす。
    pub fn from_sections(buf: &[u8]) -> Result<NitSegmentSet, DecodeError> {
        let mut set = NitSegmentSet::new();
        for psi in PsiSection::iter(buf) {
            match NitSegment::from_section(&psi?) {
                Ok(segment) => set.push(segment),
                Err(DecodeError::UnexpectedTable(table_id)) => {
                    log::debug!("skip table 0x{:02X}", table_id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(set)
    }

    /// 末尾に`segment`を追加する。
    #[inline]
    pub fn push(&mut self, segment: NitSegment) {
        self.segments.push(segment);
    }

    /// セグメントの数を返す。
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// セグメントがない場合は`true`を返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// セグメントを順に返す。
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<NitSegment> {
        self.segments.iter()
    }

    /// すべてのセグメントの選局パラメータを1つの配列にまとめる。
    #[inline]
    pub fn merge(&self) -> Vec<Transponder> {
        merge_segments(&self.segments)
    }

    /// [`NitSegmentSet::merge`]の結果から、分配システムと周波数が同じものを除く。
    ///
    /// 最初に現れたものを残し、順序は維持する。
    pub fn unique_transponders(&self) -> Vec<Transponder> {
        let mut seen = FxHashSet::default();
        self.segments
            .iter()
            .flat_map(|segment| segment.transponders())
            .filter(|t| seen.insert(*t))
            .cloned()
            .collect()
    }
}

impl FromIterator<NitSegment> for NitSegmentSet {
    fn from_iter<I: IntoIterator<Item = NitSegment>>(iter: I) -> NitSegmentSet {
        NitSegmentSet {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Extend<NitSegment> for NitSegmentSet {
    fn extend<I: IntoIterator<Item = NitSegment>>(&mut self, iter: I) {
        self.segments.extend(iter);
    }
}

impl<'a> IntoIterator for &'a NitSegmentSet {
    type Item = &'a NitSegment;
    type IntoIter = std::slice::Iter<'a, NitSegment>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
