//! 選局パラメータのテキスト形式。
//!
//! 1行に1つの`Transponder`をタブ区切りで表す。先頭は分配システムの識別子で、
//! 以降は分配システムごとに決まった順で数値が並ぶ。
//!
//! | 識別子 | フィールド |
//! |--------|------------|
//! | `C`    | 周波数、シンボルレート、変調方式、符号化率、スペクトル反転 |
//! | `T`    | 周波数、帯域幅、符号化率（高優先）、符号化率（低優先）、伝送モード、ガードインターバル、階層伝送、変調方式、スペクトル反転 |
//! | `T2`   | `T`と同じ。PLP識別が0以外の場合はその後にPLP識別 |
//! | `S`    | 周波数、シンボルレート、偏波、符号化率、スペクトル反転 |
//! | `S2`   | `S`と同じフィールドの後に変調方式、パイロット、ロールオフ率、ストリーム識別 |
//!
//! 保存済みのファイルを読めなくなるため、フィールドの順序は変更せず追加のみとすること。

use std::fmt;

use smallvec::SmallVec;

use super::*;

fn write_terrestrial(f: &mut fmt::Formatter, p: &TerrestrialParams) -> fmt::Result {
    write!(
        f,
        "\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        p.frequency,
        p.bandwidth,
        p.code_rate_hp.0,
        p.code_rate_lp.0,
        p.transmission_mode.0,
        p.guard_interval.0,
        p.hierarchy.0,
        p.modulation.0,
        p.inversion.0,
    )
}

fn write_satellite(f: &mut fmt::Formatter, p: &SatelliteParams) -> fmt::Result {
    write!(
        f,
        "\t{}\t{}\t{}\t{}\t{}",
        p.frequency,
        p.symbol_rate,
        p.polarization.to_u32(),
        p.fec.0,
        p.inversion.0,
    )
}

impl fmt::Display for Transponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.system.tag())?;
        match self.params() {
            Params::Cable(p) => write!(
                f,
                "\t{}\t{}\t{}\t{}\t{}",
                p.frequency, p.symbol_rate, p.modulation.0, p.fec.0, p.inversion.0,
            ),
            Params::Terrestrial(p) => write_terrestrial(f, &p),
            Params::Terrestrial2(p) => {
                write_terrestrial(f, &p.base)?;
                if p.stream_id != 0 {
                    write!(f, "\t{}", p.stream_id)?;
                }
                Ok(())
            }
            Params::Satellite(p) => write_satellite(f, &p),
            Params::Satellite2(p) => {
                write_satellite(f, &p.base)?;
                write!(
                    f,
                    "\t{}\t{}\t{}\t{}",
                    p.modulation.0, p.pilot.0, p.rolloff.0, p.stream_id,
                )
            }
        }
    }
}

/// 10進数字のみからなるフィールドを読み取る。
///
/// 書き出した形と一致しない符号付きや先頭に0が付いた数値は受け付けない。
fn parse_field(field: &str) -> Option<u32> {
    match field.as_bytes() {
        [] | [b'0', _, ..] => None,
        bytes if bytes.iter().all(u8::is_ascii_digit) => field.parse().ok(),
        _ => None,
    }
}

fn terrestrial_params(v: &[u32; 9]) -> TerrestrialParams {
    let [frequency, bandwidth, hp, lp, mode, guard, hierarchy, modulation, inversion] = *v;
    TerrestrialParams {
        frequency,
        bandwidth,
        code_rate_hp: CodeRate(hp),
        code_rate_lp: CodeRate(lp),
        transmission_mode: TransmissionMode(mode),
        guard_interval: GuardInterval(guard),
        hierarchy: Hierarchy(hierarchy),
        modulation: Modulation(modulation),
        inversion: Inversion(inversion),
    }
}

fn satellite_params(v: &[u32; 5]) -> Option<SatelliteParams> {
    let [frequency, symbol_rate, polarization, fec, inversion] = *v;
    Some(SatelliteParams {
        frequency,
        symbol_rate,
        polarization: Polarization::from_u32(polarization)?,
        fec: CodeRate(fec),
        inversion: Inversion(inversion),
    })
}

impl Transponder {
    /// テキスト形式の1行に変換する。改行は含まない。
    #[inline]
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// テキスト形式の1行から`Transponder`を読み取る。
    ///
    /// 周波数が0の行は空きを示すものとして`None`を返す。
    /// 識別子が未知の場合やフィールドの数が合わない場合、数値でないフィールドがある場合も
    /// `None`を返す。
    pub fn from_text(line: &str) -> Option<Transponder> {
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        let mut fields = line.split('\t');
        let system = DeliverySystem::from_tag(fields.next()?)?;
        let values = fields
            .map(parse_field)
            .collect::<Option<SmallVec<[u32; 10]>>>()?;

        if values.first().copied().unwrap_or_default() == 0 {
            return None;
        }

        let params = match (system, &*values) {
            (DeliverySystem::Cable, &[frequency, symbol_rate, modulation, fec, inversion]) => {
                Params::Cable(CableParams {
                    frequency,
                    symbol_rate,
                    modulation: Modulation(modulation),
                    fec: CodeRate(fec),
                    inversion: Inversion(inversion),
                })
            }
            (DeliverySystem::Terrestrial, v) => {
                Params::Terrestrial(terrestrial_params(v.try_into().ok()?))
            }
            (DeliverySystem::Terrestrial2, v) => {
                let (base, stream_id) = match v.len() {
                    9 => (v, 0),
                    // PLP識別が0の場合は書き出さないため、明示された0は受け付けない
                    10 if v[9] != 0 => (&v[..9], v[9]),
                    _ => return None,
                };
                Params::Terrestrial2(Terrestrial2Params {
                    base: terrestrial_params(base.try_into().ok()?),
                    stream_id,
                })
            }
            (DeliverySystem::Satellite, v) => {
                Params::Satellite(satellite_params(v.try_into().ok()?)?)
            }
            (
                DeliverySystem::Satellite2,
                &[f, sr, pol, fec, inv, modulation, pilot, rolloff, stream_id],
            ) => Params::Satellite2(Satellite2Params {
                base: satellite_params(&[f, sr, pol, fec, inv])?,
                modulation: Modulation(modulation),
                pilot: Pilot(pilot),
                rolloff: Rolloff(rolloff),
                stream_id,
            }),
            _ => return None,
        };

        Some(Transponder::new(params))
    }
}
