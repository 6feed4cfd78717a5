//! ETSI EN 300 468で規定される記述子と関連する型の定義。

use crate::transponder::{
    CableParams, CodeRate, GuardInterval, Hierarchy, Inversion, Modulation, Pilot, Polarization,
    Rolloff, Satellite2Params, SatelliteParams, TerrestrialParams, TransmissionMode, Transponder,
};
use crate::utils::BytesExt;

use super::base::Descriptor;

/// 分配システム記述子における内符号（4ビット）を符号化率に変換する。
fn fec_inner(fec: u8) -> CodeRate {
    match fec {
        0b0001 => CodeRate::FEC_1_2,
        0b0010 => CodeRate::FEC_2_3,
        0b0011 => CodeRate::FEC_3_4,
        0b0100 => CodeRate::FEC_5_6,
        0b0101 => CodeRate::FEC_7_8,
        0b0110 => CodeRate::FEC_8_9,
        0b0111 => CodeRate::FEC_3_5,
        0b1000 => CodeRate::FEC_4_5,
        0b1001 => CodeRate::FEC_9_10,
        0b1111 => CodeRate::NONE,
        // 0b0000は未定義、それ以外は予約
        _ => CodeRate::AUTO,
    }
}

/// 有線分配システム記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CableDeliverySystemDescriptor {
    /// 周波数（単位は100Hz）。
    pub frequency: u32,
    /// FEC（外側、4ビット）。
    pub fec_outer: u8,
    /// 変調。
    pub modulation: u8,
    /// シンボルレート（単位は100シンボル毎秒）。
    pub symbol_rate: u32,
    /// FEC（内側、4ビット）。
    pub fec_inner: u8,
}

impl Descriptor<'_> for CableDeliverySystemDescriptor {
    const TAG: u8 = 0x44;

    fn read(data: &[u8]) -> Option<CableDeliverySystemDescriptor> {
        if data.len() < 11 {
            log::debug!("invalid CableDeliverySystemDescriptor");
            return None;
        }

        let frequency = data[0..=3].read_bcd(8);
        let fec_outer = data[5] & 0b00001111;
        let modulation = data[6];
        let symbol_rate = data[7..=10].read_bcd(7);
        let fec_inner = data[10] & 0b00001111;

        Some(CableDeliverySystemDescriptor {
            frequency,
            fec_outer,
            modulation,
            symbol_rate,
            fec_inner,
        })
    }
}

impl CableDeliverySystemDescriptor {
    /// DVB-Cの選局パラメータに変換する。
    pub fn to_transponder(&self) -> Transponder {
        let modulation = match self.modulation {
            0x01 => Modulation::QAM_16,
            0x02 => Modulation::QAM_32,
            0x03 => Modulation::QAM_64,
            0x04 => Modulation::QAM_128,
            0x05 => Modulation::QAM_256,
            _ => Modulation::QAM_AUTO,
        };

        Transponder::cable(CableParams {
            frequency: self.frequency.saturating_mul(100),
            symbol_rate: self.symbol_rate * 100,
            modulation,
            fec: fec_inner(self.fec_inner),
            inversion: Inversion::AUTO,
        })
    }
}

/// 衛星分配システム記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatelliteDeliverySystemDescriptor {
    /// 周波数（単位は10kHz）。
    pub frequency: u32,
    /// 軌道（単位は0.1度）。
    pub orbital_position: u16,
    /// 東経西経フラグ（東経であれば`true`）。
    pub west_east_flag: bool,
    /// 偏波。
    pub polarization: Polarization,
    /// ロールオフ率（2ビット）。DVB-S2以外では0。
    pub roll_off: u8,
    /// DVB-S2であれば`true`。
    pub modulation_system: bool,
    /// 変調（2ビット）。
    pub modulation_type: u8,
    /// シンボルレート（単位は100シンボル毎秒）。
    pub symbol_rate: u32,
    /// FEC（内符号、4ビット）。
    pub fec_inner: u8,
}

impl Descriptor<'_> for SatelliteDeliverySystemDescriptor {
    const TAG: u8 = 0x43;

    fn read(data: &[u8]) -> Option<SatelliteDeliverySystemDescriptor> {
        if data.len() < 11 {
            log::debug!("invalid SatelliteDeliverySystemDescriptor");
            return None;
        }

        let frequency = data[0..=3].read_bcd(8);
        let orbital_position = data[4..=5].read_bcd(4) as u16;
        let west_east_flag = data[6] & 0b10000000 != 0;
        let polarization = Polarization::from_bits((data[6] & 0b01100000) >> 5);
        let roll_off = (data[6] & 0b00011000) >> 3;
        let modulation_system = data[6] & 0b00000100 != 0;
        let modulation_type = data[6] & 0b00000011;
        let symbol_rate = data[7..=10].read_bcd(7);
        let fec_inner = data[10] & 0b00001111;

        Some(SatelliteDeliverySystemDescriptor {
            frequency,
            orbital_position,
            west_east_flag,
            polarization,
            roll_off,
            modulation_system,
            modulation_type,
            symbol_rate,
            fec_inner,
        })
    }
}

impl SatelliteDeliverySystemDescriptor {
    /// DVB-SまたはDVB-S2の選局パラメータに変換する。
    pub fn to_transponder(&self) -> Transponder {
        let base = SatelliteParams {
            frequency: self.frequency.saturating_mul(10),
            symbol_rate: self.symbol_rate * 100,
            polarization: self.polarization,
            fec: fec_inner(self.fec_inner),
            inversion: Inversion::AUTO,
        };
        if !self.modulation_system {
            return Transponder::satellite(base);
        }

        let modulation = match self.modulation_type {
            0b01 => Modulation::QPSK,
            0b10 => Modulation::PSK_8,
            0b11 => Modulation::QAM_16,
            _ => Modulation::QAM_AUTO,
        };
        let rolloff = match self.roll_off {
            0b00 => Rolloff::ROLLOFF_35,
            0b01 => Rolloff::ROLLOFF_25,
            0b10 => Rolloff::ROLLOFF_20,
            _ => Rolloff::AUTO,
        };

        Transponder::satellite2(Satellite2Params {
            base,
            modulation,
            pilot: Pilot::AUTO,
            rolloff,
            stream_id: 0,
        })
    }
}

/// 地上分配システム記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrestrialDeliverySystemDescriptor {
    /// 中心周波数（単位は10Hz）。
    pub centre_frequency: u32,
    /// 帯域幅（3ビット）。
    pub bandwidth: u8,
    /// 高優先ストリームであれば`true`。
    pub priority: bool,
    /// タイムスライシング指示（使用中であれば`false`）。
    pub time_slicing_indicator: bool,
    /// MPE-FEC指示（使用中であれば`false`）。
    pub mpe_fec_indicator: bool,
    /// コンスタレーション（2ビット）。
    pub constellation: u8,
    /// 階層情報（3ビット）。
    pub hierarchy_information: u8,
    /// 高優先ストリームの符号化率（3ビット）。
    pub code_rate_hp: u8,
    /// 低優先ストリームの符号化率（3ビット）。
    pub code_rate_lp: u8,
    /// ガードインターバル（2ビット）。
    pub guard_interval: u8,
    /// 伝送モード（2ビット）。
    pub transmission_mode: u8,
    /// 他の周波数でも使用されていれば`true`。
    pub other_frequency_flag: bool,
}

impl Descriptor<'_> for TerrestrialDeliverySystemDescriptor {
    const TAG: u8 = 0x5A;

    fn read(data: &[u8]) -> Option<TerrestrialDeliverySystemDescriptor> {
        if data.len() < 11 {
            log::debug!("invalid TerrestrialDeliverySystemDescriptor");
            return None;
        }

        let centre_frequency = data[0..=3].read_be_32();
        let bandwidth = (data[4] & 0b11100000) >> 5;
        let priority = data[4] & 0b00010000 != 0;
        let time_slicing_indicator = data[4] & 0b00001000 != 0;
        let mpe_fec_indicator = data[4] & 0b00000100 != 0;
        let constellation = (data[5] & 0b11000000) >> 6;
        let hierarchy_information = (data[5] & 0b00111000) >> 3;
        let code_rate_hp = data[5] & 0b00000111;
        let code_rate_lp = (data[6] & 0b11100000) >> 5;
        let guard_interval = (data[6] & 0b00011000) >> 3;
        let transmission_mode = (data[6] & 0b00000110) >> 1;
        let other_frequency_flag = data[6] & 0b00000001 != 0;

        Some(TerrestrialDeliverySystemDescriptor {
            centre_frequency,
            bandwidth,
            priority,
            time_slicing_indicator,
            mpe_fec_indicator,
            constellation,
            hierarchy_information,
            code_rate_hp,
            code_rate_lp,
            guard_interval,
            transmission_mode,
            other_frequency_flag,
        })
    }
}

impl TerrestrialDeliverySystemDescriptor {
    /// DVB-Tの選局パラメータに変換する。
    pub fn to_transponder(&self) -> Transponder {
        fn code_rate(n: u8) -> CodeRate {
            match n {
                0b000 => CodeRate::FEC_1_2,
                0b001 => CodeRate::FEC_2_3,
                0b010 => CodeRate::FEC_3_4,
                0b011 => CodeRate::FEC_5_6,
                0b100 => CodeRate::FEC_7_8,
                _ => CodeRate::AUTO,
            }
        }

        let bandwidth = match self.bandwidth {
            0b000 => 8_000_000,
            0b001 => 7_000_000,
            0b010 => 6_000_000,
            0b011 => 5_000_000,
            // 予約値は自動判別に任せる
            _ => 0,
        };
        let modulation = match self.constellation {
            0b00 => Modulation::QPSK,
            0b01 => Modulation::QAM_16,
            0b10 => Modulation::QAM_64,
            _ => Modulation::QAM_AUTO,
        };
        // 最上位ビットはインターリーバーの種類
        let hierarchy = match self.hierarchy_information & 0b011 {
            0b00 => Hierarchy::NONE,
            0b01 => Hierarchy::ALPHA_1,
            0b10 => Hierarchy::ALPHA_2,
            _ => Hierarchy::ALPHA_4,
        };
        let guard_interval = match self.guard_interval {
            0b00 => GuardInterval::GUARD_1_32,
            0b01 => GuardInterval::GUARD_1_16,
            0b10 => GuardInterval::GUARD_1_8,
            _ => GuardInterval::GUARD_1_4,
        };
        let transmission_mode = match self.transmission_mode {
            0b00 => TransmissionMode::MODE_2K,
            0b01 => TransmissionMode::MODE_8K,
            0b10 => TransmissionMode::MODE_4K,
            _ => TransmissionMode::AUTO,
        };

        Transponder::terrestrial(TerrestrialParams {
            frequency: self.centre_frequency.saturating_mul(10),
            bandwidth,
            code_rate_hp: code_rate(self.code_rate_hp),
            code_rate_lp: code_rate(self.code_rate_lp),
            transmission_mode,
            guard_interval,
            hierarchy,
            modulation,
            inversion: Inversion::AUTO,
        })
    }
}

/// ストリーム識別記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamIdentifierDescriptor {
    /// コンポーネントタグ。
    pub component_tag: u8,
}

impl Descriptor<'_> for StreamIdentifierDescriptor {
    const TAG: u8 = 0x52;

    fn read(data: &[u8]) -> Option<StreamIdentifierDescriptor> {
        let [component_tag, ..] = *data else {
            log::debug!("invalid StreamIdentifierDescriptor");
            return None;
        };

        Some(StreamIdentifierDescriptor { component_tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transponder::{Command, DeliverySystem, Params};
    use hex_literal::hex;

    #[test]
    fn test_cable() {
        let desc = CableDeliverySystemDescriptor::read(&hex!("03 46 00 00 FF F2 05 00 69 00 03"));
        let desc = desc.unwrap();
        assert_eq!(
            desc,
            CableDeliverySystemDescriptor {
                frequency: 3460000,
                fec_outer: 2,
                modulation: 5,
                symbol_rate: 69000,
                fec_inner: 3,
            }
        );

        let t = desc.to_transponder();
        assert_eq!(
            t.params(),
            Params::Cable(CableParams {
                frequency: 346_000_000,
                symbol_rate: 6_900_000,
                modulation: Modulation::QAM_256,
                fec: CodeRate::FEC_3_4,
                inversion: Inversion::AUTO,
            })
        );

        assert_eq!(CableDeliverySystemDescriptor::read(&hex!("03 46 00 00 FF F2 05 00 69 00")), None);
    }

    #[test]
    fn test_satellite() {
        let desc = SatelliteDeliverySystemDescriptor::read(&hex!("01 17 49 37 01 92 81 02 75 00 03"));
        let desc = desc.unwrap();
        assert_eq!(desc.frequency, 1174937);
        assert_eq!(desc.orbital_position, 192);
        assert!(desc.west_east_flag);
        assert_eq!(desc.polarization, Polarization::Horizontal);
        assert!(!desc.modulation_system);
        assert_eq!(desc.modulation_type, 1);
        assert_eq!(desc.symbol_rate, 275000);
        assert_eq!(desc.fec_inner, 3);

        let t = desc.to_transponder();
        assert_eq!(t.system(), DeliverySystem::Satellite);
        assert_eq!(t.frequency(), 11_749_370);
        assert_eq!(t.symbol_rate(), Some(27_500_000));
        assert_eq!(t.fec(), Some(CodeRate::FEC_3_4));
        assert_eq!(t.polarization(), Some(Polarization::Horizontal));
    }

    #[test]
    fn test_satellite2() {
        let desc = SatelliteDeliverySystemDescriptor::read(&hex!("01 14 93 75 01 92 A6 02 20 00 02"));
        let desc = desc.unwrap();
        assert_eq!(desc.polarization, Polarization::Vertical);
        assert!(desc.modulation_system);
        assert_eq!(desc.roll_off, 0);
        assert_eq!(desc.modulation_type, 0b10);

        let t = desc.to_transponder();
        assert_eq!(t.system(), DeliverySystem::Satellite2);
        assert_eq!(t.frequency(), 11_493_750);
        assert_eq!(t.symbol_rate(), Some(22_000_000));
        assert_eq!(t.modulation(), Some(Modulation::PSK_8));
        assert_eq!(t.get(Command::ROLLOFF), Some(Rolloff::ROLLOFF_35.0));
        assert_eq!(t.get(Command::PILOT), Some(Pilot::AUTO.0));
        assert_eq!(t.stream_id(), Some(0));
    }

    #[test]
    fn test_terrestrial() {
        let desc =
            TerrestrialDeliverySystemDescriptor::read(&hex!("03 F8 3C 40 1F 81 0A FF FF FF FF"));
        let desc = desc.unwrap();
        assert_eq!(desc.centre_frequency, 66_600_000);
        assert_eq!(desc.bandwidth, 0);
        assert!(desc.priority);
        assert_eq!(desc.constellation, 0b10);
        assert_eq!(desc.hierarchy_information, 0);
        assert_eq!(desc.code_rate_hp, 1);
        assert_eq!(desc.code_rate_lp, 0);
        assert_eq!(desc.guard_interval, 1);
        assert_eq!(desc.transmission_mode, 1);
        assert!(!desc.other_frequency_flag);

        let t = desc.to_transponder();
        assert_eq!(
            t.params(),
            Params::Terrestrial(TerrestrialParams {
                frequency: 666_000_000,
                bandwidth: 8_000_000,
                code_rate_hp: CodeRate::FEC_2_3,
                code_rate_lp: CodeRate::FEC_1_2,
                transmission_mode: TransmissionMode::MODE_8K,
                guard_interval: GuardInterval::GUARD_1_16,
                hierarchy: Hierarchy::NONE,
                modulation: Modulation::QAM_64,
                inversion: Inversion::AUTO,
            })
        );
    }

    #[test]
    fn test_stream_identifier() {
        assert_eq!(
            StreamIdentifierDescriptor::read(&[0x0A]),
            Some(StreamIdentifierDescriptor { component_tag: 0x0A })
        );
        assert_eq!(StreamIdentifierDescriptor::read(&[]), None);
    }

    #[test]
    fn test_fec_inner() {
        assert_eq!(fec_inner(0), CodeRate::AUTO);
        assert_eq!(fec_inner(0b1001), CodeRate::FEC_9_10);
        assert_eq!(fec_inner(0b1010), CodeRate::AUTO);
        assert_eq!(fec_inner(0b1111), CodeRate::NONE);
    }
}
