//! Linux DVB API（`linux/dvb/frontend.h`）で定義されている、定数を伴う型。

use std::fmt;

/// フロントエンドに設定するプロパティの種類（`DTV_*`）。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Command(pub u32);

impl Command {
    /// 設定したプロパティで選局を開始する。
    pub const TUNE: Command = Command(1);
    /// 周波数。衛星ではkHz、それ以外ではHz単位。
    pub const FREQUENCY: Command = Command(3);
    /// 変調方式。
    pub const MODULATION: Command = Command(4);
    /// 帯域幅（Hz）。
    pub const BANDWIDTH_HZ: Command = Command(5);
    /// スペクトル反転。
    pub const INVERSION: Command = Command(6);
    /// シンボルレート（シンボル毎秒）。
    pub const SYMBOL_RATE: Command = Command(8);
    /// 内符号の符号化率。
    pub const INNER_FEC: Command = Command(9);
    /// パイロット。
    pub const PILOT: Command = Command(12);
    /// ロールオフ率。
    pub const ROLLOFF: Command = Command(13);
    /// 分配システム。
    pub const DELIVERY_SYSTEM: Command = Command(17);
    /// 高優先階層の符号化率。
    pub const CODE_RATE_HP: Command = Command(36);
    /// 低優先階層の符号化率。
    pub const CODE_RATE_LP: Command = Command(37);
    /// ガードインターバル。
    pub const GUARD_INTERVAL: Command = Command(38);
    /// 伝送モード。
    pub const TRANSMISSION_MODE: Command = Command(39);
    /// 階層伝送。
    pub const HIERARCHY: Command = Command(40);
    /// ストリーム識別（DVB-S2のISI、DVB-T2のPLP）。
    pub const STREAM_ID: Command = Command(42);
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Command::TUNE => "TUNE",
            Command::FREQUENCY => "FREQUENCY",
            Command::MODULATION => "MODULATION",
            Command::BANDWIDTH_HZ => "BANDWIDTH_HZ",
            Command::INVERSION => "INVERSION",
            Command::SYMBOL_RATE => "SYMBOL_RATE",
            Command::INNER_FEC => "INNER_FEC",
            Command::PILOT => "PILOT",
            Command::ROLLOFF => "ROLLOFF",
            Command::DELIVERY_SYSTEM => "DELIVERY_SYSTEM",
            Command::CODE_RATE_HP => "CODE_RATE_HP",
            Command::CODE_RATE_LP => "CODE_RATE_LP",
            Command::GUARD_INTERVAL => "GUARD_INTERVAL",
            Command::TRANSMISSION_MODE => "TRANSMISSION_MODE",
            Command::HIERARCHY => "HIERARCHY",
            Command::STREAM_ID => "STREAM_ID",
            Command(n) => return write!(f, "Command({})", n),
        };
        write!(f, "DTV_{}", name)
    }
}

/// 変調方式（`fe_modulation`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Modulation(pub u32);

impl Modulation {
    /// QPSK
    pub const QPSK: Modulation = Modulation(0);
    /// 16QAM
    pub const QAM_16: Modulation = Modulation(1);
    /// 32QAM
    pub const QAM_32: Modulation = Modulation(2);
    /// 64QAM
    pub const QAM_64: Modulation = Modulation(3);
    /// 128QAM
    pub const QAM_128: Modulation = Modulation(4);
    /// 256QAM
    pub const QAM_256: Modulation = Modulation(5);
    /// 自動判別
    pub const QAM_AUTO: Modulation = Modulation(6);
    /// 8VSB
    pub const VSB_8: Modulation = Modulation(7);
    /// 16VSB
    pub const VSB_16: Modulation = Modulation(8);
    /// 8PSK
    pub const PSK_8: Modulation = Modulation(9);
    /// 16APSK
    pub const APSK_16: Modulation = Modulation(10);
    /// 32APSK
    pub const APSK_32: Modulation = Modulation(11);
    /// DQPSK
    pub const DQPSK: Modulation = Modulation(12);
}

/// 符号化率（`fe_code_rate`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeRate(pub u32);

impl CodeRate {
    /// 畳み込み符号なし
    pub const NONE: CodeRate = CodeRate(0);
    /// 1/2
    pub const FEC_1_2: CodeRate = CodeRate(1);
    /// 2/3
    pub const FEC_2_3: CodeRate = CodeRate(2);
    /// 3/4
    pub const FEC_3_4: CodeRate = CodeRate(3);
    /// 4/5
    pub const FEC_4_5: CodeRate = CodeRate(4);
    /// 5/6
    pub const FEC_5_6: CodeRate = CodeRate(5);
    /// 6/7
    pub const FEC_6_7: CodeRate = CodeRate(6);
    /// 7/8
    pub const FEC_7_8: CodeRate = CodeRate(7);
    /// 8/9
    pub const FEC_8_9: CodeRate = CodeRate(8);
    /// 自動判別
    pub const AUTO: CodeRate = CodeRate(9);
    /// 3/5
    pub const FEC_3_5: CodeRate = CodeRate(10);
    /// 9/10
    pub const FEC_9_10: CodeRate = CodeRate(11);
    /// 2/5
    pub const FEC_2_5: CodeRate = CodeRate(12);
}

/// スペクトル反転（`fe_spectral_inversion`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Inversion(pub u32);

impl Inversion {
    /// 反転なし
    pub const OFF: Inversion = Inversion(0);
    /// 反転あり
    pub const ON: Inversion = Inversion(1);
    /// 自動判別
    pub const AUTO: Inversion = Inversion(2);
}

/// 伝送モード（`fe_transmit_mode`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransmissionMode(pub u32);

impl TransmissionMode {
    /// 2k
    pub const MODE_2K: TransmissionMode = TransmissionMode(0);
    /// 8k
    pub const MODE_8K: TransmissionMode = TransmissionMode(1);
    /// 自動判別
    pub const AUTO: TransmissionMode = TransmissionMode(2);
    /// 4k
    pub const MODE_4K: TransmissionMode = TransmissionMode(3);
    /// 1k
    pub const MODE_1K: TransmissionMode = TransmissionMode(4);
    /// 16k
    pub const MODE_16K: TransmissionMode = TransmissionMode(5);
    /// 32k
    pub const MODE_32K: TransmissionMode = TransmissionMode(6);
}

/// ガードインターバル（`fe_guard_interval`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GuardInterval(pub u32);

impl GuardInterval {
    /// 1/32
    pub const GUARD_1_32: GuardInterval = GuardInterval(0);
    /// 1/16
    pub const GUARD_1_16: GuardInterval = GuardInterval(1);
    /// 1/8
    pub const GUARD_1_8: GuardInterval = GuardInterval(2);
    /// 1/4
    pub const GUARD_1_4: GuardInterval = GuardInterval(3);
    /// 自動判別
    pub const AUTO: GuardInterval = GuardInterval(4);
    /// 1/128
    pub const GUARD_1_128: GuardInterval = GuardInterval(5);
    /// 19/128
    pub const GUARD_19_128: GuardInterval = GuardInterval(6);
    /// 19/256
    pub const GUARD_19_256: GuardInterval = GuardInterval(7);
}

/// 階層伝送（`fe_hierarchy`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hierarchy(pub u32);

impl Hierarchy {
    /// 非階層
    pub const NONE: Hierarchy = Hierarchy(0);
    /// α=1
    pub const ALPHA_1: Hierarchy = Hierarchy(1);
    /// α=2
    pub const ALPHA_2: Hierarchy = Hierarchy(2);
    /// α=4
    pub const ALPHA_4: Hierarchy = Hierarchy(3);
    /// 自動判別
    pub const AUTO: Hierarchy = Hierarchy(4);
}

/// パイロット（`fe_pilot`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pilot(pub u32);

impl Pilot {
    /// パイロットあり
    pub const ON: Pilot = Pilot(0);
    /// パイロットなし
    pub const OFF: Pilot = Pilot(1);
    /// 自動判別
    pub const AUTO: Pilot = Pilot(2);
}

/// ロールオフ率（`fe_rolloff`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rolloff(pub u32);

impl Rolloff {
    /// 0.35
    pub const ROLLOFF_35: Rolloff = Rolloff(0);
    /// 0.20
    pub const ROLLOFF_20: Rolloff = Rolloff(1);
    /// 0.25
    pub const ROLLOFF_25: Rolloff = Rolloff(2);
    /// 自動判別
    pub const AUTO: Rolloff = Rolloff(3);
}

/// 偏波。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Polarization {
    /// 水平。
    Horizontal,
    /// 垂直。
    Vertical,
    /// 左旋。
    CircularLeft,
    /// 右旋。
    CircularRight,
}

impl Polarization {
    /// 2ビットの値から`Polarization`を生成する。
    ///
    /// 値の割り当ては衛星分配システム記述子の`polarization`と同じである。
    pub fn from_bits(bits: u8) -> Polarization {
        match bits & 0b11 {
            0b00 => Polarization::Horizontal,
            0b01 => Polarization::Vertical,
            0b10 => Polarization::CircularLeft,
            _ => Polarization::CircularRight,
        }
    }

    /// 数値から`Polarization`を生成する。範囲外の場合は`None`を返す。
    pub fn from_u32(n: u32) -> Option<Polarization> {
        match n {
            0..=3 => Some(Polarization::from_bits(n as u8)),
            _ => None,
        }
    }

    /// 数値として値を返す。
    pub fn to_u32(self) -> u32 {
        match self {
            Polarization::Horizontal => 0,
            Polarization::Vertical => 1,
            Polarization::CircularLeft => 2,
            Polarization::CircularRight => 3,
        }
    }
}
