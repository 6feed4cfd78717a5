//! 選局パラメータ。

mod text;
mod types;

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

pub use types::*;

/// フロントエンドに設定するプロパティ（`struct dtv_property`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    /// プロパティの種類。
    pub cmd: Command,
    /// 値。
    pub value: u32,
}

impl Property {
    /// `Property`を生成する。
    #[inline]
    pub const fn new(cmd: Command, value: u32) -> Property {
        Property { cmd, value }
    }
}

/// プロパティ列。
///
/// どの分配システムでもヒープ確保が発生しない長さを確保している。
pub type Properties = SmallVec<[Property; 12]>;

/// 分配システム。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeliverySystem {
    /// DVB-C（Annex A）。
    Cable,
    /// DVB-T。
    Terrestrial,
    /// DVB-T2。
    Terrestrial2,
    /// DVB-S。
    Satellite,
    /// DVB-S2。
    Satellite2,
}

impl DeliverySystem {
    /// `DTV_DELIVERY_SYSTEM`に設定する値（`fe_delivery_system`）を返す。
    pub fn selector(self) -> u32 {
        match self {
            DeliverySystem::Cable => 1,
            DeliverySystem::Terrestrial => 3,
            DeliverySystem::Satellite => 5,
            DeliverySystem::Satellite2 => 6,
            DeliverySystem::Terrestrial2 => 16,
        }
    }

    /// `DTV_DELIVERY_SYSTEM`の値から`DeliverySystem`を生成する。
    pub fn from_selector(selector: u32) -> Option<DeliverySystem> {
        match selector {
            1 => Some(DeliverySystem::Cable),
            3 => Some(DeliverySystem::Terrestrial),
            5 => Some(DeliverySystem::Satellite),
            6 => Some(DeliverySystem::Satellite2),
            16 => Some(DeliverySystem::Terrestrial2),
            _ => None,
        }
    }

    /// テキスト形式の先頭に置く識別子を返す。
    pub fn tag(self) -> &'static str {
        match self {
            DeliverySystem::Cable => "C",
            DeliverySystem::Terrestrial => "T",
            DeliverySystem::Terrestrial2 => "T2",
            DeliverySystem::Satellite => "S",
            DeliverySystem::Satellite2 => "S2",
        }
    }

    /// テキスト形式の識別子から`DeliverySystem`を生成する。
    pub fn from_tag(tag: &str) -> Option<DeliverySystem> {
        match tag {
            "C" => Some(DeliverySystem::Cable),
            "T" => Some(DeliverySystem::Terrestrial),
            "T2" => Some(DeliverySystem::Terrestrial2),
            "S" => Some(DeliverySystem::Satellite),
            "S2" => Some(DeliverySystem::Satellite2),
            _ => None,
        }
    }

    /// 衛星の分配システムかどうかを返す。
    #[inline]
    pub fn is_satellite(self) -> bool {
        matches!(self, DeliverySystem::Satellite | DeliverySystem::Satellite2)
    }
}

/// DVB-Cのパラメータ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CableParams {
    /// 周波数（Hz）。
    pub frequency: u32,
    /// シンボルレート（シンボル毎秒）。
    pub symbol_rate: u32,
    /// 変調方式。
    pub modulation: Modulation,
    /// 内符号の符号化率。
    pub fec: CodeRate,
    /// スペクトル反転。
    pub inversion: Inversion,
}

/// DVB-TおよびDVB-T2のパラメータ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrestrialParams {
    /// 中心周波数（Hz）。
    pub frequency: u32,
    /// 帯域幅（Hz）。
    pub bandwidth: u32,
    /// 高優先階層の符号化率。
    pub code_rate_hp: CodeRate,
    /// 低優先階層の符号化率。
    pub code_rate_lp: CodeRate,
    /// 伝送モード。
    pub transmission_mode: TransmissionMode,
    /// ガードインターバル。
    pub guard_interval: GuardInterval,
    /// 階層伝送。
    pub hierarchy: Hierarchy,
    /// 変調方式。
    pub modulation: Modulation,
    /// スペクトル反転。
    pub inversion: Inversion,
}

/// DVB-T2のパラメータ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terrestrial2Params {
    /// DVB-Tと共通のパラメータ。
    pub base: TerrestrialParams,
    /// PLP識別。
    pub stream_id: u32,
}

/// DVB-Sのパラメータ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatelliteParams {
    /// 周波数（kHz）。
    pub frequency: u32,
    /// シンボルレート（シンボル毎秒）。
    pub symbol_rate: u32,
    /// 偏波。
    pub polarization: Polarization,
    /// 内符号の符号化率。
    pub fec: CodeRate,
    /// スペクトル反転。
    pub inversion: Inversion,
}

/// DVB-S2のパラメータ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Satellite2Params {
    /// DVB-Sと共通のパラメータ。
    pub base: SatelliteParams,
    /// 変調方式。
    pub modulation: Modulation,
    /// パイロット。
    pub pilot: Pilot,
    /// ロールオフ率。
    pub rolloff: Rolloff,
    /// ストリーム識別（ISI）。
    pub stream_id: u32,
}

/// 分配システムごとのパラメータ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Params {
    /// DVB-C。
    Cable(CableParams),
    /// DVB-T。
    Terrestrial(TerrestrialParams),
    /// DVB-T2。
    Terrestrial2(Terrestrial2Params),
    /// DVB-S。
    Satellite(SatelliteParams),
    /// DVB-S2。
    Satellite2(Satellite2Params),
}

/// 1つのトランスポートストリームを選局するためのパラメータ。
///
/// 分配システムと、フロントエンドに設定する順に並べたプロパティ列からなる。
/// プロパティ列の最後は常に`DTV_TUNE`である。
///
/// 比較とハッシュは分配システムと周波数のみで行い、それ以外のパラメータは考慮しない。
#[derive(Debug, Clone)]
pub struct Transponder {
    system: DeliverySystem,
    properties: Properties,
    polarization: Option<Polarization>,
}

impl Transponder {
    fn with_properties(
        system: DeliverySystem,
        polarization: Option<Polarization>,
        properties: &[(Command, u32)],
    ) -> Transponder {
        Transponder {
            system,
            properties: properties
                .iter()
                .map(|&(cmd, value)| Property::new(cmd, value))
                .collect(),
            polarization,
        }
    }

    /// パラメータから`Transponder`を生成する。
    pub fn new(params: Params) -> Transponder {
        match params {
            Params::Cable(p) => Transponder::cable(p),
            Params::Terrestrial(p) => Transponder::terrestrial(p),
            Params::Terrestrial2(p) => Transponder::terrestrial2(p),
            Params::Satellite(p) => Transponder::satellite(p),
            Params::Satellite2(p) => Transponder::satellite2(p),
        }
    }

    /// DVB-Cの`Transponder`を生成する。
    pub fn cable(p: CableParams) -> Transponder {
        Transponder::with_properties(
            DeliverySystem::Cable,
            None,
            &[
                (Command::FREQUENCY, p.frequency),
                (Command::MODULATION, p.modulation.0),
                (Command::INVERSION, p.inversion.0),
                (Command::SYMBOL_RATE, p.symbol_rate),
                (Command::INNER_FEC, p.fec.0),
                (Command::DELIVERY_SYSTEM, DeliverySystem::Cable.selector()),
                (Command::TUNE, 0),
            ],
        )
    }

    fn terrestrial_with(
        system: DeliverySystem,
        p: &TerrestrialParams,
        tail: &[(Command, u32)],
    ) -> Transponder {
        let mut t = Transponder::with_properties(
            system,
            None,
            &[
                (Command::FREQUENCY, p.frequency),
                (Command::MODULATION, p.modulation.0),
                (Command::INVERSION, p.inversion.0),
                (Command::BANDWIDTH_HZ, p.bandwidth),
                (Command::CODE_RATE_HP, p.code_rate_hp.0),
                (Command::CODE_RATE_LP, p.code_rate_lp.0),
                (Command::TRANSMISSION_MODE, p.transmission_mode.0),
                (Command::GUARD_INTERVAL, p.guard_interval.0),
                (Command::HIERARCHY, p.hierarchy.0),
                (Command::DELIVERY_SYSTEM, system.selector()),
            ],
        );
        t.properties
            .extend(tail.iter().map(|&(cmd, value)| Property::new(cmd, value)));
        t.properties.push(Property::new(Command::TUNE, 0));
        t
    }

    /// DVB-Tの`Transponder`を生成する。
    pub fn terrestrial(p: TerrestrialParams) -> Transponder {
        Transponder::terrestrial_with(DeliverySystem::Terrestrial, &p, &[])
    }

    /// DVB-T2の`Transponder`を生成する。
    pub fn terrestrial2(p: Terrestrial2Params) -> Transponder {
        Transponder::terrestrial_with(
            DeliverySystem::Terrestrial2,
            &p.base,
            &[(Command::STREAM_ID, p.stream_id)],
        )
    }

    /// DVB-Sの`Transponder`を生成する。
    pub fn satellite(p: SatelliteParams) -> Transponder {
        Transponder::with_properties(
            DeliverySystem::Satellite,
            Some(p.polarization),
            &[
                (Command::FREQUENCY, p.frequency),
                (Command::SYMBOL_RATE, p.symbol_rate),
                (Command::INVERSION, p.inversion.0),
                (Command::INNER_FEC, p.fec.0),
                (Command::DELIVERY_SYSTEM, DeliverySystem::Satellite.selector()),
                (Command::TUNE, 0),
            ],
        )
    }

    /// DVB-S2の`Transponder`を生成する。
    ///
    /// DVB-Sのプロパティ列の分配システムを書き換え、
    /// `DTV_TUNE`の直前にDVB-S2固有のプロパティを追加したものとなる。
    pub fn satellite2(p: Satellite2Params) -> Transponder {
        let mut t = Transponder::satellite(p.base);
        t.system = DeliverySystem::Satellite2;

        let tune = t.properties.pop();
        debug_assert_eq!(tune.map(|p| p.cmd), Some(Command::TUNE));
        for prop in &mut t.properties {
            if prop.cmd == Command::DELIVERY_SYSTEM {
                prop.value = DeliverySystem::Satellite2.selector();
            }
        }
        t.properties.extend([
            Property::new(Command::MODULATION, p.modulation.0),
            Property::new(Command::PILOT, p.pilot.0),
            Property::new(Command::ROLLOFF, p.rolloff.0),
            Property::new(Command::STREAM_ID, p.stream_id),
            Property::new(Command::TUNE, 0),
        ]);
        t
    }

    /// 分配システムを返す。
    #[inline]
    pub fn system(&self) -> DeliverySystem {
        self.system
    }

    /// フロントエンドに設定する順に並んだプロパティ列を返す。
    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// 偏波を返す。衛星以外では`None`となる。
    #[inline]
    pub fn polarization(&self) -> Option<Polarization> {
        self.polarization
    }

    /// `cmd`の値を返す。プロパティ列に`cmd`がない場合は`None`を返す。
    pub fn get(&self, cmd: Command) -> Option<u32> {
        self.properties
            .iter()
            .find(|p| p.cmd == cmd)
            .map(|p| p.value)
    }

    /// 周波数を返す。
    ///
    /// 単位は衛星ではkHz、それ以外ではHzである。
    #[inline]
    pub fn frequency(&self) -> u32 {
        // どのコンストラクタも周波数を設定する
        self.get(Command::FREQUENCY).unwrap_or_default()
    }

    /// シンボルレートを返す。
    #[inline]
    pub fn symbol_rate(&self) -> Option<u32> {
        self.get(Command::SYMBOL_RATE)
    }

    /// 変調方式を返す。
    #[inline]
    pub fn modulation(&self) -> Option<Modulation> {
        self.get(Command::MODULATION).map(Modulation)
    }

    /// 内符号の符号化率を返す。
    #[inline]
    pub fn fec(&self) -> Option<CodeRate> {
        self.get(Command::INNER_FEC).map(CodeRate)
    }

    /// スペクトル反転を返す。
    #[inline]
    pub fn inversion(&self) -> Option<Inversion> {
        self.get(Command::INVERSION).map(Inversion)
    }

    /// 帯域幅を返す。
    #[inline]
    pub fn bandwidth(&self) -> Option<u32> {
        self.get(Command::BANDWIDTH_HZ)
    }

    /// ストリーム識別を返す。
    #[inline]
    pub fn stream_id(&self) -> Option<u32> {
        self.get(Command::STREAM_ID)
    }

    /// プロパティ列から分配システムごとのパラメータを復元する。
    pub fn params(&self) -> Params {
        let get = |cmd| self.get(cmd).unwrap_or_default();
        let terrestrial = || TerrestrialParams {
            frequency: get(Command::FREQUENCY),
            bandwidth: get(Command::BANDWIDTH_HZ),
            code_rate_hp: CodeRate(get(Command::CODE_RATE_HP)),
            code_rate_lp: CodeRate(get(Command::CODE_RATE_LP)),
            transmission_mode: TransmissionMode(get(Command::TRANSMISSION_MODE)),
            guard_interval: GuardInterval(get(Command::GUARD_INTERVAL)),
            hierarchy: Hierarchy(get(Command::HIERARCHY)),
            modulation: Modulation(get(Command::MODULATION)),
            inversion: Inversion(get(Command::INVERSION)),
        };
        let satellite = || SatelliteParams {
            frequency: get(Command::FREQUENCY),
            symbol_rate: get(Command::SYMBOL_RATE),
            polarization: self.polarization.unwrap_or(Polarization::Horizontal),
            fec: CodeRate(get(Command::INNER_FEC)),
            inversion: Inversion(get(Command::INVERSION)),
        };

        match self.system {
            DeliverySystem::Cable => Params::Cable(CableParams {
                frequency: get(Command::FREQUENCY),
                symbol_rate: get(Command::SYMBOL_RATE),
                modulation: Modulation(get(Command::MODULATION)),
                fec: CodeRate(get(Command::INNER_FEC)),
                inversion: Inversion(get(Command::INVERSION)),
            }),
            DeliverySystem::Terrestrial => Params::Terrestrial(terrestrial()),
            DeliverySystem::Terrestrial2 => Params::Terrestrial2(Terrestrial2Params {
                base: terrestrial(),
                stream_id: get(Command::STREAM_ID),
            }),
            DeliverySystem::Satellite => Params::Satellite(satellite()),
            DeliverySystem::Satellite2 => Params::Satellite2(Satellite2Params {
                base: satellite(),
                modulation: Modulation(get(Command::MODULATION)),
                pilot: Pilot(get(Command::PILOT)),
                rolloff: Rolloff(get(Command::ROLLOFF)),
                stream_id: get(Command::STREAM_ID),
            }),
        }
    }
}

impl From<Params> for Transponder {
    #[inline]
    fn from(params: Params) -> Transponder {
        Transponder::new(params)
    }
}

impl PartialEq for Transponder {
    fn eq(&self, other: &Transponder) -> bool {
        self.get(Command::DELIVERY_SYSTEM) == other.get(Command::DELIVERY_SYSTEM)
            && self.frequency() == other.frequency()
    }
}

impl Eq for Transponder {}

impl Hash for Transponder {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get(Command::DELIVERY_SYSTEM).hash(state);
        self.frequency().hash(state);
    }
}
