//! フロントエンドの選局。
//!
//! [`Tuner`]は[`Transponder`]のプロパティ列を複製し、衛星であれば周波数を中間周波数に置き換えてから
//! [`Frontend`]に送る。その後、信号とロックが揃うまでフロントエンドの状態を問い合わせる。

use std::fmt;
use std::ops;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::observe::Observer;
use crate::transponder::{Command, Properties, Property, Transponder};

/// フロントエンドの状態（`fe_status`）。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrontendStatus(pub u32);

impl FrontendStatus {
    /// 何らかの信号がある。
    pub const SIGNAL: FrontendStatus = FrontendStatus(0x01);
    /// 搬送波を検出した。
    pub const CARRIER: FrontendStatus = FrontendStatus(0x02);
    /// 内符号が安定した。
    pub const VITERBI: FrontendStatus = FrontendStatus(0x04);
    /// 同期バイトを検出した。
    pub const SYNC: FrontendStatus = FrontendStatus(0x08);
    /// ロックした。
    pub const LOCK: FrontendStatus = FrontendStatus(0x10);
    /// ロックしないまま時間切れとなった。
    pub const TIMEDOUT: FrontendStatus = FrontendStatus(0x20);
    /// フロントエンドが再初期化された。
    pub const REINIT: FrontendStatus = FrontendStatus(0x40);

    /// `other`のビットをすべて含む場合は`true`を返す。
    #[inline]
    pub fn contains(self, other: FrontendStatus) -> bool {
        self.0 & other.0 == other.0
    }
}

impl ops::BitOr for FrontendStatus {
    type Output = FrontendStatus;

    #[inline]
    fn bitor(self, rhs: FrontendStatus) -> FrontendStatus {
        FrontendStatus(self.0 | rhs.0)
    }
}

impl fmt::Debug for FrontendStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const NAMES: [(FrontendStatus, &str); 7] = [
            (FrontendStatus::SIGNAL, "SIGNAL"),
            (FrontendStatus::CARRIER, "CARRIER"),
            (FrontendStatus::VITERBI, "VITERBI"),
            (FrontendStatus::SYNC, "SYNC"),
            (FrontendStatus::LOCK, "LOCK"),
            (FrontendStatus::TIMEDOUT, "TIMEDOUT"),
            (FrontendStatus::REINIT, "REINIT"),
        ];

        let mut set = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{}", name));
            }
        }
        set.finish()
    }
}

/// DVBのフロントエンド。
pub trait Frontend {
    /// プロパティ列をまとめて設定する（`FE_SET_PROPERTY`）。
    ///
    /// 受け付けられなかった場合はエラー番号を返す。
    fn set_properties(&mut self, properties: &[Property]) -> Result<(), i32>;

    /// 現在の状態を返す（`FE_READ_STATUS`）。
    fn status(&mut self) -> FrontendStatus;
}

impl<F: Frontend + ?Sized> Frontend for &mut F {
    #[inline]
    fn set_properties(&mut self, properties: &[Property]) -> Result<(), i32> {
        (**self).set_properties(properties)
    }

    #[inline]
    fn status(&mut self) -> FrontendStatus {
        (**self).status()
    }
}

/// 衛星の受信に使うLNB。
pub trait Lnb {
    /// `transponder`を受信する際の局部発振周波数（kHz）を返す。
    fn frequency_offset(&self, transponder: &Transponder) -> u32;
}

impl<F: Fn(&Transponder) -> u32> Lnb for F {
    #[inline]
    fn frequency_offset(&self, transponder: &Transponder) -> u32 {
        self(transponder)
    }
}

/// 選局の設定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuneOptions {
    /// ロックを待つ間にフロントエンドの状態を問い合わせる間隔。
    pub poll_interval: Duration,
}

impl Default for TuneOptions {
    fn default() -> TuneOptions {
        TuneOptions {
            poll_interval: Duration::from_millis(20),
        }
    }
}

/// [`Tuner::tune`]で発生するエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TuneError {
    /// フロントエンドがプロパティ列を受け付けなかった。
    #[error("frontend rejected properties (errno {0})")]
    Rejected(i32),

    /// 時間内にロックしなかった。
    #[error("no lock within {0:?}")]
    LockTimeout(Duration),
}

/// フロントエンドを選局する。
pub struct Tuner<F, O = ()> {
    frontend: F,
    lnb: Option<Box<dyn Lnb>>,
    options: TuneOptions,
    observer: O,
}

impl<F: Frontend> Tuner<F> {
    /// `frontend`を選局する`Tuner`を生成する。
    pub fn new(frontend: F) -> Tuner<F> {
        Tuner {
            frontend,
            lnb: None,
            options: TuneOptions::default(),
            observer: (),
        }
    }
}

impl<F: Frontend, O: Observer> Tuner<F, O> {
    /// 衛星の選局に使うLNBを設定する。
    pub fn with_lnb<L: Lnb + 'static>(mut self, lnb: L) -> Tuner<F, O> {
        self.lnb = Some(Box::new(lnb));
        self
    }

    /// 選局の設定を変更する。
    pub fn with_options(mut self, options: TuneOptions) -> Tuner<F, O> {
        self.options = options;
        self
    }

    /// 選局の経過を`observer`に通知するようにする。
    pub fn with_observer<P: Observer>(self, observer: P) -> Tuner<F, P> {
        Tuner {
            frontend: self.frontend,
            lnb: self.lnb,
            options: self.options,
            observer,
        }
    }

    /// フロントエンドを返す。
    #[inline]
    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// フロントエンドを返す。
    #[inline]
    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    /// オブザーバーを返す。
    #[inline]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// フロントエンドを取り出す。
    #[inline]
    pub fn into_frontend(self) -> F {
        self.frontend
    }

    /// フロントエンドに送るプロパティ列を生成する。
    ///
    /// 衛星では周波数を中間周波数に置き換える。中間周波数は周波数と
    /// LNBの局部発振周波数の差の絶対値で、局部発振周波数の方が高い場合（Cバンド）は
    /// `局部発振周波数 - 周波数`となる。LNBがなければ周波数はそのままとする。
    pub fn prepare(&self, transponder: &Transponder) -> Properties {
        let mut properties = Properties::from_slice(transponder.properties());
        if !transponder.system().is_satellite() {
            return properties;
        }

        let offset = self
            .lnb
            .as_ref()
            .map_or(0, |lnb| lnb.frequency_offset(transponder));
        for prop in &mut properties {
            if prop.cmd == Command::FREQUENCY {
                prop.value = prop.value.abs_diff(offset);
            }
        }
        properties
    }

    /// `transponder`を選局する。
    ///
    /// `timeout`が0の場合はプロパティ列を送るだけで、状態は問い合わせない。
    /// それ以外では信号とロックが揃うまで状態を問い合わせ、`timeout`を過ぎても揃わなければ
    /// [`TuneError::LockTimeout`]を返す。状態は少なくとも1回は問い合わせる。
    ///
    /// `transponder`は変更しない。
    pub fn tune(&mut self, transponder: &Transponder, timeout: Duration) -> Result<(), TuneError> {
        let properties = self.prepare(transponder);
        self.observer.tune_attempted(transponder, &properties);

        if let Err(code) = self.frontend.set_properties(&properties) {
            self.observer.tune_rejected(transponder, code);
            return Err(TuneError::Rejected(code));
        }

        if timeout.is_zero() {
            return Ok(());
        }

        let start = Instant::now();
        loop {
            let status = self.frontend.status();
            if status.contains(FrontendStatus::SIGNAL | FrontendStatus::LOCK) {
                self.observer.lock_acquired(transponder, start.elapsed());
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                self.observer.lock_timed_out(transponder, timeout);
                return Err(TuneError::LockTimeout(timeout));
            }
            std::thread::sleep(self.options.poll_interval.min(timeout - elapsed));
        }
    }
}

impl<F: fmt::Debug, O: fmt::Debug> fmt::Debug for Tuner<F, O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Tuner")
            .field("frontend", &self.frontend)
            .field("lnb", &self.lnb.is_some())
            .field("options", &self.options)
            .field("observer", &self.observer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transponder::tests::{cable, satellite, satellite2};
    use crate::transponder::{Polarization, SatelliteParams};
    use assert_matches::assert_matches;

    /// 指定回数の問い合わせの後にロックするフロントエンド。
    #[derive(Debug, Default)]
    struct MockFrontend {
        submitted: Vec<Vec<Property>>,
        reject: Option<i32>,
        lock_after: Option<usize>,
        queries: usize,
    }

    impl Frontend for MockFrontend {
        fn set_properties(&mut self, properties: &[Property]) -> Result<(), i32> {
            self.submitted.push(properties.to_vec());
            match self.reject {
                Some(code) => Err(code),
                None => Ok(()),
            }
        }

        fn status(&mut self) -> FrontendStatus {
            self.queries += 1;
            match self.lock_after {
                Some(n) if self.queries > n => {
                    FrontendStatus::SIGNAL
                        | FrontendStatus::CARRIER
                        | FrontendStatus::SYNC
                        | FrontendStatus::LOCK
                }
                _ => FrontendStatus::SIGNAL,
            }
        }
    }

    fn fast() -> TuneOptions {
        TuneOptions {
            poll_interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_zero_timeout() {
        let mut tuner = Tuner::new(MockFrontend::default());
        let t = cable();
        assert_eq!(tuner.tune(&t, Duration::ZERO), Ok(()));
        assert_eq!(tuner.frontend().queries, 0);
        assert_eq!(tuner.frontend().submitted, [t.properties().to_vec()]);
    }

    #[test]
    fn test_rejected() {
        let mut tuner = Tuner::new(MockFrontend {
            reject: Some(22),
            lock_after: Some(0),
            ..Default::default()
        });
        assert_matches!(
            tuner.tune(&cable(), Duration::from_secs(1)),
            Err(TuneError::Rejected(22))
        );
        assert_eq!(tuner.frontend().queries, 0);
    }

    #[test]
    fn test_lock() {
        let mut tuner = Tuner::new(MockFrontend {
            lock_after: Some(3),
            ..Default::default()
        })
        .with_options(fast());
        assert_eq!(tuner.tune(&cable(), Duration::from_secs(5)), Ok(()));
        assert_eq!(tuner.frontend().queries, 4);

        // 既にロックしていても1回は問い合わせる
        let mut tuner = Tuner::new(MockFrontend {
            lock_after: Some(0),
            ..Default::default()
        });
        assert_eq!(tuner.tune(&cable(), Duration::from_secs(5)), Ok(()));
        assert_eq!(tuner.frontend().queries, 1);
    }

    #[test]
    fn test_lock_timeout() {
        let timeout = Duration::from_millis(10);
        let mut tuner = Tuner::new(MockFrontend::default()).with_options(fast());
        let start = Instant::now();
        assert_matches!(
            tuner.tune(&cable(), timeout),
            Err(TuneError::LockTimeout(d)) if d == timeout
        );
        assert!(start.elapsed() >= timeout);
        assert!(tuner.frontend().queries >= 2);
    }

    #[test]
    fn test_satellite_offset() {
        let mut tuner = Tuner::new(MockFrontend::default()).with_lnb(|t: &Transponder| {
            match t.polarization() {
                Some(Polarization::Horizontal) => 10_600_000,
                _ => 9_750_000,
            }
        });

        let t = Transponder::satellite(satellite());
        let before = t.properties().to_vec();
        assert_eq!(tuner.tune(&t, Duration::ZERO), Ok(()));

        let sent = &tuner.frontend().submitted[0];
        assert_eq!(sent[0], Property::new(Command::FREQUENCY, 1_236_500));
        assert_eq!(&sent[1..], &before[1..]);
        // 元の選局パラメータは変わらない
        assert_eq!(t.properties(), before);
        assert_eq!(t.frequency(), 11_836_500);

        let t = Transponder::satellite2(satellite2());
        assert_eq!(tuner.tune(&t, Duration::ZERO), Ok(()));
        let sent = &tuner.frontend().submitted[1];
        assert_eq!(sent[0], Property::new(Command::FREQUENCY, 893_750));
        assert_eq!(sent.last().map(|p| p.cmd), Some(Command::TUNE));
    }

    #[test]
    fn test_offset_above_carrier() {
        let tuner = Tuner::new(MockFrontend::default()).with_lnb(|_: &Transponder| 5_150_000);
        let t = Transponder::satellite(SatelliteParams {
            frequency: 3_900_000,
            polarization: Polarization::CircularRight,
            ..satellite()
        });
        assert_eq!(tuner.prepare(&t)[0].value, 1_250_000);
    }

    #[test]
    fn test_no_offset_for_terrestrial() {
        let tuner = Tuner::new(MockFrontend::default()).with_lnb(|_: &Transponder| 10_600_000);
        let t = cable();
        assert_eq!(&tuner.prepare(&t)[..], t.properties());

        // LNBがなければ衛星でもそのまま
        let tuner = Tuner::new(MockFrontend::default());
        let t = Transponder::satellite(satellite());
        assert_eq!(&tuner.prepare(&t)[..], t.properties());
    }

    #[derive(Debug, Default)]
    struct Events(Vec<&'static str>);

    impl Observer for Events {
        fn tune_attempted(&mut self, _: &Transponder, _: &[Property]) {
            self.0.push("attempted");
        }

        fn tune_rejected(&mut self, _: &Transponder, _: i32) {
            self.0.push("rejected");
        }

        fn lock_acquired(&mut self, _: &Transponder, _: Duration) {
            self.0.push("locked");
        }

        fn lock_timed_out(&mut self, _: &Transponder, _: Duration) {
            self.0.push("timed out");
        }
    }

    #[test]
    fn test_observer() {
        let mut tuner = Tuner::new(MockFrontend {
            lock_after: Some(1),
            ..Default::default()
        })
        .with_options(fast())
        .with_observer(Events::default());
        assert_eq!(tuner.tune(&cable(), Duration::from_secs(1)), Ok(()));
        tuner.frontend_mut().lock_after = None;
        assert!(tuner.tune(&cable(), Duration::from_millis(5)).is_err());
        tuner.frontend_mut().reject = Some(1);
        assert!(tuner.tune(&cable(), Duration::from_millis(5)).is_err());

        assert_eq!(
            tuner.observer().0,
            ["attempted", "locked", "attempted", "timed out", "attempted", "rejected"]
        );
    }

    #[test]
    fn test_status_debug() {
        let status = FrontendStatus::SIGNAL | FrontendStatus::LOCK;
        assert_eq!(format!("{:?}", status), "{SIGNAL, LOCK}");
        assert!(status.contains(FrontendStatus::LOCK));
        assert!(!status.contains(FrontendStatus::SIGNAL | FrontendStatus::SYNC));
    }
}
