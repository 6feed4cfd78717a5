//! NITの読み取りや選局の経過を受け取るためのモジュール。

use std::time::Duration;

use crate::psi::desc::AnyDescriptor;
use crate::transponder::{Property, Transponder};

/// NITにおけるループの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// ネットワーク記述子のループ。
    Network,
    /// トランスポートストリームのループ。
    TransportStreams,
    /// 1つのトランスポートストリームにおけるトランスポート記述子のループ。
    Transport {
        /// トランスポートストリーム識別。
        transport_stream_id: u16,
        /// オリジナルネットワーク識別。
        original_network_id: u16,
    },
}

/// NITの読み取りや選局の経過を受け取るトレイト。
///
/// すべてのメソッドは既定で何もしない。`()`は何も受け取らない実装である。
#[allow(unused_variables)]
pub trait Observer {
    /// 記述子を1つ読み取った。`offset`は記述子の先頭位置。
    fn descriptor_decoded(&mut self, offset: usize, desc: &AnyDescriptor) {}

    /// `length`バイトのループに入った。`offset`はループ本体の先頭位置。
    fn loop_entered(&mut self, kind: LoopKind, offset: usize, length: usize) {}

    /// ループを読み終えた。
    fn loop_exited(&mut self, kind: LoopKind) {}

    /// フロントエンドにプロパティ列を送る直前。
    ///
    /// `properties`は周波数の変換などを済ませた、実際に送るプロパティ列である。
    fn tune_attempted(&mut self, transponder: &Transponder, properties: &[Property]) {}

    /// フロントエンドがプロパティ列を受け付けなかった。
    fn tune_rejected(&mut self, transponder: &Transponder, code: i32) {}

    /// ロックした。
    fn lock_acquired(&mut self, transponder: &Transponder, elapsed: Duration) {}

    /// 時間内にロックしなかった。
    fn lock_timed_out(&mut self, transponder: &Transponder, timeout: Duration) {}
}

impl Observer for () {}

impl<O: Observer + ?Sized> Observer for &mut O {
    #[inline]
    fn descriptor_decoded(&mut self, offset: usize, desc: &AnyDescriptor) {
        (**self).descriptor_decoded(offset, desc)
    }

    #[inline]
    fn loop_entered(&mut self, kind: LoopKind, offset: usize, length: usize) {
        (**self).loop_entered(kind, offset, length)
    }

    #[inline]
    fn loop_exited(&mut self, kind: LoopKind) {
        (**self).loop_exited(kind)
    }

    #[inline]
    fn tune_attempted(&mut self, transponder: &Transponder, properties: &[Property]) {
        (**self).tune_attempted(transponder, properties)
    }

    #[inline]
    fn tune_rejected(&mut self, transponder: &Transponder, code: i32) {
        (**self).tune_rejected(transponder, code)
    }

    #[inline]
    fn lock_acquired(&mut self, transponder: &Transponder, elapsed: Duration) {
        (**self).lock_acquired(transponder, elapsed)
    }

    #[inline]
    fn lock_timed_out(&mut self, transponder: &Transponder, timeout: Duration) {
        (**self).lock_timed_out(transponder, timeout)
    }
}

/// 経過を`log`クレートに出力する[`Observer`]。
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn descriptor_decoded(&mut self, offset: usize, desc: &AnyDescriptor) {
        log::trace!("descriptor at {}: {:?}", offset, desc);
    }

    fn loop_entered(&mut self, kind: LoopKind, offset: usize, length: usize) {
        log::trace!("enter {:?} at {} ({} bytes)", kind, offset, length);
    }

    fn loop_exited(&mut self, kind: LoopKind) {
        log::trace!("exit {:?}", kind);
    }

    fn tune_attempted(&mut self, transponder: &Transponder, properties: &[Property]) {
        log::debug!("tune {} ({} properties)", transponder, properties.len());
    }

    fn tune_rejected(&mut self, transponder: &Transponder, code: i32) {
        log::warn!("frontend rejected {}: error {}", transponder, code);
    }

    fn lock_acquired(&mut self, transponder: &Transponder, elapsed: Duration) {
        log::info!("locked {} in {:?}", transponder, elapsed);
    }

    fn lock_timed_out(&mut self, transponder: &Transponder, timeout: Duration) {
        log::warn!("no lock on {} within {:?}", transponder, timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::table::NitSegment;
    use crate::transponder::tests::cable;
    use hex_literal::hex;

    #[test]
    fn test_log_observer() {
        let data = hex!("F0 03 52 01 0A F0 06 00 01 00 02 F0 00");
        let mut observer = LogObserver;
        let nit = NitSegment::read_with(&data, &mut observer).unwrap();
        assert_eq!(nit.transport_streams.len(), 1);

        let t = cable();
        observer.tune_attempted(&t, t.properties());
        observer.lock_timed_out(&t, Duration::from_millis(1));
    }

    #[test]
    fn test_forward() {
        struct Count(usize);

        impl Observer for Count {
            fn loop_exited(&mut self, _: LoopKind) {
                self.0 += 1;
            }
        }

        let mut count = Count(0);
        let mut forward = &mut count;
        Observer::loop_exited(&mut forward, LoopKind::Network);
        ().loop_exited(LoopKind::Network);
        assert_eq!(count.0, 1);
    }
}
