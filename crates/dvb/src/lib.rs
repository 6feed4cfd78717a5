//! ETSI EN 300 468に基づいたNITを読み込み、DVBのフロントエンドを選局するためのクレート。

#![deny(missing_docs)]

pub mod crc32;
pub mod observe;
pub mod psi;
pub mod transponder;
pub mod tune;
mod utils;

pub use observe::Observer;
pub use transponder::{DeliverySystem, Transponder};
pub use tune::{Frontend, FrontendStatus, Lnb, TuneError, TuneOptions, Tuner};
