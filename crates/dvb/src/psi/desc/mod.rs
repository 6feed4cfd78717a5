//! 記述子の定義。

mod base;
mod dvb;

pub use base::*;
pub use dvb::*;
