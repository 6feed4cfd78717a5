//! PSIテーブルの定義。

mod nit;

pub use nit::*;
