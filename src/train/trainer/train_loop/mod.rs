//! Multi-epoch run driver
//!
//! - `basic`: `Loop::run` and `Loop::resume`

mod basic;
