//! 预置拓扑

pub mod diamond;
