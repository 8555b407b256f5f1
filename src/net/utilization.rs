//! 端口利用率
//!
//! 每个 `(node, port)` 保存累计发送字节数，相邻两次采样做差分得到速率。

use std::collections::HashMap;

use super::id::{NodeId, PortNo};
use tracing::trace;

/// 端口利用率跟踪器
#[derive(Debug, Clone)]
pub struct UtilizationTracker {
    interval_secs: f64,
    /// 最近一次采样到的累计 tx 字节数
    counters: HashMap<(NodeId, PortNo), u64>,
    /// 最近一次计算出的速率（bytes/s）
    rates: HashMap<(NodeId, PortNo), f64>,
}

impl UtilizationTracker {
    /// `interval_secs` 为两次采样之间的名义间隔，必须大于 0。
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs: interval_secs.max(1) as f64,
            counters: HashMap::new(),
            rates: HashMap::new(),
        }
    }

    /// 计数器清零（链路发现时调用）。不影响已有速率。
    pub fn reset_counter(&mut self, node: NodeId, port: PortNo) {
        if port.is_local() {
            return;
        }
        self.counters.insert((node, port), 0);
    }

    /// 记录一次采样。
    ///
    /// 已有上一次计数时计算 `(counter - previous) / interval`；
    /// 没有时只保存计数，本轮不产生速率。
    /// 交换机计数器回绕或重置时速率可能为负，按原值保存。
    pub fn sample(&mut self, node: NodeId, port: PortNo, counter: u64) {
        if port.is_local() {
            trace!(node = %node, "忽略本地端口采样");
            return;
        }
        let key = (node, port);
        if let Some(prev) = self.counters.insert(key, counter) {
            let rate = (counter as f64 - prev as f64) / self.interval_secs;
            trace!(node = %node, port = %port, prev, counter, rate, "更新端口速率");
            self.rates.insert(key, rate);
        } else {
            trace!(node = %node, port = %port, counter, "首次采样，仅记录计数");
        }
    }

    /// 最近一次速率；没有记录（或本地端口）时为 0。
    pub fn rate(&self, node: NodeId, port: PortNo) -> f64 {
        if port.is_local() {
            return 0.0;
        }
        self.rates.get(&(node, port)).copied().unwrap_or(0.0)
    }

    pub fn has_rate(&self, node: NodeId, port: PortNo) -> bool {
        self.rates.contains_key(&(node, port))
    }

    pub fn counter(&self, node: NodeId, port: PortNo) -> Option<u64> {
        self.counters.get(&(node, port)).copied()
    }

    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }
}
