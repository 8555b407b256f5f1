//! 选路决策记录（结构化 JSON，供离线分析）

use crate::net::{NodeId, Selection};
use serde::Serialize;

/// 一次选路决策
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub seq: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub path: Vec<NodeId>,
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_rejected: Option<f64>,
    pub candidates: usize,
}

/// 一个简单的决策收集器（存内存，结束时写 JSON 文件）
#[derive(Debug, Default)]
pub struct DecisionLog {
    pub records: Vec<DecisionRecord>,
}

impl DecisionLog {
    pub fn push(&mut self, src: NodeId, dst: NodeId, sel: &Selection) {
        let seq = self.records.len() as u64;
        self.records.push(DecisionRecord {
            seq,
            src,
            dst,
            path: sel.path.clone(),
            cost: sel.cost,
            mean_rejected: sel.mean_rejected,
            candidates: sel.candidates,
        });
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}
