//! 世界 trait
//!
//! 定义仿真世界接口。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现（例如控制器 + 仿真交换机）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每个事件执行完之后调用，用于把事件产生的副作用（下行命令等）转换为新事件。
    fn after_event(&mut self, _sim: &mut Simulator) {}
}
