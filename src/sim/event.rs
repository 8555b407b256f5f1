//! 事件 trait
//!
//! 控制器的每个入口（定时轮询、统计应答、连接、链路发现、packet-in）
//! 都包装成一个事件，在单一逻辑线程上逐个执行到底。

use super::simulator::Simulator;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
pub trait Event: 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
