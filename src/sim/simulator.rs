//! 仿真器
//!
//! 单线程、协作式的事件驱动执行器：维护当前时间与事件队列，
//! 事件之间没有抢占，同一时刻的事件按调度顺序执行。

use super::event::Event;
use super::time::SimTime;
use super::world::World;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 队列中的事件；按 (时间, 序号) 排序
struct Pending {
    key: (SimTime, u64),
    ev: Box<dyn Event>,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Pending {}

/// 事件驱动仿真器
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<Reverse<Pending>>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 调度事件在指定时间执行（早于当前时间的按当前时间处理）
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = %at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(Reverse(Pending {
            key: (at, seq),
            ev: Box::new(ev),
        }));
        trace!(seq, queue_size = self.q.len(), "事件已加入队列");
    }

    /// 在当前时间之后 `delay` 执行
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) {
        self.schedule(self.now.after(delay), ev);
    }

    fn step(&mut self, world: &mut dyn World) -> bool {
        let Some(Reverse(item)) = self.q.pop() else {
            return false;
        };
        self.now = item.key.0;
        item.ev.execute(self, world);
        world.after_event(self);
        true
    }

    /// 运行直到事件队列为空或到达 `until`，返回执行的事件数。
    ///
    /// 周期性事件（例如统计轮询）会不断重新调度自身，因此通常用这个入口。
    #[tracing::instrument(skip(self, world), fields(until = %until))]
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) -> u64 {
        info!("▶️  开始运行仿真");
        let mut executed = 0u64;
        while let Some(Reverse(top)) = self.q.peek() {
            if top.key.0 > until {
                break;
            }
            self.step(world);
            executed += 1;
        }
        self.now = self.now.max(until);
        info!(
            total_events = executed,
            final_time = %self.now,
            remaining_queue = self.q.len(),
            "✅ 仿真完成"
        );
        executed
    }

    /// 运行所有事件直到队列为空。
    pub fn run(&mut self, world: &mut dyn World) -> u64 {
        let mut executed = 0u64;
        while self.step(world) {
            executed += 1;
        }
        debug!(total_events = executed, final_time = %self.now, "队列已清空");
        executed
    }
}
