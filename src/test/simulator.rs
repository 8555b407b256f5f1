use crate::sim::{Event, SimTime, Simulator, World};
use std::any::Any;

#[derive(Default)]
struct LogWorld {
    log: Vec<(u32, SimTime)>,
    after_events: usize,
}

impl World for LogWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn after_event(&mut self, _sim: &mut Simulator) {
        self.after_events += 1;
    }
}

fn log_world(world: &mut dyn World) -> &mut LogWorld {
    world
        .as_any_mut()
        .downcast_mut::<LogWorld>()
        .expect("LogWorld")
}

struct Record {
    id: u32,
}

impl Event for Record {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        log_world(world).log.push((self.id, sim.now()));
    }
}

/// 每隔 `every` 重新调度自身，共执行 `remaining` 次
struct Periodic {
    id: u32,
    every: SimTime,
    remaining: u32,
}

impl Event for Periodic {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        log_world(world).log.push((self.id, sim.now()));
        if self.remaining > 1 {
            let every = self.every;
            sim.schedule_in(
                every,
                Periodic {
                    remaining: self.remaining - 1,
                    ..*self
                },
            );
        }
    }
}

#[test]
fn events_run_in_time_order_then_schedule_order() {
    let mut sim = Simulator::default();
    sim.schedule(SimTime(10), Record { id: 1 });
    sim.schedule(SimTime(5), Record { id: 2 });
    sim.schedule(SimTime(10), Record { id: 3 });

    let mut world = LogWorld::default();
    let executed = sim.run(&mut world);

    let ids: Vec<u32> = world.log.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![2, 1, 3]);
    assert_eq!(executed, 3);
    assert_eq!(world.after_events, 3);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn periodic_event_reschedules_itself_until_run_until_stops() {
    let mut sim = Simulator::default();
    sim.schedule(
        SimTime::ZERO,
        Periodic {
            id: 7,
            every: SimTime::from_secs(5),
            remaining: u32::MAX,
        },
    );

    let mut world = LogWorld::default();
    sim.run_until(SimTime::from_secs(12), &mut world);

    let times: Vec<SimTime> = world.log.iter().map(|(_, t)| *t).collect();
    assert_eq!(
        times,
        vec![SimTime::ZERO, SimTime::from_secs(5), SimTime::from_secs(10)]
    );
    // 下一次 tick（15s）仍在队列中
    assert_eq!(sim.pending(), 1);
    assert_eq!(sim.now(), SimTime::from_secs(12));
}

#[test]
fn periodic_event_stops_when_exhausted() {
    let mut sim = Simulator::default();
    sim.schedule(
        SimTime::ZERO,
        Periodic {
            id: 1,
            every: SimTime(3),
            remaining: 3,
        },
    );
    let mut world = LogWorld::default();
    sim.run(&mut world);
    assert_eq!(world.log.len(), 3);
    assert_eq!(sim.now(), SimTime(6));
    assert_eq!(sim.pending(), 0);
}

#[test]
fn scheduling_in_the_past_runs_at_current_time() {
    let mut sim = Simulator::default();
    let mut world = LogWorld::default();
    sim.run_until(SimTime(100), &mut world);

    sim.schedule(SimTime(40), Record { id: 9 });
    sim.run(&mut world);
    assert_eq!(world.log, vec![(9, SimTime(100))]);
}

#[test]
fn run_until_executes_events_exactly_at_until_and_keeps_later_ones() {
    let mut sim = Simulator::default();
    sim.schedule(SimTime(5), Record { id: 1 });
    sim.schedule(SimTime(6), Record { id: 2 });

    let mut world = LogWorld::default();
    assert_eq!(sim.run_until(SimTime(5), &mut world), 1);
    assert_eq!(world.log, vec![(1, SimTime(5))]);
    assert_eq!(sim.pending(), 1);
}

#[test]
fn sim_time_conversions_saturate() {
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(2), SimTime(2_000_000_000));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime(u64::MAX).after(SimTime(1)), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(1500).to_string(), "1.500s");
}
