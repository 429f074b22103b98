//! A per-frame task service with an injectable time source.
//!
//! Tasks are callbacks invoked once per frame with the current time; a task
//! stays registered while it returns `true` and is dropped the first time it
//! returns `false`. The service is owned by the host process and runs while
//! any task is pending.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use slotmap::SlotMap;

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant { Instant::now() }
}

/// Manually-advanced clock for deterministic tests and trace replay.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock { now: Cell::new(Instant::now()) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self { Self::new() }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant { self.now.get() }
}

slotmap::new_key_type! {
    pub struct TaskId;
}

type FrameTask = Box<dyn FnMut(Instant) -> bool>;

pub struct FrameScheduler {
    clock: Rc<dyn Clock>,
    tasks: SlotMap<TaskId, FrameTask>,
}

impl FrameScheduler {
    pub fn new(clock: Rc<dyn Clock>) -> FrameScheduler {
        FrameScheduler { clock, tasks: SlotMap::default() }
    }

    pub fn system() -> FrameScheduler { FrameScheduler::new(Rc::new(SystemClock)) }

    pub fn clock(&self) -> Rc<dyn Clock> { self.clock.clone() }

    pub fn add(&mut self, task: impl FnMut(Instant) -> bool + 'static) -> TaskId {
        self.tasks.insert(Box::new(task))
    }

    pub fn cancel(&mut self, id: TaskId) -> bool { self.tasks.remove(id).is_some() }

    pub fn is_idle(&self) -> bool { self.tasks.is_empty() }

    /// Run every pending task once, removing those that report completion.
    pub fn run_frame(&mut self) {
        let now = self.clock.now();
        let finished: Vec<TaskId> = self
            .tasks
            .iter_mut()
            .filter_map(|(id, task)| (!task(now)).then_some(id))
            .collect();
        for id in finished {
            self.tasks.remove(id);
        }
    }

    /// Drive frames at `frame_interval` until no task remains. Only useful
    /// with a real-time clock; a manual clock should step via [`run_frame`].
    ///
    /// [`run_frame`]: FrameScheduler::run_frame
    pub fn run_until_idle(&mut self, frame_interval: Duration) {
        let mut deadline = self.clock.now();
        while !self.is_idle() {
            self.run_frame();
            deadline += frame_interval;
            let now = self.clock.now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }
    }
}

/// Frame interval for a target frame rate.
pub fn frame_interval(fps: f64) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1.0))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn task_runs_until_it_reports_completion() {
        let clock = Rc::new(ManualClock::new());
        let mut sched = FrameScheduler::new(clock.clone());

        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        sched.add(move |_| {
            counter.set(counter.get() + 1);
            counter.get() < 3
        });

        assert!(!sched.is_idle());
        for _ in 0..5 {
            sched.run_frame();
        }
        assert_eq!(runs.get(), 3);
        assert!(sched.is_idle());
    }

    #[test]
    fn cancel_removes_a_pending_task() {
        let mut sched = FrameScheduler::new(Rc::new(ManualClock::new()));
        let id = sched.add(|_| true);
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        assert!(sched.is_idle());
    }

    #[test]
    fn tasks_observe_the_injected_clock() {
        let clock = Rc::new(ManualClock::new());
        let start = clock.now();
        let mut sched = FrameScheduler::new(clock.clone());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        sched.add(move |now| {
            sink.borrow_mut().push(now);
            sink.borrow().len() < 2
        });

        sched.run_frame();
        clock.advance(Duration::from_millis(16));
        sched.run_frame();

        let seen = seen.borrow();
        assert_eq!(seen[0], start);
        assert_eq!(seen[1], start + Duration::from_millis(16));
    }

    #[test]
    fn run_until_idle_terminates_with_system_clock() {
        let mut sched = FrameScheduler::system();
        let mut frames = 0;
        sched.add(move |_| {
            frames += 1;
            frames < 3
        });
        sched.run_until_idle(Duration::from_millis(1));
        assert!(sched.is_idle());
    }

    #[test]
    fn frame_interval_matches_fps() {
        assert_eq!(frame_interval(60.0), Duration::from_secs_f64(1.0 / 60.0));
        // Degenerate rates are clamped rather than dividing by zero.
        assert_eq!(frame_interval(0.0), Duration::from_secs(1));
    }
}
