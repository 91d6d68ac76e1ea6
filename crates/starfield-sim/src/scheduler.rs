//! Timed and repeating callbacks driven by simulation time.
//!
//! Countdowns are decremented by the tick delta, never by wall-clock time.
//! A repeating task cancels itself by returning `false`.

/// Callback receiving the owning context, the tick timestamp and the delta.
pub type TaskFn<C> = Box<dyn FnMut(&mut C, f64, f64) -> bool + Send>;

struct Task<C> {
    callback: TaskFn<C>,
    remaining_ms: f64,
    /// Interval to restart from, for repeating tasks.
    repeat: Option<f64>,
}

/// Queue of pending tasks for one context (normally one `Game`).
pub struct Scheduler<C> {
    tasks: Vec<Task<C>>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `callback` once `ms` of simulation time has elapsed, and every
    /// `ms` after that while `repeat` is set and the callback returns true.
    pub fn schedule<F>(&mut self, callback: F, ms: f64, repeat: bool)
    where
        F: FnMut(&mut C, f64, f64) -> bool + Send + 'static,
    {
        self.tasks.push(Task {
            callback: Box::new(callback),
            remaining_ms: ms,
            repeat: repeat.then_some(ms),
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Run one pass over every task.
    ///
    /// The scheduler lives inside `ctx`, so it is reached through `select`.
    /// Tasks scheduled by a callback during the pass are kept but first
    /// counted down on the next pass. Panics in callbacks propagate.
    pub fn run_pass(
        ctx: &mut C,
        select: fn(&mut C) -> &mut Scheduler<C>,
        time_stamp: f64,
        delta_ms: f64,
    ) {
        let pending = std::mem::take(&mut select(ctx).tasks);
        let mut survivors = Vec::with_capacity(pending.len());

        for mut task in pending {
            task.remaining_ms -= delta_ms;
            if task.remaining_ms > 0.0 {
                survivors.push(task);
                continue;
            }
            let keep = (task.callback)(ctx, time_stamp, delta_ms);
            if let (true, Some(interval)) = (keep, task.repeat) {
                task.remaining_ms = interval;
                survivors.push(task);
            }
        }

        let scheduler = select(ctx);
        let added = std::mem::replace(&mut scheduler.tasks, survivors);
        scheduler.tasks.extend(added);
    }
}
