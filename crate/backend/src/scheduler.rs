use crate::exec::step_process_once;
use crate::runtime::Runtime;
use crate::trace::TraceSink;

/// The default ceiling on ticks before a run is aborted as a deadlock
/// (§4.11 step 6).
pub const DEFAULT_MAX_TICKS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Deadlock,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: RunStatus,
    pub reason: String,
}

/// Builds a fresh [`Runtime`] for `group`, ready to be stepped by
/// [`run_group`].
pub fn init_runtime(group: &crate::ir::IRGroup) -> Runtime<'_> {
    Runtime::new(group)
}

/// Runs a group's schedule to completion or deadlock (§4.11).
pub fn run_group(rt: &mut Runtime, trace: &mut dyn TraceSink, max_ticks: u64) -> RunResult {
    loop {
        if rt.all_finished() {
            trace.on_status("Completed", "all_processes_finished", rt);
            return RunResult {
                status: RunStatus::Completed,
                reason: "all_processes_finished".to_string(),
            };
        }

        if rt.tick >= max_ticks {
            trace.on_status("Deadlock", "max_ticks_exceeded", rt);
            return RunResult {
                status: RunStatus::Deadlock,
                reason: "max_ticks_exceeded".to_string(),
            };
        }

        rt.tick += 1;
        trace.on_tick_begin(rt.tick);

        let mut progressed = false;
        let steps: Vec<String> = rt.group.schedule_steps.clone();
        for proc_name in &steps {
            if rt.procs[proc_name.as_str()].status != crate::runtime::ProcStatus::Running {
                continue;
            }
            if step_process_once(rt, proc_name, trace) {
                progressed = true;
            }
        }

        trace.on_tick_end(rt.tick);

        if rt.all_finished() {
            trace.on_status("Completed", "all_processes_finished", rt);
            return RunResult {
                status: RunStatus::Completed,
                reason: "all_processes_finished".to_string(),
            };
        }

        if !progressed && rt.any_blocked() && !rt.any_running() {
            trace.on_status("Deadlock", "all_processes_blocked_no_progress", rt);
            return RunResult {
                status: RunStatus::Deadlock,
                reason: "all_processes_blocked_no_progress".to_string(),
            };
        }
    }
}
