use std::collections::VecDeque;

use colored::Colorize;

use crate::runtime::{ProcStatus, Runtime};
use crate::value::Value;

/// The event interface the scheduler invokes at tick, step, action, block,
/// and status transitions (§4.12, §6). Any conforming implementation must
/// yield the same event sequence for the same program.
pub trait TraceSink {
    fn on_tick_begin(&mut self, _tick: u64) {}
    fn on_tick_end(&mut self, _tick: u64) {}

    fn on_process_step_begin(&mut self, _tick: u64, _proc: &str, _state_before: &str) {}
    fn on_process_step_end(&mut self, _tick: u64, _proc: &str, _state_after: &str, _status: ProcStatus) {}

    fn on_assign(&mut self, _proc: &str, _var: &str, _before: &Value, _after: &Value) {}

    fn on_send_begin(&mut self, _proc: &str, _chan: &str, _value: &Value, _buffer_before: &VecDeque<Value>) {}
    fn on_send_end(&mut self, _proc: &str, _chan: &str, _buffer_after: &VecDeque<Value>) {}

    fn on_receive_begin(&mut self, _proc: &str, _chan: &str, _buffer_before: &VecDeque<Value>) {}
    fn on_receive_end(&mut self, _proc: &str, _chan: &str, _value: &Value, _buffer_after: &VecDeque<Value>) {}

    fn on_try_send(&mut self, _proc: &str, _chan: &str, _value: &Value, _success: bool, _buffer_after: &VecDeque<Value>) {}
    fn on_try_receive(&mut self, _proc: &str, _chan: &str, _ok: bool, _value: &Value, _buffer_after: &VecDeque<Value>) {}

    fn on_block(&mut self, _proc: &str, _direction: &str, _chan: &str, _reason: &str) {}
    fn on_transition_skipped(&mut self, _tick: u64, _proc: &str, _reason: &str) {}

    fn on_status(&mut self, _status: &str, _reason: &str, _runtime: &Runtime) {}
}

/// A no-op sink, for runs that don't care about tracing.
#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {}

/// Renders each event as a colored line of text, matching the style of the
/// diagnostic rendering in `caps_error`/`caps_shared`.
#[derive(Debug, Default)]
pub struct TextTraceSink;

impl TraceSink for TextTraceSink {
    fn on_tick_begin(&mut self, tick: u64) {
        println!("{} {}", "tick".bold(), tick.to_string().cyan());
    }

    fn on_process_step_begin(&mut self, _tick: u64, proc: &str, state_before: &str) {
        println!("  {} {} @ {}", "step".dimmed(), proc, state_before);
    }

    fn on_process_step_end(&mut self, _tick: u64, proc: &str, state_after: &str, status: ProcStatus) {
        println!("    {} -> {} [{:?}]", proc, state_after, status);
    }

    fn on_assign(&mut self, proc: &str, var: &str, before: &Value, after: &Value) {
        println!("    {} {}.{} = {} (was {})", "assign".yellow(), proc, var, after, before);
    }

    fn on_send_begin(&mut self, proc: &str, chan: &str, value: &Value, _buffer_before: &VecDeque<Value>) {
        println!("    {} {} -> {} : {}", "send".green(), proc, chan, value);
    }

    fn on_send_end(&mut self, _proc: &str, _chan: &str, _buffer_after: &VecDeque<Value>) {}

    fn on_receive_begin(&mut self, proc: &str, chan: &str, _buffer_before: &VecDeque<Value>) {
        println!("    {} {} <- {}", "receive".green(), proc, chan);
    }

    fn on_receive_end(&mut self, _proc: &str, _chan: &str, value: &Value, _buffer_after: &VecDeque<Value>) {
        println!("    {} {}", "received".green(), value);
    }

    fn on_try_send(&mut self, proc: &str, chan: &str, value: &Value, success: bool, _buffer_after: &VecDeque<Value>) {
        println!("    {} {} -> {} : {} ({})", "try_send".blue(), proc, chan, value, success);
    }

    fn on_try_receive(&mut self, proc: &str, chan: &str, ok: bool, value: &Value, _buffer_after: &VecDeque<Value>) {
        println!("    {} {} <- {} ({}, {})", "try_receive".blue(), proc, chan, ok, value);
    }

    fn on_block(&mut self, proc: &str, direction: &str, chan: &str, reason: &str) {
        println!("    {} {} {} {} ({})", "blocked".red(), proc, direction, chan, reason);
    }

    fn on_transition_skipped(&mut self, _tick: u64, proc: &str, reason: &str) {
        println!("    {} {} ({})", "transition skipped".red(), proc, reason);
    }

    fn on_status(&mut self, status: &str, reason: &str, runtime: &Runtime) {
        let line = format!("{status} ({reason})");
        if status == "Completed" {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line.red().bold());
        }
        let mut procs: Vec<_> = runtime.procs.values().collect();
        procs.sort_by(|a, b| a.name.cmp(&b.name));
        for proc in procs {
            println!("    {} {} @ {} [{:?}]", "final".dimmed(), proc.name, proc.state, proc.status);
        }
    }
}
