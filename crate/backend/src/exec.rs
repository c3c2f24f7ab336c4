use crate::eval::eval_expr;
use crate::ir::{IRAction, IRState, IRTransition};
use crate::runtime::{ProcStatus, ProcessInstance, Runtime};
use crate::trace::TraceSink;
use crate::value::Value;

/// Executes one IR action against the current process. Returns whether the
/// process blocked (§4.10).
pub fn exec_action(rt: &mut Runtime, proc_name: &str, action: &IRAction, trace: &mut dyn TraceSink) -> bool {
    if rt.procs[proc_name].status != ProcStatus::Running {
        return false;
    }

    match action {
        IRAction::Assign { dst, expr } => {
            let proc = &rt.procs[proc_name];
            let value = eval_expr(rt, proc, expr);
            let proc = rt.procs.get_mut(proc_name).expect("process exists");
            let before = proc.lookup(dst).cloned().unwrap_or(Value::Unset);
            proc.assign(dst, value.clone());
            trace.on_assign(proc_name, dst, &before, &value);
            false
        }

        IRAction::Send { chan, expr } => {
            let proc = &rt.procs[proc_name];
            let value = eval_expr(rt, proc, expr);
            let buffer_before = rt.channels[chan].buffer.clone();
            trace.on_send_begin(proc_name, chan, &value, &buffer_before);

            if rt.channels[chan].is_rendezvous() {
                let waiting_receiver = rt
                    .procs
                    .iter()
                    .find(|(_, q)| q.is_blocked_receiving_on(chan))
                    .map(|(name, _)| name.clone());

                match waiting_receiver {
                    Some(receiver_name) => {
                        rt.procs
                            .get_mut(&receiver_name)
                            .expect("receiver exists")
                            .deposit_mailbox(chan.clone(), value);
                        trace.on_send_end(proc_name, chan, &rt.channels[chan].buffer);
                        false
                    }
                    None => {
                        trace.on_block(proc_name, "send", chan, "unbuffered_no_receiver");
                        rt.procs.get_mut(proc_name).expect("process exists").block_on_send(chan.clone());
                        true
                    }
                }
            } else if rt.channels[chan].is_full() {
                trace.on_block(proc_name, "send", chan, "channel_full");
                rt.procs.get_mut(proc_name).expect("process exists").block_on_send(chan.clone());
                true
            } else {
                rt.channels.get_mut(chan).expect("channel exists").buffer.push_back(value);
                trace.on_send_end(proc_name, chan, &rt.channels[chan].buffer);
                false
            }
        }

        IRAction::Receive { chan, dst } => {
            let buffer_before = rt.channels[chan].buffer.clone();
            trace.on_receive_begin(proc_name, chan, &buffer_before);

            if rt.channels[chan].is_rendezvous() {
                let proc = rt.procs.get_mut(proc_name).expect("process exists");
                match proc.take_mailbox(chan) {
                    Some(value) => {
                        proc.assign(dst, value.clone());
                        trace.on_receive_end(proc_name, chan, &value, &rt.channels[chan].buffer);
                        false
                    }
                    None => {
                        trace.on_block(proc_name, "receive", chan, "unbuffered_no_value");
                        proc.block_on_receive(chan.clone());
                        true
                    }
                }
            } else if rt.channels[chan].is_empty() {
                trace.on_block(proc_name, "receive", chan, "channel_empty");
                rt.procs.get_mut(proc_name).expect("process exists").block_on_receive(chan.clone());
                true
            } else {
                let value = rt.channels.get_mut(chan).expect("channel exists").buffer.pop_front().expect("non-empty");
                rt.procs.get_mut(proc_name).expect("process exists").assign(dst, value.clone());
                trace.on_receive_end(proc_name, chan, &value, &rt.channels[chan].buffer);
                false
            }
        }

        IRAction::TrySend { chan, expr, out } => {
            let proc = &rt.procs[proc_name];
            let value = eval_expr(rt, proc, expr);

            let success = if rt.channels[chan].is_rendezvous() {
                let waiting_receiver = rt
                    .procs
                    .iter()
                    .find(|(_, q)| q.is_blocked_receiving_on(chan))
                    .map(|(name, _)| name.clone());
                match waiting_receiver {
                    Some(receiver_name) => {
                        rt.procs
                            .get_mut(&receiver_name)
                            .expect("receiver exists")
                            .deposit_mailbox(chan.clone(), value.clone());
                        true
                    }
                    None => false,
                }
            } else if rt.channels[chan].is_full() {
                false
            } else {
                rt.channels.get_mut(chan).expect("channel exists").buffer.push_back(value.clone());
                true
            };

            rt.procs.get_mut(proc_name).expect("process exists").assign(out, Value::result_ok(Value::Bool(success)));
            trace.on_try_send(proc_name, chan, &value, success, &rt.channels[chan].buffer);
            false
        }

        IRAction::TryReceive { chan, out } => {
            if rt.channels[chan].is_rendezvous() {
                let proc = rt.procs.get_mut(proc_name).expect("process exists");
                match proc.take_mailbox(chan) {
                    Some(value) => {
                        proc.assign(out, Value::result_ok(value.clone()));
                        trace.on_try_receive(proc_name, chan, true, &value, &rt.channels[chan].buffer);
                    }
                    None => {
                        proc.assign(out, Value::result_err("empty"));
                        trace.on_try_receive(proc_name, chan, false, &Value::Unset, &rt.channels[chan].buffer);
                    }
                }
            } else if rt.channels[chan].is_empty() {
                rt.procs.get_mut(proc_name).expect("process exists").assign(out, Value::result_err("empty"));
                trace.on_try_receive(proc_name, chan, false, &Value::Unset, &rt.channels[chan].buffer);
            } else {
                let value = rt.channels.get_mut(chan).expect("channel exists").buffer.pop_front().expect("non-empty");
                rt.procs.get_mut(proc_name).expect("process exists").assign(out, Value::result_ok(value.clone()));
                trace.on_try_receive(proc_name, chan, true, &value, &rt.channels[chan].buffer);
            }
            false
        }

        IRAction::TryUnwrapAssign {
            dst,
            result_expr,
            error_state,
            last_error_local,
        } => {
            let proc = &rt.procs[proc_name];
            let result = eval_expr(rt, proc, result_expr);
            let result = result.as_result().clone();
            let proc = rt.procs.get_mut(proc_name).expect("process exists");
            if result.ok {
                proc.assign(dst, result.value);
            } else {
                proc.assign(last_error_local, Value::Text(result.error));
                proc.state = error_state.clone();
            }
            false
        }
    }
}

/// Runs a single base-action-then-transition step for one process (§4.11.1).
/// Returns whether any progress (action executed or state changed) occurred.
pub fn step_process_once(rt: &mut Runtime, proc_name: &str, trace: &mut dyn TraceSink) -> bool {
    if rt.procs[proc_name].status != ProcStatus::Running {
        return false;
    }

    let state_before = rt.procs[proc_name].state.clone();
    trace.on_process_step_begin(rt.tick, proc_name, &state_before);

    let def = rt.group.process(proc_name).expect("process definition exists");
    let st: IRState = def.state(&state_before).expect("state exists").clone();

    for action in &st.actions {
        // A TryUnwrapAssign may have redirected `state` already; subsequent
        // actions in the same on-block still run against the original list
        // (the redirect only takes effect at the transition step).
        if exec_action(rt, proc_name, action, trace) {
            trace.on_process_step_end(rt.tick, proc_name, &rt.procs[proc_name].state.clone(), rt.procs[proc_name].status);
            return true;
        }
    }

    if rt.procs[proc_name].state != state_before {
        // A TryUnwrapAssign already forced a transition to `__Error`.
        finalize_state_change(rt, proc_name, trace);
        return true;
    }

    let next = match &st.transition {
        IRTransition::Unconditional { to } => to.clone(),
        IRTransition::IfElse {
            cond,
            then_actions,
            then_to,
            else_actions,
            else_to,
        } => {
            let proc = &rt.procs[proc_name];
            let cond_value = eval_expr(rt, proc, cond).as_bool();
            let (actions, target) = if cond_value {
                (then_actions, then_to)
            } else {
                (else_actions, else_to)
            };

            for action in actions {
                if exec_action(rt, proc_name, action, trace) {
                    trace.on_transition_skipped(rt.tick, proc_name, "blocked_in_branch_actions");
                    trace.on_process_step_end(rt.tick, proc_name, &rt.procs[proc_name].state.clone(), rt.procs[proc_name].status);
                    return true;
                }
            }

            if rt.procs[proc_name].state != state_before {
                finalize_state_change(rt, proc_name, trace);
                return true;
            }

            target.clone()
        }
    };

    rt.procs.get_mut(proc_name).expect("process exists").state = next;
    finalize_state_change(rt, proc_name, trace);
    true
}

fn finalize_state_change(rt: &mut Runtime, proc_name: &str, trace: &mut dyn TraceSink) {
    let state_after = rt.procs[proc_name].state.clone();
    let def = rt.group.process(proc_name).expect("process definition exists");
    if def.state(&state_after).expect("state exists").terminal {
        rt.procs.get_mut(proc_name).expect("process exists").status = ProcStatus::Finished;
    }
    trace.on_process_step_end(rt.tick, proc_name, &state_after, rt.procs[proc_name].status);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IRChannel, IRExpr, IRGroup, IRProcess};
    use crate::trace::NullTraceSink;
    use caps_ir::ast::BinaryOp;
    use std::collections::HashMap;

    fn rendezvous_group() -> IRGroup {
        let mut sender_states = HashMap::new();
        sender_states.insert(
            "Send0".to_string(),
            IRState {
                name: "Send0".to_string(),
                actions: vec![IRAction::Send {
                    chan: "c".to_string(),
                    expr: IRExpr::IntLit(42),
                }],
                transition: IRTransition::Unconditional { to: "Done".to_string() },
                terminal: false,
            },
        );
        sender_states.insert(
            "Done".to_string(),
            IRState {
                name: "Done".to_string(),
                actions: Vec::new(),
                transition: IRTransition::Unconditional { to: "Done".to_string() },
                terminal: true,
            },
        );

        let mut receiver_states = HashMap::new();
        receiver_states.insert(
            "Recv0".to_string(),
            IRState {
                name: "Recv0".to_string(),
                actions: vec![IRAction::Receive {
                    chan: "c".to_string(),
                    dst: "x".to_string(),
                }],
                transition: IRTransition::Unconditional { to: "Done".to_string() },
                terminal: false,
            },
        );
        receiver_states.insert(
            "Done".to_string(),
            IRState {
                name: "Done".to_string(),
                actions: Vec::new(),
                transition: IRTransition::Unconditional { to: "Done".to_string() },
                terminal: true,
            },
        );

        IRGroup {
            name: "g".to_string(),
            channels: vec![IRChannel { name: "c".to_string(), capacity: 0 }],
            processes: vec![
                IRProcess {
                    name: "Sender".to_string(),
                    initial_state: "Send0".to_string(),
                    states: sender_states,
                    local_names: Vec::new(),
                    output_names: Vec::new(),
                    realtimesafe: false,
                },
                IRProcess {
                    name: "Receiver".to_string(),
                    initial_state: "Recv0".to_string(),
                    states: receiver_states,
                    local_names: vec!["x".to_string()],
                    output_names: Vec::new(),
                    realtimesafe: false,
                },
            ],
            schedule_steps: vec!["Sender".to_string(), "Receiver".to_string()],
            repeat: false,
        }
    }

    #[test]
    fn sender_blocks_until_receiver_waits_then_both_finish() {
        let group = rendezvous_group();
        let mut rt = Runtime::new(&group);
        let mut trace = NullTraceSink;

        // Tick 1: sender runs first in schedule order and finds no waiting
        // receiver yet, so it blocks.
        assert!(step_process_once(&mut rt, "Sender", &mut trace));
        assert_eq!(rt.procs["Sender"].status, ProcStatus::Blocked);

        // Receiver steps next: finds no mailbox value yet (the rendezvous
        // requires the receiver to already be blocked before the sender's
        // check runs), so it blocks too.
        assert!(step_process_once(&mut rt, "Receiver", &mut trace));
        assert_eq!(rt.procs["Receiver"].status, ProcStatus::Blocked);
    }

    #[test]
    fn try_unwrap_assign_redirects_to_error_state_on_err() {
        let mut states = HashMap::new();
        states.insert(
            "S0".to_string(),
            IRState {
                name: "S0".to_string(),
                actions: vec![IRAction::TryUnwrapAssign {
                    dst: "v".to_string(),
                    result_expr: IRExpr::Var("r".to_string()),
                    error_state: "__Error".to_string(),
                    last_error_local: "__last_error".to_string(),
                }],
                transition: IRTransition::Unconditional { to: "Next".to_string() },
                terminal: false,
            },
        );
        states.insert(
            "Next".to_string(),
            IRState {
                name: "Next".to_string(),
                actions: Vec::new(),
                transition: IRTransition::Unconditional { to: "Next".to_string() },
                terminal: true,
            },
        );
        states.insert(
            "__Error".to_string(),
            IRState {
                name: "__Error".to_string(),
                actions: Vec::new(),
                transition: IRTransition::Unconditional { to: "__Error".to_string() },
                terminal: true,
            },
        );

        let group = IRGroup {
            name: "g".to_string(),
            channels: Vec::new(),
            processes: vec![IRProcess {
                name: "P".to_string(),
                initial_state: "S0".to_string(),
                states,
                local_names: vec!["r".to_string(), "v".to_string()],
                output_names: Vec::new(),
                realtimesafe: false,
            }],
            schedule_steps: vec!["P".to_string()],
            repeat: false,
        };

        let mut rt = Runtime::new(&group);
        rt.procs.get_mut("P").unwrap().locals.insert("r".to_string(), Value::result_err("boom"));
        let mut trace = NullTraceSink;

        step_process_once(&mut rt, "P", &mut trace);

        assert_eq!(rt.procs["P"].state, "__Error");
        assert_eq!(rt.procs["P"].status, ProcStatus::Finished);
        assert_eq!(rt.procs["P"].lookup("__last_error"), Some(&Value::Text("boom".to_string())));
    }

    #[test]
    fn arithmetic_action_assigns_and_transitions() {
        let mut states = HashMap::new();
        states.insert(
            "S0".to_string(),
            IRState {
                name: "S0".to_string(),
                actions: vec![IRAction::Assign {
                    dst: "x".to_string(),
                    expr: IRExpr::Binary {
                        op: BinaryOp::Add,
                        left: Box::new(IRExpr::IntLit(1)),
                        right: Box::new(IRExpr::IntLit(2)),
                    },
                }],
                transition: IRTransition::Unconditional { to: "Done".to_string() },
                terminal: false,
            },
        );
        states.insert(
            "Done".to_string(),
            IRState {
                name: "Done".to_string(),
                actions: Vec::new(),
                transition: IRTransition::Unconditional { to: "Done".to_string() },
                terminal: true,
            },
        );

        let group = IRGroup {
            name: "g".to_string(),
            channels: Vec::new(),
            processes: vec![IRProcess {
                name: "P".to_string(),
                initial_state: "S0".to_string(),
                states,
                local_names: vec!["x".to_string()],
                output_names: Vec::new(),
                realtimesafe: false,
            }],
            schedule_steps: vec!["P".to_string()],
            repeat: false,
        };

        let mut rt = Runtime::new(&group);
        let mut trace = NullTraceSink;
        step_process_once(&mut rt, "P", &mut trace);
        assert_eq!(rt.procs["P"].lookup("x"), Some(&Value::Int(3)));
        assert_eq!(rt.procs["P"].state, "Done");
        assert_eq!(rt.procs["P"].status, ProcStatus::Finished);
    }
}
