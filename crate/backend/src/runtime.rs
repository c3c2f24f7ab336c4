use std::collections::HashMap;

use crate::channel::Channel;
use crate::ir::IRGroup;
use crate::value::Value;

/// A process instance's scheduling status (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcStatus {
    Running,
    Blocked,
    Finished,
}

/// What a `Blocked` process is waiting on.
#[derive(Debug, Clone)]
pub struct BlockedOn {
    pub channel: String,
    pub is_send: bool,
}

/// One running instance of a process definition.
#[derive(Debug, Clone)]
pub struct ProcessInstance {
    pub name: String,
    pub state: String,
    pub status: ProcStatus,
    pub locals: HashMap<String, Value>,
    pub outputs: HashMap<String, Value>,
    pub blocked_on: Option<BlockedOn>,
    /// The rendezvous mailbox: a value a sender deposited directly into this
    /// process while it was blocked receiving on `channel`, keyed by channel
    /// name (§4.10, §5's "Rendezvous mailbox").
    mailbox: HashMap<String, Value>,
}

impl ProcessInstance {
    pub fn new(name: impl Into<String>, initial_state: impl Into<String>) -> Self {
        let mut locals = HashMap::new();
        locals.insert("__last_error".to_string(), Value::Text(String::new()));
        Self {
            name: name.into(),
            state: initial_state.into(),
            status: ProcStatus::Running,
            locals,
            outputs: HashMap::new(),
            blocked_on: None,
            mailbox: HashMap::new(),
        }
    }

    pub fn block_on_send(&mut self, channel: impl Into<String>) {
        self.status = ProcStatus::Blocked;
        self.blocked_on = Some(BlockedOn {
            channel: channel.into(),
            is_send: true,
        });
    }

    pub fn block_on_receive(&mut self, channel: impl Into<String>) {
        self.status = ProcStatus::Blocked;
        self.blocked_on = Some(BlockedOn {
            channel: channel.into(),
            is_send: false,
        });
    }

    pub fn is_blocked_receiving_on(&self, channel: &str) -> bool {
        matches!(&self.blocked_on, Some(b) if !b.is_send && b.channel == channel)
    }

    pub fn deposit_mailbox(&mut self, channel: impl Into<String>, value: Value) {
        self.mailbox.insert(channel.into(), value);
        self.status = ProcStatus::Running;
        self.blocked_on = None;
    }

    pub fn take_mailbox(&mut self, channel: &str) -> Option<Value> {
        self.mailbox.remove(channel)
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals.get(name).or_else(|| self.outputs.get(name))
    }

    /// Writes `value` into whichever of locals/outputs already holds `name`,
    /// falling back to locals for a first-time binding.
    pub fn assign(&mut self, name: &str, value: Value) {
        if self.outputs.contains_key(name) {
            self.outputs.insert(name.to_string(), value);
        } else {
            self.locals.insert(name.to_string(), value);
        }
    }
}

/// The full execution state of one group (§3, runtime.h).
pub struct Runtime<'g> {
    pub group: &'g IRGroup,
    pub channels: HashMap<String, Channel>,
    pub procs: HashMap<String, ProcessInstance>,
    pub tick: u64,
}

impl<'g> Runtime<'g> {
    pub fn new(group: &'g IRGroup) -> Self {
        let channels = group
            .channels
            .iter()
            .map(|c| (c.name.clone(), Channel::new(c.name.clone(), c.capacity)))
            .collect();

        let procs = group
            .processes
            .iter()
            .map(|p| {
                let mut instance = ProcessInstance::new(p.name.clone(), p.initial_state.clone());
                for name in &p.local_names {
                    instance.locals.entry(name.clone()).or_insert(Value::Unset);
                }
                for name in &p.output_names {
                    instance.outputs.entry(name.clone()).or_insert(Value::Unset);
                }
                (p.name.clone(), instance)
            })
            .collect();

        Self {
            group,
            channels,
            procs,
            tick: 0,
        }
    }

    pub fn all_finished(&self) -> bool {
        self.procs.values().all(|p| p.status == ProcStatus::Finished)
    }

    pub fn any_running(&self) -> bool {
        self.procs.values().any(|p| p.status == ProcStatus::Running)
    }

    pub fn any_blocked(&self) -> bool {
        self.procs.values().any(|p| p.status == ProcStatus::Blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IRChannel;

    fn empty_group() -> IRGroup {
        IRGroup {
            name: "g".to_string(),
            channels: vec![IRChannel { name: "c".to_string(), capacity: 2 }],
            processes: Vec::new(),
            schedule_steps: Vec::new(),
            repeat: false,
        }
    }

    #[test]
    fn new_runtime_has_last_error_preinitialized_via_process_instance() {
        let instance = ProcessInstance::new("P", "S0");
        assert_eq!(instance.lookup("__last_error"), Some(&Value::Text(String::new())));
    }

    #[test]
    fn no_processes_means_trivially_all_finished() {
        let group = empty_group();
        let rt = Runtime::new(&group);
        assert!(rt.all_finished());
    }

    #[test]
    fn mailbox_deposit_unblocks_the_receiver() {
        let mut instance = ProcessInstance::new("Q", "S0");
        instance.block_on_receive("c");
        assert_eq!(instance.status, ProcStatus::Blocked);
        instance.deposit_mailbox("c", Value::Int(7));
        assert_eq!(instance.status, ProcStatus::Running);
        assert_eq!(instance.take_mailbox("c"), Some(Value::Int(7)));
    }
}
