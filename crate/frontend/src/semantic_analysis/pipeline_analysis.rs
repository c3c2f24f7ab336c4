use std::collections::{HashMap, HashSet, VecDeque};

use caps_error::ErrorCode;
use caps_ir::ast::{Action, GroupDecl, ProcessDecl, Transition};
use caps_shared::DiagnosticEngine;

/// Per-channel writer/reader usage, gathered from every action in every
/// process of a `@pipeline_safe` group, including branch actions of an
/// if/else transition (§4.6).
#[derive(Default)]
struct ChannelUse {
    writers: Vec<String>,
    readers: Vec<String>,
}

/// One channel's writer-to-reader hop: the edge carries the channel name so
/// `--dump-topology` can label it, per the single-writer/single-reader shape
/// `@pipeline_safe` enforces.
pub struct TopologyEdge {
    pub from_process: String,
    pub channel: String,
    pub to_process: String,
}

/// The directed graph induced by a group's channels: one edge per channel,
/// from its writer process to its reader process. Exposed so tooling (e.g.
/// `--dump-topology`) can render the same graph the safety check verifies.
pub struct TopologyGraph {
    pub processes: Vec<String>,
    pub edges: Vec<TopologyEdge>,
}

impl TopologyGraph {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for edge in &self.edges {
            out.push_str(&format!("{}: {} -> {}\n", edge.channel, edge.from_process, edge.to_process));
        }
        out
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        for process in &self.processes {
            out.push_str(&format!("  \"{process}\";\n"));
        }
        for edge in &self.edges {
            out.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                edge.from_process, edge.to_process, edge.channel
            ));
        }
        out.push_str("}\n");
        out
    }
}

/// Enforces `@pipeline_safe` (§4.6): single writer/reader per channel, an
/// acyclic channel graph, and a schedule order that respects that graph's
/// topology.
pub fn check_pipeline_safety(group: &GroupDecl, diagnostics: &mut DiagnosticEngine) {
    let mut uses: HashMap<String, ChannelUse> = group
        .channels
        .iter()
        .map(|c| (c.name.clone(), ChannelUse::default()))
        .collect();

    for process in &group.processes {
        for block in &process.on_blocks {
            for action in &block.actions {
                record_action(action, &process.name, &mut uses);
            }
            if let Transition::IfElse {
                then_actions,
                else_actions,
                ..
            } = &block.transition
            {
                for action in then_actions.iter().chain(else_actions.iter()) {
                    record_action(action, &process.name, &mut uses);
                }
            }
        }
    }

    let mut edges = Vec::new();
    for (channel, usage) in &uses {
        if usage.writers.len() > 1 {
            diagnostics.emit_error(
                ErrorCode::MultipleChannelWriters,
                format!(
                    "channel '{channel}' has {} writers ({}), expected exactly one under @pipeline_safe",
                    usage.writers.len(),
                    usage.writers.join(", "),
                ),
                group.pos,
            );
        }
        if usage.readers.len() > 1 {
            diagnostics.emit_error(
                ErrorCode::MultipleChannelReaders,
                format!(
                    "channel '{channel}' has {} readers ({}), expected exactly one under @pipeline_safe",
                    usage.readers.len(),
                    usage.readers.join(", "),
                ),
                group.pos,
            );
        }
        if let (Some(writer), Some(reader)) = (usage.writers.first(), usage.readers.first()) {
            edges.push(TopologyEdge {
                from_process: writer.clone(),
                channel: channel.clone(),
                to_process: reader.clone(),
            });
        }
    }
    edges.sort_by(|a, b| (&a.from_process, &a.channel, &a.to_process).cmp(&(&b.from_process, &b.channel, &b.to_process)));

    let process_names: Vec<String> = group.processes.iter().map(|p| p.name.clone()).collect();

    if let Err(cycle_member) = topological_order(&process_names, &edges) {
        diagnostics.emit_error(
            ErrorCode::PipelineCycle,
            format!("channel graph contains a cycle involving process '{cycle_member}'"),
            group.pos,
        );
        return;
    }

    check_schedule_order(group, &edges, diagnostics);
}

fn record_action(action: &Action, process_name: &str, uses: &mut HashMap<String, ChannelUse>) {
    match action {
        Action::Send { channel, .. } => {
            uses.entry(channel.clone()).or_default().writers.push(process_name.to_string());
        }
        Action::Receive { channel, .. } => {
            uses.entry(channel.clone()).or_default().readers.push(process_name.to_string());
        }
        Action::TrySend { channel, .. } => {
            uses.entry(channel.clone()).or_default().writers.push(process_name.to_string());
        }
        Action::TryReceive { channel, .. } => {
            uses.entry(channel.clone()).or_default().readers.push(process_name.to_string());
        }
        Action::Do(_) => {}
    }
}

/// Kahn's algorithm. Returns `Ok(order)` of process names if the graph is
/// acyclic; `Err(name)` naming a process stuck in a cycle otherwise.
fn topological_order(nodes: &[String], edges: &[TopologyEdge]) -> Result<Vec<String>, String> {
    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = nodes.iter().map(|n| (n.as_str(), Vec::new())).collect();

    for edge in edges {
        let (from, to) = (edge.from_process.as_str(), edge.to_process.as_str());
        if let Some(list) = adjacency.get_mut(from) {
            list.push(to);
        }
        if let Some(degree) = in_degree.get_mut(to) {
            *degree += 1;
        }
    }

    let mut queue_sorted: Vec<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    queue_sorted.sort();
    let mut queue: VecDeque<&str> = queue_sorted.into();

    let mut order = Vec::new();
    while let Some(node) = queue.pop_front() {
        order.push(node.to_string());
        if let Some(neighbors) = adjacency.get(node) {
            let mut next_ready: Vec<&str> = Vec::new();
            for neighbor in neighbors {
                let degree = in_degree.get_mut(neighbor).expect("neighbor in in_degree map");
                *degree -= 1;
                if *degree == 0 {
                    next_ready.push(neighbor);
                }
            }
            next_ready.sort();
            for ready in next_ready {
                queue.push_back(ready);
            }
        }
    }

    if order.len() == nodes.len() {
        Ok(order)
    } else {
        let remaining: HashSet<&str> = nodes.iter().map(String::as_str).collect::<HashSet<_>>()
            .difference(&order.iter().map(String::as_str).collect())
            .copied()
            .collect();
        Err(remaining.into_iter().min().unwrap_or("<unknown>").to_string())
    }
}

fn check_schedule_order(group: &GroupDecl, edges: &[TopologyEdge], diagnostics: &mut DiagnosticEngine) {
    let schedule_index: HashMap<&str, usize> = group
        .schedule
        .steps
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    for edge in edges {
        let (from, to) = (edge.from_process.as_str(), edge.to_process.as_str());
        if let (Some(&from_idx), Some(&to_idx)) = (schedule_index.get(from), schedule_index.get(to)) {
            if from_idx > to_idx {
                diagnostics.emit_error(
                    ErrorCode::ScheduleOrderViolation,
                    format!("schedule steps '{from}' before '{to}' but the channel graph requires the reverse order"),
                    group.schedule.pos,
                );
            }
        }
    }
}

/// Builds the topology graph for a group without re-running the safety
/// checks, for `--dump-topology` output.
pub fn build_topology(group: &GroupDecl) -> TopologyGraph {
    let mut uses: HashMap<String, ChannelUse> = group
        .channels
        .iter()
        .map(|c| (c.name.clone(), ChannelUse::default()))
        .collect();

    for process in &group.processes {
        for block in &process.on_blocks {
            for action in &block.actions {
                record_action(action, &process.name, &mut uses);
            }
            if let Transition::IfElse {
                then_actions,
                else_actions,
                ..
            } = &block.transition
            {
                for action in then_actions.iter().chain(else_actions.iter()) {
                    record_action(action, &process.name, &mut uses);
                }
            }
        }
    }

    let mut edges: Vec<TopologyEdge> = uses
        .into_iter()
        .filter_map(|(channel, usage)| {
            Some(TopologyEdge {
                from_process: usage.writers.into_iter().next()?,
                channel,
                to_process: usage.readers.into_iter().next()?,
            })
        })
        .collect();
    edges.sort_by(|a, b| (&a.from_process, &a.channel, &a.to_process).cmp(&(&b.from_process, &b.channel, &b.to_process)));

    TopologyGraph {
        processes: group.processes.iter().map(|p: &ProcessDecl| p.name.clone()).collect(),
        edges,
    }
}
