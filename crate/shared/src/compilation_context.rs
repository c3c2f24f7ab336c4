use std::collections::{HashMap, HashSet};

use caps_ir::ast::GroupDecl;
use caps_types::Type;

/// The environment a single group's semantic checks run against: the
/// channel-name → element-type map and the set of declared process names
/// (§4.5 step 1-2).
///
/// Built once per group before any process is checked, so every process
/// analyzer sees the same, already-resolved channel types regardless of
/// declaration order.
pub struct CompilationContext {
    channel_types: HashMap<String, Type>,
    process_names: HashSet<String>,
}

impl CompilationContext {
    /// Builds the environment for `group`. Channel types are resolved via
    /// `TypeRef::resolve`; a channel whose declared type does not name a
    /// recognized primitive resolves to `Type::Unknown` here, and it is the
    /// caller's responsibility to diagnose that.
    pub fn for_group(group: &GroupDecl) -> Self {
        let channel_types = group
            .channels
            .iter()
            .map(|decl| {
                let element = decl.element_type.resolve();
                (decl.name.clone(), Type::channel(element, decl.capacity))
            })
            .collect();

        let process_names = group.processes.iter().map(|p| p.name.clone()).collect();

        Self {
            channel_types,
            process_names,
        }
    }

    /// The full `Channel<T; N>` type of a declared channel, if it exists.
    pub fn channel_type(&self, name: &str) -> Option<&Type> {
        self.channel_types.get(name)
    }

    /// The element type `T` of a declared channel, if it exists.
    pub fn channel_element_type(&self, name: &str) -> Option<&Type> {
        match self.channel_types.get(name) {
            Some(Type::Channel { element, .. }) => Some(element),
            _ => None,
        }
    }

    pub fn has_process(&self, name: &str) -> bool {
        self.process_names.contains(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channel_types.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caps_ir::SourceLocation;
    use caps_ir::ast::{ChannelDecl, ScheduleDecl, TypeRef};

    fn sample_group() -> GroupDecl {
        let pos = SourceLocation::default();
        GroupDecl {
            pos,
            name: "g".to_string(),
            annotations: Vec::new(),
            channels: vec![ChannelDecl {
                pos,
                name: "c".to_string(),
                element_type: TypeRef::primitive(pos, "int"),
                capacity: 2,
            }],
            processes: Vec::new(),
            schedule: ScheduleDecl {
                pos,
                steps: Vec::new(),
                repeat: false,
            },
        }
    }

    #[test]
    fn resolves_declared_channel_types() {
        let group = sample_group();
        let ctx = CompilationContext::for_group(&group);
        assert_eq!(ctx.channel_element_type("c"), Some(&Type::Int));
        assert_eq!(ctx.channel_type("c"), Some(&Type::channel(Type::Int, 2)));
    }

    #[test]
    fn unknown_channel_name_is_none() {
        let group = sample_group();
        let ctx = CompilationContext::for_group(&group);
        assert_eq!(ctx.channel_type("nope"), None);
    }
}
