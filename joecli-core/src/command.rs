// Copyright 2019 Lyndon Brown
//
// This file is part of the `joecli-core` command-line framework library.
//
// Licensed under the MIT license or the Apache license (version 2.0), at your option. You may not
// copy, modify, or distribute this file except in compliance with said license. You can find copies
// of these licenses either in the LICENSE-MIT and LICENSE-APACHE files, or alternatively at
// <http://opensource.org/licenses/MIT> and <http://www.apache.org/licenses/LICENSE-2.0>
// respectively.

//! The command tree
//!
//! Spec §9: rather than an `Rc<RefCell<..>>` graph of borrowed nodes (as `gong`'s `CommandSet`
//! favours for a tree that is built once and never mutated again), the tree here is an arena: a
//! flat `Vec<Node>` addressed by opaque [`NodeId`] indices, owned outright by a [`Tree`]. Every
//! [`Command`], [`Flag`](../flag/struct.Flag.html) and [`Arg`](../arg/struct.Arg.html) is a node;
//! commands additionally carry lists of their children's ids. The tree is mutable only while
//! [`Timing::Initial`](../pipeline/enum.Timing.html) actions are running; afterwards the
//! dispatcher treats it as frozen.

use std::fmt;

use crate::arg::Arg;
use crate::bits::Bits;
use crate::flag::Flag;
use crate::pipeline::Pipelines;
use crate::target::{DataMap, Path, Target};

/// An opaque index into a [`Tree`]'s arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Construct a `NodeId` from a raw index; exposed for tests and for hosts that persist ids
    /// across runs (e.g. to re-select the same subcommand programmatically).
    pub fn from_raw(raw: usize) -> Self {
        NodeId(raw)
    }

    /// The raw index
    pub fn raw(self) -> usize {
        self.0
    }
}

/// The concrete payload of one arena slot
#[derive(Debug)]
pub enum NodeKind {
    Command(Command),
    Flag(Flag),
    Arg(Arg),
}

impl NodeKind {
    /// Borrow the node as a [`Target`], regardless of kind
    pub fn as_target(&self) -> &dyn Target {
        match self {
            NodeKind::Command(c) => c,
            NodeKind::Flag(f) => f,
            NodeKind::Arg(a) => a,
        }
    }

    /// Mutably borrow the node as a [`Target`], regardless of kind
    pub fn as_target_mut(&mut self) -> &mut dyn Target {
        match self {
            NodeKind::Command(c) => c,
            NodeKind::Flag(f) => f,
            NodeKind::Arg(a) => a,
        }
    }

    /// Borrow as a [`Command`], if this node is one
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            NodeKind::Command(c) => Some(c),
            _ => None,
        }
    }

    /// Mutably borrow as a [`Command`], if this node is one
    pub fn as_command_mut(&mut self) -> Option<&mut Command> {
        match self {
            NodeKind::Command(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow as a [`Flag`], if this node is one
    pub fn as_flag(&self) -> Option<&Flag> {
        match self {
            NodeKind::Flag(f) => Some(f),
            _ => None,
        }
    }

    /// Borrow as an [`Arg`], if this node is one
    pub fn as_arg(&self) -> Option<&Arg> {
        match self {
            NodeKind::Arg(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// A subcommand (or the application root), owning its own flags, positional args and further
/// subcommands (spec §3 "Command").
#[derive(Debug)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    help: Option<String>,
    usage: Option<String>,
    category: Option<String>,
    data: DataMap,
    flags: Vec<NodeId>,
    args: Vec<NodeId>,
    subcommands: Vec<NodeId>,
    pipelines: Pipelines,
    bits: Bits,
}

impl Command {
    /// Start building a command named `name` (the root command's name is conventionally the
    /// binary name; subcommand names are matched against the command line, abbreviations allowed)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            help: None,
            usage: None,
            category: None,
            data: DataMap::new(),
            flags: Vec::new(),
            args: Vec::new(),
            subcommands: Vec::new(),
            pipelines: Pipelines::new(),
            bits: Bits::new(),
        }
    }

    /// The child flags, in declaration order
    pub fn flags(&self) -> &[NodeId] {
        &self.flags
    }

    /// The child positional args, in declaration order (matched left to right)
    pub fn args(&self) -> &[NodeId] {
        &self.args
    }

    /// The child subcommands, in declaration order
    pub fn subcommands(&self) -> &[NodeId] {
        &self.subcommands
    }

    /// The help summary, if set
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the help summary
    pub fn set_help(&mut self, help: impl Into<String>) -> &mut Self {
        self.help = Some(help.into());
        self
    }

    /// The usage line override, if set
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    /// Set the usage line override
    pub fn set_usage(&mut self, usage: impl Into<String>) -> &mut Self {
        self.usage = Some(usage.into());
        self
    }

    /// The help-output grouping category, if set
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Set the help-output grouping category
    pub fn set_category(&mut self, category: impl Into<String>) -> &mut Self {
        self.category = Some(category.into());
        self
    }

    /// Add an alias name
    pub fn add_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.aliases.push(alias.into());
        self
    }
}

impl Target for Command {
    fn name(&self) -> &str {
        &self.name
    }
    fn aliases(&self) -> &[String] {
        &self.aliases
    }
    fn bits(&self) -> &Bits {
        &self.bits
    }
    fn bits_mut(&mut self) -> &mut Bits {
        &mut self.bits
    }
    fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }
    fn pipelines_mut(&mut self) -> &mut Pipelines {
        &mut self.pipelines
    }
    fn data(&self) -> &DataMap {
        &self.data
    }
    fn data_mut(&mut self) -> &mut DataMap {
        &mut self.data
    }
}

/// The owned arena backing a whole command tree, rooted at a single application [`Command`].
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Set once the application has finished running `Initial` actions; subsequent mutation
    /// attempts through [`Tree::add_command`]/[`Tree::add_flag`]/[`Tree::add_arg`] are refused.
    frozen: bool,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("len", &self.nodes.len()).field("frozen", &self.frozen).finish()
    }
}

impl Tree {
    /// Build a new tree with a single root command
    pub fn new(root_name: impl Into<String>) -> Self {
        let root_node = Node { parent: None, kind: NodeKind::Command(Command::new(root_name)) };
        Tree { nodes: vec![root_node], root: NodeId(0), frozen: false }
    }

    /// The root command's id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Freeze the tree, refusing further structural mutation
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the tree has been frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Borrow a node's payload
    pub fn get(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Mutably borrow a node's payload
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// A node's parent, if any (the root has none)
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Walk from `id` up to (and including) the root, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            chain.push(n);
            cur = self.parent_of(n);
        }
        chain
    }

    /// Build the decorated [`Path`] for `id`
    pub fn path_of(&self, id: NodeId) -> Path {
        let mut chain = self.ancestors(id);
        chain.reverse();
        let mut path = Path::new();
        for (i, node_id) in chain.iter().enumerate() {
            match self.get(*node_id) {
                NodeKind::Command(c) => path.push_command(c.name()),
                NodeKind::Flag(flag) => {
                    let long = crate::target::canonical_long_name(flag.name(), flag.aliases());
                    let short = crate::target::canonical_short_name(flag.name(), flag.aliases());
                    path.push_flag(long, short);
                }
                NodeKind::Arg(arg) => path.push_arg(arg.name()),
            }
            let _ = i;
        }
        path
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        self.nodes.push(Node { parent: Some(parent), kind });
        NodeId(self.nodes.len() - 1)
    }

    /// Add a subcommand under `parent`, returning its id. Only legal before the tree is frozen.
    pub fn add_command(&mut self, parent: NodeId, command: Command) -> Result<NodeId, TreeError> {
        if self.frozen {
            return Err(TreeError::Frozen);
        }
        let id = self.push_node(parent, NodeKind::Command(command));
        if let Some(p) = self.get_mut(parent).as_command_mut() {
            p.subcommands.push(id);
        } else {
            return Err(TreeError::NotACommand);
        }
        Ok(id)
    }

    /// Add a flag under `parent`, returning its id. Only legal before the tree is frozen.
    pub fn add_flag(&mut self, parent: NodeId, flag: Flag) -> Result<NodeId, TreeError> {
        if self.frozen {
            return Err(TreeError::Frozen);
        }
        let id = self.push_node(parent, NodeKind::Flag(flag));
        if let Some(p) = self.get_mut(parent).as_command_mut() {
            p.flags.push(id);
        } else {
            return Err(TreeError::NotACommand);
        }
        Ok(id)
    }

    /// Add a positional arg under `parent`, returning its id. Only legal before the tree is
    /// frozen.
    pub fn add_arg(&mut self, parent: NodeId, arg: Arg) -> Result<NodeId, TreeError> {
        if self.frozen {
            return Err(TreeError::Frozen);
        }
        let id = self.push_node(parent, NodeKind::Arg(arg));
        if let Some(p) = self.get_mut(parent).as_command_mut() {
            p.args.push(id);
        } else {
            return Err(TreeError::NotACommand);
        }
        Ok(id)
    }

    /// Find a direct child subcommand of `parent` by name or alias, honouring unambiguous
    /// abbreviation per spec §4.4 unless the parent disables it.
    pub fn find_subcommand(&self, parent: NodeId, token: &str) -> crate::matching::MatchOutcome<NodeId> {
        let candidates: Vec<(NodeId, &str, &[String])> = match self.get(parent).as_command() {
            Some(c) => c.subcommands.iter().map(|&id| {
                let cmd = self.get(id).as_command().expect("subcommand child must be a Command");
                (id, cmd.name(), cmd.aliases())
            }).collect(),
            None => return crate::matching::MatchOutcome::NoMatch,
        };
        crate::matching::find_name_match(token, candidates.into_iter())
    }
}

/// Failure modes for structural tree mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The tree has already been frozen (past `Initial`)
    Frozen,
    /// The target parent id does not refer to a [`Command`]
    NotACommand,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Frozen => write!(f, "command tree is frozen; structural changes are only legal during Initial"),
            TreeError::NotACommand => write!(f, "parent node is not a command and cannot own children"),
        }
    }
}

impl std::error::Error for TreeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_find_subcommand() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let sub = tree.add_command(root, Command::new("generate")).unwrap();
        match tree.find_subcommand(root, "gen") {
            crate::matching::MatchOutcome::Match(found) => assert_eq!(found, sub),
            other => panic!("expected unambiguous abbreviation match, got {:?}", other),
        }
    }

    #[test]
    fn frozen_tree_refuses_mutation() {
        let mut tree = Tree::new("app");
        tree.freeze();
        let root = tree.root();
        assert_eq!(tree.add_command(root, Command::new("late")), Err(TreeError::Frozen));
    }

    #[test]
    fn path_of_renders_full_ancestry() {
        let mut tree = Tree::new("app");
        let root = tree.root();
        let sub = tree.add_command(root, Command::new("generate")).unwrap();
        assert_eq!(tree.path_of(sub).render(), "app generate");
    }
}
