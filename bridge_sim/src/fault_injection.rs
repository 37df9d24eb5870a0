//! Deterministic fault injection for testing
//!
//! This module lets tests inject faults into the simulated bus's delivery
//! pipeline: lost messages, duplicated messages, and reordering.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: No randomness, faults trigger by count or content
//! - **Composable**: Multiple faults can be combined in one plan
//! - **Test-focused**: Not intended for production use
//!
//! ## Example
//!
//! ```
//! use bridge_sim::fault_injection::{FaultPlan, MessageFault};
//!
//! let plan = FaultPlan::new()
//!     .with_message_fault(MessageFault::DropNext { count: 2 })
//!     .with_message_fault(MessageFault::DuplicateNext { count: 1 });
//! assert_eq!(plan.message_faults().len(), 2);
//! ```

use std::collections::VecDeque;

/// A fault to inject into message delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFault {
    /// Drop the next N posts
    DropNext { count: usize },

    /// Drop every post whose payload contains `needle`
    DropMatching { needle: String },

    /// Deliver each of the next N posts twice
    DuplicateNext { count: usize },

    /// Swap the in-flight message at `index` with the one at `index + offset`
    /// each time the bus drains
    ReorderWindow { index: usize, offset: usize },
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    message_faults: Vec<MessageFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message fault to the plan
    pub fn with_message_fault(mut self, fault: MessageFault) -> Self {
        self.message_faults.push(fault);
        self
    }

    /// Returns a reference to the message faults
    pub fn message_faults(&self) -> &[MessageFault] {
        &self.message_faults
    }
}

/// What the bus should do with a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostDecision {
    Deliver,
    Drop,
    Duplicate,
}

/// Applies a [`FaultPlan`] to posts as they enter the bus
#[derive(Debug, Default)]
pub struct FaultInjector {
    plan: FaultPlan,
    drop_next_count: usize,
    duplicate_next_count: usize,
    posts_seen: usize,
}

impl FaultInjector {
    /// Creates a new fault injector with the given plan
    pub fn new(plan: FaultPlan) -> Self {
        let mut injector = Self {
            plan,
            ..Self::default()
        };

        for fault in injector.plan.message_faults().to_vec() {
            match fault {
                MessageFault::DropNext { count } => injector.drop_next_count += count,
                MessageFault::DuplicateNext { count } => injector.duplicate_next_count += count,
                // Checked per post or per drain
                MessageFault::DropMatching { .. } | MessageFault::ReorderWindow { .. } => {}
            }
        }

        injector
    }

    /// Decides the fate of a post
    pub fn decide(&mut self, payload: &str) -> PostDecision {
        self.posts_seen += 1;

        if self.drop_next_count > 0 {
            self.drop_next_count -= 1;
            return PostDecision::Drop;
        }

        let matches_drop = self.plan.message_faults().iter().any(|fault| {
            matches!(
                fault,
                MessageFault::DropMatching { needle } if payload.contains(needle.as_str())
            )
        });
        if matches_drop {
            return PostDecision::Drop;
        }

        if self.duplicate_next_count > 0 {
            self.duplicate_next_count -= 1;
            return PostDecision::Duplicate;
        }

        PostDecision::Deliver
    }

    /// Applies reordering faults to the in-flight queue
    pub fn apply_reordering<T>(&self, queue: &mut VecDeque<T>) {
        for fault in self.plan.message_faults() {
            if let MessageFault::ReorderWindow { index, offset } = fault {
                if *index + offset < queue.len() {
                    queue.swap(*index, *index + offset);
                }
            }
        }
    }

    /// Returns the number of posts seen
    pub fn posts_seen(&self) -> usize {
        self.posts_seen
    }
}
