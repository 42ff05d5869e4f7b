use std::collections::HashSet;

use crate::logger;
use crate::platform::{Accessibility, Element};
use crate::types::Pid;

/// An element plus up to `max_depth` of its ancestors, nearest first.
pub struct AncestorChain<'a> {
    start: &'a dyn Element,
    ancestors: Vec<Box<dyn Element>>,
}

impl<'a> AncestorChain<'a> {
    pub fn walk(start: &'a dyn Element, max_depth: usize) -> Self {
        let mut ancestors: Vec<Box<dyn Element>> = Vec::new();
        let mut next = start.parent();
        while let Some(parent) = next {
            if ancestors.len() >= max_depth {
                break;
            }
            next = parent.parent();
            ancestors.push(parent);
        }
        Self { start, ancestors }
    }

    pub fn len(&self) -> usize {
        1 + self.ancestors.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// 0 is the starting element, 1 its parent, and so on.
    pub fn get(&self, index: usize) -> Option<&dyn Element> {
        match index {
            0 => Some(self.start),
            i => self.ancestors.get(i - 1).map(|b| b.as_ref()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Element> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Processes already told to expose their full accessibility tree.
/// Chrome and Electron only build the complete tree once asked.
#[derive(Debug, Default)]
pub struct EnhancedUiRegistry {
    pids: HashSet<Pid>,
}

impl EnhancedUiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable enhanced UI for `pid` on first contact. Returns true if this
    /// call performed the enrollment.
    pub fn enroll(&mut self, ax: &dyn Accessibility, pid: Pid) -> bool {
        if !self.pids.insert(pid) {
            return false;
        }
        logger::info_p("engine", &format!("enabling enhanced accessibility for pid {}", pid));
        ax.enable_enhanced_ui(pid);
        true
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }
}
