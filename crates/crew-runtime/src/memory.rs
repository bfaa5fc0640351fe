//! Short-term memory shared by the agents of one crew run

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// One remembered task result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Task name
    pub task: String,
    /// Role of the agent that produced the output
    pub agent: String,
    /// Raw task output
    pub output: String,
}

/// Per-run store of task outputs
///
/// Clones share the same entries. A new memory is created for every kickoff.
#[derive(Debug, Clone, Default)]
pub struct ShortTermMemory {
    entries: Arc<Mutex<Vec<MemoryEntry>>>,
}

impl ShortTermMemory {
    /// Create an empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a task output
    pub fn add(&self, task: impl Into<String>, agent: impl Into<String>, output: impl Into<String>) {
        self.lock().push(MemoryEntry {
            task: task.into(),
            agent: agent.into(),
            output: output.into(),
        });
    }

    /// The newest `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<MemoryEntry> {
        let entries = self.lock();
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been remembered yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MemoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_window() {
        let memory = ShortTermMemory::new();
        assert!(memory.recent(3).is_empty());

        for task in ["a", "b", "c", "d"] {
            memory.add(task, "analyst", format!("output {task}"));
        }

        let recent: Vec<_> = memory.recent(2).into_iter().map(|e| e.task).collect();
        assert_eq!(recent, ["c", "d"]);
        assert_eq!(memory.recent(10).len(), 4);
    }

    #[test]
    fn test_clones_share_entries() {
        let memory = ShortTermMemory::new();
        memory.clone().add("get_news", "Stock news Analyst", "BTC up");
        assert_eq!(memory.len(), 1);
        assert!(!memory.is_empty());
    }
}
