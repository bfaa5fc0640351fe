//! Process modes and verbosity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a crew runs its tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Each task is executed by its own agent, in order
    #[default]
    Sequential,
    /// A manager agent executes every task, delegating to the crew
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Process::Sequential => write!(f, "sequential"),
            Process::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

impl FromStr for Process {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Process::Sequential),
            "hierarchical" => Ok(Process::Hierarchical),
            other => Err(format!(
                "unknown process '{other}', expected 'sequential' or 'hierarchical'"
            )),
        }
    }
}

/// How much a crew reports while running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Progress at debug level only
    #[default]
    Quiet,
    /// Task start and finish at info level
    Normal,
    /// Also every tool call and final answer of every agent
    Detailed,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            _ => Verbosity::Detailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_parse() {
        assert_eq!(" Hierarchical ".parse::<Process>(), Ok(Process::Hierarchical));
        assert_eq!("sequential".parse::<Process>(), Ok(Process::Sequential));
        assert!("parallel".parse::<Process>().is_err());
        assert_eq!(Process::Hierarchical.to_string(), "hierarchical");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Verbosity::from(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from(1), Verbosity::Normal);
        assert_eq!(Verbosity::from(9), Verbosity::Detailed);
        assert!(Verbosity::Detailed > Verbosity::Normal);
    }
}
