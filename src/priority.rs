//! Priority tiers and scheduling options for work items.
//!
//! The underlying scheduler only knows three tiers, so Win32 thread priorities
//! collapse by sign: anything below `THREAD_PRIORITY_NORMAL` runs low, anything
//! above runs high.

/// Priority tier a work item is submitted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkItemPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl WorkItemPriority {
    /// Map a Win32-style signed thread priority onto a tier
    pub fn from_thread_priority(priority: i32) -> Self {
        match priority {
            p if p < 0 => Self::Low,
            p if p > 0 => Self::High,
            _ => Self::Normal,
        }
    }

    /// Index of the tier's queue, highest priority first
    pub(crate) fn queue_index(self) -> usize {
        match self {
            Self::High => 0,
            Self::Normal => 1,
            Self::Low => 2,
        }
    }
}

impl From<i32> for WorkItemPriority {
    fn from(priority: i32) -> Self {
        Self::from_thread_priority(priority)
    }
}

impl std::fmt::Display for WorkItemPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

/// How a work item may occupy a scheduler context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkItemOptions {
    /// No preference
    #[default]
    None,
    /// Cooperative; the item is not guaranteed exclusive use of a core
    TimeSliced,
}

// Win32 priority constants, kept so callers can pass the familiar names.
pub const THREAD_PRIORITY_LOWEST: i32 = -2;
pub const THREAD_PRIORITY_BELOW_NORMAL: i32 = -1;
pub const THREAD_PRIORITY_NORMAL: i32 = 0;
pub const THREAD_PRIORITY_ABOVE_NORMAL: i32 = 1;
pub const THREAD_PRIORITY_HIGHEST: i32 = 2;
pub const THREAD_PRIORITY_TIME_CRITICAL: i32 = 15;
pub const THREAD_PRIORITY_IDLE: i32 = -15;
