use std::fmt;
use std::time::Duration;

/// Task priority, most urgent first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SchedulerPriority {
    Immediate = 1,
    UserBlocking = 2,
    #[default]
    Normal = 3,
    Low = 4,
    Idle = 5,
}

impl SchedulerPriority {
    pub const ALL: [SchedulerPriority; 5] = [
        SchedulerPriority::Immediate,
        SchedulerPriority::UserBlocking,
        SchedulerPriority::Normal,
        SchedulerPriority::Low,
        SchedulerPriority::Idle,
    ];

    /// Time after which a queued task of this priority counts as late.
    pub fn timeout(self) -> Duration {
        match self {
            SchedulerPriority::Immediate => Duration::ZERO,
            SchedulerPriority::UserBlocking => Duration::from_millis(250),
            SchedulerPriority::Normal => Duration::from_secs(5),
            SchedulerPriority::Low => Duration::from_secs(10),
            SchedulerPriority::Idle => Duration::from_secs(300),
        }
    }

    /// True when `self` must run before `other`.
    pub fn is_more_urgent_than(self, other: SchedulerPriority) -> bool {
        self < other
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(SchedulerPriority::Immediate),
            2 => Some(SchedulerPriority::UserBlocking),
            3 => Some(SchedulerPriority::Normal),
            4 => Some(SchedulerPriority::Low),
            5 => Some(SchedulerPriority::Idle),
            _ => None,
        }
    }
}

impl fmt::Display for SchedulerPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerPriority::Immediate => "immediate",
            SchedulerPriority::UserBlocking => "user-blocking",
            SchedulerPriority::Normal => "normal",
            SchedulerPriority::Low => "low",
            SchedulerPriority::Idle => "idle",
        };
        f.write_str(name)
    }
}
