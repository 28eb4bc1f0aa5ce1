use {super::*, std::str::FromStr};

/// the cumulative time the host's cpus have spent in each state, summed across all cpus.
///
/// these are the first seven fields of the aggregate line in `/proc/stat`, in order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CpuTime {
    /// time spent in user mode.
    pub user: UserHz,
    /// time spent in user mode with low priority (nice).
    pub nice: UserHz,
    /// time spent in system mode.
    pub system: UserHz,
    /// time spent in the idle task.
    ///
    /// this value should be USER_HZ times the second entry in the /proc/uptime pseudo-file.
    pub idle: UserHz,
    /// time waiting for i/o to complete.
    ///
    /// this value is not reliable, for the following reasons:
    ///   *  the cpu will not wait for i/o to complete; iowait is the time that a task is waiting
    ///      for i/o to complete. when a cpu goes into idle state for outstanding task i/o,
    ///      another task will be scheduled on this cpu.
    ///   *  on a multi-core cpu, the task waiting for i/o to complete is not running on any cpu,
    ///      so the iowait of each cpu is difficult to calculate.
    ///   *  the value in this field may decrease in certain conditions.
    pub iowait: UserHz,
    /// time servicing interrupts.
    pub irq: UserHz,
    /// time servicing softirqs.
    pub softirq: UserHz,
}

// === impl CpuTime ===

impl CpuTime {
    /// the number of fields parsed from the aggregate line.
    pub const FIELDS: usize = 7;

    /// returns the time the cpus spent doing work.
    pub fn work(&self) -> UserHz {
        let Self {
            user,
            nice,
            system,
            irq,
            softirq,
            idle: _,   // do not count idle time...
            iowait: _, // ...nor time spent waiting on i/o.
        } = *self;

        user + nice + system + irq + softirq
    }
}

impl FromStr for CpuTime {
    type Err = EntryParseError;
    /// parses the whitespace-separated fields that follow the `cpu` header.
    fn from_str(fields: &str) -> Result<Self, Self::Err> {
        fields
            .split_whitespace()
            .take(Self::FIELDS)
            .map(str::parse::<UserHz>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(EntryParseError::UserHzParse)
            .and_then(CpuTime::try_from)
    }
}

impl TryFrom<Vec<UserHz>> for CpuTime {
    type Error = EntryParseError;
    fn try_from(times: Vec<UserHz>) -> Result<Self, Self::Error> {
        <_ as TryInto<[_; CpuTime::FIELDS]>>::try_into(times)
            .map(Self::from)
            .map_err(|times| EntryParseError::CpuTime { found: times.len() })
    }
}

impl From<[UserHz; CpuTime::FIELDS]> for CpuTime {
    fn from([user, nice, system, idle, iowait, irq, softirq]: [UserHz; CpuTime::FIELDS]) -> Self {
        Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
        }
    }
}
