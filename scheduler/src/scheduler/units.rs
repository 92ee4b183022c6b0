use super::task::Task;
use crate::error::ProviderError;
use std::{collections::HashMap, fmt};

/// Opaque handle to an execution unit owned by an [`ExecutionProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitHandle(u64);

impl UnitHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Priority requested from the provider when a unit is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPriority {
    Highest,
    Normal,
}

impl UnitPriority {
    pub fn for_task(task: &Task) -> Self {
        if task.is_real_time() {
            UnitPriority::Highest
        } else {
            UnitPriority::Normal
        }
    }
}

/// The capability that actually occupies a schedulable slot on behalf of a
/// task. The dispatcher only sequences these four calls and never looks
/// inside a unit.
pub trait ExecutionProvider: Send {
    fn create(&mut self, task: &Task, priority: UnitPriority) -> Result<UnitHandle, ProviderError>;
    fn suspend(&mut self, unit: UnitHandle) -> Result<(), ProviderError>;
    fn resume(&mut self, unit: UnitHandle) -> Result<(), ProviderError>;
    fn destroy(&mut self, unit: UnitHandle) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Running,
    Suspended,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Running => f.write_str("running"),
            UnitState::Suspended => f.write_str("suspended"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitStats {
    pub created: u64,
    pub suspended: u64,
    pub resumed: u64,
    pub destroyed: u64,
}

#[derive(Debug)]
struct UnitEntry {
    task_name: String,
    priority: UnitPriority,
    state: UnitState,
}

/// In-process provider: each unit is just a state flag.
#[derive(Debug, Default)]
pub struct SimulatedUnits {
    next_handle: u64,
    units: HashMap<UnitHandle, UnitEntry>,
    stats: UnitStats,
}

impl SimulatedUnits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> UnitStats {
        self.stats
    }

    pub fn live_units(&self) -> usize {
        self.units.len()
    }

    pub fn state(&self, unit: UnitHandle) -> Option<UnitState> {
        self.units.get(&unit).map(|entry| entry.state)
    }

    pub fn priority(&self, unit: UnitHandle) -> Option<UnitPriority> {
        self.units.get(&unit).map(|entry| entry.priority)
    }

    pub fn task_name(&self, unit: UnitHandle) -> Option<&str> {
        self.units.get(&unit).map(|entry| entry.task_name.as_str())
    }

    fn transition(
        &mut self,
        unit: UnitHandle,
        from: UnitState,
        to: UnitState,
        operation: &'static str,
    ) -> Result<(), ProviderError> {
        let entry = self
            .units
            .get_mut(&unit)
            .ok_or(ProviderError::UnknownUnit(unit))?;
        if entry.state != from {
            return Err(ProviderError::InvalidTransition {
                unit,
                state: entry.state,
                operation,
            });
        }
        entry.state = to;
        Ok(())
    }
}

impl ExecutionProvider for SimulatedUnits {
    fn create(&mut self, task: &Task, priority: UnitPriority) -> Result<UnitHandle, ProviderError> {
        self.next_handle += 1;
        let unit = UnitHandle(self.next_handle);
        self.units.insert(
            unit,
            UnitEntry {
                task_name: task.name().to_owned(),
                priority,
                state: UnitState::Running,
            },
        );
        self.stats.created += 1;
        Ok(unit)
    }

    fn suspend(&mut self, unit: UnitHandle) -> Result<(), ProviderError> {
        self.transition(unit, UnitState::Running, UnitState::Suspended, "suspend")?;
        self.stats.suspended += 1;
        Ok(())
    }

    fn resume(&mut self, unit: UnitHandle) -> Result<(), ProviderError> {
        self.transition(unit, UnitState::Suspended, UnitState::Running, "resume")?;
        self.stats.resumed += 1;
        Ok(())
    }

    fn destroy(&mut self, unit: UnitHandle) -> Result<(), ProviderError> {
        self.units
            .remove(&unit)
            .ok_or(ProviderError::UnknownUnit(unit))?;
        self.stats.destroyed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::task::TaskSpec;

    #[test]
    fn unit_lifecycle_is_tracked() {
        let mut units = SimulatedUnits::new();
        let task = Task::new(0, TaskSpec::new(0, 0, 1));
        let unit = units.create(&task, UnitPriority::for_task(&task)).unwrap();

        assert_eq!(units.state(unit), Some(UnitState::Running));
        assert_eq!(units.priority(unit), Some(UnitPriority::Highest));
        assert_eq!(units.task_name(unit), Some("T0"));

        units.suspend(unit).unwrap();
        assert_eq!(units.state(unit), Some(UnitState::Suspended));
        units.resume(unit).unwrap();
        units.destroy(unit).unwrap();

        assert_eq!(units.live_units(), 0);
        assert_eq!(
            units.stats(),
            UnitStats {
                created: 1,
                suspended: 1,
                resumed: 1,
                destroyed: 1,
            }
        );
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut units = SimulatedUnits::new();
        let task = Task::new(0, TaskSpec::new(0, 2, 1));
        let unit = units.create(&task, UnitPriority::for_task(&task)).unwrap();

        assert!(matches!(
            units.resume(unit),
            Err(ProviderError::InvalidTransition {
                state: UnitState::Running,
                ..
            })
        ));
        units.destroy(unit).unwrap();
        assert!(matches!(
            units.suspend(unit),
            Err(ProviderError::UnknownUnit(_))
        ));
    }
}
