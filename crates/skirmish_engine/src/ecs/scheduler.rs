//! System scheduling
//!
//! Systems are grouped by [`SystemPhase`]; inside a phase they run in ascending
//! priority, ties keeping the order in which they were added. Sorting is lazy:
//! adding a system only marks the order dirty and the next phase update
//! re-sorts every phase once.
//!
//! Execution is single-threaded and each update runs to completion before the
//! next one starts.

use std::time::Duration;

use crate::ecs::system::{System, SystemPhase};
use crate::ecs::World;
use crate::foundation::time::{FrameTime, Stopwatch};

/// Registration record describing where a system runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// System name
    pub name: &'static str,
    /// Phase the system belongs to
    pub phase: SystemPhase,
    /// Ordering key inside the phase (ascending)
    pub priority: i32,
    /// Whether the system is skipped while paused
    pub pausable: bool,
}

/// Accumulated timing for one system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProfile {
    /// System name
    pub name: &'static str,
    /// Phase the system belongs to
    pub phase: SystemPhase,
    /// Number of completed updates while profiling was on
    pub calls: u64,
    /// Wall-clock time spent in those updates
    pub total: Duration,
}

impl SystemProfile {
    /// Mean time per update
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / u32::try_from(self.calls).unwrap_or(u32::MAX)
        }
    }
}

struct SystemEntry {
    system: Box<dyn System>,
    priority: i32,
    sequence: u64,
    calls: u64,
    total: Duration,
}

/// Phase-ordered, priority-sorted system runner
pub struct SystemManager {
    phases: Vec<Vec<SystemEntry>>,
    next_sequence: u64,
    dirty: bool,
    profiling: bool,
}

impl SystemManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            phases: SystemPhase::ALL.iter().map(|_| Vec::new()).collect(),
            next_sequence: 0,
            dirty: false,
            profiling: false,
        }
    }

    /// Register an already initialized system
    ///
    /// Use [`World::add_system`] which runs `initialize` first.
    pub(crate) fn insert(&mut self, system: Box<dyn System>, phase: SystemPhase, priority: i32) {
        log::debug!(
            "Registering system {} in {:?} with priority {}",
            system.name(),
            phase,
            priority
        );

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.phases[phase.index()].push(SystemEntry {
            system,
            priority,
            sequence,
            calls: 0,
            total: Duration::ZERO,
        });
        self.dirty = true;
    }

    /// Move systems registered into `other` over to this manager
    ///
    /// They keep their relative add order and land after everything already
    /// registered here.
    pub(crate) fn absorb(&mut self, mut other: SystemManager) {
        let mut incoming: Vec<(SystemPhase, SystemEntry)> = Vec::new();
        for phase in SystemPhase::ALL {
            for entry in other.phases[phase.index()].drain(..) {
                incoming.push((phase, entry));
            }
        }
        if incoming.is_empty() {
            return;
        }

        incoming.sort_by_key(|(_, entry)| entry.sequence);
        for (phase, mut entry) in incoming {
            entry.sequence = self.next_sequence;
            self.next_sequence += 1;
            self.phases[phase.index()].push(entry);
        }
        self.dirty = true;
    }

    /// Run every system of `phase` once against `world`
    ///
    /// Pausable systems are skipped while the world is paused. A failing
    /// system is logged and the phase continues with the next one.
    pub fn update_phase(&mut self, world: &mut World, phase: SystemPhase, time: &FrameTime) {
        self.sort_if_dirty();

        let paused = world.is_paused();
        let profiling = self.profiling;

        for entry in &mut self.phases[phase.index()] {
            if paused && entry.system.is_pausable() {
                continue;
            }

            let stopwatch = profiling.then(Stopwatch::start_new);
            let result = entry.system.update(world, time);

            if let Some(mut stopwatch) = stopwatch {
                stopwatch.stop();
                entry.calls += 1;
                entry.total += stopwatch.elapsed();
            }

            if let Err(err) = result {
                log::error!("System {} failed in {:?}: {}", entry.system.name(), phase, err);
            }
        }
    }

    /// Turn per-system timing on or off
    pub fn set_profiling(&mut self, enabled: bool) {
        self.profiling = enabled;
    }

    /// Whether timings are being collected
    pub fn is_profiling(&self) -> bool {
        self.profiling
    }

    /// Timings per system, in phase and execution order
    pub fn profile_report(&mut self) -> Vec<SystemProfile> {
        self.sort_if_dirty();
        SystemPhase::ALL
            .iter()
            .flat_map(|&phase| {
                self.phases[phase.index()].iter().map(move |entry| SystemProfile {
                    name: entry.system.name(),
                    phase,
                    calls: entry.calls,
                    total: entry.total,
                })
            })
            .collect()
    }

    /// Zero all accumulated timings
    pub fn reset_profile(&mut self) {
        for entry in self.phases.iter_mut().flatten() {
            entry.calls = 0;
            entry.total = Duration::ZERO;
        }
    }

    /// Registered systems in execution order
    pub fn systems(&mut self) -> Vec<SystemInfo> {
        self.sort_if_dirty();
        SystemPhase::ALL
            .iter()
            .flat_map(|&phase| {
                self.phases[phase.index()].iter().map(move |entry| SystemInfo {
                    name: entry.system.name(),
                    phase,
                    priority: entry.priority,
                    pausable: entry.system.is_pausable(),
                })
            })
            .collect()
    }

    /// Total number of registered systems
    pub fn len(&self) -> usize {
        self.phases.iter().map(Vec::len).sum()
    }

    /// True when no system is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every system
    pub fn clear(&mut self) {
        for phase in &mut self.phases {
            phase.clear();
        }
        self.dirty = false;
    }

    fn sort_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        for phase in &mut self.phases {
            // Stable sort keeps insertion order for equal priorities
            phase.sort_by_key(|entry| (entry.priority, entry.sequence));
        }
        self.dirty = false;
    }
}

impl Default for SystemManager {
    fn default() -> Self {
        Self::new()
    }
}
