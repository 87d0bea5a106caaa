//! The state register: the single owned home of the controller state.
//!
//! The current [`State`], the `stabilizing` / `throwing_water` flags and the
//! completed-snub counter live behind one mutex.  Every transition computes
//! the successor, hands its command byte to the caller's writer **while the
//! lock is held**, and commits the successor only if the write succeeded:
//!
//! ```text
//!   lock ─▶ successor = table(state) ─▶ writer(successor byte) ─┬─ Ok  ─▶ commit ─▶ unlock
//!                                                              └─ Err ─▶ keep   ─▶ unlock
//! ```
//!
//! The in-memory state therefore never runs ahead of the last command the
//! device accepted, and wire writes appear in the same order as the
//! transitions that produced them.
//!
//! Lock order is register → serial link.  Nothing that holds the link lock
//! may call into the register.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use super::{State, Table};
use crate::error::{Error, Result};

/// Transient controller flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// A delayed accelerate → brake transition is in progress.
    Stabilizing,
    /// A water cooling sub-cycle is in progress.
    ThrowingWater,
}

/// Consistent point-in-time copy of the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub state: State,
    pub stabilizing: bool,
    pub throwing_water: bool,
    pub completed_snubs: u32,
}

/// Result of one committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: State,
    pub to: State,
    /// `Some(n)` when this transition completed the n-th snub
    /// (cool-down → accelerate on the `next` table).
    pub snub: Option<u32>,
}

#[derive(Debug)]
struct Registers {
    state: State,
    stabilizing: bool,
    throwing_water: bool,
    completed_snubs: u32,
}

impl Registers {
    fn flag_mut(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::Stabilizing => &mut self.stabilizing,
            Flag::ThrowingWater => &mut self.throwing_water,
        }
    }
}

/// Mutex-protected controller state, shared by reference with every task.
#[derive(Debug)]
pub struct StateRegister {
    cell: Mutex<Registers>,
}

impl StateRegister {
    pub fn new(initial: State) -> Self {
        Self {
            cell: Mutex::new(Registers {
                state: initial,
                stabilizing: false,
                throwing_water: false,
                completed_snubs: 0,
            }),
        }
    }

    /// Current state.
    pub fn read(&self) -> State {
        self.lock().state
    }

    pub fn snapshot(&self) -> Snapshot {
        let regs = self.lock();
        Snapshot {
            state: regs.state,
            stabilizing: regs.stabilizing,
            throwing_water: regs.throwing_water,
            completed_snubs: regs.completed_snubs,
        }
    }

    /// Set `flag` if it is clear.  Returns `None` when someone else holds it.
    /// The flag is cleared again when the returned claim is dropped.
    pub fn claim(&self, flag: Flag) -> Option<FlagClaim<'_>> {
        let mut regs = self.lock();
        let slot = regs.flag_mut(flag);
        if *slot {
            return None;
        }
        *slot = true;
        debug!("Register: {:?} claimed", flag);
        Some(FlagClaim {
            register: self,
            flag,
        })
    }

    /// Move to the next step of the snub cycle.
    pub fn advance<W>(&self, writer: W) -> Result<Transition>
    where
        W: FnOnce(u8) -> Result<()>,
    {
        self.apply(Table::Next, writer)
    }

    /// Switch to the water-suffixed counterpart of the current state.
    pub fn begin_water<W>(&self, writer: W) -> Result<Transition>
    where
        W: FnOnce(u8) -> Result<()>,
    {
        self.apply(Table::WaterOn, writer)
    }

    /// Switch back to the dry counterpart of the current state.
    pub fn end_water<W>(&self, writer: W) -> Result<Transition>
    where
        W: FnOnce(u8) -> Result<()>,
    {
        self.apply(Table::WaterOff, writer)
    }

    /// Look the current state up in `table` and transition to the result.
    /// Any writer error, including a withheld write, leaves the state as is.
    pub fn apply<W>(&self, table: Table, writer: W) -> Result<Transition>
    where
        W: FnOnce(u8) -> Result<()>,
    {
        let mut regs = self.lock();
        let from = regs.state;
        let to = table
            .apply(from)
            .ok_or(Error::UnmappedState { state: from, table })?;
        writer(to.wire_command())?;
        regs.state = to;

        let snub = if table == Table::Next
            && matches!(from, State::CoolDown | State::CoolDownWater)
        {
            regs.completed_snubs = regs.completed_snubs.saturating_add(1);
            Some(regs.completed_snubs)
        } else {
            None
        };

        Ok(Transition { from, to, snub })
    }

    /// Transition to an explicit target regardless of the tables
    /// (fail-safe cool-down, shutdown).
    pub fn force<W>(&self, target: State, writer: W) -> Result<Transition>
    where
        W: FnOnce(u8) -> Result<()>,
    {
        let mut regs = self.lock();
        let from = regs.state;
        writer(target.wire_command())?;
        regs.state = target;
        Ok(Transition {
            from,
            to: target,
            snub: None,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Registers> {
        // Fields are only ever replaced whole, so a poisoned value is still consistent.
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ownership of a controller flag.  Clears the flag on drop.
#[must_use = "dropping the claim releases the flag immediately"]
#[derive(Debug)]
pub struct FlagClaim<'a> {
    register: &'a StateRegister,
    flag: Flag,
}

impl Drop for FlagClaim<'_> {
    fn drop(&mut self) {
        *self.register.lock().flag_mut(self.flag) = false;
        debug!("Register: {:?} released", self.flag);
    }
}
