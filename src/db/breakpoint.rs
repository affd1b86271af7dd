use super::expr::DbExpr;
use crate::proc::Msp430;
use std::collections::BTreeMap;

//===========================================================================//

/// A breakpoint condition, along with the text it was compiled from.
#[derive(Clone, Debug)]
pub struct Condition {
    /// The expression as the user typed it.
    pub source: String,
    /// The compiled boolean expression.
    pub expr: DbExpr,
}

/// A single breakpoint.
#[derive(Clone, Debug)]
pub struct Breakpoint {
    /// How many more times the breakpoint may trigger before it is removed,
    /// or `None` for a permanent breakpoint.
    pub hits_left: Option<u32>,
    /// If set, the breakpoint only triggers when this evaluates to true.
    pub condition: Option<Condition>,
}

//===========================================================================//

/// The set of breakpoints, keyed by address.
#[derive(Debug, Default)]
pub struct BreakpointSet {
    breakpoints: BTreeMap<u16, Breakpoint>,
}

impl BreakpointSet {
    /// Returns an empty breakpoint set.
    pub fn new() -> BreakpointSet {
        BreakpointSet::default()
    }

    /// Sets a permanent breakpoint at `addr`, replacing any breakpoint
    /// already there.
    pub fn set_permanent(&mut self, addr: u16, condition: Option<Condition>) {
        self.breakpoints
            .insert(addr, Breakpoint { hits_left: None, condition });
    }

    /// Sets a breakpoint at `addr` that triggers `count` times and is then
    /// removed.  Any condition on an existing breakpoint is kept.
    pub fn set_temporary(&mut self, addr: u16, count: u32) {
        debug_assert!(count > 0);
        let breakpoint = self
            .breakpoints
            .entry(addr)
            .or_insert(Breakpoint { hits_left: None, condition: None });
        breakpoint.hits_left = Some(count);
    }

    /// Removes the breakpoint at `addr`.  Returns false if there was none.
    pub fn remove(&mut self, addr: u16) -> bool {
        self.breakpoints.remove(&addr).is_some()
    }

    /// Removes every breakpoint.
    pub fn clear(&mut self) {
        self.breakpoints.clear();
    }

    /// Returns the breakpoint at `addr`, if any.
    pub fn get(&self, addr: u16) -> Option<&Breakpoint> {
        self.breakpoints.get(&addr)
    }

    /// Returns true if there are no breakpoints.
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Iterates over all breakpoints in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Breakpoint)> {
        self.breakpoints.iter().map(|(&addr, bp)| (addr, bp))
    }

    /// Decides whether execution should stop at `pc`.  A breakpoint whose
    /// condition is false is not hit and keeps its remaining count; a
    /// temporary breakpoint on its last hit is removed.
    pub fn check(&mut self, pc: u16, cpu: &Msp430) -> bool {
        let Some(breakpoint) = self.breakpoints.get_mut(&pc) else {
            return false;
        };
        if let Some(condition) = &breakpoint.condition {
            if !condition.expr.evaluate(cpu).unwrap_bool() {
                return false;
            }
        }
        let last_hit = match &mut breakpoint.hits_left {
            None => false,
            Some(1) => true,
            Some(count) => {
                *count -= 1;
                false
            }
        };
        if last_hit {
            self.breakpoints.remove(&pc);
        }
        true
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{BreakpointSet, Condition};
    use crate::bus::Ram64k;
    use crate::db::DbExpr;
    use crate::proc::Msp430;

    fn condition(source: &str) -> Condition {
        Condition {
            source: source.to_string(),
            expr: DbExpr::compile(source).unwrap(),
        }
    }

    #[test]
    fn permanent_breakpoint_always_triggers() {
        let cpu = Msp430::new(Ram64k::new());
        let mut breakpoints = BreakpointSet::new();
        breakpoints.set_permanent(0x4400, None);
        for _ in 0..3 {
            assert!(breakpoints.check(0x4400, &cpu));
        }
        assert!(!breakpoints.check(0x4402, &cpu));
        assert!(breakpoints.get(0x4400).is_some());
    }

    #[test]
    fn single_hit_breakpoint_is_removed() {
        let cpu = Msp430::new(Ram64k::new());
        let mut breakpoints = BreakpointSet::new();
        breakpoints.set_temporary(0x4400, 1);
        assert!(breakpoints.check(0x4400, &cpu));
        assert!(breakpoints.is_empty());
        assert!(!breakpoints.check(0x4400, &cpu));
    }

    #[test]
    fn counted_breakpoint() {
        let cpu = Msp430::new(Ram64k::new());
        let mut breakpoints = BreakpointSet::new();
        breakpoints.set_temporary(0x4400, 2);
        assert!(breakpoints.check(0x4400, &cpu));
        assert_eq!(breakpoints.get(0x4400).unwrap().hits_left, Some(1));
        assert!(breakpoints.check(0x4400, &cpu));
        assert!(!breakpoints.check(0x4400, &cpu));
    }

    #[test]
    fn conditional_breakpoint() {
        let mut cpu = Msp430::new(Ram64k::new());
        let mut breakpoints = BreakpointSet::new();
        breakpoints.set_permanent(0x4400, Some(condition("r15 == 3")));
        assert!(!breakpoints.check(0x4400, &cpu));
        cpu.registers_mut().set(15, 3);
        assert!(breakpoints.check(0x4400, &cpu));
    }

    #[test]
    fn false_condition_keeps_count() {
        let mut cpu = Msp430::new(Ram64k::new());
        let mut breakpoints = BreakpointSet::new();
        breakpoints.set_permanent(0x4400, Some(condition("carry")));
        breakpoints.set_temporary(0x4400, 1);
        assert!(!breakpoints.check(0x4400, &cpu));
        assert_eq!(breakpoints.get(0x4400).unwrap().hits_left, Some(1));
        cpu.registers_mut().set(2, 1);
        assert!(breakpoints.check(0x4400, &cpu));
        assert!(breakpoints.is_empty());
    }

    #[test]
    fn listing_is_sorted() {
        let mut breakpoints = BreakpointSet::new();
        breakpoints.set_permanent(0x4500, None);
        breakpoints.set_permanent(0x4400, None);
        let addrs: Vec<u16> =
            breakpoints.iter().map(|(addr, _)| addr).collect();
        assert_eq!(addrs, vec![0x4400, 0x4500]);
        assert!(breakpoints.remove(0x4400));
        assert!(!breakpoints.remove(0x4400));
        breakpoints.clear();
        assert!(breakpoints.is_empty());
    }
}

//===========================================================================//
