//! Session state: current/original code and the one-level repair history.

use crate::model::{Patch, RepairSession};

/// Code state owned by the controller. `original_code` always reflects the
/// last text the user authored directly, so a revert can restore it after a
/// repair replaced the displayed code.
pub struct Session {
    current_code: String,
    original_code: String,
    showing_repaired: bool,
    repair: Option<RepairSession>,
}

impl Session {
    pub fn new(initial_code: String) -> Self {
        Self {
            current_code: initial_code.clone(),
            original_code: initial_code,
            showing_repaired: false,
            repair: None,
        }
    }

    pub fn current_code(&self) -> &str {
        &self.current_code
    }

    pub fn patches(&self) -> &[Patch] {
        self.repair.as_ref().map(|r| r.patches.as_slice()).unwrap_or(&[])
    }

    /// Record a user edit. The original-code snapshot follows the edit unless
    /// the session is currently displaying a repaired result.
    pub fn edit(&mut self, code: String) {
        self.current_code = code;
        if !self.showing_repaired {
            self.original_code = self.current_code.clone();
        }
    }

    /// Apply a completed repair: the repaired code becomes current and the
    /// patch set replaces any previous one.
    pub fn apply_repair(&mut self, repair: RepairSession) {
        self.current_code = repair.final_code.clone();
        self.showing_repaired = true;
        self.repair = Some(repair);
    }

    /// Restore the pre-repair snapshot and discard the patch set. Returns
    /// false (and changes nothing) when no repair has been applied.
    pub fn revert(&mut self) -> bool {
        if self.repair.take().is_none() {
            return false;
        }
        self.current_code = self.original_code.clone();
        self.showing_repaired = false;
        true
    }
}
