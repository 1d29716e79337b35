//! System onboarding workflow
//!
//! Setup of the system is handed from role to role:
//!
//! ```text
//! super_admin → office_admin → hr_manager → completed
//! ```
//!
//! Each phase is owned by one role. Only the owner (or a super_admin) may
//! advance it, and only to the immediately following phase. The persisted
//! state lives in `db::onboarding`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::roles::Role;

/// Onboarding phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SuperAdmin,
    OfficeAdmin,
    HrManager,
    Completed,
}

/// Rejected onboarding transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot move onboarding from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("The {phase} phase is owned by another role; {role} cannot advance it")]
    NotPhaseOwner { phase: Phase, role: Role },
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::SuperAdmin,
        Phase::OfficeAdmin,
        Phase::HrManager,
        Phase::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::SuperAdmin => "super_admin",
            Phase::OfficeAdmin => "office_admin",
            Phase::HrManager => "hr_manager",
            Phase::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Phase::ALL.into_iter().find(|phase| phase.as_str() == value)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::SuperAdmin => Some(Phase::OfficeAdmin),
            Phase::OfficeAdmin => Some(Phase::HrManager),
            Phase::HrManager => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    /// Role that owns setup during this phase
    pub fn owner(&self) -> Option<Role> {
        match self {
            Phase::SuperAdmin => Some(Role::SuperAdmin),
            Phase::OfficeAdmin => Some(Role::OfficeAdmin),
            Phase::HrManager => Some(Role::HrManager),
            Phase::Completed => None,
        }
    }

    /// 0, 33, 67, 100
    pub fn progress_percent(&self) -> u8 {
        let last = Phase::Completed.index();
        ((self.index() * 100 + last / 2) / last) as u8
    }

    /// True once the workflow is at or past `phase`
    pub fn reached(&self, phase: Phase) -> bool {
        *self >= phase
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed-transition guard for advancing the workflow
///
/// `to` must be the phase directly after `from`, and `actor` must own
/// `from` or be a super_admin.
pub fn check_transition(from: Phase, to: Phase, actor: Role) -> Result<(), TransitionError> {
    if from.next() != Some(to) {
        return Err(TransitionError::InvalidTransition { from, to });
    }

    if actor != Role::SuperAdmin && from.owner() != Some(actor) {
        return Err(TransitionError::NotPhaseOwner {
            phase: from,
            role: actor,
        });
    }

    Ok(())
}

/// Guard for sending the workflow back to the first phase
pub fn check_reset(from: Phase, actor: Role) -> Result<(), TransitionError> {
    if actor != Role::SuperAdmin {
        return Err(TransitionError::NotPhaseOwner {
            phase: from,
            role: actor,
        });
    }

    if from == Phase::SuperAdmin {
        return Err(TransitionError::InvalidTransition {
            from,
            to: Phase::SuperAdmin,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phase = Phase::SuperAdmin;
        let mut visited = vec![phase];
        while let Some(next) = phase.next() {
            visited.push(next);
            phase = next;
        }
        assert_eq!(visited, Phase::ALL.to_vec());
    }

    #[test]
    fn test_progress_percent() {
        let percents: Vec<u8> = Phase::ALL.iter().map(Phase::progress_percent).collect();
        assert_eq!(percents, vec![0, 33, 67, 100]);
    }

    #[test]
    fn test_owner_may_advance_one_step() {
        assert!(check_transition(Phase::SuperAdmin, Phase::OfficeAdmin, Role::SuperAdmin).is_ok());
        assert!(check_transition(Phase::OfficeAdmin, Phase::HrManager, Role::OfficeAdmin).is_ok());
        assert!(check_transition(Phase::HrManager, Phase::Completed, Role::HrManager).is_ok());
    }

    #[test]
    fn test_super_admin_may_advance_any_phase() {
        assert!(check_transition(Phase::OfficeAdmin, Phase::HrManager, Role::SuperAdmin).is_ok());
        assert!(check_transition(Phase::HrManager, Phase::Completed, Role::SuperAdmin).is_ok());
    }

    #[test]
    fn test_skipping_and_going_back_rejected() {
        assert_eq!(
            check_transition(Phase::SuperAdmin, Phase::HrManager, Role::SuperAdmin),
            Err(TransitionError::InvalidTransition {
                from: Phase::SuperAdmin,
                to: Phase::HrManager
            })
        );
        assert!(check_transition(Phase::HrManager, Phase::OfficeAdmin, Role::SuperAdmin).is_err());
        assert!(check_transition(Phase::OfficeAdmin, Phase::OfficeAdmin, Role::OfficeAdmin).is_err());
        assert!(check_transition(Phase::Completed, Phase::Completed, Role::SuperAdmin).is_err());
    }

    #[test]
    fn test_non_owner_rejected() {
        assert_eq!(
            check_transition(Phase::SuperAdmin, Phase::OfficeAdmin, Role::OfficeAdmin),
            Err(TransitionError::NotPhaseOwner {
                phase: Phase::SuperAdmin,
                role: Role::OfficeAdmin
            })
        );
        assert!(check_transition(Phase::OfficeAdmin, Phase::HrManager, Role::HrManager).is_err());
        assert!(check_transition(Phase::HrManager, Phase::Completed, Role::Employee).is_err());
    }

    #[test]
    fn test_reset_rules() {
        assert!(check_reset(Phase::Completed, Role::SuperAdmin).is_ok());
        assert!(check_reset(Phase::HrManager, Role::SuperAdmin).is_ok());
        assert!(check_reset(Phase::SuperAdmin, Role::SuperAdmin).is_err());
        assert!(check_reset(Phase::Completed, Role::OfficeAdmin).is_err());
    }

    #[test]
    fn test_reached() {
        assert!(Phase::HrManager.reached(Phase::OfficeAdmin));
        assert!(Phase::HrManager.reached(Phase::HrManager));
        assert!(!Phase::OfficeAdmin.reached(Phase::HrManager));
        assert!(Phase::Completed.reached(Phase::HrManager));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Phase::parse("hr_manager"), Some(Phase::HrManager));
        assert_eq!(Phase::parse("done"), None);
    }
}
