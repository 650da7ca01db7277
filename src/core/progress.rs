//! Linear progress state machine for simulated deposits and withdrawals
//!
//! Each flow is a fixed sequence of stages driven by named external triggers
//! (a real event or a "simulate" button). The machine is forward-only:
//! - every trigger is valid from exactly one source stage
//! - a trigger fired from any other stage is ignored, never an error
//! - a stage is never re-entered and there is no cancel or rollback
//!
//! The terminal stage of the deposit flow is what enables the withdrawal
//! flow (`has_active_deposit`). Starting either flow additionally requires the
//! [`PreconditionGate`] to be open; that gate is a separate AND over
//! independent flags and is not part of the stage sequence.

use tracing::{debug, info};

use crate::core::gate::PreconditionGate;
use crate::types::{DashboardError, FlowKind, PaymentMethod, Stage, Trigger};

/// (flow, source stage, trigger, target stage); `None` is the unset state
const TRANSITIONS: [(FlowKind, Option<Stage>, Trigger, Stage); 13] = [
    (FlowKind::BankDeposit, None, Trigger::SubmitTransfer, Stage::Pending),
    (FlowKind::BankDeposit, Some(Stage::Pending), Trigger::SimulateReconciliation, Stage::Reconciled),
    (FlowKind::BankDeposit, Some(Stage::Reconciled), Trigger::SimulateAssignment, Stage::Assigned),
    (FlowKind::CryptoDeposit, None, Trigger::SimulateDetection, Stage::Detected),
    (FlowKind::CryptoDeposit, Some(Stage::Detected), Trigger::SimulateConfirmation, Stage::Confirmed),
    (FlowKind::CryptoDeposit, Some(Stage::Confirmed), Trigger::SimulateAssignment, Stage::Assigned),
    (FlowKind::BankWithdrawal, None, Trigger::RequestWithdrawal, Stage::Received),
    (FlowKind::BankWithdrawal, Some(Stage::Received), Trigger::SimulateScheduling, Stage::Scheduled),
    (FlowKind::BankWithdrawal, Some(Stage::Scheduled), Trigger::SimulateTransfer, Stage::Transferred),
    (FlowKind::BankWithdrawal, Some(Stage::Transferred), Trigger::SimulateFinalization, Stage::Finalized),
    (FlowKind::CryptoWithdrawal, None, Trigger::RequestWithdrawal, Stage::Received),
    (FlowKind::CryptoWithdrawal, Some(Stage::Received), Trigger::SimulateBroadcast, Stage::TxSent),
    (FlowKind::CryptoWithdrawal, Some(Stage::TxSent), Trigger::SimulateFinalization, Stage::Finalized),
];

/// Next stage for `trigger`, or `current` unchanged if it does not apply
pub fn advance(flow: FlowKind, current: Option<Stage>, trigger: Trigger) -> Option<Stage> {
    TRANSITIONS
        .iter()
        .find(|(f, from, t, _)| *f == flow && *from == current && *t == trigger)
        .map(|(_, _, _, to)| Some(*to))
        .unwrap_or(current)
}

/// The trigger that starts `flow` from the unset state
pub fn entry_trigger(flow: FlowKind) -> Trigger {
    TRANSITIONS
        .iter()
        .find(|(f, from, _, _)| *f == flow && from.is_none())
        .map(|(_, _, trigger, _)| *trigger)
        .unwrap_or(Trigger::SubmitTransfer)
}

/// Whether `trigger` appears anywhere in `flow`'s table
pub fn belongs_to(flow: FlowKind, trigger: Trigger) -> bool {
    TRANSITIONS
        .iter()
        .any(|(f, _, t, _)| *f == flow && *t == trigger)
}

/// Outcome of firing a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced { from: Option<Stage>, to: Stage },
    Ignored { current: Option<Stage> },
}

/// Current position in one flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTracker {
    flow: FlowKind,
    current: Option<Stage>,
}

impl ProgressTracker {
    pub fn new(flow: FlowKind) -> Self {
        ProgressTracker {
            flow,
            current: None,
        }
    }

    pub fn flow(&self) -> FlowKind {
        self.flow
    }

    pub fn stage(&self) -> Option<Stage> {
        self.current
    }

    /// Position of the current stage; `None` while unset
    pub fn stage_index(&self) -> Option<usize> {
        let current = self.current?;
        self.flow.stages().iter().position(|stage| *stage == current)
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_some() && self.current == self.flow.stages().last().copied()
    }

    pub fn fire(&mut self, trigger: Trigger) -> Transition {
        let next = advance(self.flow, self.current, trigger);
        match next {
            Some(to) if next != self.current => {
                let from = self.current;
                self.current = next;
                Transition::Advanced { from, to }
            }
            _ => {
                debug!(flow = %self.flow, trigger = %trigger, "trigger ignored in current stage");
                Transition::Ignored {
                    current: self.current,
                }
            }
        }
    }
}

/// Deposit/withdrawal simulation state of one page session
///
/// Lives only as long as the session; a reload starts a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSession {
    method: PaymentMethod,
    deposit: ProgressTracker,
    withdrawal: Option<ProgressTracker>,
    gate: PreconditionGate,
}

impl SimulationSession {
    pub fn new(method: PaymentMethod) -> Self {
        SimulationSession {
            method,
            deposit: ProgressTracker::new(method.deposit_flow()),
            withdrawal: None,
            gate: PreconditionGate::new(),
        }
    }

    pub fn gate(&self) -> &PreconditionGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut PreconditionGate {
        &mut self.gate
    }

    pub fn deposit(&self) -> &ProgressTracker {
        &self.deposit
    }

    pub fn withdrawal(&self) -> Option<&ProgressTracker> {
        self.withdrawal.as_ref()
    }

    /// The deposit has reached its terminal stage
    pub fn has_active_deposit(&self) -> bool {
        self.deposit.is_terminal()
    }

    /// Whether the withdrawal entry screen is available
    pub fn withdrawal_entry_enabled(&self) -> bool {
        self.has_active_deposit()
    }

    fn require_gate(&self, action: &str) -> Result<(), DashboardError> {
        if self.gate.is_open() {
            return Ok(());
        }
        let missing: Vec<&str> = self.gate.missing().iter().map(|p| p.name()).collect();
        Err(DashboardError::action_unavailable(
            action,
            &format!("missing {}", missing.join(", ")),
        ))
    }

    /// Open the withdrawal flow and fire its entry trigger
    ///
    /// # Errors
    ///
    /// `ActionUnavailable` when there is no active deposit or a precondition
    /// is missing. With a withdrawal already open the trigger is ignored.
    pub fn start_withdrawal(&mut self) -> Result<Transition, DashboardError> {
        if !self.withdrawal_entry_enabled() {
            return Err(DashboardError::action_unavailable(
                "start withdrawal",
                "no active deposit",
            ));
        }
        if let Some(withdrawal) = self.withdrawal.as_mut() {
            return Ok(withdrawal.fire(Trigger::RequestWithdrawal));
        }
        self.require_gate("start withdrawal")?;

        let mut tracker = ProgressTracker::new(self.method.withdrawal_flow());
        let transition = tracker.fire(Trigger::RequestWithdrawal);
        info!(flow = %tracker.flow(), "withdrawal started");
        self.withdrawal = Some(tracker);
        Ok(transition)
    }

    /// Route a trigger to the flow it belongs to
    ///
    /// The deposit entry trigger is gated like [`start_withdrawal`]
    /// (`ActionUnavailable` while the gate is closed). Every other trigger
    /// either advances its flow or is ignored.
    ///
    /// [`start_withdrawal`]: SimulationSession::start_withdrawal
    pub fn fire(&mut self, trigger: Trigger) -> Result<Transition, DashboardError> {
        if trigger == Trigger::RequestWithdrawal {
            return self.start_withdrawal();
        }

        if let Some(withdrawal) = self.withdrawal.as_mut() {
            if belongs_to(withdrawal.flow(), trigger) {
                return Ok(withdrawal.fire(trigger));
            }
        }

        if self.deposit.stage().is_none() && trigger == entry_trigger(self.deposit.flow()) {
            self.require_gate("start deposit")?;
        }

        Ok(self.deposit.fire(trigger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::Precondition;
    use rstest::rstest;

    fn ready_session(method: PaymentMethod) -> SimulationSession {
        let mut session = SimulationSession::new(method);
        for precondition in Precondition::ALL {
            session.gate_mut().set(precondition, true);
        }
        session
    }

    #[test]
    fn test_bank_deposit_happy_path() {
        let triggers = [
            Trigger::SubmitTransfer,
            Trigger::SimulateReconciliation,
            Trigger::SimulateAssignment,
        ];
        let mut current = None;
        for trigger in triggers {
            current = advance(FlowKind::BankDeposit, current, trigger);
        }
        assert_eq!(current, Some(Stage::Assigned));
    }

    #[rstest]
    #[case::assignment_from_unset(None, Trigger::SimulateAssignment)]
    #[case::reconciliation_from_unset(None, Trigger::SimulateReconciliation)]
    #[case::resubmit_when_pending(Some(Stage::Pending), Trigger::SubmitTransfer)]
    #[case::skip_ahead(Some(Stage::Pending), Trigger::SimulateAssignment)]
    #[case::after_terminal(Some(Stage::Assigned), Trigger::SimulateReconciliation)]
    #[case::foreign_trigger(Some(Stage::Reconciled), Trigger::SimulateConfirmation)]
    fn test_out_of_order_trigger_is_noop(#[case] current: Option<Stage>, #[case] trigger: Trigger) {
        assert_eq!(advance(FlowKind::BankDeposit, current, trigger), current);
    }

    #[test]
    fn test_every_transition_moves_exactly_one_stage_forward() {
        for (flow, from, _, to) in TRANSITIONS {
            let stages = flow.stages();
            let from_index = from.map(|s| stages.iter().position(|x| *x == s).unwrap());
            let to_index = stages.iter().position(|x| *x == to).unwrap();
            assert_eq!(to_index, from_index.map_or(0, |i| i + 1), "{flow}: {to}");
        }
    }

    #[test]
    fn test_each_trigger_has_one_source_per_flow() {
        for (flow, _, trigger, _) in TRANSITIONS {
            let sources = TRANSITIONS
                .iter()
                .filter(|(f, _, t, _)| *f == flow && *t == trigger)
                .count();
            assert_eq!(sources, 1, "{flow}: {trigger}");
        }
    }

    #[rstest]
    #[case::bank_withdrawal(
        FlowKind::BankWithdrawal,
        vec![Trigger::RequestWithdrawal, Trigger::SimulateScheduling, Trigger::SimulateTransfer, Trigger::SimulateFinalization]
    )]
    #[case::crypto_withdrawal(
        FlowKind::CryptoWithdrawal,
        vec![Trigger::RequestWithdrawal, Trigger::SimulateBroadcast, Trigger::SimulateFinalization]
    )]
    #[case::crypto_deposit(
        FlowKind::CryptoDeposit,
        vec![Trigger::SimulateDetection, Trigger::SimulateConfirmation, Trigger::SimulateAssignment]
    )]
    fn test_tracker_index_is_monotonic(#[case] flow: FlowKind, #[case] triggers: Vec<Trigger>) {
        let mut tracker = ProgressTracker::new(flow);
        let mut last_index = None;
        for trigger in triggers {
            assert!(matches!(tracker.fire(trigger), Transition::Advanced { .. }));
            assert!(tracker.stage_index() > last_index);
            last_index = tracker.stage_index();
            // Replaying the same trigger never moves backwards or forwards
            assert!(matches!(tracker.fire(trigger), Transition::Ignored { .. }));
            assert_eq!(tracker.stage_index(), last_index);
        }
        assert!(tracker.is_terminal());
    }

    #[test]
    fn test_unset_tracker_is_not_terminal() {
        let tracker = ProgressTracker::new(FlowKind::BankDeposit);
        assert_eq!(tracker.stage(), None);
        assert_eq!(tracker.stage_index(), None);
        assert!(!tracker.is_terminal());
    }

    #[test]
    fn test_withdrawal_requires_assigned_deposit() {
        let mut session = ready_session(PaymentMethod::Bank);
        assert!(!session.withdrawal_entry_enabled());
        assert!(session.fire(Trigger::RequestWithdrawal).is_err());

        session.fire(Trigger::SubmitTransfer).unwrap();
        session.fire(Trigger::SimulateReconciliation).unwrap();
        assert!(!session.has_active_deposit());

        session.fire(Trigger::SimulateAssignment).unwrap();
        assert!(session.has_active_deposit());
        assert!(session.withdrawal_entry_enabled());

        let transition = session.fire(Trigger::RequestWithdrawal).unwrap();
        assert_eq!(
            transition,
            Transition::Advanced {
                from: None,
                to: Stage::Received
            }
        );
    }

    #[test]
    fn test_repeated_withdrawal_request_is_ignored() {
        let mut session = ready_session(PaymentMethod::Bank);
        for trigger in [
            Trigger::SubmitTransfer,
            Trigger::SimulateReconciliation,
            Trigger::SimulateAssignment,
            Trigger::RequestWithdrawal,
        ] {
            session.fire(trigger).unwrap();
        }

        assert_eq!(
            session.fire(Trigger::RequestWithdrawal),
            Ok(Transition::Ignored {
                current: Some(Stage::Received)
            })
        );
        assert_eq!(session.withdrawal().and_then(|w| w.stage()), Some(Stage::Received));

        for trigger in [
            Trigger::SimulateScheduling,
            Trigger::SimulateTransfer,
            Trigger::SimulateFinalization,
        ] {
            session.fire(trigger).unwrap();
        }
        assert_eq!(
            session.start_withdrawal(),
            Ok(Transition::Ignored {
                current: Some(Stage::Finalized)
            })
        );
    }

    #[test]
    fn test_closed_gate_blocks_deposit_start() {
        let mut session = SimulationSession::new(PaymentMethod::Crypto);
        session.gate_mut().set(Precondition::ContractSigned, true);

        let error = session.fire(Trigger::SimulateDetection).unwrap_err();
        assert_eq!(
            error,
            DashboardError::action_unavailable("start deposit", "missing kyc, profile, docs")
        );
        assert_eq!(session.deposit().stage(), None);
    }

    #[test]
    fn test_session_routes_triggers_to_withdrawal() {
        let mut session = ready_session(PaymentMethod::Crypto);
        for trigger in [
            Trigger::SimulateDetection,
            Trigger::SimulateConfirmation,
            Trigger::SimulateAssignment,
            Trigger::RequestWithdrawal,
            Trigger::SimulateBroadcast,
        ] {
            session.fire(trigger).unwrap();
        }

        assert_eq!(session.deposit().stage(), Some(Stage::Assigned));
        assert_eq!(session.withdrawal().and_then(|w| w.stage()), Some(Stage::TxSent));

        // Deposit triggers after the fact are ignored, not errors
        assert_eq!(
            session.fire(Trigger::SimulateConfirmation).unwrap(),
            Transition::Ignored {
                current: Some(Stage::Assigned)
            }
        );
    }
}
