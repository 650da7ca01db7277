//! Deposit and withdrawal progress types
//!
//! A flow is an ordered list of named stages. The transition table that moves
//! between them lives in [`crate::core::progress`].

use std::fmt;
use std::str::FromStr;

use super::error::DashboardError;

/// How the client moves money in and out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Bank,
    Crypto,
}

impl PaymentMethod {
    pub fn deposit_flow(self) -> FlowKind {
        match self {
            PaymentMethod::Bank => FlowKind::BankDeposit,
            PaymentMethod::Crypto => FlowKind::CryptoDeposit,
        }
    }

    pub fn withdrawal_flow(self) -> FlowKind {
        match self {
            PaymentMethod::Bank => FlowKind::BankWithdrawal,
            PaymentMethod::Crypto => FlowKind::CryptoWithdrawal,
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bank" | "transfer" | "iban" => Ok(PaymentMethod::Bank),
            "crypto" | "usdc" | "wallet" => Ok(PaymentMethod::Crypto),
            _ => Err(DashboardError::UnknownFlow {
                name: s.to_string(),
            }),
        }
    }
}

/// Payment-method specific lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// Bank transfer deposit: Pending → Reconciled → Assigned
    BankDeposit,
    /// Crypto deposit: Detected → Confirmed → Assigned
    CryptoDeposit,
    /// Bank withdrawal: Received → Scheduled → Transferred → Finalized
    BankWithdrawal,
    /// Crypto withdrawal: Received → TxSent → Finalized
    CryptoWithdrawal,
}

impl FlowKind {
    /// Stages in order; the last one is terminal
    pub fn stages(self) -> &'static [Stage] {
        match self {
            FlowKind::BankDeposit => &[Stage::Pending, Stage::Reconciled, Stage::Assigned],
            FlowKind::CryptoDeposit => &[Stage::Detected, Stage::Confirmed, Stage::Assigned],
            FlowKind::BankWithdrawal => &[
                Stage::Received,
                Stage::Scheduled,
                Stage::Transferred,
                Stage::Finalized,
            ],
            FlowKind::CryptoWithdrawal => &[Stage::Received, Stage::TxSent, Stage::Finalized],
        }
    }

    pub fn is_deposit(self) -> bool {
        matches!(self, FlowKind::BankDeposit | FlowKind::CryptoDeposit)
    }
}

impl FromStr for FlowKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "bank-deposit" => Ok(FlowKind::BankDeposit),
            "crypto-deposit" => Ok(FlowKind::CryptoDeposit),
            "bank-withdrawal" => Ok(FlowKind::BankWithdrawal),
            "crypto-withdrawal" => Ok(FlowKind::CryptoWithdrawal),
            _ => Err(DashboardError::UnknownFlow {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowKind::BankDeposit => "bank-deposit",
            FlowKind::CryptoDeposit => "crypto-deposit",
            FlowKind::BankWithdrawal => "bank-withdrawal",
            FlowKind::CryptoWithdrawal => "crypto-withdrawal",
        };
        f.write_str(name)
    }
}

/// A named point in a linear progress sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Pending,
    Reconciled,
    Detected,
    Confirmed,
    Assigned,
    Received,
    Scheduled,
    Transferred,
    TxSent,
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "Pending",
            Stage::Reconciled => "Reconciled",
            Stage::Detected => "Detected",
            Stage::Confirmed => "Confirmed",
            Stage::Assigned => "Assigned",
            Stage::Received => "Received",
            Stage::Scheduled => "Scheduled",
            Stage::Transferred => "Transferred",
            Stage::TxSent => "TxSent",
            Stage::Finalized => "Finalized",
        };
        f.write_str(name)
    }
}

/// External event that may advance a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    SubmitTransfer,
    SimulateReconciliation,
    SimulateDetection,
    SimulateConfirmation,
    SimulateAssignment,
    RequestWithdrawal,
    SimulateScheduling,
    SimulateTransfer,
    SimulateBroadcast,
    SimulateFinalization,
}

impl Trigger {
    pub fn name(self) -> &'static str {
        match self {
            Trigger::SubmitTransfer => "submit transfer",
            Trigger::SimulateReconciliation => "simulate reconciliation",
            Trigger::SimulateDetection => "simulate detection",
            Trigger::SimulateConfirmation => "simulate confirmation",
            Trigger::SimulateAssignment => "simulate assignment",
            Trigger::RequestWithdrawal => "request withdrawal",
            Trigger::SimulateScheduling => "simulate scheduling",
            Trigger::SimulateTransfer => "simulate transfer",
            Trigger::SimulateBroadcast => "simulate broadcast",
            Trigger::SimulateFinalization => "simulate finalization",
        }
    }

    const ALL: [Trigger; 10] = [
        Trigger::SubmitTransfer,
        Trigger::SimulateReconciliation,
        Trigger::SimulateDetection,
        Trigger::SimulateConfirmation,
        Trigger::SimulateAssignment,
        Trigger::RequestWithdrawal,
        Trigger::SimulateScheduling,
        Trigger::SimulateTransfer,
        Trigger::SimulateBroadcast,
        Trigger::SimulateFinalization,
    ];
}

/// Accepts `"simulate reconciliation"`, `"simulate-reconciliation"` or
/// `"simulate_reconciliation"`, any case
impl FromStr for Trigger {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Trigger::ALL
            .into_iter()
            .find(|trigger| trigger.name() == normalized)
            .ok_or_else(|| DashboardError::UnknownTrigger {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
