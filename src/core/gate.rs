//! Precondition gate for deposit and withdrawal actions
//!
//! Before a client may start a deposit or withdrawal, four independent
//! readiness flags must all hold. They arrive in any order (KYC approval comes
//! from an external status query, the rest are toggled by the client), so this
//! is a plain AND-gate, not a sequence.

use std::fmt;
use std::str::FromStr;

use crate::types::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precondition {
    ContractSigned,
    KycApproved,
    ProfileCompleted,
    DisclosuresAcknowledged,
}

impl Precondition {
    pub const ALL: [Precondition; 4] = [
        Precondition::ContractSigned,
        Precondition::KycApproved,
        Precondition::ProfileCompleted,
        Precondition::DisclosuresAcknowledged,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Precondition::ContractSigned => "contract",
            Precondition::KycApproved => "kyc",
            Precondition::ProfileCompleted => "profile",
            Precondition::DisclosuresAcknowledged => "docs",
        }
    }
}

impl FromStr for Precondition {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contract" | "contract-signed" => Ok(Precondition::ContractSigned),
            "kyc" | "kyc-approved" => Ok(Precondition::KycApproved),
            "profile" | "suitability" | "profile-completed" => Ok(Precondition::ProfileCompleted),
            "docs" | "disclosures" | "disclosures-acknowledged" => {
                Ok(Precondition::DisclosuresAcknowledged)
            }
            _ => Err(DashboardError::UnknownPrecondition {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// AND over the four readiness flags; all start false
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreconditionGate {
    contract_signed: bool,
    kyc_approved: bool,
    profile_completed: bool,
    disclosures_acknowledged: bool,
}

impl PreconditionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, precondition: Precondition, satisfied: bool) {
        let flag = match precondition {
            Precondition::ContractSigned => &mut self.contract_signed,
            Precondition::KycApproved => &mut self.kyc_approved,
            Precondition::ProfileCompleted => &mut self.profile_completed,
            Precondition::DisclosuresAcknowledged => &mut self.disclosures_acknowledged,
        };
        *flag = satisfied;
    }

    pub fn is_satisfied(&self, precondition: Precondition) -> bool {
        match precondition {
            Precondition::ContractSigned => self.contract_signed,
            Precondition::KycApproved => self.kyc_approved,
            Precondition::ProfileCompleted => self.profile_completed,
            Precondition::DisclosuresAcknowledged => self.disclosures_acknowledged,
        }
    }

    /// Feed the result of a KYC status query; only `approved` opens the flag
    pub fn apply_kyc_status(&mut self, status: &str) {
        let approved = status.trim().eq_ignore_ascii_case("approved");
        self.set(Precondition::KycApproved, approved);
    }

    /// True iff every precondition holds
    pub fn is_open(&self) -> bool {
        Precondition::ALL.iter().all(|p| self.is_satisfied(*p))
    }

    /// Preconditions still blocking the action, in checklist order
    pub fn missing(&self) -> Vec<Precondition> {
        Precondition::ALL
            .into_iter()
            .filter(|p| !self.is_satisfied(*p))
            .collect()
    }
}
