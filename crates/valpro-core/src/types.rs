use crate::error::ValproError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalise user input such as `OPEN_FOR_BIDS`, `open-for-bids` or
/// `Open for Bids` into the snake_case wire form.
fn normalize(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}

// ---------------------------------------------------------------------------
// UserType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Valuer,
    Company,
    Client,
    Admin,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Valuer => "valuer",
            UserType::Company => "company",
            UserType::Client => "client",
            UserType::Admin => "admin",
        }
    }

    /// Clients and companies both commission valuations.
    pub fn can_commission(self) -> bool {
        matches!(self, UserType::Client | UserType::Company)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserType {
    type Err = ValproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "valuer" => Ok(UserType::Valuer),
            "company" => Ok(UserType::Company),
            "client" => Ok(UserType::Client),
            "admin" => Ok(UserType::Admin),
            _ => Err(ValproError::UnknownValue {
                kind: "user type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    PendingPayment,
    OpenForBids,
    New,
    InProgress,
    RevisionsRequested,
    ReportReady,
    PendingClientSignature,
    PendingValuerSignature,
    PendingFinalSignature,
    Completed,
}

impl JobStatus {
    pub fn all() -> &'static [JobStatus] {
        &[
            JobStatus::PendingPayment,
            JobStatus::OpenForBids,
            JobStatus::New,
            JobStatus::InProgress,
            JobStatus::RevisionsRequested,
            JobStatus::ReportReady,
            JobStatus::PendingClientSignature,
            JobStatus::PendingValuerSignature,
            JobStatus::PendingFinalSignature,
            JobStatus::Completed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::PendingPayment => "pending_payment",
            JobStatus::OpenForBids => "open_for_bids",
            JobStatus::New => "new",
            JobStatus::InProgress => "in_progress",
            JobStatus::RevisionsRequested => "revisions_requested",
            JobStatus::ReportReady => "report_ready",
            JobStatus::PendingClientSignature => "pending_client_signature",
            JobStatus::PendingValuerSignature => "pending_valuer_signature",
            JobStatus::PendingFinalSignature => "pending_final_signature",
            JobStatus::Completed => "completed",
        }
    }

    /// Human-facing label, as shown on job cards.
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::PendingPayment => "Pending Payment",
            JobStatus::OpenForBids => "Open for Bids",
            JobStatus::New => "New",
            JobStatus::InProgress => "In Progress",
            JobStatus::RevisionsRequested => "Revisions Requested",
            JobStatus::ReportReady => "Report Ready",
            JobStatus::PendingClientSignature => "Pending Client Signature",
            JobStatus::PendingValuerSignature => "Pending Valuer Signature",
            JobStatus::PendingFinalSignature => "Pending Final Signature",
            JobStatus::Completed => "Completed",
        }
    }

    /// True while the job is waiting on one or more signatures.
    pub fn is_signing(self) -> bool {
        matches!(
            self,
            JobStatus::ReportReady
                | JobStatus::PendingClientSignature
                | JobStatus::PendingValuerSignature
                | JobStatus::PendingFinalSignature
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = ValproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        JobStatus::all()
            .iter()
            .copied()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| ValproError::UnknownValue {
                kind: "job status",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// CertificationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl fmt::Display for CertificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CertificationStatus::Pending => "pending",
            CertificationStatus::Verified => "verified",
            CertificationStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for CertificationStatus {
    type Err = ValproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" => Ok(CertificationStatus::Pending),
            "verified" => Ok(CertificationStatus::Verified),
            "rejected" => Ok(CertificationStatus::Rejected),
            _ => Err(ValproError::UnknownValue {
                kind: "certification status",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// SubscriptionTier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Enterprise,
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// CarType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarType {
    Small,
    Big,
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CarType::Small => "small",
            CarType::Big => "big",
        })
    }
}

impl std::str::FromStr for CarType {
    type Err = ValproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "small" => Ok(CarType::Small),
            "big" => Ok(CarType::Big),
            _ => Err(ValproError::UnknownValue {
                kind: "car type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// InspectionPoint
// ---------------------------------------------------------------------------

/// A place on the vehicle the valuer can annotate during inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InspectionPoint {
    FrontBumper,
    RearBumper,
    Hood,
    Roof,
    Trunk,
    DriverDoor,
    PassengerDoor,
    DriverRearDoor,
    PassengerRearDoor,
    Windshield,
    RearWindow,
    FrontLeftTire,
    FrontRightTire,
    RearLeftTire,
    RearRightTire,
    Engine,
    Interior,
}

impl InspectionPoint {
    pub fn all() -> &'static [InspectionPoint] {
        use InspectionPoint::*;
        &[
            FrontBumper,
            RearBumper,
            Hood,
            Roof,
            Trunk,
            DriverDoor,
            PassengerDoor,
            DriverRearDoor,
            PassengerRearDoor,
            Windshield,
            RearWindow,
            FrontLeftTire,
            FrontRightTire,
            RearLeftTire,
            RearRightTire,
            Engine,
            Interior,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InspectionPoint::FrontBumper => "front-bumper",
            InspectionPoint::RearBumper => "rear-bumper",
            InspectionPoint::Hood => "hood",
            InspectionPoint::Roof => "roof",
            InspectionPoint::Trunk => "trunk",
            InspectionPoint::DriverDoor => "driver-door",
            InspectionPoint::PassengerDoor => "passenger-door",
            InspectionPoint::DriverRearDoor => "driver-rear-door",
            InspectionPoint::PassengerRearDoor => "passenger-rear-door",
            InspectionPoint::Windshield => "windshield",
            InspectionPoint::RearWindow => "rear-window",
            InspectionPoint::FrontLeftTire => "front-left-tire",
            InspectionPoint::FrontRightTire => "front-right-tire",
            InspectionPoint::RearLeftTire => "rear-left-tire",
            InspectionPoint::RearRightTire => "rear-right-tire",
            InspectionPoint::Engine => "engine",
            InspectionPoint::Interior => "interior",
        }
    }
}

impl fmt::Display for InspectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InspectionPoint {
    type Err = ValproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        InspectionPoint::all()
            .iter()
            .copied()
            .find(|p| normalize(p.as_str()) == wanted)
            .ok_or_else(|| ValproError::UnknownValue {
                kind: "inspection point",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// SignerRole
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    Client,
    Valuer,
    Admin,
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignerRole::Client => "client",
            SignerRole::Valuer => "valuer",
            SignerRole::Admin => "admin",
        })
    }
}

impl std::str::FromStr for SignerRole {
    type Err = ValproError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "client" => Ok(SignerRole::Client),
            "valuer" => Ok(SignerRole::Valuer),
            "admin" => Ok(SignerRole::Admin),
            _ => Err(ValproError::UnknownValue {
                kind: "signer role",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
