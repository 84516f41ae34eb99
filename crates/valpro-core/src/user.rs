use crate::error::{Result, ValproError};
use crate::types::{CertificationStatus, SubscriptionTier, UserType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Certification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuing_org: String,
    /// Issue date as entered by the valuer (`YYYY-MM-DD`).
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    pub status: CertificationStatus,
}

impl Certification {
    pub fn pending(
        name: impl Into<String>,
        issuing_org: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            issuing_org: issuing_org.into(),
            date: date.into(),
            document_url: None,
            status: CertificationStatus::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs_completed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<SubscriptionTier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specializations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bids_this_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<Certification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        user_type: UserType,
    ) -> Self {
        let id = id.into();
        let avatar_url = format!("https://i.pravatar.cc/150?u={id}");
        Self {
            id,
            name: name.into(),
            email: email.into(),
            user_type,
            avatar_url,
            company_name: None,
            signature_url: None,
            location: None,
            rating: None,
            jobs_completed: None,
            subscription_tier: None,
            specializations: Vec::new(),
            bids_this_month: None,
            certifications: Vec::new(),
            notes: None,
            verified: false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    pub fn is_valuer(&self) -> bool {
        self.user_type == UserType::Valuer
    }

    pub fn certification(&self, name: &str) -> Option<&Certification> {
        self.certifications.iter().find(|c| c.name == name)
    }

    /// Move a pending certification to verified or rejected.
    ///
    /// Certifications are reviewed once; a verified or rejected entry cannot
    /// be moved again, and nothing can move back to pending.
    pub fn set_certification_status(
        &mut self,
        name: &str,
        status: CertificationStatus,
    ) -> Result<()> {
        let user_id = self.id.clone();
        let cert = self
            .certifications
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ValproError::CertificationNotFound {
                user_id,
                name: name.to_string(),
            })?;

        if cert.status != CertificationStatus::Pending {
            return Err(ValproError::invalid(
                "update_certification_status",
                cert.status,
                format!("certification '{name}' has already been reviewed"),
            ));
        }
        if status == CertificationStatus::Pending {
            return Err(ValproError::invalid(
                "update_certification_status",
                cert.status,
                "a certification can only move to verified or rejected",
            ));
        }
        cert.status = status;
        if status == CertificationStatus::Verified {
            self.verified = true;
        }
        Ok(())
    }

    /// Ensure an edited profile keeps the identity fields of the original.
    ///
    /// Review outcomes are not profile data: certification statuses and the
    /// verified badge only move through [`User::set_certification_status`].
    pub fn check_update_of(&self, original: &User) -> Result<()> {
        if self.id != original.id {
            return Err(ValproError::Validation(format!(
                "user id cannot change ({} -> {})",
                original.id, self.id
            )));
        }
        if self.user_type != original.user_type {
            return Err(ValproError::Validation(format!(
                "user type of {} is immutable ({} -> {})",
                self.id, original.user_type, self.user_type
            )));
        }
        if self.name.trim().is_empty() {
            return Err(ValproError::Validation("user name is required".into()));
        }

        let reviewed = |reason: String| Err(ValproError::invalid("update_user", "profile", reason));
        if self.verified != original.verified {
            return reviewed("the verified badge is set by certification review".into());
        }
        for cert in &self.certifications {
            let before = original
                .certification(&cert.name)
                .map_or(CertificationStatus::Pending, |c| c.status);
            if cert.status != before {
                return reviewed(format!(
                    "certification '{}' cannot move from {before} to {} by editing the profile",
                    cert.name, cert.status
                ));
            }
        }
        for cert in &original.certifications {
            let dropped = self.certification(&cert.name).is_none();
            if dropped && cert.status != CertificationStatus::Pending {
                return reviewed(format!(
                    "reviewed certification '{}' cannot be removed",
                    cert.name
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

/// The identity of a user as recorded on a job at the time they joined it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
}

impl From<&User> for Party {
    fn from(user: &User) -> Self {
        Party {
            id: user.id.clone(),
            name: user.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
