use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer gender on record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// Audience restriction carried by catalog entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetGender {
    Male,
    Female,
    Any,
}

impl TargetGender {
    pub fn allows(&self, gender: Gender) -> bool {
        match self {
            TargetGender::Any => true,
            TargetGender::Male => gender == Gender::Male,
            TargetGender::Female => gender == Gender::Female,
        }
    }
}

impl fmt::Display for TargetGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetGender::Male => write!(f, "male"),
            TargetGender::Female => write!(f, "female"),
            TargetGender::Any => write!(f, "any"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    VeryBad,
    Bad,
    Average,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Banking,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Refunded,
}

/// Payment details submitted alongside a consultation or booking registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub method: PaymentMethod,
    pub amount: f64,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_gender_gating() {
        assert!(TargetGender::Any.allows(Gender::Male));
        assert!(TargetGender::Any.allows(Gender::Female));
        assert!(TargetGender::Female.allows(Gender::Female));
        assert!(!TargetGender::Female.allows(Gender::Male));
        assert!(!TargetGender::Male.allows(Gender::Female));
    }
}
