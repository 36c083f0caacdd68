use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Approved,
    Rejected,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Approved => "approved",
            OfferStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferDonor {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub association_id: i64,
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: OfferStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub user: Option<OfferDonor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOffer {
    pub association_id: i64,
    pub user_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The only transitions an association may request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferDecision {
    Approved,
    Rejected,
}

impl OfferDecision {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" | "approve" => Some(OfferDecision::Approved),
            "rejected" | "reject" => Some(OfferDecision::Rejected),
            _ => None,
        }
    }
}

impl From<OfferDecision> for OfferStatus {
    fn from(d: OfferDecision) -> Self {
        match d {
            OfferDecision::Approved => OfferStatus::Approved,
            OfferDecision::Rejected => OfferStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferStatusUpdate {
    pub status: OfferDecision,
    pub association_id: i64,
}
