use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssociationCategory {
    Food,
    Clothes,
    Healthcare,
    Education,
    #[serde(rename = "Home supplies")]
    HomeSupplies,
}

impl AssociationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationCategory::Food => "Food",
            AssociationCategory::Clothes => "Clothes",
            AssociationCategory::Healthcare => "Healthcare",
            AssociationCategory::Education => "Education",
            AssociationCategory::HomeSupplies => "Home supplies",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "food" => Some(AssociationCategory::Food),
            "clothes" => Some(AssociationCategory::Clothes),
            "healthcare" => Some(AssociationCategory::Healthcare),
            "education" => Some(AssociationCategory::Education),
            "home supplies" | "home_supplies" => Some(AssociationCategory::HomeSupplies),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    // Unknown labels from the backend are treated as unset.
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Option<AssociationCategory>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

fn lenient_category<'de, D>(deserializer: D) -> Result<Option<AssociationCategory>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(AssociationCategory::parse))
}

/// Body for `POST /associations` (admin).
#[derive(Debug, Clone, Serialize)]
pub struct NewAssociation {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Body for `PUT /associations/{id}` (admin).
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssociationChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
