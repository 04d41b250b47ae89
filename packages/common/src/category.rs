#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Showcase category of a portfolio entry.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
/// The stored value is the human-readable label, which is also the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum Category {
    #[serde(rename = "Web Development")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Web Development"))]
    WebDevelopment,
    #[serde(rename = "Mobile App")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Mobile App"))]
    MobileApp,
    #[serde(rename = "AI/ML")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "AI/ML"))]
    AiMl,
    #[serde(rename = "Data Analytics")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Data Analytics"))]
    DataAnalytics,
    #[serde(rename = "Cloud/DevOps")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Cloud/DevOps"))]
    CloudDevOps,
    #[serde(rename = "Blockchain")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Blockchain"))]
    Blockchain,
    #[serde(rename = "Other")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Other"))]
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: &'static [Category] = &[
        Self::WebDevelopment,
        Self::MobileApp,
        Self::AiMl,
        Self::DataAnalytics,
        Self::CloudDevOps,
        Self::Blockchain,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebDevelopment => "Web Development",
            Self::MobileApp => "Mobile App",
            Self::AiMl => "AI/ML",
            Self::DataAnalytics => "Data Analytics",
            Self::CloudDevOps => "Cloud/DevOps",
            Self::Blockchain => "Blockchain",
            Self::Other => "Other",
        }
    }

    /// Comma-separated list of every label, for error messages.
    pub fn labels() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError {
    invalid: String,
}

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid category '{}'. Valid values: {}",
            self.invalid,
            Category::labels()
        )
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError {
                invalid: s.to_string(),
            })
    }
}
