//! Role and area policy.
//!
//! Every profile has exactly one [`Role`]. Each role-scoped [`Area`] of the
//! portal admits exactly one role: there is no hierarchy, so an admin does
//! not see the provider area.

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Traveler,
    Provider,
    Admin,
    Ambassador,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Traveler => "traveler",
            Self::Provider => "provider",
            Self::Admin => "admin",
            Self::Ambassador => "ambassador",
        }
    }

    /// The area this role lands on and is allowed into.
    pub fn area(self) -> Area {
        match self {
            Self::Traveler => Area::Traveler,
            Self::Provider => Area::Provider,
            Self::Admin => Area::Admin,
            Self::Ambassador => Area::Ambassador,
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "traveler" => Ok(Self::Traveler),
            "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            "ambassador" => Ok(Self::Ambassador),
            other => Err(EngineError::InvalidRole(format!("invalid role: {other}"))),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section of the portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Admin,
    Provider,
    Ambassador,
    Traveler,
    Public,
}

impl Area {
    fn segment(self) -> Option<&'static str> {
        match self {
            Self::Admin => Some("admin"),
            Self::Provider => Some("provider"),
            Self::Ambassador => Some("ambassador"),
            Self::Traveler => Some("traveler"),
            Self::Public => None,
        }
    }

    /// Path of the area root under `locale`, e.g. `/es/admin`.
    pub fn path(self, locale: Locale) -> String {
        match self.segment() {
            Some(segment) => format!("/{}/{segment}", locale.as_str()),
            None => format!("/{}", locale.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
    Zh,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Unknown or missing locales fall back to the default.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("en") => Self::En,
            Some("zh") => Self::Zh,
            _ => Self::Es,
        }
    }
}

/// Where a freshly authenticated identity is sent.
///
/// `role` is the raw value stored on the profile; anything that is not a
/// known role lands on the public page.
pub fn landing_path(role: Option<&str>, locale: Locale) -> String {
    role.and_then(|raw| Role::try_from(raw).ok())
        .map_or(Area::Public, Role::area)
        .path(locale)
}

/// Whether `role` may enter `area`. The public area admits everyone.
pub fn is_authorized(role: Role, area: Area) -> bool {
    area == Area::Public || role.area() == area
}
