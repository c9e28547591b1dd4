//! Contact form records: raw visitor input, the validated contact and the service catalogue

use serde::{Deserialize, Serialize};

/// Field values exactly as the visitor typed them. Nothing here is trusted
/// until it has been through [`crate::validation::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactFormInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service_interest: String,
    pub message: String,
    /// Hidden from real visitors. Posted as `website` by the form.
    #[serde(rename = "website")]
    pub honeypot: String,
}

impl ContactFormInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        service_interest: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            service_interest: service_interest.into(),
            message: message.into(),
            honeypot: String::new(),
        }
    }

    pub fn with_honeypot(mut self, value: impl Into<String>) -> Self {
        self.honeypot = value.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceInterest {
    LawnCare,
    LandscapeDesign,
    Hardscaping,
    SeasonalCleanup,
    Irrigation,
    TreeCare,
    Consultation,
    Other,
}

impl ServiceInterest {
    pub const ALL: [ServiceInterest; 8] = [
        ServiceInterest::LawnCare,
        ServiceInterest::LandscapeDesign,
        ServiceInterest::Hardscaping,
        ServiceInterest::SeasonalCleanup,
        ServiceInterest::Irrigation,
        ServiceInterest::TreeCare,
        ServiceInterest::Consultation,
        ServiceInterest::Other,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ServiceInterest::LawnCare => "lawn-care",
            ServiceInterest::LandscapeDesign => "landscape-design",
            ServiceInterest::Hardscaping => "hardscaping",
            ServiceInterest::SeasonalCleanup => "seasonal-cleanup",
            ServiceInterest::Irrigation => "irrigation",
            ServiceInterest::TreeCare => "tree-care",
            ServiceInterest::Consultation => "consultation",
            ServiceInterest::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceInterest::LawnCare => "Lawn Care & Maintenance",
            ServiceInterest::LandscapeDesign => "Landscape Design & Installation",
            ServiceInterest::Hardscaping => "Hardscaping & Patios",
            ServiceInterest::SeasonalCleanup => "Seasonal Cleanup",
            ServiceInterest::Irrigation => "Irrigation Systems",
            ServiceInterest::TreeCare => "Tree & Shrub Care",
            ServiceInterest::Consultation => "Free Consultation",
            ServiceInterest::Other => "Other / Multiple Services",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL.into_iter().find(|service| service.slug() == slug)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

impl From<ServiceInterest> for ServiceOption {
    fn from(service: ServiceInterest) -> Self {
        Self {
            value: service.slug(),
            label: service.label(),
        }
    }
}

/// A contact that passed every field rule. Only the validator builds these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedContact {
    name: String,
    email: String,
    phone: String,
    service: ServiceInterest,
    message: String,
}

impl ValidatedContact {
    pub(crate) fn new(
        name: String,
        email: String,
        phone: String,
        service: ServiceInterest,
        message: String,
    ) -> Self {
        Self {
            name,
            email,
            phone,
            service,
            message,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// The ten digits of the phone number, formatting removed.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn service(&self) -> ServiceInterest {
        self.service
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
