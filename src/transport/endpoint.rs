//! Web service endpoint addressing

use std::fmt;

/// Class of service an operation lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceType {
    /// `core-service`, used by LoginService
    Core,
    #[default]
    Manager,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Core => "core-service",
            ServiceType::Manager => "manager-service",
        }
    }
}

/// REST or SOAP flavour of the web services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Rest,
    Services,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Rest => "rest",
            Protocol::Services => "services",
        }
    }
}

/// A service/operation pair plus the service class and protocol it is reached through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub service_type: ServiceType,
    pub protocol: Protocol,
    pub service: String,
    pub operation: String,
}

impl Endpoint {
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service_type: ServiceType::default(),
            protocol: Protocol::default(),
            service: service.into(),
            operation: operation.into(),
        }
    }

    pub fn service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = service_type;
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Full URL for this endpoint on the given ESM instance
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/www/{}/{}/{}/{}?alt=json",
            base_url.trim_end_matches('/'),
            self.service_type.as_str(),
            self.protocol.as_str(),
            self.service,
            self.operation
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.operation)
    }
}
