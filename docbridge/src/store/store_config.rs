use crate::common::{EMULATED_SITE, EMULATOR_HOST, EMULATOR_PORT};
use std::fmt::{Display, Formatter};

/// Which store instance a client talks to.
///
/// Chosen once when the client is built and never changed afterwards.
///
/// ```text
/// let target = StoreTarget::for_site("emulated_site", "community-platform");
/// assert_eq!(target, StoreTarget::emulator("localhost", 4003));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreTarget {
    /// A production project, addressed by its id
    Production { project_id: String },
    /// A local emulator instance
    Emulator { host: String, port: u16 },
}

impl StoreTarget {
    pub fn production(project_id: &str) -> Self {
        StoreTarget::Production {
            project_id: project_id.to_string(),
        }
    }

    pub fn emulator(host: &str, port: u16) -> Self {
        StoreTarget::Emulator {
            host: host.to_string(),
            port,
        }
    }

    /// Selects the target for a deployment site: the `emulated_site` site talks
    /// to the local emulator on port 4003, every other site to production.
    pub fn for_site(site: &str, project_id: &str) -> Self {
        if site == EMULATED_SITE {
            StoreTarget::emulator(EMULATOR_HOST, EMULATOR_PORT)
        } else {
            StoreTarget::production(project_id)
        }
    }

    pub fn is_emulated(&self) -> bool {
        matches!(self, StoreTarget::Emulator { .. })
    }
}

impl Default for StoreTarget {
    fn default() -> Self {
        StoreTarget::emulator(EMULATOR_HOST, EMULATOR_PORT)
    }
}

impl Display for StoreTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreTarget::Production { project_id } => write!(f, "production({})", project_id),
            StoreTarget::Emulator { host, port } => write!(f, "emulator({}:{})", host, port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_site_selects_emulator() {
        let target = StoreTarget::for_site("emulated_site", "demo");
        assert_eq!(target, StoreTarget::emulator("localhost", 4003));
        assert!(target.is_emulated());
    }

    #[test]
    fn test_for_site_selects_production() {
        let target = StoreTarget::for_site("production", "demo");
        assert_eq!(target, StoreTarget::production("demo"));
        assert!(!target.is_emulated());
    }

    #[test]
    fn test_display() {
        assert_eq!(StoreTarget::production("demo").to_string(), "production(demo)");
        assert_eq!(StoreTarget::default().to_string(), "emulator(localhost:4003)");
    }
}
