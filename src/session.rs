//! Selected cloud, profile and region for the running dashboard.
//!
//! The session is an explicit value handed to the router, the view context and every
//! viewer factory, so a component's dependencies show up in its signature.

use std::fmt;
use std::str::FromStr;

use crate::error::LensError;

/// Environment variable naming the AWS profile
pub const AWS_PROFILE: &str = "AWS_PROFILE";
/// Environment variable naming the default AWS region
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Supported cloud providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Cloud {
    #[default]
    Aws,
    Gcp,
}

impl Cloud {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cloud::Aws => "AWS",
            Cloud::Gcp => "GCP",
        }
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cloud {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Cloud::Aws),
            "gcp" => Ok(Cloud::Gcp),
            other => Err(LensError::Configuration(format!("unknown cloud '{}'", other))),
        }
    }
}

/// The active cloud context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub cloud: Cloud,
    pub profile: String,
    pub region: String,
    pub project: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            cloud: Cloud::Aws,
            profile: "default".to_string(),
            region: "us-east-1".to_string(),
            project: None,
        }
    }
}

impl Session {
    /// Build a session, filling unset AWS fields from the environment
    pub fn new(cloud: Cloud, profile: Option<String>, region: Option<String>, project: Option<String>) -> Self {
        let defaults = Self::default();
        let profile = profile
            .or_else(|| std::env::var(AWS_PROFILE).ok())
            .unwrap_or(defaults.profile);
        let region = region
            .or_else(|| std::env::var(AWS_DEFAULT_REGION).ok())
            .unwrap_or(defaults.region);
        Self {
            cloud,
            profile,
            region,
            project,
        }
    }

    /// Short label for title bars
    pub fn label(&self) -> String {
        match self.cloud {
            Cloud::Aws => format!("{} {}@{}", self.cloud, self.profile, self.region),
            Cloud::Gcp => format!(
                "{} {}",
                self.cloud,
                self.project.as_deref().unwrap_or("(no project)")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_parse() {
        assert_eq!("aws".parse::<Cloud>().unwrap(), Cloud::Aws);
        assert_eq!("GCP".parse::<Cloud>().unwrap(), Cloud::Gcp);
        assert!("azure".parse::<Cloud>().is_err());
    }

    #[test]
    fn test_session_label() {
        let session = Session {
            cloud: Cloud::Gcp,
            profile: String::new(),
            region: String::new(),
            project: Some("demo".to_string()),
        };
        assert_eq!(session.label(), "GCP demo");

        let session = Session::new(Cloud::Aws, Some("dev".into()), Some("eu-west-1".into()), None);
        assert_eq!(session.label(), "AWS dev@eu-west-1");
    }
}
