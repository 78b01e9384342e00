use super::builder::Builder;
use crate::error::Error;
use crate::error::Result;

/// Addresses of the primary and the read replicas
///
/// With the `serde` feature this deserializes from any serde format:
///
/// ```ignore
/// let config: Config = serde_json::from_str(r#"{ "primary": "app.db", "replicas": ["replica.db"] }"#)?;
/// let engine = Engine::from_config(&config).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub primary:     String,
    pub replicas:    Vec<String>,
    pub enable_mvcc: bool,
}

impl Config {
    pub fn new(primary: impl Into<String>) -> Self {
        Self { primary: primary.into(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.primary.trim().is_empty() {
            return Err(Error::ConfigInvalid("primary address is empty"));
        }
        if self.replicas.iter().any(|replica| replica.trim().is_empty()) {
            return Err(Error::ConfigInvalid("replica address is empty"));
        }
        Ok(())
    }
}

impl From<&Builder> for Config {
    fn from(builder: &Builder) -> Self {
        Self {
            primary:     builder.primary.clone(),
            replicas:    builder.replicas.clone(),
            enable_mvcc: builder.enable_mvcc,
        }
    }
}
