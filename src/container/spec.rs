// src/container/spec.rs

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Host-to-container port binding, written `"host:container"` (or a single
/// port for both sides).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub host: u16,
    pub container: u16,
}

impl FromStr for PortBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u16>()
                .map_err(|e| format!("invalid port '{part}' in binding '{s}': {e}"))
        };

        match s.split_once(':') {
            Some((host, container)) => Ok(PortBinding {
                host: parse(host)?,
                container: parse(container)?,
            }),
            None => {
                let port = parse(s)?;
                Ok(PortBinding {
                    host: port,
                    container: port,
                })
            }
        }
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

/// Everything needed to create the service container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub name: Option<String>,
    pub working_dir: Option<String>,
    /// `os[/arch[/variant]]`, e.g. `linux/arm64`.
    pub platform: Option<String>,
    pub ports: Vec<PortBinding>,
    pub env: BTreeMap<String, String>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: None,
            working_dir: None,
            platform: None,
            ports: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}
