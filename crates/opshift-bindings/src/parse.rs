use std::path::Path;

use opshift_bit_mask::Key;
use serde::Deserialize;

use crate::{v1::BindingsV1, Bindings, ProfileError};

/// Parse yaml bindings.
pub fn parse_bindings<O: Key, S: Key>(input: &str) -> Result<Bindings<O, S>, ProfileError> {
    let version = parse_version(input)?;
    match version {
        1 => {
            let raw: BindingsV1 = serde_yaml::from_str(input)?;
            let builder = raw.parse::<O, S>()?;
            Ok(builder.build()?)
        }
        _ => Err(ProfileError::UnsupportedVersion(version)),
    }
}

/// Read and parse a yaml bindings file.
pub fn load_bindings<O: Key, S: Key>(path: &Path) -> Result<Bindings<O, S>, ProfileError> {
    let input = std::fs::read_to_string(path)?;
    parse_bindings(&input)
}

/// Bindings with a version.
#[derive(Debug, Clone, Deserialize)]
struct VersionedBindings {
    version: u8,
}

/// Parse the version of yaml bindings.
fn parse_version(input: &str) -> Result<u8, ProfileError> {
    let raw: VersionedBindings = serde_yaml::from_str(input)?;
    Ok(raw.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opshift_bit_derive::Key;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Op {
        Intake,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Shift {
        Alt,
    }

    #[test]
    fn parse_bindings_yaml_error_when_version_missing() {
        let yaml = "operations: {}\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::YamlDeserializeError(_))
        ));
    }

    #[test]
    fn parse_bindings_rejects_unknown_version() {
        let yaml = "version: 2\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn validation_errors_surface_as_config_errors() {
        let yaml = r#"
version: 1
shifts:
  alt: { device: none, button: 5 }
"#;
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::Config(_))
        ));
    }
}
