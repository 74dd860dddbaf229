//! JSON emit functions for CLI output
//!
//! Output uses the same camelCase shapes the generation service returns.

use serde::Serialize;

use crate::BambooError;

/// Pretty-printed JSON for `value`
pub fn to_json<T: Serialize>(value: &T) -> Result<String, BambooError> {
    serde_json::to_string_pretty(value).map_err(|e| BambooError::Io(std::io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmergencyMode;

    #[test]
    fn test_emergency_mode_is_kebab_case() {
        assert_eq!(to_json(&EmergencyMode::TeacherRaid).unwrap(), "\"teacher-raid\"");
    }
}
