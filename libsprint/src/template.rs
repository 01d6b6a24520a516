//! Starter routine shown when no code has been saved yet

/// Default code text for a fresh session
///
/// The backend imports the submission as a method named `calculate_path`.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/calculate_path.py");

/// Name of the routine the backend calls
pub const ENTRY_POINT: &str = "calculate_path";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_defines_entry_point() {
        assert!(DEFAULT_TEMPLATE.starts_with(&format!("def {}(self):", ENTRY_POINT)));
        assert!(DEFAULT_TEMPLATE.contains("return final_path"));
    }
}
