//! Unit tests for config.rs

use crate::config::{Config, DebugSeverity, Settings};

// ============================================================================
// SETTINGS
// ============================================================================

#[test]
fn test_settings_default_enables_anisotropy() {
    let settings = Settings::default();
    assert_eq!(settings.anisotropic_filter_level, 16.0);
    assert!(settings.anisotropy_enabled());
}

#[test]
fn test_zero_level_disables_anisotropy() {
    let settings = Settings { anisotropic_filter_level: 0.0 };
    assert!(!settings.anisotropy_enabled());
}

#[test]
fn test_negative_and_nan_levels_read_as_disabled() {
    assert_eq!(Settings { anisotropic_filter_level: -4.0 }.anisotropy(), 0.0);
    assert_eq!(Settings { anisotropic_filter_level: f32::NAN }.anisotropy(), 0.0);
}

#[test]
fn test_clamped_to_device_limit() {
    let settings = Settings { anisotropic_filter_level: 16.0 };
    assert_eq!(settings.clamped_to_device(Some(8.0)).anisotropic_filter_level, 8.0);
    assert_eq!(settings.clamped_to_device(Some(32.0)).anisotropic_filter_level, 16.0);
}

#[test]
fn test_clamped_without_feature_disables() {
    let settings = Settings { anisotropic_filter_level: 4.0 };
    assert!(!settings.clamped_to_device(None).anisotropy_enabled());
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.enable_validation, cfg!(debug_assertions));
    assert_eq!(config.debug_severity, DebugSeverity::ErrorsAndWarnings);
    assert_eq!(config.app_version, (1, 0, 0));
    assert_eq!(config.settings, Settings::default());
    assert!(!config.app_name.is_empty());
}
