/// Device and resource configuration

/// Validation message severity forwarded to the engine logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

impl Default for DebugSeverity {
    fn default() -> Self {
        DebugSeverity::ErrorsAndWarnings
    }
}

/// Resource-level settings consumed by image creation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Maximum anisotropy for texture samplers. `0.0` disables anisotropic filtering.
    pub anisotropic_filter_level: f32,
}

impl Settings {
    /// Sanitized anisotropy level: negative and NaN values read as disabled
    pub fn anisotropy(&self) -> f32 {
        if self.anisotropic_filter_level.is_nan() || self.anisotropic_filter_level < 0.0 {
            0.0
        } else {
            self.anisotropic_filter_level
        }
    }

    /// Whether samplers should enable anisotropic filtering
    pub fn anisotropy_enabled(&self) -> bool {
        self.anisotropy() > 0.0
    }

    /// Copy of these settings with the anisotropy level capped at `max`
    ///
    /// Pass `None` when the device lacks the sampler anisotropy feature.
    pub fn clamped_to_device(&self, max: Option<f32>) -> Settings {
        let level = match max {
            Some(max) => self.anisotropy().min(max),
            None => 0.0,
        };
        Settings { anisotropic_filter_level: level }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self { anisotropic_filter_level: 16.0 }
    }
}

/// Configuration for the headless device bootstrap
#[derive(Debug, Clone)]
pub struct Config {
    /// Request Vulkan validation layers (needs the `vulkan-validation` feature)
    pub enable_validation: bool,

    /// Application name reported to the driver
    pub app_name: String,

    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),

    /// Which validation messages reach the logger
    pub debug_severity: DebugSeverity,

    /// Resource settings handed to the device link
    pub settings: Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Ember Application".to_string(),
            app_version: (1, 0, 0),
            debug_severity: DebugSeverity::default(),
            settings: Settings::default(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
