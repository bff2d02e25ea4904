//! Unit tests for the validation messenger callback (no GPU required)

use super::*;
use serial_test::serial;

type Sev = vk::DebugUtilsMessageSeverityFlagsEXT;

fn invoke(severity: Sev, message: &'static CStr) -> vk::Bool32 {
    let mut data = vk::DebugUtilsMessengerCallbackDataEXT::default();
    data.p_message_id_name = c"VUID-test".as_ptr();
    data.p_message = message.as_ptr();
    unsafe {
        vulkan_debug_callback(
            severity,
            vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
            &data,
            std::ptr::null_mut(),
        )
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

#[test]
fn test_tracker_counts_by_severity() {
    let tracker = ValidationStatsTracker::new();
    tracker.record(Sev::ERROR);
    tracker.record(Sev::WARNING);
    tracker.record(Sev::WARNING);
    tracker.record(Sev::VERBOSE);

    let stats = tracker.get_stats();
    assert_eq!(stats, ValidationStats { errors: 1, warnings: 2, info: 0, verbose: 1 });
    assert_eq!(stats.total(), 4);

    tracker.reset();
    assert_eq!(tracker.get_stats(), ValidationStats::default());
}

#[test]
fn test_message_type_label() {
    assert_eq!(message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION), "Validation");
    assert_eq!(message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE), "Performance");
    assert_eq!(message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL), "General");
}

// ============================================================================
// CALLBACK
// ============================================================================

#[test]
#[serial]
fn test_callback_counts_accepted_messages() {
    init_debug_config(DebugConfig { severity: DebugSeverity::ErrorsAndWarnings, enable_stats: true });

    assert_eq!(invoke(Sev::ERROR, c"broken barrier"), vk::FALSE);
    invoke(Sev::WARNING, c"slow path");
    invoke(Sev::INFO, c"filtered out");

    let stats = validation_stats();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.warnings, 1);
    assert_eq!(stats.info, 0);
    cleanup_debug_config();
}

#[test]
#[serial]
fn test_callback_groups_repeated_messages() {
    init_debug_config(DebugConfig { severity: DebugSeverity::All, enable_stats: true });

    invoke(Sev::WARNING, c"same message");
    invoke(Sev::WARNING, c"same message");

    assert_eq!(track_message("same message"), 3);
    cleanup_debug_config();
}

#[test]
#[serial]
fn test_callback_ignored_without_config() {
    init_debug_config(DebugConfig { severity: DebugSeverity::All, enable_stats: true });
    cleanup_debug_config();

    invoke(Sev::ERROR, c"after shutdown");
    assert_eq!(validation_stats().total(), 0);
}
