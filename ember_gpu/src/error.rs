//! Error types for the Ember GPU resource core
//!
//! This module defines the error types used throughout the crate,
//! covering allocation, layout transitions, command submission and
//! device bootstrap.

use std::fmt;

use crate::device::ImageLayout;

/// Result type for Ember operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ember errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan driver, memory binding, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// The allocator could not satisfy a buffer or image memory request
    AllocationFailed(String),

    /// The driver rejected an image view or sampler
    ResourceCreationFailed(String),

    /// The requested layout pair is not part of the transition table
    UnsupportedTransition {
        from: ImageLayout,
        to: ImageLayout,
    },

    /// The caller's `old` layout disagrees with the layout the image is tracked in
    LayoutMismatch {
        expected: ImageLayout,
        actual: ImageLayout,
    },

    /// A one-shot command buffer could not be allocated, recorded, submitted or waited on
    CommandSubmissionFailed(String),

    /// Invalid resource (missing handle, duplicate registration, bad size, etc.)
    InvalidResource(String),

    /// Initialization failed (instance, device, allocator)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::AllocationFailed(msg) => write!(f, "Allocation failed: {}", msg),
            Error::ResourceCreationFailed(msg) => write!(f, "Resource creation failed: {}", msg),
            Error::UnsupportedTransition { from, to } => {
                write!(f, "Unsupported layout transition: {:?} -> {:?}", from, to)
            }
            Error::LayoutMismatch { expected, actual } => write!(
                f,
                "Layout mismatch: image is in {:?} but caller expected {:?}",
                actual, expected
            ),
            Error::CommandSubmissionFailed(msg) => write!(f, "Command submission failed: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` carrying the same text
///
/// Meant for `map_err` closures on driver calls.
///
/// # Example
///
/// ```ignore
/// device.bind_image_memory(image, memory, offset)
///     .map_err(|e| engine_err!("ember::vulkan", "Failed to bind image memory: {:?}", e))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::ember::Engine::log_detailed(
            $crate::ember::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::ember::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an error
///
/// With a bare message the error is `Error::BackendError`. The `=>` form
/// chooses the variant: `engine_bail!(source, InvalidResource => "...")`.
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $variant:ident => $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::ember::Engine::log_detailed(
            $crate::ember::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        return Err($crate::ember::Error::$variant(message));
    }};
    ($source:expr, $($arg:tt)*) => {{
        return Err($crate::engine_err!($source, $($arg)*));
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
