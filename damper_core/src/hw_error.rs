//! Maps `Box<dyn Error>` from trait boundaries to typed `DamperError`.
//!
//! The traits in `damper_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `damper_hardware::HwError`
//! downcasting.

use crate::error::DamperError;

/// Map a device error raised mid-run to a typed `DamperError`.
///
/// Every device error inside the control loop is runtime-fatal; the mapping
/// only decides how it is reported.
pub fn map_device_error(
    device: &'static str,
    e: &(dyn std::error::Error + 'static),
) -> DamperError {
    #[cfg(feature = "hardware-errors")]
    {
        use damper_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::WriteTimeout(_) => DamperError::Timeout { device },
                HwError::Disconnected(_, reason) => DamperError::DeviceLost {
                    device,
                    reason: reason.clone(),
                },
                other => DamperError::DeviceLost {
                    device,
                    reason: other.to_string(),
                },
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timed out") {
        DamperError::Timeout { device }
    } else {
        DamperError::DeviceLost { device, reason: s }
    }
}
