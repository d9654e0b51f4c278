/// Vulkan Debug Messenger - Forwards validation layer messages to the engine logger
///
/// Validation errors are also counted, so tests can assert that a sequence of
/// descriptor operations produced none.

use ash::vk;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use galaxy_3d_descriptors::{engine_debug, engine_error, engine_warn};

/// Validation errors reported since start-up (or the last reset)
static VALIDATION_ERRORS: AtomicU32 = AtomicU32::new(0);

pub fn validation_error_count() -> u32 {
    VALIDATION_ERRORS.load(Ordering::Relaxed)
}

pub fn reset_validation_error_count() {
    VALIDATION_ERRORS.store(0, Ordering::Relaxed);
}

/// Vulkan debug messenger callback
///
/// # Safety
///
/// Called by the validation layers with a valid callback data pointer.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let type_str = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    };

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        VALIDATION_ERRORS.fetch_add(1, Ordering::Relaxed);
        engine_error!("galaxy3d::vulkan", "[{}] {}: {}", type_str, message_id_name, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        engine_warn!("galaxy3d::vulkan", "[{}] {}: {}", type_str, message_id_name, message);
    } else {
        engine_debug!("galaxy3d::vulkan", "[{}] {}: {}", type_str, message_id_name, message);
    }

    vk::FALSE // Don't abort Vulkan execution
}
