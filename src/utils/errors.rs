//! User-Friendly Error Formatting
//!
//! Provides user-friendly error messages with troubleshooting hints
//! for common error scenarios.

use std::fmt::Write;

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    // Analyze the whole chain; context messages sit on top of io errors
    let error_msg = format!("{:#}", error);

    if error_msg.contains("/dev/") || error_msg.contains("device") {
        format_device_error(&mut output, &error_msg);
    } else if error_msg.contains("bind") || error_msg.contains("address") {
        format_network_error(&mut output, &error_msg);
    } else if error_msg.contains("refused") || error_msg.contains("timed out") {
        format_connect_error(&mut output, &error_msg);
    } else if error_msg.contains("config") {
        format_config_error(&mut output, &error_msg);
    } else {
        format_generic_error(&mut output, &error_msg);
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    // Footer with help
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: lamco-rc-receiver -vv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Report issues: https://github.com/lamco-admin/lamco-rc-drive/issues"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_device_error(output: &mut String, _error: &str) {
    writeln!(output, "Control Device Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not drive the vehicle control device.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Driver not loaded").ok();
    writeln!(output, "     → Check: ls -l /dev/mydevice").ok();
    writeln!(output, "     → Load the motor driver module and retry").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Permission denied").ok();
    writeln!(output, "     → Check device ownership and mode").ok();
    writeln!(output, "     → Add a udev rule or run as the device group").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Testing without hardware").ok();
    writeln!(output, "     → Set actuator = \"log\" under [receiver]").ok();
}

fn format_network_error(output: &mut String, _error: &str) {
    writeln!(output, "Network Binding Error").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "Could not bind to network address for controller connections."
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Port 8888 already in use").ok();
    writeln!(output, "     → Check: sudo ss -tlnp | grep 8888").ok();
    writeln!(output, "     → Kill other process or use different port").ok();
    writeln!(
        output,
        "     → Change in config.toml: listen_addr = '0.0.0.0:8889'"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Permission denied (port < 1024)").ok();
    writeln!(output, "     → Use port >= 1024").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Invalid listen address").ok();
    writeln!(output, "     → Check config.toml: listen_addr format").ok();
    writeln!(output, "     → Should be: 'IP:PORT' like '0.0.0.0:8888'").ok();
}

fn format_connect_error(output: &mut String, _error: &str) {
    writeln!(output, "Connection Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not reach the vehicle receiver.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Receiver not running").ok();
    writeln!(output, "     → Start lamco-rc-receiver on the vehicle").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Wrong address or port").ok();
    writeln!(output, "     → Receiver listens on port 8888 by default").ok();
    writeln!(output, "     → Check both hosts are on the same network").ok();
}

fn format_config_error(output: &mut String, _error: &str) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(
        output,
        "     → Or specify: lamco-rc-receiver -c /path/to/config.toml"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Invalid values").ok();
    writeln!(output, "     → Intervals must be greater than 0").ok();
    writeln!(output, "     → host must be a dotted-quad IPv4 address").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Runtime Error").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Re-run with -vv and check the log output").ok();
    writeln!(output, "  2. Verify the configuration with the defaults").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_user_error() {
        let error = anyhow::anyhow!("Failed to bind 0.0.0.0:8888");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("ERROR"));
        assert!(formatted.contains("Network Binding Error"));
    }

    #[test]
    fn test_device_error_uses_context_chain() {
        let error = anyhow::Error::new(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
            .context("Failed to open /dev/mydevice");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("Control Device Error"));
    }

    #[test]
    fn test_generic_error() {
        let formatted = format_user_error(&anyhow::anyhow!("something odd"));
        assert!(formatted.contains("Runtime Error"));
        assert!(formatted.contains("something odd"));
    }
}
