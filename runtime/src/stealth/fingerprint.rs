//! Make the headless page look like an ordinary desktop browser.
//!
//! The portal's sign-in flow serves a degraded page to clients it takes for
//! bots, so the extractor presents a desktop user agent and hides the usual
//! automation markers before any portal script runs.

/// Sent on every request and reported by `navigator.userAgent`.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Installed with `evaluate_on_new_document`, so it runs ahead of page code
/// in every frame.
const STEALTH_SCRIPT: &str = r#"
(() => {
    const patch = (obj, prop, value) => {
        try {
            Object.defineProperty(obj, prop, { get: () => value, configurable: true });
        } catch (_) {}
    };

    patch(navigator, 'webdriver', undefined);
    patch(navigator, 'languages', ['en-US', 'en']);
    patch(navigator, 'platform', 'Win32');
    patch(navigator, 'hardwareConcurrency', 8);

    window.chrome = window.chrome || {};
    window.chrome.runtime = window.chrome.runtime || {};

    if (navigator.permissions && navigator.permissions.query) {
        const query = navigator.permissions.query.bind(navigator.permissions);
        navigator.permissions.query = (params) =>
            params && params.name === 'notifications'
                ? Promise.resolve({ state: Notification.permission })
                : query(params);
    }
})();
"#;

pub fn stealth_script() -> &'static str {
    STEALTH_SCRIPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_is_desktop_chrome() {
        assert!(DESKTOP_USER_AGENT.contains("Windows NT 10.0"));
        assert!(DESKTOP_USER_AGENT.contains("Chrome/"));
        assert!(!DESKTOP_USER_AGENT.contains("Headless"));
    }

    #[test]
    fn test_script_hides_webdriver() {
        assert!(stealth_script().contains("'webdriver'"));
    }
}
