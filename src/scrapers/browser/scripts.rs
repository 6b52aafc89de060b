//! JavaScript snippets evaluated in the listing page.
//!
//! Element operations go through `document.querySelectorAll(..)[index]` so a
//! handle never outlives the node it was resolved against. Each element
//! script evaluates to `null` when the element is gone.

use super::types::ElementHandle;

/// Scroll the viewport to the bottom of the document.
pub const SCROLL_TO_BOTTOM: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

/// JavaScript to wait for page ready state.
pub const WAIT_FOR_READY: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Automation markers hidden in stealth mode.
pub const STEALTH_SCRIPTS: &[&str] = &[
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    "#,
    r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true
    });
    "#,
];

/// Encode a selector as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Count elements matching `selector`.
pub fn count_elements(selector: &str) -> String {
    format!(
        "(() => document.querySelectorAll({}).length)()",
        js_string(selector)
    )
}

/// Run `body` against the element behind `handle`; `body` sees it as `el`.
fn with_element(handle: &ElementHandle, body: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelectorAll({})[{}]; if (!el) return null; {} }})()",
        js_string(&handle.selector),
        handle.index,
        body
    )
}

pub fn is_displayed(handle: &ElementHandle) -> String {
    with_element(
        handle,
        "const s = window.getComputedStyle(el); const r = el.getBoundingClientRect(); \
         return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0;",
    )
}

pub fn scroll_into_view(handle: &ElementHandle) -> String {
    with_element(handle, "el.scrollIntoView({block: 'center'}); return true;")
}

pub fn click(handle: &ElementHandle) -> String {
    with_element(handle, "el.click(); return true;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_quoted() {
        let script = count_elements(r#"a[href="x"]"#);
        assert!(script.contains(r#""a[href=\"x\"]""#));
    }

    #[test]
    fn test_element_script_targets_index() {
        let handle = ElementHandle::new("button.more", 2);
        let script = click(&handle);
        assert!(script.contains(r#"document.querySelectorAll("button.more")[2]"#));
        assert!(script.contains("if (!el) return null;"));
        assert!(script.contains("el.click()"));
    }
}
