//! URL helpers for logging feed locations

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn sensitive_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([?&](?:username|password|user|pass|pwd|passwd|token|key)=)[^&]*")
            .expect("static query parameter pattern is valid")
    })
}

/// Mask credentials in a URL so it can be written to logs
///
/// Userinfo (`user:pass@host`) and credential-like query parameters are
/// replaced with `****`.
pub fn obfuscate_credentials(url: &str) -> String {
    let mut obfuscated = url.to_string();

    if let Ok(parsed) = Url::parse(url) {
        if !parsed.username().is_empty() || parsed.password().is_some() {
            let mut masked = parsed.clone();
            let _ = masked.set_username("****");
            let _ = masked.set_password(Some("****"));
            obfuscated = masked.to_string();
        }
    }

    sensitive_param_regex()
        .replace_all(&obfuscated, "${1}****")
        .into_owned()
}
