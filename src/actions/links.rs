//! Site-relative locations actions redirect to.

pub const INDEX: &str = "/";

/// Page of the board's front controller, e.g. `/?source=settings`.
#[must_use]
pub fn page(source: &str) -> String {
    format!("/?source={}", urlencoding::encode(source))
}

/// The datastore step with an error message attached.
#[must_use]
pub fn datastore_error(message: &str) -> String {
    format!("{}&error={}", page("mysql"), urlencoding::encode(message))
}

/// Login page flagged as failed, keeping the original destination.
#[must_use]
pub fn login_failed(continue_to: Option<&str>) -> String {
    let mut link = format!("{}&attempt=failed", page("login"));
    if let Some(target) = continue_to {
        link.push_str("&continue=");
        link.push_str(&urlencoding::encode(target));
    }
    link
}

/// Accepts only site-relative paths; everything else falls back to the
/// index. Stops `continue=` from sending users to another host.
#[must_use]
pub fn sanitize_continue(raw: Option<&str>) -> String {
    let Some(target) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return INDEX.to_string();
    };

    let site_relative = target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.contains("://")
        && !target.chars().any(char::is_control);

    if site_relative {
        target.to_string()
    } else {
        INDEX.to_string()
    }
}
