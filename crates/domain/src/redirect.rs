//! Post-submission redirect handling.

use url::Url;

/// Computes a safe redirect target for `raw_url`.
///
/// Unparseable input is returned unchanged. When `allowed_domains` is given
/// and non-empty, a URL whose host is neither one of the domains nor a
/// subdomain of one is reduced to its path, query and fragment.
pub fn sanitize(raw_url: &str, allowed_domains: Option<&[String]>) -> String {
    let url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Failed to parse redirect URL '{}': {}", raw_url, e);
            return raw_url.to_string();
        }
    };

    if let Some(domains) = allowed_domains.filter(|d| !d.is_empty()) {
        let host = url.host_str().unwrap_or_default();
        if !domains.iter().any(|domain| host_matches(host, domain)) {
            tracing::warn!("Redirect to non-allowed domain blocked: {}", host);
            return path_only(&url);
        }
    }

    url.to_string()
}

fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_end_matches('.');
    if domain.is_empty() {
        return false;
    }
    host.eq_ignore_ascii_case(domain)
        || host
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
}

/// Leading slashes collapse to one so the result cannot be read as a
/// protocol-relative `//host/...` reference.
fn path_only(url: &Url) -> String {
    let mut out = format!("/{}", url.path().trim_start_matches(['/', '\\']));
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
