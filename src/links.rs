//! Accepting links, bare tokens and ids on the command line.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use slotlink_core::local_time::parse_timezone;
use url::Url;

/// The value of `?{param}=` when `input` is a full link, else `input`
/// itself (trimmed) as a bare token or id.
pub fn reference(input: &str, param: &str) -> String {
    let input = input.trim();
    Url::parse(input)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == param)
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| input.to_string())
}

/// `--tz` when given, else this machine's zone, else UTC.
pub fn timezone(explicit: Option<&str>) -> Result<Tz> {
    if let Some(name) = explicit {
        return Ok(parse_timezone(name)?);
    }
    Ok(system_timezone().unwrap_or(chrono_tz::UTC))
}

fn system_timezone() -> Option<Tz> {
    let name = iana_time_zone::get_timezone()
        .inspect_err(|e| tracing::debug!(error = %e, "Could not detect system timezone"))
        .ok()?;
    parse_timezone(&name).ok()
}

/// `http://host:port` from a bare `host:port`.
pub fn server_url(input: &str) -> Result<String> {
    let input = input.trim().trim_end_matches('/');
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };
    Url::parse(&with_scheme).with_context(|| format!("Invalid server address: {input}"))?;
    Ok(with_scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_from_link() {
        assert_eq!(
            reference("https://meet.example.com/schedule?book=abc123", "book"),
            "abc123"
        );
        assert_eq!(
            reference("https://meet.example.com/s?lang=en&edit=tok_en", "edit"),
            "tok_en"
        );
    }

    #[test]
    fn bare_values_pass_through() {
        assert_eq!(reference("  eyJ0aXRsZSI6IngifQ  ", "book"), "eyJ0aXRsZSI6IngifQ");
        assert_eq!(reference("a1b2c3d4e5f6", "book"), "a1b2c3d4e5f6");
    }

    #[test]
    fn link_without_the_param_is_used_whole() {
        let link = "https://meet.example.com/schedule";
        assert_eq!(reference(link, "book"), link);
    }

    #[test]
    fn plus_in_query_becomes_space() {
        // The token decoder turns spaces back into '+'.
        assert_eq!(reference("https://x.test/?book=ab+cd", "book"), "ab cd");
    }

    #[test]
    fn explicit_timezone() {
        assert_eq!(timezone(Some("Asia/Kolkata")).unwrap(), chrono_tz::Asia::Kolkata);
        assert!(timezone(Some("Mars/Base")).is_err());
    }

    #[test]
    fn server_url_adds_scheme() {
        assert_eq!(server_url("127.0.0.1:4100").unwrap(), "http://127.0.0.1:4100");
        assert_eq!(
            server_url("https://book.example.com/").unwrap(),
            "https://book.example.com"
        );
    }
}
