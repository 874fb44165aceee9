use std::fmt;

use chrono::{DateTime, Utc};

/// A response cookie, serialized in `Set-Cookie` form by `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }
}

impl fmt::Display for Cookie {
    /// `name=value; path=/` followed by whichever optional attributes are set.
    /// The path defaults to `/`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; path={}",
            self.name,
            self.value,
            self.path.as_deref().unwrap_or("/")
        )?;
        if let Some(expires) = self.expires {
            write!(f, "; expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT"))?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; domain={domain}")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn minimal_cookie_has_default_path() {
        assert_eq!(Cookie::new("visited", "1").to_string(), "visited=1; path=/");
    }

    #[test]
    fn every_attribute() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 15, 8, 30, 0).unwrap();
        let cookie = Cookie::new("session", "abc")
            .with_path("/app")
            .with_domain("example.com")
            .with_expires(expires)
            .secure()
            .http_only();

        assert_eq!(
            cookie.to_string(),
            "session=abc; path=/app; expires=Tue, 15 Jan 2030 08:30:00 GMT; \
             domain=example.com; Secure; HttpOnly"
        );
    }

    #[test]
    fn flags_without_dates() {
        let cookie = Cookie::new("a", "b").http_only();
        assert_eq!(cookie.to_string(), "a=b; path=/; HttpOnly");
    }
}
