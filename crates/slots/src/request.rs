#![forbid(unsafe_code)]

use crate::RequestError;
use url::Url;

/// Optional parameters attached to a prefetch request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchParams {
    /// Extra request headers, sent as given.
    pub additional_headers: Vec<(String, String)>,
    /// Expected `No-Vary-Search` hint of the response.
    pub expected_no_vary_search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchRequest {
    pub url: String,
    pub params: Option<PrefetchParams>,
}

impl PrefetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: PrefetchParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Default::default)
            .additional_headers
            .push((name.into(), value.into()));
        self
    }

    /// Check the request before handing it to a pipeline.
    ///
    /// The URL is checked first, then the feature switch, then the headers.
    pub fn validate(&self, triggers_enabled: bool) -> Result<(), RequestError> {
        if !is_https(&self.url) {
            return Err(RequestError::NotHttps(self.url.clone()));
        }
        if !triggers_enabled {
            return Err(RequestError::FeatureDisabled);
        }
        let Some(params) = &self.params else {
            return Ok(());
        };
        for (name, value) in &params.additional_headers {
            if !is_header_name(name) {
                return Err(RequestError::InvalidHeaderName(name.clone()));
            }
            if !is_header_value(value) {
                return Err(RequestError::InvalidHeaderValue(name.clone()));
            }
        }
        Ok(())
    }
}

/// `https://` followed by a non-empty host, parsed as a whole.
fn is_https(url: &str) -> bool {
    let Some(prefix) = url.get(.."https://".len()) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case("https://") {
        return false;
    }
    // an empty authority would be skipped over by the parser
    if url[prefix.len()..].starts_with(['/', '\\']) {
        return false;
    }
    Url::parse(url).is_ok_and(|url| url.scheme() == "https" && url.host().is_some())
}

/// RFC 7230 `token`.
fn is_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

fn is_header_value(value: &str) -> bool {
    !value.bytes().any(|b| matches!(b, b'\r' | b'\n' | b'\0'))
}
