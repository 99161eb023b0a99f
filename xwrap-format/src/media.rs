//! Media type parsing and subset matching

use crate::error::{ReadError, Result};
use mime::Mime;
use std::fmt;
use std::str::FromStr;

/// Parsed media type
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType(Mime);

impl MediaType {
    /// Parse a media type string
    pub fn parse(input: &str) -> Result<Self> {
        input
            .trim()
            .parse::<Mime>()
            .map(MediaType)
            .map_err(|e| {
                ReadError::Configuration(format!("invalid media type '{}': {}", input, e))
            })
    }

    /// `type/subtype[+suffix]` without parameters
    pub fn essence(&self) -> &str {
        self.0.essence_str()
    }

    /// Value of the `charset` parameter, if any
    pub fn charset(&self) -> Option<&str> {
        self.0.get_param(mime::CHARSET).map(|name| name.as_str())
    }

    /// Whether this media type is a subset of `set`
    ///
    /// Types must be equal (or `set` a wildcard). When `set` carries a
    /// structured-syntax suffix, subtype and suffix must both be equal;
    /// otherwise `set`'s subtype must equal this subtype (without suffix) or
    /// this suffix, so `application/soap+xml` is a subset of `application/xml`.
    /// Every parameter of `set` other than `q` must appear here with the same
    /// value.
    pub fn is_subset_of(&self, set: &MediaType) -> bool {
        let (this, set) = (&self.0, &set.0);

        let type_matches = set.type_() == mime::STAR
            || eq_ignore_case(this.type_().as_str(), set.type_().as_str());
        if !type_matches {
            return false;
        }

        let subtype_matches = if set.subtype() == mime::STAR {
            true
        } else if let Some(set_suffix) = set.suffix() {
            match this.suffix() {
                Some(suffix) => {
                    eq_ignore_case(this.subtype().as_str(), set.subtype().as_str())
                        && eq_ignore_case(suffix.as_str(), set_suffix.as_str())
                }
                None => false,
            }
        } else {
            let plain = this.suffix().is_none()
                && eq_ignore_case(this.subtype().as_str(), set.subtype().as_str());
            let by_suffix = this
                .suffix()
                .map(|suffix| eq_ignore_case(suffix.as_str(), set.subtype().as_str()))
                .unwrap_or(false);
            plain || by_suffix
        };
        if !subtype_matches {
            return false;
        }

        set.params()
            .filter(|(name, _)| !eq_ignore_case(name.as_str(), "q"))
            .all(|(name, value)| {
                this.params().any(|(other_name, other_value)| {
                    eq_ignore_case(other_name.as_str(), name.as_str())
                        && eq_ignore_case(other_value.as_str(), value.as_str())
                })
            })
    }
}

impl FromStr for MediaType {
    type Err = ReadError;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Find the first supported media type the request content type is a subset of
///
/// Fails closed: an absent or unparsable content type matches nothing.
pub fn match_media_type<'a>(
    content_type: Option<&str>,
    supported: &'a [MediaType],
) -> Option<&'a MediaType> {
    let request = MediaType::parse(content_type?).ok()?;
    supported.iter().find(|set| request.is_subset_of(set))
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
