//! QR payload parsing

use serde::Serialize;
use std::fmt;

/// Visitor identity decoded from a badge
///
/// Both fields are trimmed and non-empty. The only constructor is [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VisitorIdentity {
    name: String,
    id: String,
}

impl VisitorIdentity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for VisitorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.id)
    }
}

/// Parse decoded QR text of the form `<name>.<id>`
///
/// Returns `None` for anything else, including empty input, payloads where
/// either side is blank after trimming, and payloads with control
/// characters (line breaks included) left inside either side.
///
/// # Examples
/// ```
/// use visitor_kiosk::visitor::parse;
///
/// let visitor = parse("田中.太郎.12345").unwrap();
/// assert_eq!(visitor.name(), "田中.太郎");
/// assert_eq!(visitor.id(), "12345");
/// assert!(parse("name.").is_none());
/// ```
pub fn parse(text: &str) -> Option<VisitorIdentity> {
    let (name, id) = text.rsplit_once('.')?;
    let name = name.trim();
    let id = id.trim();

    if name.is_empty() || id.is_empty() {
        return None;
    }
    if name.chars().chain(id.chars()).any(char::is_control) {
        return None;
    }

    Some(VisitorIdentity {
        name: name.to_string(),
        id: id.to_string(),
    })
}
