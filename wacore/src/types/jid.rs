use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_USER_SERVER: &str = "s.whatsapp.net";
pub const GROUP_SERVER: &str = "g.us";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JidError {
    #[error("Invalid JID format: {0}")]
    InvalidFormat(String),
}

/// Address of a one-to-one or group conversation.
///
/// The textual form is `user[.agent][:device]@server`. A `.` or `:` suffix
/// only counts as agent or device when it is a non-zero number; anything else
/// stays part of the user, so `john.doe@example.com` is a plain user. Serialization goes
/// through that string so a `Jid` survives a JSON round-trip unchanged, and the
/// derived ordering only looks at the fields, which keeps it stable across
/// process restarts.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Jid {
    pub user: String,
    pub server: String,
    pub agent: u8,
    pub device: u16,
}

impl Jid {
    pub fn new(user: &str, server: &str) -> Self {
        Self {
            user: user.to_string(),
            server: server.to_string(),
            ..Default::default()
        }
    }

    pub fn user(user: &str) -> Self {
        Self::new(user, DEFAULT_USER_SERVER)
    }

    pub fn group(id: &str) -> Self {
        Self::new(id, GROUP_SERVER)
    }

    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }

    pub fn is_empty(&self) -> bool {
        self.server.is_empty()
    }
}

impl FromStr for Jid {
    type Err = JidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(JidError::InvalidFormat(s.to_string()));
        }

        let (user_part, server) = match s.split_once('@') {
            Some((u, s)) => (u, s.to_string()),
            None => ("", s.to_string()),
        };

        if server.is_empty() || server.contains('@') {
            return Err(JidError::InvalidFormat(s.to_string()));
        }

        if user_part.is_empty() {
            return Ok(Jid::new("", &server));
        }

        let (user_base, device) = match numeric_suffix::<u16>(user_part, ':') {
            Some((u, d)) => (u, d),
            None => (user_part, 0),
        };
        let (user, agent) = match numeric_suffix::<u8>(user_base, '.') {
            Some((u, a)) => (u, a),
            None => (user_base, 0),
        };

        Ok(Jid {
            user: user.to_string(),
            server,
            agent,
            device,
        })
    }
}

/// Splits `value` at the last `sep` when what follows is a non-zero number.
fn numeric_suffix<T>(value: &str, sep: char) -> Option<(&str, T)>
where
    T: FromStr + Default + PartialEq,
{
    let (head, tail) = value.rsplit_once(sep)?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse::<T>()
        .ok()
        .filter(|n| *n != T::default())
        .map(|n| (head, n))
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user.is_empty() && self.agent == 0 && self.device == 0 {
            return write!(f, "{}", self.server);
        }
        write!(f, "{}", self.user)?;
        if self.agent > 0 {
            write!(f, ".{}", self.agent)?;
        }
        if self.device > 0 {
            write!(f, ":{}", self.device)?;
        }
        write!(f, "@{}", self.server)
    }
}

impl From<Jid> for String {
    fn from(jid: Jid) -> Self {
        jid.to_string()
    }
}

impl TryFrom<String> for Jid {
    type Error = JidError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Jid::from_str(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_roundtrip() {
        for raw in [
            "5511999887766@s.whatsapp.net",
            "5511999887766:33@s.whatsapp.net",
            "100000000000001.1:75@lid",
            "120363021033254949@g.us",
            "status@broadcast",
            "s.whatsapp.net",
        ] {
            let jid = Jid::from_str(raw).expect("test JID should be valid");
            assert_eq!(jid.to_string(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Jid::from_str("").is_err());
        assert!(Jid::from_str("123@").is_err());
        assert!(Jid::from_str("a@b@c").is_err());
    }

    #[test]
    fn test_non_numeric_suffixes_stay_in_user() {
        let jid: Jid = "john.doe@example.com".parse().unwrap();
        assert_eq!(jid, Jid::new("john.doe", "example.com"));

        let jid: Jid = "123:abc@s.whatsapp.net".parse().unwrap();
        assert_eq!(jid.user, "123:abc");
        assert_eq!(jid.device, 0);

        // Zero is the "absent" value, so it cannot be a component.
        let jid: Jid = "room.0@example.com".parse().unwrap();
        assert_eq!(jid.user, "room.0");
        assert_eq!(jid.agent, 0);

        // Too large for an agent.
        let jid: Jid = "team.300@example.com".parse().unwrap();
        assert_eq!(jid.user, "team.300");
    }

    #[test]
    fn test_json_roundtrip_of_unusual_jids() {
        let device_only = Jid {
            device: 7,
            ..Jid::new("", "s.whatsapp.net")
        };
        for jid in [
            Jid::new("john.doe", "example.com"),
            Jid::new("a:b.c", "example.com"),
            Jid::new("room.0", "example.com"),
            device_only,
        ] {
            let json = serde_json::to_string(&jid).unwrap();
            let back: Jid = serde_json::from_str(&json).unwrap();
            assert_eq!(back, jid, "{json}");
        }
    }

    #[test]
    fn test_json_uses_string_form() {
        let jid = Jid::group("120363021033254949");
        let json = serde_json::to_string(&jid).unwrap();
        assert_eq!(json, "\"120363021033254949@g.us\"");

        let back: Jid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, jid);
        assert!(back.is_group());
    }

    #[test]
    fn test_ordering_is_field_based() {
        let a = Jid::user("111");
        let b = Jid::user("222");
        let a_again: Jid = "111@s.whatsapp.net".parse().unwrap();

        assert!(a < b);
        assert_eq!(a.cmp(&a_again), std::cmp::Ordering::Equal);
    }
}
