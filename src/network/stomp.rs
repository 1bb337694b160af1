//! STOMP 1.2 text frames as carried inside WebSocket text messages.

use std::fmt;

use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "CONNECT" | "STOMP" => Self::Connect,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            _ => return None,
        })
    }

    /// CONNECT and CONNECTED headers are sent verbatim.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header called `name`; repeated headers after the
    /// first are ignored.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn connect(host: &str) -> Self {
        Self::new(Command::Connect)
            .header("accept-version", "1.1,1.2")
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn unsubscribe(id: &str) -> Self {
        Self::new(Command::Unsubscribe).header("id", id)
    }

    pub fn send(destination: &str, content_type: &str, body: impl Into<String>) -> Self {
        Self::new(Command::Send)
            .header("destination", destination)
            .header("content-type", content_type)
            .with_body(body)
    }

    pub fn disconnect(receipt: &str) -> Self {
        Self::new(Command::Disconnect).header("receipt", receipt)
    }

    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');

        let escape = self.command.escapes_headers();
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }

        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parses one frame. Returns `Ok(None)` for a heart-beat (a message made
    /// only of end-of-line characters).
    pub fn decode(raw: &str) -> Result<Option<Self>, ChatError> {
        let text = raw.trim_start_matches(['\r', '\n']);
        if text.is_empty() || text == "\0" {
            return Ok(None);
        }

        let (head, rest) = split_head(text)
            .ok_or_else(|| ChatError::Protocol("frame has no header terminator".to_string()))?;

        let mut lines = head.lines().map(|line| line.trim_end_matches('\r'));
        let command_line = lines.next().unwrap_or_default();
        let command = Command::parse(command_line)
            .ok_or_else(|| ChatError::Protocol(format!("unknown command `{command_line}`")))?;

        let mut headers = Vec::new();
        for line in lines.filter(|line| !line.is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ChatError::Protocol(format!("malformed header `{line}`")))?;
            if command.escapes_headers() {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let frame = Self {
            command,
            headers,
            body: String::new(),
        };
        let body = read_body(&frame, rest)?;
        Ok(Some(frame.with_body(body)))
    }
}

fn split_head(text: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches('\n').trim_end_matches('\r');
        if content.is_empty() && offset > 0 {
            return Some((&text[..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn read_body(frame: &Frame, rest: &str) -> Result<String, ChatError> {
    if let Some(length) = frame.get("content-length") {
        let length: usize = length
            .trim()
            .parse()
            .map_err(|_| ChatError::Protocol(format!("bad content-length `{length}`")))?;
        return rest
            .get(..length)
            .map(str::to_string)
            .ok_or_else(|| ChatError::Protocol("body shorter than content-length".to_string()));
    }

    Ok(match rest.find('\0') {
        Some(end) => rest[..end].to_string(),
        None => rest.to_string(),
    })
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, ChatError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(ChatError::Protocol(format!(
                    "invalid header escape `\\{}`",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test_log::test]
    fn encodes_send_with_content_length() {
        let frame = Frame::send("/app/typing/abc", "text/plain", "alice");
        assert_eq!(
            frame.encode(),
            "SEND\ndestination:/app/typing/abc\ncontent-type:text/plain\ncontent-length:5\n\nalice\0"
        );
    }

    #[test_log::test]
    fn connect_headers_are_not_escaped() {
        let encoded = Frame::connect("chat.example:3105").encode();
        assert!(encoded.starts_with("CONNECT\naccept-version:1.1,1.2\nhost:chat.example:3105\n"));
        assert!(encoded.ends_with("\n\n\0"));
    }

    #[test_log::test]
    fn decodes_broker_message() {
        let raw = "MESSAGE\ndestination:/topic/room/abc\ncontent-type:application/json\n\
                   subscription:sub-0\nmessage-id:k2l-1\ncontent-length:37\n\n\
                   {\"sender\":\"bob\",\"content\":\"hi there\"}\0\n";
        let frame = Frame::decode(raw).unwrap().unwrap();

        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.get("subscription"), Some("sub-0"));
        assert_eq!(frame.get("destination"), Some("/topic/room/abc"));
        assert_eq!(frame.body, r#"{"sender":"bob","content":"hi there"}"#);
    }

    #[test_log::test]
    fn decodes_crlf_frames_without_content_length() {
        let frame = Frame::decode("CONNECTED\r\nversion:1.2\r\nheart-beat:0,0\r\n\r\n\0")
            .unwrap()
            .unwrap();

        assert_eq!(frame.command, Command::Connected);
        assert_eq!(frame.get("version"), Some("1.2"));
        assert_eq!(frame.body, "");
    }

    #[test_log::test]
    fn heartbeats_decode_to_nothing() {
        assert_eq!(Frame::decode("\n").unwrap(), None);
        assert_eq!(Frame::decode("\r\n").unwrap(), None);
        assert_eq!(Frame::decode("").unwrap(), None);
    }

    #[test_log::test]
    fn content_length_allows_nul_in_body() {
        let frame = Frame::decode("MESSAGE\ncontent-length:3\n\na\0b\0").unwrap().unwrap();
        assert_eq!(frame.body, "a\0b");
    }

    #[test_log::test]
    fn first_repeated_header_wins() {
        let frame = Frame::decode("MESSAGE\nfoo:first\nfoo:second\n\n\0").unwrap().unwrap();
        assert_eq!(frame.get("foo"), Some("first"));
    }

    #[test_log::test]
    fn escaped_header_values_survive_a_trip() {
        let frame = Frame::new(Command::Message).header("note", "a:b\\c\nd");
        let decoded = Frame::decode(&frame.encode()).unwrap().unwrap();
        assert_eq!(decoded.get("note"), Some("a:b\\c\nd"));
    }

    #[test_log::test]
    fn rejects_garbage() {
        assert!(matches!(
            Frame::decode("HELLO\n\n\0"),
            Err(ChatError::Protocol(_))
        ));
        assert!(matches!(
            Frame::decode("MESSAGE\ndestination:/x"),
            Err(ChatError::Protocol(_))
        ));
        assert!(matches!(
            Frame::decode("MESSAGE\nbad\\xheader:1\n\n\0"),
            Err(ChatError::Protocol(_))
        ));
        assert!(matches!(
            Frame::decode("MESSAGE\ncontent-length:10\n\nabc\0"),
            Err(ChatError::Protocol(_))
        ));
    }
}
