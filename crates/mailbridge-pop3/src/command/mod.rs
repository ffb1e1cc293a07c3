//! POP3 command serialization.

/// POP3 command sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// USER - Name the mailbox
    User(String),
    /// PASS - Mailbox password
    Pass(String),
    /// STLS - Upgrade to TLS (RFC 2595)
    Stls,
    /// CAPA - List server capabilities (RFC 2449)
    Capa,
    /// STAT - Maildrop message count and size
    Stat,
    /// LIST - Scan listing of every message
    List,
    /// RETR - Retrieve a message
    Retr(u32),
    /// DELE - Mark a message as deleted
    Dele(u32),
    /// RSET - Unmark messages marked as deleted
    Rset,
    /// QUIT - Commit deletions and close
    Quit,
}

impl Command {
    /// Serializes the command to a CRLF-terminated line.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = match self {
            Self::User(name) => format!("USER {name}"),
            Self::Pass(password) => format!("PASS {password}"),
            Self::Stls => "STLS".to_string(),
            Self::Capa => "CAPA".to_string(),
            Self::Stat => "STAT".to_string(),
            Self::List => "LIST".to_string(),
            Self::Retr(index) => format!("RETR {index}"),
            Self::Dele(index) => format!("DELE {index}"),
            Self::Rset => "RSET".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
        .into_bytes();

        line.extend_from_slice(b"\r\n");
        line
    }

    /// Returns the command with the password masked, for logging.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Pass(_) => "PASS ***".to_string(),
            other => String::from_utf8_lossy(&other.serialize())
                .trim_end()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_commands() {
        assert_eq!(
            Command::User("alice@example.com".into()).serialize(),
            b"USER alice@example.com\r\n"
        );
        assert_eq!(Command::Pass("s3cret".into()).serialize(), b"PASS s3cret\r\n");
    }

    #[test]
    fn indexed_commands() {
        assert_eq!(Command::List.serialize(), b"LIST\r\n");
        assert_eq!(Command::Retr(12).serialize(), b"RETR 12\r\n");
        assert_eq!(Command::Dele(1).serialize(), b"DELE 1\r\n");
    }

    #[test]
    fn redaction_hides_password() {
        assert_eq!(Command::Pass("s3cret".into()).redacted(), "PASS ***");
        assert_eq!(Command::User("alice".into()).redacted(), "USER alice");
        assert_eq!(Command::Stat.redacted(), "STAT");
    }
}
