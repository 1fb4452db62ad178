//! Command parsing and the wire vocabulary.

/// Every control marker the protocol puts on the wire, in one place.
pub mod wire {
    pub const USERNAME_PROMPT: &str = "USERNAME:";
    pub const PASSWORD_PROMPT: &str = "PASSWORD:";
    pub const AUTH_OK: &str = "AUTH_OK";
    pub const AUTH_FAIL: &str = "AUTH_FAIL";

    pub const END_OF_LIST: &str = "END";
    pub const READY: &str = "READY";
    pub const UPLOAD_OK: &str = "OK uploaded (pending admin approval)";
    pub const APPROVED: &str = "APPROVED";
    pub const DENIED: &str = "DENIED";

    /// Prefix of the GET success marker: `OK <size>`.
    pub const OK_PREFIX: &str = "OK ";
    /// Prefix of the PUT size declaration: `SIZE <n>`.
    pub const SIZE_PREFIX: &str = "SIZE ";

    pub const ERR: &str = "ERR";
    pub const ERR_INVALID: &str = "ERR invalid";
    pub const ERR_PROTOCOL: &str = "ERR protocol";
    pub const ERR_BAD_NAME: &str = "ERR bad_name";
    pub const ERR_TOO_LARGE: &str = "ERR too_large";
    pub const ERR_CANNOT_OPEN: &str = "ERR cannot_open";
    pub const ERR_NO_SUCH_FILE: &str = "ERR no such file";
    pub const ERR_MOVE_FAILED: &str = "ERR move_failed";
    pub const ERR_NO_OPERATOR: &str = "ERR operator_unavailable";
}

/// One parsed command line: a verb plus at most one argument.
///
/// The argument is taken verbatim from the rest of the line, spaces
/// included; whether it is a usable filename is decided later by
/// [`crate::storage::repository::validate_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Get(String),
    Put(String),
    Request(String),
    Exit,
}

impl Command {
    /// Parse one command line. Returns `None` for anything outside the
    /// five accepted forms; the session answers those with `ERR invalid`.
    pub fn parse(line: &str) -> Option<Self> {
        if line == "LIST" {
            return Some(Command::List);
        }
        if line == "EXIT" {
            return Some(Command::Exit);
        }
        if let Some(name) = line.strip_prefix("GET ") {
            return Some(Command::Get(name.to_string()));
        }
        if let Some(name) = line.strip_prefix("PUT ") {
            return Some(Command::Put(name.to_string()));
        }
        if let Some(name) = line.strip_prefix("REQUEST ") {
            return Some(Command::Request(name.to_string()));
        }
        None
    }
}
