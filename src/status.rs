use std::process::ExitCode;

/// Outcome of a mail check, as reported through the exit status.
///
/// The polarity is the reverse of the usual "0 = nothing to report": status
/// bar scripts treat 0 as "show the mail indicator".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailStatus {
    /// At least one unread entry. Exit status 0.
    NewMail,
    /// No unread entries, or the check failed. Exit status 1.
    NoMail,
}

impl MailStatus {
    pub fn code(self) -> u8 {
        match self {
            MailStatus::NewMail => 0,
            MailStatus::NoMail => 1,
        }
    }
}

impl From<MailStatus> for ExitCode {
    fn from(status: MailStatus) -> Self {
        ExitCode::from(status.code())
    }
}

pub fn decide(entries: usize) -> MailStatus {
    if entries == 0 {
        MailStatus::NoMail
    } else {
        MailStatus::NewMail
    }
}
