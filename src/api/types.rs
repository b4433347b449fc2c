use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ValidationStatus {
    InProgress,
    Completed,
    Deleted,
    Expired,
    #[serde(other)]
    Unknown,
}

impl Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "InProgress"),
            Self::Completed => write!(f, "Completed"),
            Self::Deleted => write!(f, "Deleted"),
            Self::Expired => write!(f, "Expired"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
pub enum QualityLevel {
    #[default]
    Standard,
    High,
    Extreme,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
pub enum Deduplication {
    #[default]
    Off,
    Safe,
    Relaxed,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EntryClassification {
    Deliverable,
    Risky,
    Undeliverable,
    #[serde(other)]
    Unknown,
}

impl Display for EntryClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deliverable => write!(f, "Deliverable"),
            Self::Risky => write!(f, "Risky"),
            Self::Undeliverable => write!(f, "Undeliverable"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EntryStatus {
    Success,
    CatchAllConnectionFailure,
    CatchAllValidationTimeout,
    DnsConnectionFailure,
    DnsQueryTimeout,
    DomainDoesNotExist,
    DomainHasNullMx,
    DomainIsMisconfigured,
    DomainIsWellKnownDea,
    DomainPartCompliancyFailure,
    DoubleDotSequence,
    Duplicate,
    InvalidAddressLength,
    InvalidCharacterInSequence,
    InvalidEmptyQuotedWord,
    InvalidFoldingWhiteSpaceSequence,
    InvalidLocalPartLength,
    InvalidWordBoundaryStart,
    IspSpecificSyntaxFailure,
    LocalEndPointRejected,
    LocalPartIsWellKnownRoleAccount,
    LocalSenderAddressRejected,
    MailboxConnectionFailure,
    MailboxDoesNotExist,
    MailboxIsDea,
    MailboxTemporarilyUnavailable,
    MailboxValidationTimeout,
    MailExchangerIsHoneypot,
    MailExchangerIsParked,
    MailExchangerIsWellKnownDea,
    OverrideMatch,
    ServerDoesNotSupportInternationalMailboxes,
    ServerIsCatchAll,
    ServerTemporaryUnavailable,
    SmtpConnectionFailure,
    SmtpConnectionTimeout,
    SmtpDialogError,
    UnacceptableDomainLiteral,
    UnbalancedCommentParenthesis,
    UnexpectedQuotedPairSequence,
    UnhandledException,
    UnmatchedQuotedPair,
    #[serde(other)]
    Unknown,
}

/// Serde helpers for the service's time span text form,
/// `[d.]hh:mm:ss[.fffffff]`.
pub mod time_span {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// # Errors
    ///
    /// Fails on anything that is not `[d.]hh:mm:ss[.fraction]` with hours
    /// below 24 and minutes and seconds below 60.
    pub fn parse(raw: &str) -> Result<Duration, String> {
        let invalid = || format!("invalid time span: {raw}");
        let number = |part: &str| part.parse::<u64>().map_err(|_| invalid());

        // Days are separated by a dot placed before the first colon
        let first_colon = raw.find(':').ok_or_else(invalid)?;
        let (days, rest) = match raw[..first_colon].split_once('.') {
            Some((days, _)) => (days, &raw[days.len() + 1..]),
            None => ("0", raw),
        };
        let (clock, fraction) = match rest.split_once('.') {
            Some((clock, fraction)) => (clock, Some(fraction)),
            None => (rest, None),
        };

        let parts: Vec<&str> = clock.split(':').collect();
        let &[hours, minutes, seconds] = parts.as_slice() else {
            return Err(invalid());
        };
        let (days, hours, minutes, seconds) =
            (number(days)?, number(hours)?, number(minutes)?, number(seconds)?);
        if hours >= 24 || minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        let nanos = match fraction {
            Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                let padded: String = digits.chars().chain("000000000".chars()).take(9).collect();
                padded.parse::<u32>().map_err(|_| invalid())?
            }
            Some(_) => return Err(invalid()),
            None => 0,
        };

        let total = days * 86_400 + hours * 3_600 + minutes * 60 + seconds;
        Ok(Duration::new(total, nanos))
    }

    pub fn format(duration: &Duration) -> String {
        let total = duration.as_secs();
        let (days, rest) = (total / 86_400, total % 86_400);
        let clock = format!("{:02}:{:02}:{:02}", rest / 3_600, rest % 3_600 / 60, rest % 60);
        let clock = if days > 0 {
            format!("{days}.{clock}")
        } else {
            clock
        };

        match duration.subsec_nanos() {
            0 => clock,
            nanos => format!("{clock}.{:07}", nanos / 100),
        }
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S: Serializer>(
            duration: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match duration {
                Some(duration) => super::serialize(duration, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(de::Error::custom))
                .transpose()
        }
    }
}
