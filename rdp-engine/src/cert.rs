//! Certificate verification types for the engine callback contract.

/// TLS certificate details presented during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateInfo {
    pub host: String,
    pub port: u16,
    pub common_name: String,
    pub subject: String,
    pub issuer: String,
    pub fingerprint: String,
}

/// Outcome of certificate verification.
///
/// The numeric codes follow the engine contract: 0 rejects the connection,
/// 1 trusts the certificate permanently, 2 accepts it for this session only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateVerdict {
    Reject,
    AcceptPermanent,
    AcceptOnce,
}

impl CertificateVerdict {
    /// Wire code as defined by the callback contract.
    pub const fn code(self) -> u32 {
        match self {
            Self::Reject => 0,
            Self::AcceptPermanent => 1,
            Self::AcceptOnce => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn verdict_codes_match_contract() {
        assert_eq!(CertificateVerdict::Reject.code(), 0);
        assert_eq!(CertificateVerdict::AcceptPermanent.code(), 1);
        assert_eq!(CertificateVerdict::AcceptOnce.code(), 2);
    }
}
