//! Core domain types shared across PropTrust services

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Kind of land-record document presented for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// Record of Rights, Tenancy and Crops
    Rtc,
    /// Mutation Register extract
    Mr,
    /// Encumbrance Certificate
    Ec,
    /// Registered sale deed
    SaleDeed,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Rtc => "RTC",
            DocumentType::Mr => "MR",
            DocumentType::Ec => "EC",
            DocumentType::SaleDeed => "SALE_DEED",
            DocumentType::Unknown => "UNKNOWN",
        }
    }

    /// Parse a declared document type; unrecognized values are `Unknown`.
    pub fn parse(s: &str) -> DocumentType {
        match s.trim().to_ascii_uppercase().as_str() {
            "RTC" => DocumentType::Rtc,
            "MR" => DocumentType::Mr,
            "EC" => DocumentType::Ec,
            "SALE_DEED" | "SALEDEED" => DocumentType::SaleDeed,
            _ => DocumentType::Unknown,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level derived from the numeric risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Thresholds: 0-30 Low, 31-60 Medium, 61-100 High.
    pub fn from_score(score: u8) -> RiskLevel {
        match score {
            0..=30 => RiskLevel::Low,
            31..=60 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> RiskLevel {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => RiskLevel::Low,
            "MEDIUM" => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SHA-256 digest of the canonical verification record. Always 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; 32]) -> Fingerprint {
        Fingerprint(bytes)
    }

    /// Decode from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Fingerprint> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        if hex.len() != 64 {
            return Err(Error::BadInput(format!(
                "fingerprint must be 64 hex characters, got {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk)
                .map_err(|_| Error::BadInput("fingerprint is not valid hex".into()))?;
            bytes[i] = u8::from_str_radix(s, 16)
                .map_err(|_| Error::BadInput("fingerprint is not valid hex".into()))?;
        }
        Ok(Fingerprint(bytes))
    }

    /// Decode from a raw 32-byte slice (as stored in the ledger table).
    pub fn from_slice(bytes: &[u8]) -> Result<Fingerprint> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::BadInput(format!("fingerprint must be 32 bytes, got {}", bytes.len())))?;
        Ok(Fingerprint(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_round_trips() {
        for dt in [
            DocumentType::Rtc,
            DocumentType::Mr,
            DocumentType::Ec,
            DocumentType::SaleDeed,
            DocumentType::Unknown,
        ] {
            assert_eq!(DocumentType::parse(dt.as_str()), dt);
        }
        assert_eq!(DocumentType::parse("patta"), DocumentType::Unknown);
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(31), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(61), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn fingerprint_hex_round_trip() {
        let fp = Fingerprint::from_bytes([0xab; 32]);
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), fp);
        assert_eq!(Fingerprint::from_hex(&format!("0x{hex}")).unwrap(), fp);
    }

    #[test]
    fn fingerprint_rejects_bad_lengths() {
        assert!(Fingerprint::from_hex("abcd").is_err());
        assert!(Fingerprint::from_slice(&[0u8; 31]).is_err());
    }
}
