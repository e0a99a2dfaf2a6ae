//! Fixed-layout discovery datagram.
//!
//! ```text
//! offset  size  field
//!      0     4  magic cookie 0xABCDDCBA (big endian)
//!      4     1  message type 0x02
//!      5     2  server TCP port (big endian)
//!      7    32  server name, UTF-8, NUL padded
//! ```

use std::fmt;

use super::errors::OfferError;

pub const MAGIC_COOKIE: u32 = 0xABCD_DCBA;

pub const OFFER_TYPE: u8 = 0x2;

/// Width of the server name field.
pub const NAME_LEN: usize = 32;

/// Encoded size of an offer.
pub const OFFER_LEN: usize = 4 + 1 + 2 + NAME_LEN;

/// A server's advertisement of where its game sessions can be reached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiscoveryOffer {
    pub port: u16,
    name: String,
}

impl DiscoveryOffer {
    /// Names longer than [`NAME_LEN`] bytes are cut at the last character
    /// boundary that fits.
    #[must_use]
    pub fn new(port: u16, name: &str) -> Self {
        let mut end = name.len().min(NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            port,
            name: name[..end].to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn encode(&self) -> [u8; OFFER_LEN] {
        let mut buf = [0; OFFER_LEN];
        buf[0..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf[4] = OFFER_TYPE;
        buf[5..7].copy_from_slice(&self.port.to_be_bytes());
        let name = self.name.as_bytes();
        buf[7..7 + name.len()].copy_from_slice(name);
        buf
    }

    /// Parse the first [`OFFER_LEN`] bytes of `buf`. Anything after that is
    /// ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, OfferError> {
        if buf.len() < OFFER_LEN {
            return Err(OfferError::TooShort { len: buf.len() });
        }
        let cookie = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if cookie != MAGIC_COOKIE {
            return Err(OfferError::BadCookie(cookie));
        }
        if buf[4] != OFFER_TYPE {
            return Err(OfferError::BadType(buf[4]));
        }
        let port = u16::from_be_bytes([buf[5], buf[6]]);
        let raw = &buf[7..OFFER_LEN];
        let end = raw
            .iter()
            .rposition(|&b| b != 0 && b != b' ')
            .map_or(0, |i| i + 1);
        let name = String::from_utf8_lossy(&raw[..end]).into_owned();
        Ok(Self { port, name })
    }
}

impl fmt::Display for DiscoveryOffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' on port {}", self.name, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let buf = DiscoveryOffer::new(0x1234, "dealer").encode();
        assert_eq!(&buf[0..4], &[0xAB, 0xCD, 0xDC, 0xBA]);
        assert_eq!(buf[4], 0x02);
        assert_eq!(&buf[5..7], &[0x12, 0x34]);
        assert_eq!(&buf[7..13], b"dealer");
        assert!(buf[13..].iter().all(|&b| b == 0));
    }

    #[test]
    fn encode_then_decode() {
        let offer = DiscoveryOffer::new(40123, "Blackijecky");
        let decoded = DiscoveryOffer::decode(&offer.encode()).unwrap();
        assert_eq!(decoded.port, 40123);
        assert_eq!(decoded.name(), "Blackijecky");
    }

    #[test]
    fn flipped_cookie_is_malformed() {
        let mut buf = DiscoveryOffer::new(1, "x").encode();
        buf[0] ^= 0xFF;
        assert!(matches!(
            DiscoveryOffer::decode(&buf),
            Err(OfferError::BadCookie(_))
        ));
    }

    #[test]
    fn wrong_type_is_malformed() {
        let mut buf = DiscoveryOffer::new(1, "x").encode();
        buf[4] = 0x3;
        assert_eq!(DiscoveryOffer::decode(&buf), Err(OfferError::BadType(3)));
    }

    #[test]
    fn short_buffer_is_malformed() {
        let buf = DiscoveryOffer::new(1, "x").encode();
        assert_eq!(
            DiscoveryOffer::decode(&buf[..OFFER_LEN - 1]),
            Err(OfferError::TooShort { len: OFFER_LEN - 1 })
        );
        assert!(DiscoveryOffer::decode(&[]).is_err());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut buf = DiscoveryOffer::new(7, "srv").encode().to_vec();
        buf.extend_from_slice(b"garbage");
        assert_eq!(
            DiscoveryOffer::decode(&buf),
            Ok(DiscoveryOffer::new(7, "srv"))
        );
    }

    #[test]
    fn space_padding_is_stripped() {
        let mut buf = DiscoveryOffer::new(7, "").encode();
        buf[7..7 + 3].copy_from_slice(b"srv");
        buf[10..].fill(b' ');
        assert_eq!(DiscoveryOffer::decode(&buf).unwrap().name(), "srv");
    }

    #[test]
    fn long_names_truncate_on_char_boundary() {
        let name = "é".repeat(20);
        let offer = DiscoveryOffer::new(1, &name);
        assert_eq!(offer.name().len(), 32);
        let decoded = DiscoveryOffer::decode(&offer.encode()).unwrap();
        assert_eq!(decoded.name(), "é".repeat(16));

        let odd = format!("a{}", "é".repeat(20));
        assert_eq!(DiscoveryOffer::new(1, &odd).name().len(), 31);
    }
}
