// Copyright 2025 the junction developers.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The [`Type`] structure for DNS RR types and the [`RrFlags`] bit set
//! recorded on radix-tree nodes.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record.
///
/// An RR type is represented on the wire as an unsigned 16-bit
/// integer. Hence this is basically a wrapper around `u16` with nice
/// [`Debug`](fmt::Debug), [`Display`](fmt::Display), and [`FromStr`]
/// implementations, as well as constants for the types the router
/// dispatches on. The record data behind a type is opaque to this
/// crate.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Type(u16);

impl Type {
    pub const A: Type = Type(1);
    pub const NS: Type = Type(2);
    pub const CNAME: Type = Type(5);
    pub const SOA: Type = Type(6);
    pub const PTR: Type = Type(12);
    pub const MX: Type = Type(15);
    pub const TXT: Type = Type(16);
    pub const AAAA: Type = Type(28);
    pub const SRV: Type = Type(33);
    pub const DNAME: Type = Type(39);
    pub const DS: Type = Type(43);
    pub const RRSIG: Type = Type(46);
    pub const NSEC: Type = Type(47);
    pub const DNSKEY: Type = Type(48);
    pub const NSEC3: Type = Type(50);
    pub const ANY: Type = Type(255);

    /// The zero type. [`TypeEntry`](crate::TypeEntry) uses it for the
    /// `type_covered` field of entries that are not RRSIGs.
    pub const NONE: Type = Type(0);
}

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match Caseless(text) {
            Caseless("A") => Ok(Self::A),
            Caseless("NS") => Ok(Self::NS),
            Caseless("CNAME") => Ok(Self::CNAME),
            Caseless("SOA") => Ok(Self::SOA),
            Caseless("PTR") => Ok(Self::PTR),
            Caseless("MX") => Ok(Self::MX),
            Caseless("TXT") => Ok(Self::TXT),
            Caseless("AAAA") => Ok(Self::AAAA),
            Caseless("SRV") => Ok(Self::SRV),
            Caseless("DNAME") => Ok(Self::DNAME),
            Caseless("DS") => Ok(Self::DS),
            Caseless("RRSIG") => Ok(Self::RRSIG),
            Caseless("NSEC") => Ok(Self::NSEC),
            Caseless("DNSKEY") => Ok(Self::DNSKEY),
            Caseless("NSEC3") => Ok(Self::NSEC3),
            Caseless("ANY") => Ok(Self::ANY),
            _ => {
                if text
                    .get(0..4)
                    .map_or(false, |prefix| prefix.eq_ignore_ascii_case("TYPE"))
                {
                    text[4..]
                        .parse::<u16>()
                        .map(Self::from)
                        .or(Err("type value is not a valid unsigned 16-bit integer"))
                } else {
                    Err("unknown type")
                }
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", *self)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::A => write!(f, "A"),
            Self::NS => write!(f, "NS"),
            Self::CNAME => write!(f, "CNAME"),
            Self::SOA => write!(f, "SOA"),
            Self::PTR => write!(f, "PTR"),
            Self::MX => write!(f, "MX"),
            Self::TXT => write!(f, "TXT"),
            Self::AAAA => write!(f, "AAAA"),
            Self::SRV => write!(f, "SRV"),
            Self::DNAME => write!(f, "DNAME"),
            Self::DS => write!(f, "DS"),
            Self::RRSIG => write!(f, "RRSIG"),
            Self::NSEC => write!(f, "NSEC"),
            Self::DNSKEY => write!(f, "DNSKEY"),
            Self::NSEC3 => write!(f, "NSEC3"),
            Self::ANY => write!(f, "ANY"),
            Self(value) => write!(f, "TYPE{}", value), // RFC 3597 § 5
        }
    }
}

////////////////////////////////////////////////////////////////////////
// NODE RR FLAGS                                                      //
////////////////////////////////////////////////////////////////////////

/// The subset of RR types a radix-tree node is flagged with.
///
/// A node owning an NS or SOA record (that originates within its
/// registration origin) is a *zone* node; one owning a DNAME record
/// authoritatively replaces its subtree during lookup. The flags are
/// maintained by the node's type table as entries are appended.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct RrFlags(u8);

impl RrFlags {
    pub const NONE: Self = Self(0);
    pub const NS: Self = Self(1 << 0);
    pub const SOA: Self = Self(1 << 1);
    pub const DNAME: Self = Self(1 << 2);

    /// NS or SOA: the mask identifying zone nodes.
    pub const ZONE: Self = Self(Self::NS.0 | Self::SOA.0);

    /// Returns whether any flag in `mask` is set.
    pub fn intersects(self, mask: Self) -> bool {
        self.0 & mask.0 != 0
    }

    /// Returns whether every flag in `mask` is set.
    pub fn contains(self, mask: Self) -> bool {
        self.0 & mask.0 == mask.0
    }
}

impl BitOr for RrFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RrFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for RrFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut wrote = false;
        for (bit, label) in [(Self::NS, "NS"), (Self::SOA, "SOA"), (Self::DNAME, "DNAME")] {
            if self.contains(bit) {
                if wrote {
                    f.write_str("|")?;
                }
                f.write_str(label)?;
                wrote = true;
            }
        }
        if !wrote {
            f.write_str("NONE")?;
        }
        Ok(())
    }
}
