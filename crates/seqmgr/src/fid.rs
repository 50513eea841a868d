use core::fmt;

/// Number of bytes in the big-endian encoding of a [`Fid`]
/// (64-bit sequence, 32-bit oid, 32-bit version).
pub const FID_SIZE: usize = 16;

/// A file identifier: the `(sequence, oid, version)` triple naming exactly one
/// object in the system.
///
/// `seq` is one sequence drawn from a granted range, `oid` counts objects
/// within that sequence starting at the configured initial oid, and `ver` is
/// reserved for reuse semantics and always minted as `0`.
///
/// Ordering is by `seq`, then `oid`, then `ver`, so identifiers minted by one
/// client compare in the order they were minted.
///
/// # Example
/// ```
/// use seqmgr::Fid;
///
/// let a = Fid::new(5, 1, 0);
/// let b = Fid::new(5, 2, 0);
/// let c = Fid::new(6, 1, 0);
///
/// assert!(a < b && b < c);
/// assert_eq!(Fid::from_be_bytes(c.to_be_bytes()), c);
/// assert_eq!(c.to_string(), "[0x6:0x1:0x0]");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fid {
    /// Sequence number.
    pub seq: u64,
    /// Object id within the sequence.
    pub oid: u32,
    /// Version.
    pub ver: u32,
}

impl Fid {
    /// The all-zero identifier. Never sane.
    pub const ZERO: Self = Self {
        seq: 0,
        oid: 0,
        ver: 0,
    };

    /// Builds an identifier from its parts without checking sanity.
    pub const fn new(seq: u64, oid: u32, ver: u32) -> Self {
        Self { seq, oid, ver }
    }

    /// Returns `true` if the sequence is non-zero and `oid` lies in
    /// `[init_oid, width)`.
    pub const fn is_sane(&self, init_oid: u32, width: u32) -> bool {
        self.seq != 0 && self.oid >= init_oid && self.oid < width
    }

    /// Encodes as 16 big-endian bytes, preserving [`Ord`] under byte-wise
    /// comparison.
    pub fn to_be_bytes(&self) -> [u8; FID_SIZE] {
        let mut buf = [0_u8; FID_SIZE];
        buf[..8].copy_from_slice(&self.seq.to_be_bytes());
        buf[8..12].copy_from_slice(&self.oid.to_be_bytes());
        buf[12..].copy_from_slice(&self.ver.to_be_bytes());
        buf
    }

    /// Decodes the encoding produced by [`Fid::to_be_bytes`].
    pub fn from_be_bytes(buf: [u8; FID_SIZE]) -> Self {
        let [s0, s1, s2, s3, s4, s5, s6, s7, o0, o1, o2, o3, v0, v1, v2, v3] = buf;
        Self {
            seq: u64::from_be_bytes([s0, s1, s2, s3, s4, s5, s6, s7]),
            oid: u32::from_be_bytes([o0, o1, o2, o3]),
            ver: u32::from_be_bytes([v0, v1, v2, v3]),
        }
    }
}

impl fmt::Display for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}:{:#x}:{:#x}]", self.seq, self.oid, self.ver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_seq_then_oid() {
        let mut fids = vec![
            Fid::new(7, 1, 0),
            Fid::new(6, 99, 0),
            Fid::new(6, 2, 0),
            Fid::new(6, 2, 1),
        ];
        fids.sort();
        assert_eq!(
            fids,
            vec![
                Fid::new(6, 2, 0),
                Fid::new(6, 2, 1),
                Fid::new(6, 99, 0),
                Fid::new(7, 1, 0),
            ]
        );
    }

    #[test]
    fn byte_order_matches_fid_order() {
        let lo = Fid::new(0x1_0000_0000, u32::MAX, 0);
        let hi = Fid::new(0x1_0000_0001, 1, 0);
        assert!(lo < hi);
        assert!(lo.to_be_bytes() < hi.to_be_bytes());
    }

    #[test]
    fn sanity_window() {
        assert!(!Fid::ZERO.is_sane(1, 100));
        assert!(Fid::new(5, 1, 0).is_sane(1, 100));
        assert!(Fid::new(5, 99, 0).is_sane(1, 100));
        assert!(!Fid::new(5, 100, 0).is_sane(1, 100));
        assert!(!Fid::new(5, 0, 0).is_sane(1, 100));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_json_shape() {
        let fid = Fid::new(0x401, 3, 0);
        let json = serde_json::to_string(&fid).unwrap();
        assert_eq!(json, r#"{"seq":1025,"oid":3,"ver":0}"#);
        assert_eq!(serde_json::from_str::<Fid>(&json).unwrap(), fid);
    }
}
