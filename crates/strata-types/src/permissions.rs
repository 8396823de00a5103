use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

/// A single permission bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMask(u32);

impl PermissionMask {
    pub const NONE: Self = Self(0);
    pub const TRANSFER: Self = Self(1 << 13);
    pub const MODIFY: Self = Self(1 << 14);
    pub const COPY: Self = Self(1 << 15);
    pub const MOVE: Self = Self(1 << 19);
    pub const DAMAGE: Self = Self(1 << 20);
    pub const ALL: Self = Self(0x7FFF_FFFF);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PermissionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for PermissionMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for PermissionMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionMask({:#010x})", self.0)
    }
}

impl fmt::LowerHex for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// The five independent role masks of an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    pub base_mask: PermissionMask,
    pub owner_mask: PermissionMask,
    pub group_mask: PermissionMask,
    pub everyone_mask: PermissionMask,
    pub next_owner_mask: PermissionMask,
}

impl Permissions {
    /// Full rights for base and owner, nothing for anyone else.
    pub fn owner_full() -> Self {
        Self {
            base_mask: PermissionMask::ALL,
            owner_mask: PermissionMask::ALL,
            ..Self::default()
        }
    }

    /// Whether the next owner will receive `perm`.
    pub fn next_owner_can(&self, perm: PermissionMask) -> bool {
        self.next_owner_mask.contains(perm)
    }
}
