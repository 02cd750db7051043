//! Trusted image owners.
//!
//! Only images published by these accounts are ever fetched from the
//! catalog. The set is closed: it is not read from configuration.

use serde::{Deserialize, Serialize};

/// Account allowed to publish images the check will accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrustedOwner {
    /// Publisher of the manifest tooling's own images (kope.io).
    Kopeio,
    /// Red Hat Enterprise Linux images.
    RedHat,
    /// Container-optimized OS images.
    CoreOs,
    /// The provider's base Amazon Linux 2 images.
    AmazonLinux2,
}

impl TrustedOwner {
    /// Every trusted owner, in query order.
    pub const ALL: [TrustedOwner; 4] = [
        TrustedOwner::Kopeio,
        TrustedOwner::RedHat,
        TrustedOwner::CoreOs,
        TrustedOwner::AmazonLinux2,
    ];

    /// Provider account identifier.
    pub const fn account_id(self) -> &'static str {
        match self {
            TrustedOwner::Kopeio => "383156758163",
            TrustedOwner::RedHat => "309956199498",
            TrustedOwner::CoreOs => "595879546273",
            TrustedOwner::AmazonLinux2 => "137112412989",
        }
    }

    /// Account identifiers of every trusted owner.
    pub fn account_ids() -> [&'static str; 4] {
        Self::ALL.map(TrustedOwner::account_id)
    }
}

impl std::fmt::Display for TrustedOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustedOwner::Kopeio => write!(f, "kope.io"),
            TrustedOwner::RedHat => write!(f, "redhat"),
            TrustedOwner::CoreOs => write!(f, "coreos"),
            TrustedOwner::AmazonLinux2 => write!(f, "amazon-linux-2"),
        }
    }
}
