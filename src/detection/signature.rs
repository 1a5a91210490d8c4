//! Built-in table of known cheat clients.
//!
//! Each signature pairs a lowercase key, matched as a substring against file
//! names and archive contents, with the display name reported to the user.
//! Iteration follows insertion order so overlapping keys resolve the same way
//! on every run.

use serde::{Deserialize, Serialize};

/// A single known-threat signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatSignature {
    /// Lowercase substring to look for
    pub key: String,
    /// Canonical name shown to the user
    pub display_name: String,
}

impl ThreatSignature {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into().to_lowercase(),
            display_name: display_name.into(),
        }
    }

    /// Whether a lowercase, extension-stripped file name matches this signature.
    ///
    /// Accepts an exact match, a bare substring, or a versioned form such as
    /// `key-1.8.9`, `key_b7` or `key v2`.
    pub fn matches_name(&self, stem: &str) -> bool {
        let key = self.key.as_str();
        if stem == key || stem.contains(key) {
            return true;
        }
        ['-', '_', ' ']
            .iter()
            .any(|sep| stem.strip_prefix(key).is_some_and(|rest| rest.starts_with(*sep)))
    }
}

const BUILTIN_SIGNATURES: &[(&str, &str)] = &[
    // Popular clients
    ("liquidbounce", "LiquidBounce"),
    ("nursultan", "Nursultan"),
    ("excellent", "Excellent"),
    ("expensive", "Expensive"),
    ("delta", "Delta"),
    ("wexside", "Wexside"),
    ("celestial", "Celestial"),
    ("wurst", "Wurst"),
    ("impact", "Impact"),
    ("meteor", "Meteor Client"),
    // Other known clients
    ("aristois", "Aristois"),
    ("sigma", "Sigma"),
    ("flux", "Flux"),
    ("lambda", "Lambda"),
    ("inertia", "Inertia"),
    ("ares", "Ares"),
    ("wolfram", "Wolfram"),
    ("pyro", "Pyro"),
    ("rusherhack", "RusherHack"),
    ("future", "Future"),
    ("konas", "Konas"),
    ("salhack", "SalHack"),
    ("phobos", "Phobos"),
    ("kamihack", "KamiHack"),
    ("creepy salhack", "Creepy SalHack"),
    ("earthhack", "EarthHack"),
    ("gamesense", "GameSense"),
    ("kami blue", "Kami Blue"),
    ("zenith", "Zenith"),
    ("abyss", "Abyss"),
    ("bleachhack", "BleachHack"),
    ("valhalla", "Valhalla"),
    ("devil", "Devil"),
    ("xulu", "Xulu"),
    ("remix", "Remix"),
    ("vonware", "Vonware"),
    ("thunderhack", "ThunderHack"),
    ("banana", "Banana"),
    ("catalyst", "Catalyst"),
    ("backdoored", "Backdoored"),
    ("forgehax", "ForgeHax"),
    ("huzuni", "Huzuni"),
    ("nodus", "Nodus"),
    ("wizardhax", "WizardHax"),
    ("xray", "XRay"),
    ("mineplex", "Mineplex"),
    ("vape", "Vape"),
    ("entropy", "Entropy"),
    ("azura", "Azura"),
    ("atlas", "Atlas"),
    ("vertex", "Vertex"),
    ("astolfo", "Astolfo"),
    ("exhibition", "Exhibition"),
    ("rise", "Rise"),
    ("novoline", "Novoline"),
    ("suicide", "Suicide"),
    ("jello", "Jello"),
    ("winterware", "Winterware"),
    ("crypt", "Crypt"),
    ("moon", "Moon"),
    ("slinky", "Slinky"),
    ("gopro", "GoPro"),
    ("lblc", "LBLC"),
    ("vestige", "Vestige"),
    ("tenacity", "Tenacity"),
    ("eject", "Eject"),
    ("rockstar", "Rockstar"),
    ("drip", "Drip"),
    ("shield", "Shield"),
    ("akrien", "Akrien"),
    ("spicy", "Spicy"),
    ("augustus", "Augustus"),
];

/// Immutable, ordered collection of signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTable {
    signatures: Vec<ThreatSignature>,
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SignatureTable {
    /// The table compiled into the binary.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_SIGNATURES
                .iter()
                .map(|(key, name)| ThreatSignature::new(*key, *name)),
        )
    }

    /// Build a table from signatures in priority order.
    pub fn new(signatures: impl IntoIterator<Item = ThreatSignature>) -> Self {
        Self {
            signatures: signatures.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreatSignature> {
        self.signatures.iter()
    }

    /// Display name for an exact key.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.signatures
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.display_name.as_str())
    }

    /// First signature matching an extension-stripped, lowercase file name.
    pub fn match_name(&self, stem: &str) -> Option<&ThreatSignature> {
        self.signatures.iter().find(|s| s.matches_name(stem))
    }

    /// First signature whose key occurs anywhere in `text` (already lowercase).
    pub fn find_in(&self, text: &str) -> Option<&ThreatSignature> {
        self.signatures.iter().find(|s| text.contains(s.key.as_str()))
    }

    /// All display names in table order.
    pub fn display_names(&self) -> Vec<String> {
        self.signatures
            .iter()
            .map(|s| s.display_name.clone())
            .collect()
    }
}
