use std::{fmt, str::FromStr};

use crate::Error;

/// Code assigned to tags the lookup table does not know.
pub const OTHER: &str = "X";

/// Penn Treebank tags mapped to single-letter part-of-speech codes.
///
/// Codes: `N` noun, `V` verb, `A` adjective, `D` adverb, `P` pronoun,
/// `J` preposition/conjunction, `C` cardinal, `I` interjection,
/// `T` particle, `X` other.
const PENN_TAGS: [(&str, &str); 36] = [
    ("CC", "J"),
    ("CD", "C"),
    ("DT", "X"),
    ("EX", "X"),
    ("FW", "X"),
    ("IN", "J"),
    ("JJ", "A"),
    ("JJR", "A"),
    ("JJS", "A"),
    ("LS", "X"),
    ("MD", "V"),
    ("NN", "N"),
    ("NNS", "N"),
    ("NNP", "N"),
    ("NNPS", "N"),
    ("PDT", "X"),
    ("POS", "X"),
    ("PRP", "P"),
    ("PRP$", "P"),
    ("RB", "D"),
    ("RBR", "D"),
    ("RBS", "D"),
    ("RP", "T"),
    ("SYM", "X"),
    ("TO", "J"),
    ("UH", "I"),
    ("VB", "V"),
    ("VBD", "V"),
    ("VBG", "V"),
    ("VBN", "V"),
    ("VBP", "V"),
    ("VBZ", "V"),
    ("WDT", "X"),
    ("WP", "P"),
    ("WP$", "P"),
    ("WRB", "D"),
];

/// Strategy turning a source tag into a part-of-speech code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tagset {
    /// The source already uses the target codes.
    #[default]
    Identity,
    /// Penn Treebank tags.
    Penn,
}

impl Tagset {
    /// Never fails; unknown Penn tags become [`OTHER`].
    pub fn normalize<'a>(&self, tag: &'a str) -> &'a str {
        match self {
            Tagset::Identity => tag,
            Tagset::Penn => penn(tag),
        }
    }
}

pub fn penn(tag: &str) -> &'static str {
    PENN_TAGS
        .iter()
        .find(|(penn_tag, _)| *penn_tag == tag)
        .map(|&(_, code)| code)
        .unwrap_or(OTHER)
}

impl FromStr for Tagset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Tagset::Identity),
            "penn" => Ok(Tagset::Penn),
            other => Err(Error::UnknownTagset(other.to_string())),
        }
    }
}

impl fmt::Display for Tagset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tagset::Identity => f.write_str("identity"),
            Tagset::Penn => f.write_str("penn"),
        }
    }
}
