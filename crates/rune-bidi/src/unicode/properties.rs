//! Character property oracle.

use unicode_bidi::{format_chars, BidiClass};

use crate::bidi::mirror;

/// Role of a character within a paired bracket (BidiBrackets.txt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketRole {
    Open,
    Close,
}

/// Paired-bracket property of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub role: BracketRole,
    /// Opening bracket of the pair after canonical folding, so that
    /// U+2329 and U+3008 (and their closers) pair with each other.
    pub pair_key: char,
}

impl Bracket {
    /// The same bracket as read from the opposite side.
    pub fn flipped(self) -> Self {
        let role = match self.role {
            BracketRole::Open => BracketRole::Close,
            BracketRole::Close => BracketRole::Open,
        };
        Self { role, pair_key: self.pair_key }
    }
}

/// Read-only oracle for the per-character data the algorithm needs.
///
/// Implementations must be pure: the same code point always yields the
/// same answer. [`UnicodeProps`] is the stock implementation.
pub trait CharProps {
    fn bidi_class(&self, ch: char) -> BidiClass;

    fn mirror_of(&self, ch: char) -> Option<char>;

    fn mirrored(&self, ch: char) -> bool {
        self.mirror_of(ch).is_some()
    }

    fn paired_bracket(&self, ch: char) -> Option<Bracket>;

    /// Whether `ch` attaches to the preceding base character.
    fn is_combining_mark(&self, ch: char) -> bool {
        self.bidi_class(ch) == BidiClass::NSM
    }
}

/// Property data from the Unicode Character Database.
///
/// Bidi classes come from `unicode-bidi`; mirroring and bracket pairs
/// from the tables in this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnicodeProps;

impl CharProps for UnicodeProps {
    fn bidi_class(&self, ch: char) -> BidiClass {
        unicode_bidi::bidi_class(ch)
    }

    fn mirror_of(&self, ch: char) -> Option<char> {
        mirror::mirror_of(ch)
    }

    fn paired_bracket(&self, ch: char) -> Option<Bracket> {
        paired_bracket(ch)
    }
}

/// Opening/closing pairs from BidiBrackets.txt, sorted by opener.
static BRACKET_PAIRS: &[(char, char)] = &[
    ('(', ')'), ('[', ']'), ('{', '}'),
    ('\u{0F3A}', '\u{0F3B}'), ('\u{0F3C}', '\u{0F3D}'), ('\u{169B}', '\u{169C}'),
    ('\u{2045}', '\u{2046}'), ('\u{207D}', '\u{207E}'), ('\u{208D}', '\u{208E}'),
    ('\u{2308}', '\u{2309}'), ('\u{230A}', '\u{230B}'), ('\u{2329}', '\u{232A}'),
    ('\u{2768}', '\u{2769}'), ('\u{276A}', '\u{276B}'), ('\u{276C}', '\u{276D}'),
    ('\u{276E}', '\u{276F}'), ('\u{2770}', '\u{2771}'), ('\u{2772}', '\u{2773}'),
    ('\u{2774}', '\u{2775}'), ('\u{27C5}', '\u{27C6}'), ('\u{27E6}', '\u{27E7}'),
    ('\u{27E8}', '\u{27E9}'), ('\u{27EA}', '\u{27EB}'), ('\u{27EC}', '\u{27ED}'),
    ('\u{27EE}', '\u{27EF}'), ('\u{2983}', '\u{2984}'), ('\u{2985}', '\u{2986}'),
    ('\u{2987}', '\u{2988}'), ('\u{2989}', '\u{298A}'), ('\u{298B}', '\u{298C}'),
    ('\u{298D}', '\u{2990}'), ('\u{298F}', '\u{298E}'), ('\u{2991}', '\u{2992}'),
    ('\u{2993}', '\u{2994}'), ('\u{2995}', '\u{2996}'), ('\u{2997}', '\u{2998}'),
    ('\u{29D8}', '\u{29D9}'), ('\u{29DA}', '\u{29DB}'), ('\u{29FC}', '\u{29FD}'),
    ('\u{2E22}', '\u{2E23}'), ('\u{2E24}', '\u{2E25}'), ('\u{2E26}', '\u{2E27}'),
    ('\u{2E28}', '\u{2E29}'), ('\u{2E55}', '\u{2E56}'), ('\u{2E57}', '\u{2E58}'),
    ('\u{2E59}', '\u{2E5A}'), ('\u{2E5B}', '\u{2E5C}'), ('\u{3008}', '\u{3009}'),
    ('\u{300A}', '\u{300B}'), ('\u{300C}', '\u{300D}'), ('\u{300E}', '\u{300F}'),
    ('\u{3010}', '\u{3011}'), ('\u{3014}', '\u{3015}'), ('\u{3016}', '\u{3017}'),
    ('\u{3018}', '\u{3019}'), ('\u{301A}', '\u{301B}'), ('\u{FE59}', '\u{FE5A}'),
    ('\u{FE5B}', '\u{FE5C}'), ('\u{FE5D}', '\u{FE5E}'), ('\u{FF08}', '\u{FF09}'),
    ('\u{FF3B}', '\u{FF3D}'), ('\u{FF5B}', '\u{FF5D}'), ('\u{FF5F}', '\u{FF60}'),
    ('\u{FF62}', '\u{FF63}'),
];

fn canonical_opener(ch: char) -> char {
    match ch {
        '\u{2329}' => '\u{3008}',
        _ => ch,
    }
}

/// Look up the Bidi_Paired_Bracket data for `ch`.
pub fn paired_bracket(ch: char) -> Option<Bracket> {
    if let Ok(idx) = BRACKET_PAIRS.binary_search_by_key(&ch, |&(open, _)| open) {
        return Some(Bracket {
            role: BracketRole::Open,
            pair_key: canonical_opener(BRACKET_PAIRS[idx].0),
        });
    }
    BRACKET_PAIRS
        .iter()
        .find(|&&(_, close)| close == ch)
        .map(|&(open, _)| Bracket { role: BracketRole::Close, pair_key: canonical_opener(open) })
}

/// Zero-width joiners, directional marks and explicit formatting
/// characters removed by `REMOVE_BIDI_CONTROLS`.
pub fn is_bidi_control(ch: char) -> bool {
    matches!(
        ch,
        format_chars::ALM
            | '\u{200C}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
    )
}
