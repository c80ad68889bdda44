//! The Bamini to Unicode Tamil mapping table.
//!
//! Bamini is a glyph-substitution font: each keystroke selects a glyph shape,
//! so a single Tamil syllable is often typed as two or three ASCII
//! characters. The table below pairs those keystroke sequences with the
//! Unicode Tamil they render as.
//!
//! The encoding is not prefix-free (`f` is க, `fp` is கி, `nfh` is கொ), so
//! the table hands its rules out longest pattern first. See
//! [`MappingTable::rules`].

use indexmap::IndexMap;
use std::cmp::Reverse;
use std::sync::LazyLock;

/// Bamini keystroke sequences and their Unicode Tamil equivalents, in table
/// order.
///
/// Vowel signs that render before their consonant (ெ ே ை) are typed first
/// in Bamini (`n`, `N`, `i`), so those rows map the whole keystroke sequence
/// straight to consonant + vowel sign in Unicode order.
///
/// `Jh` is listed twice; the later row wins.
const BAMINI_PAIRS: &[(&str, &str)] = &[
    // ள and ர forms placed ahead of the consonant rows
    ("sp", "ளி"),
    ("hp", "ரி"),
    ("hP", "ரீ"),
    ("uP", "ரீ"),
    ("u;", "ர்"),
    ("h;", "ர்"),
    ("H", "ர்"),
    // க (f)
    ("nfs", "கௌ"),
    ("Nfh", "கோ"),
    ("nfh", "கொ"),
    ("fh", "கா"),
    ("fp", "கி"),
    ("fP", "கீ"),
    ("F", "கு"),
    ("$", "கூ"),
    ("nf", "கெ"),
    ("Nf", "கே"),
    ("if", "கை"),
    ("f;", "க்"),
    ("f", "க"),
    // ங (q)
    ("nqs", "ஙௌ"),
    ("Nqh", "ஙோ"),
    ("nqh", "ஙொ"),
    ("qh", "ஙா"),
    ("qp", "ஙி"),
    ("qP", "ஙீ"),
    ("nq", "ஙெ"),
    ("Nq", "ஙே"),
    ("iq", "ஙை"),
    ("q;", "ங்"),
    ("q", "ங"),
    // ச (r)
    ("nrs", "சௌ"),
    ("Nrh", "சோ"),
    ("nrh", "சொ"),
    ("rh", "சா"),
    ("rp", "சி"),
    ("rP", "சீ"),
    ("R", "சு"),
    ("#", "சூ"),
    ("nr", "செ"),
    ("Nr", "சே"),
    ("ir", "சை"),
    ("r;", "ச்"),
    ("r", "ச"),
    // ஜ ([)
    ("n[s", "ஜௌ"),
    ("N[h", "ஜோ"),
    ("n[h", "ஜொ"),
    ("[h", "ஜா"),
    ("[p", "ஜி"),
    ("[P", "ஜீ"),
    ("[{", "ஜு"),
    ("[_", "ஜூ"),
    ("n[", "ஜெ"),
    ("N[", "ஜே"),
    ("i[", "ஜை"),
    ("[;", "ஜ்"),
    ("[", "ஜ"),
    // ஞ (Q)
    ("nQs", "ஞௌ"),
    ("NQh", "ஞோ"),
    ("nQh", "ஞொ"),
    ("Qh", "ஞா"),
    ("Qp", "ஞி"),
    ("QP", "ஞீ"),
    ("nQ", "ஞெ"),
    ("NQ", "ஞே"),
    ("iQ", "ஞை"),
    ("Q;", "ஞ்"),
    ("Q", "ஞ"),
    // ட (l)
    ("nls", "டௌ"),
    ("Nlh", "டோ"),
    ("nlh", "டொ"),
    ("lp", "டி"),
    ("lP", "டீ"),
    ("lh", "டா"),
    ("b", "டி"),
    ("B", "டீ"),
    ("L", "டு"),
    ("^", "டூ"),
    ("nl", "டெ"),
    ("Nl", "டே"),
    ("il", "டை"),
    ("l;", "ட்"),
    ("l", "ட"),
    // ண (z)
    ("nzs", "ணௌ"),
    ("Nzh", "ணோ"),
    ("nzh", "ணொ"),
    ("zh", "ணா"),
    ("zp", "ணி"),
    ("zP", "ணீ"),
    ("Zh", "ணூ"),
    ("Z}", "ணூ"),
    ("nz", "ணெ"),
    ("Nz", "ணே"),
    ("iz", "ணை"),
    ("z;", "ண்"),
    ("Z", "ணு"),
    ("z", "ண"),
    // த (j)
    ("njs", "தௌ"),
    ("Njh", "தோ"),
    ("njh", "தொ"),
    ("jh", "தா"),
    ("jp", "தி"),
    ("jP", "தீ"),
    ("Jh", "தூ"),
    ("Jh", "தூ"),
    ("J}", "தூ"),
    ("J", "து"),
    ("nj", "தெ"),
    ("Nj", "தே"),
    ("ij", "தை"),
    ("j;", "த்"),
    ("j", "த"),
    // ந (e)
    ("nes", "நௌ"),
    ("Neh", "நோ"),
    ("neh", "நொ"),
    ("eh", "நா"),
    ("ep", "நி"),
    ("eP", "நீ"),
    ("E}", "நூ"),
    ("Eh", "நூ"),
    ("E", "நு"),
    ("ne", "நெ"),
    ("Ne", "நே"),
    ("ie", "நை"),
    ("e;", "ந்"),
    ("e", "ந"),
    // ன (d)
    ("nds", "னௌ"),
    ("Ndh", "னோ"),
    ("ndh", "னொ"),
    ("dh", "னா"),
    ("dp", "னி"),
    ("dP", "னீ"),
    ("D}", "னூ"),
    ("Dh", "னூ"),
    ("D", "னு"),
    ("nd", "னெ"),
    ("Nd", "னே"),
    ("id", "னை"),
    ("d;", "ன்"),
    ("d", "ன"),
    // ப (g)
    ("ngs", "பௌ"),
    ("Ngh", "போ"),
    ("ngh", "பொ"),
    ("gh", "பா"),
    ("gp", "பி"),
    ("gP", "பீ"),
    ("G", "பு"),
    ("ng", "பெ"),
    ("Ng", "பே"),
    ("ig", "பை"),
    ("g;", "ப்"),
    ("g", "ப"),
    // ம (k)
    ("nks", "மௌ"),
    ("Nkh", "மோ"),
    ("nkh", "மொ"),
    ("kh", "மா"),
    ("kp", "மி"),
    ("kP", "மீ"),
    ("K", "மு"),
    ("%", "மூ"),
    ("nk", "மெ"),
    ("Nk", "மே"),
    ("ik", "மை"),
    ("k;", "ம்"),
    ("k", "ம"),
    // ய (a)
    ("nas", "யௌ"),
    ("Nah", "யோ"),
    ("nah", "யொ"),
    ("ah", "யா"),
    ("ap", "யி"),
    ("aP", "யீ"),
    ("A", "யு"),
    ("A+", "யூ"),
    ("na", "யெ"),
    ("Na", "யே"),
    ("ia", "யை"),
    ("a;", "ய்"),
    ("a", "ய"),
    // ர (u)
    ("nus", "ரௌ"),
    ("Nuh", "ரோ"),
    ("nuh", "ரொ"),
    ("uh", "ரா"),
    ("up", "ரி"),
    ("U", "ரு"),
    ("&", "ரூ"),
    ("nu", "ரெ"),
    ("Nu", "ரே"),
    ("iu", "ரை"),
    ("u", "ர"),
    // ல (y)
    ("nys", "லௌ"),
    ("Nyh", "லோ"),
    ("nyh", "லொ"),
    ("yh", "லா"),
    ("yp", "லி"),
    ("yP", "லீ"),
    ("Yh", "லூ"),
    ("Y}", "லூ"),
    ("Y", "லு"),
    ("ny", "லெ"),
    ("Ny", "லே"),
    ("iy", "லை"),
    ("y;", "ல்"),
    ("y", "ல"),
    // ள (s)
    ("nss", "ளௌ"),
    ("Nsh", "ளோ"),
    ("nsh", "ளொ"),
    ("sh", "ளா"),
    ("sP", "ளீ"),
    ("Sh", "ளூ"),
    ("S", "ளு"),
    ("ns", "ளெ"),
    ("Ns", "ளே"),
    ("is", "ளை"),
    ("s;", "ள்"),
    ("s", "ள"),
    // வ (t)
    ("ntt", "வௌ"),
    ("Nth", "வோ"),
    ("nth", "வொ"),
    ("th", "வா"),
    ("tp", "வி"),
    ("tP", "வீ"),
    ("nt", "வெ"),
    ("Nt", "வே"),
    ("it", "வை"),
    ("t;", "வ்"),
    ("t", "வ"),
    // ழ (o)
    ("noo", "ழௌ"),
    ("Noh", "ழோ"),
    ("noh", "ழொ"),
    ("oh", "ழா"),
    ("op", "ழி"),
    ("oP", "ழீ"),
    ("*", "ழூ"),
    ("O", "ழு"),
    ("no", "ழெ"),
    ("No", "ழே"),
    ("io", "ழை"),
    ("o;", "ழ்"),
    ("o", "ழ"),
    // ற (w)
    ("nws", "றௌ"),
    ("Nwh", "றோ"),
    ("nwh", "றொ"),
    ("wh", "றா"),
    ("wp", "றி"),
    ("wP", "றீ"),
    ("Wh", "றூ"),
    ("W}", "றூ"),
    ("W", "று"),
    ("nw", "றெ"),
    ("Nw", "றே"),
    ("iw", "றை"),
    ("w;", "ற்"),
    ("w", "ற"),
    // ஹ (`)
    ("n``", "ஹௌ"),
    ("N`h", "ஹோ"),
    ("n`h", "ஹொ"),
    ("`h", "ஹா"),
    ("`p", "ஹி"),
    ("`P", "ஹீ"),
    ("n`", "ஹெ"),
    ("N`", "ஹே"),
    ("i`", "ஹை"),
    ("`;", "ஹ்"),
    ("`", "ஹ"),
    // ஷ (\)
    ("n\\s", "ஷௌ"),
    ("N\\h", "ஷோ"),
    ("n\\h", "ஷொ"),
    ("\\h", "ஷா"),
    ("\\p", "ஷி"),
    ("\\P", "ஷீ"),
    ("n\\", "ஷெ"),
    ("N\\", "ஷே"),
    ("i\\", "ஷை"),
    ("\\;", "ஷ்"),
    ("\\", "ஷ"),
    // ஸ (])
    ("n]s", "ஸௌ"),
    ("N]h", "ஸோ"),
    ("n]h", "ஸொ"),
    ("]h", "ஸா"),
    ("]p", "ஸி"),
    ("]P", "ஸீ"),
    ("n]", "ஸெ"),
    ("N]", "ஸே"),
    ("i]", "ஸை"),
    ("];", "ஸ்"),
    ("]", "ஸ"),
    // Independent vowels and symbols
    ("m", "அ"),
    ("M", "ஆ"),
    ("<", "ஈ"),
    ("c", "உ"),
    ("C", "ஊ"),
    ("v", "எ"),
    ("V", "ஏ"),
    ("I", "ஐ"),
    ("x", "ஒ"),
    ("X", "ஓ"),
    ("xs", "ஔ"),
    ("/", "ஃ"),
    (",", "இ"),
    ("=", "ஸ்ரீ"),
    (">", ","),
    ("T", "வு"),
    // Long u after an already converted short u, and stray marks
    ("வு+", "வூ"),
    ("பு+", "பூ"),
    ("யு+", "யூ"),
    ("சு+", "சூ"),
    ("+", "ooh"),
    (";", "்"),
    ("@", ";"),
    // Join marker for the ai vowel sign typed after its consonant
    ("¿f", "கை"),
    ("¿q", "ஙை"),
    ("¿r", "சை"),
    ("¿[", "ஜை"),
    ("¿Q", "ஞை"),
    ("¿l", "டை"),
    ("¿z", "ணை"),
    ("¿j", "தை"),
    ("¿e", "நை"),
    ("¿d", "னை"),
    ("¿g", "பை"),
    ("¿k", "மை"),
    ("¿a", "யை"),
    ("¿u", "ரை"),
    ("¿y", "லை"),
    ("¿s", "ளை"),
    ("¿t", "வை"),
    ("¿o", "ழை"),
    ("¿w", "றை"),
    ("¿`", "ஹை"),
    ("¿\\", "ஷை"),
    ("¿]", "ஸை"),
    ("¿", "ை"),
    ("≈", "ௐ"),
];

static BAMINI_TABLE: LazyLock<MappingTable> =
    LazyLock::new(|| MappingTable::from_pairs(BAMINI_PAIRS.iter().copied()));

/// An immutable, ordered set of (pattern, replacement) pairs.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    /// Patterns in first-insertion order, holding their last-defined value.
    entries: IndexMap<String, String>,

    /// Indices into `entries` in application order.
    rules: Vec<usize>,

    /// Patterns that were defined more than once.
    duplicates: Vec<String>,

    /// Length of the longest pattern, in characters.
    max_pattern_len: usize,
}

impl MappingTable {
    /// The built-in Bamini table, built on first use and shared for the
    /// lifetime of the process.
    pub fn bamini() -> &'static MappingTable {
        &BAMINI_TABLE
    }

    /// Build a table from pairs in table order.
    ///
    /// A pattern defined twice keeps its first position and takes its last
    /// value. Empty patterns are dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries: IndexMap<String, String> = IndexMap::new();
        let mut duplicates = Vec::new();

        for (pattern, replacement) in pairs {
            let pattern = pattern.into();
            let replacement = replacement.into();

            if pattern.is_empty() {
                log::warn!("Ignoring empty pattern mapped to {:?}", replacement);
                continue;
            }

            if let Some(previous) = entries.insert(pattern.clone(), replacement) {
                log::debug!(
                    "Pattern {:?} defined more than once (previous value {:?})",
                    pattern,
                    previous
                );
                if !duplicates.contains(&pattern) {
                    duplicates.push(pattern);
                }
            }
        }

        // Stable sort: equal-length patterns keep table order.
        let mut rules: Vec<usize> = (0..entries.len()).collect();
        rules.sort_by_key(|&idx| {
            let len = entries
                .get_index(idx)
                .map(|(pattern, _)| pattern.chars().count())
                .unwrap_or(0);
            Reverse(len)
        });

        let max_pattern_len = entries
            .keys()
            .map(|pattern| pattern.chars().count())
            .max()
            .unwrap_or(0);

        Self {
            entries,
            rules,
            duplicates,
            max_pattern_len,
        }
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no patterns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the replacement for an exact pattern.
    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.entries.get(pattern).map(String::as_str)
    }

    /// All (pattern, replacement) pairs in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(pattern, replacement)| (pattern.as_str(), replacement.as_str()))
    }

    /// All (pattern, replacement) pairs in application order: longest
    /// pattern first, ties in table order.
    ///
    /// Tie order is significant. A few replacements contain other patterns
    /// (`+` becomes `ooh`, `>` becomes `,`), and those only come out right
    /// because the contained pattern's rule has already run.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.rules.iter().filter_map(move |&idx| {
            self.entries
                .get_index(idx)
                .map(|(pattern, replacement)| (pattern.as_str(), replacement.as_str()))
        })
    }

    /// Length of the longest pattern, in characters.
    pub fn max_pattern_len(&self) -> usize {
        self.max_pattern_len
    }

    /// Patterns that were defined more than once, in order of first
    /// redefinition.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bamini_table_size() {
        let table = MappingTable::bamini();
        // One row is a duplicate.
        assert_eq!(BAMINI_PAIRS.len(), table.len() + 1);
        assert!(!table.is_empty());
        assert_eq!(table.max_pattern_len(), 3);
    }

    #[test]
    fn test_duplicate_rows_fold_into_one() {
        let table = MappingTable::bamini();
        assert_eq!(table.duplicates(), &["Jh".to_string()]);
        assert_eq!(table.get("Jh"), Some("தூ"));
    }

    #[test]
    fn test_last_definition_wins_at_first_position() {
        let table = MappingTable::from_pairs([("a", "1"), ("b", "2"), ("a", "3")]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some("3"));
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries, vec![("a", "3"), ("b", "2")]);
        assert_eq!(table.duplicates(), &["a".to_string()]);
    }

    #[test]
    fn test_empty_pattern_is_dropped() {
        let table = MappingTable::from_pairs([("", "x"), ("a", "y")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(""), None);
    }

    #[test]
    fn test_rules_longest_first_and_stable() {
        let table = MappingTable::from_pairs([
            ("b", "1"),
            ("abc", "2"),
            ("a", "3"),
            ("ab", "4"),
            ("cd", "5"),
        ]);

        let order: Vec<&str> = table.rules().map(|(pattern, _)| pattern).collect();
        assert_eq!(order, vec!["abc", "ab", "cd", "b", "a"]);
    }

    #[test]
    fn test_pattern_length_counts_characters() {
        let table = MappingTable::bamini();

        // Three characters, nine bytes.
        let position = table.rules().position(|(pattern, _)| pattern == "வு+");
        let first_two_char = table
            .rules()
            .position(|(pattern, _)| pattern.chars().count() == 2);
        assert!(position < first_two_char);
    }

    #[test]
    fn test_replacements_never_retrigger_later_rules() {
        // When a replacement contains another pattern, that pattern's rule
        // must already have run, or the output would be rewritten again.
        let table = MappingTable::bamini();
        let rules: Vec<(&str, &str)> = table.rules().collect();

        for (position, (pattern, replacement)) in rules.iter().enumerate() {
            for (later, _) in &rules[position + 1..] {
                assert!(
                    !replacement.contains(later),
                    "{:?} -> {:?} would be rewritten by later rule {:?}",
                    pattern,
                    replacement,
                    later
                );
            }
        }
    }

    #[test]
    fn test_known_quirk_rows() {
        let table = MappingTable::bamini();
        assert_eq!(table.get("+"), Some("ooh"));
        assert_eq!(table.get(">"), Some(","));
        assert_eq!(table.get("@"), Some(";"));
        assert_eq!(table.get("="), Some("ஸ்ரீ"));
        assert_eq!(table.get("¿"), Some("ை"));
        assert_eq!(table.get("≈"), Some("ௐ"));
        assert_eq!(table.get("n\\s"), Some("ஷௌ"));
        assert_eq!(table.get("\\"), Some("ஷ"));
    }
}
