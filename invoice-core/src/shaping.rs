//! Text shaping for scripts the PDF text operators cannot lay out.
//!
//! PDF `Tj` draws glyphs strictly left to right, one per code. Arabic
//! needs two passes before that: each letter is swapped for its
//! contextual presentation form (isolated, final, initial, medial), then
//! the line is reordered into visual order with the Unicode
//! Bidirectional Algorithm.

use unicode_bidi::BidiInfo;

/// Turns logical-order text into a string that draws correctly when its
/// characters are emitted left to right.
pub trait TextShaper {
    fn shape(&self, text: &str) -> String;
}

/// Identity shaper for left-to-right only deployments and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughShaper;

impl TextShaper for PassthroughShaper {
    fn shape(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Arabic reshaping followed by bidi reordering.
#[derive(Debug, Clone, Copy)]
pub struct ArabicShaper {
    /// Drop harakat (short vowel marks). They cannot be positioned by a
    /// plain left-to-right `Tj`, so they are removed by default.
    pub strip_harakat: bool,
}

impl Default for ArabicShaper {
    fn default() -> Self {
        ArabicShaper {
            strip_harakat: true,
        }
    }
}

impl TextShaper for ArabicShaper {
    fn shape(&self, text: &str) -> String {
        let reshaped = reshape(text, self.strip_harakat);
        visual_order(&reshaped)
    }
}

/// How a letter connects to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Connects on both sides; has four forms.
    Dual,
    /// Connects only to the preceding letter; isolated and final forms.
    Right,
    /// Never connects (hamza).
    None,
    /// Tatweel: connects both sides but has no forms of its own.
    Causing,
}

/// Presentation forms: (isolated, final, initial, medial). Right-joining
/// letters repeat isolated/final in the last two slots.
#[rustfmt::skip]
const FORMS: &[(char, Joining, [u32; 4])] = &[
    ('\u{0621}', Joining::None,  [0xFE80, 0xFE80, 0xFE80, 0xFE80]),
    ('\u{0622}', Joining::Right, [0xFE81, 0xFE82, 0xFE81, 0xFE82]),
    ('\u{0623}', Joining::Right, [0xFE83, 0xFE84, 0xFE83, 0xFE84]),
    ('\u{0624}', Joining::Right, [0xFE85, 0xFE86, 0xFE85, 0xFE86]),
    ('\u{0625}', Joining::Right, [0xFE87, 0xFE88, 0xFE87, 0xFE88]),
    ('\u{0626}', Joining::Dual,  [0xFE89, 0xFE8A, 0xFE8B, 0xFE8C]),
    ('\u{0627}', Joining::Right, [0xFE8D, 0xFE8E, 0xFE8D, 0xFE8E]),
    ('\u{0628}', Joining::Dual,  [0xFE8F, 0xFE90, 0xFE91, 0xFE92]),
    ('\u{0629}', Joining::Right, [0xFE93, 0xFE94, 0xFE93, 0xFE94]),
    ('\u{062A}', Joining::Dual,  [0xFE95, 0xFE96, 0xFE97, 0xFE98]),
    ('\u{062B}', Joining::Dual,  [0xFE99, 0xFE9A, 0xFE9B, 0xFE9C]),
    ('\u{062C}', Joining::Dual,  [0xFE9D, 0xFE9E, 0xFE9F, 0xFEA0]),
    ('\u{062D}', Joining::Dual,  [0xFEA1, 0xFEA2, 0xFEA3, 0xFEA4]),
    ('\u{062E}', Joining::Dual,  [0xFEA5, 0xFEA6, 0xFEA7, 0xFEA8]),
    ('\u{062F}', Joining::Right, [0xFEA9, 0xFEAA, 0xFEA9, 0xFEAA]),
    ('\u{0630}', Joining::Right, [0xFEAB, 0xFEAC, 0xFEAB, 0xFEAC]),
    ('\u{0631}', Joining::Right, [0xFEAD, 0xFEAE, 0xFEAD, 0xFEAE]),
    ('\u{0632}', Joining::Right, [0xFEAF, 0xFEB0, 0xFEAF, 0xFEB0]),
    ('\u{0633}', Joining::Dual,  [0xFEB1, 0xFEB2, 0xFEB3, 0xFEB4]),
    ('\u{0634}', Joining::Dual,  [0xFEB5, 0xFEB6, 0xFEB7, 0xFEB8]),
    ('\u{0635}', Joining::Dual,  [0xFEB9, 0xFEBA, 0xFEBB, 0xFEBC]),
    ('\u{0636}', Joining::Dual,  [0xFEBD, 0xFEBE, 0xFEBF, 0xFEC0]),
    ('\u{0637}', Joining::Dual,  [0xFEC1, 0xFEC2, 0xFEC3, 0xFEC4]),
    ('\u{0638}', Joining::Dual,  [0xFEC5, 0xFEC6, 0xFEC7, 0xFEC8]),
    ('\u{0639}', Joining::Dual,  [0xFEC9, 0xFECA, 0xFECB, 0xFECC]),
    ('\u{063A}', Joining::Dual,  [0xFECD, 0xFECE, 0xFECF, 0xFED0]),
    ('\u{0640}', Joining::Causing, [0x0640, 0x0640, 0x0640, 0x0640]),
    ('\u{0641}', Joining::Dual,  [0xFED1, 0xFED2, 0xFED3, 0xFED4]),
    ('\u{0642}', Joining::Dual,  [0xFED5, 0xFED6, 0xFED7, 0xFED8]),
    ('\u{0643}', Joining::Dual,  [0xFED9, 0xFEDA, 0xFEDB, 0xFEDC]),
    ('\u{0644}', Joining::Dual,  [0xFEDD, 0xFEDE, 0xFEDF, 0xFEE0]),
    ('\u{0645}', Joining::Dual,  [0xFEE1, 0xFEE2, 0xFEE3, 0xFEE4]),
    ('\u{0646}', Joining::Dual,  [0xFEE5, 0xFEE6, 0xFEE7, 0xFEE8]),
    ('\u{0647}', Joining::Dual,  [0xFEE9, 0xFEEA, 0xFEEB, 0xFEEC]),
    ('\u{0648}', Joining::Right, [0xFEED, 0xFEEE, 0xFEED, 0xFEEE]),
    ('\u{0649}', Joining::Right, [0xFEEF, 0xFEF0, 0xFEEF, 0xFEF0]),
    ('\u{064A}', Joining::Dual,  [0xFEF1, 0xFEF2, 0xFEF3, 0xFEF4]),
    // Persian additions
    ('\u{067E}', Joining::Dual,  [0xFB56, 0xFB57, 0xFB58, 0xFB59]),
    ('\u{0686}', Joining::Dual,  [0xFB7A, 0xFB7B, 0xFB7C, 0xFB7D]),
    ('\u{0698}', Joining::Right, [0xFB8A, 0xFB8B, 0xFB8A, 0xFB8B]),
    ('\u{06A9}', Joining::Dual,  [0xFB8E, 0xFB8F, 0xFB90, 0xFB91]),
    ('\u{06AF}', Joining::Dual,  [0xFB92, 0xFB93, 0xFB94, 0xFB95]),
    ('\u{06CC}', Joining::Dual,  [0xFBFC, 0xFBFD, 0xFBFE, 0xFBFF]),
];

/// Lam followed by an alef variant: (alef, isolated ligature, final ligature).
const LAM_ALEF: &[(char, u32, u32)] = &[
    ('\u{0622}', 0xFEF5, 0xFEF6),
    ('\u{0623}', 0xFEF7, 0xFEF8),
    ('\u{0625}', 0xFEF9, 0xFEFA),
    ('\u{0627}', 0xFEFB, 0xFEFC),
];

const LAM: char = '\u{0644}';

fn lookup(ch: char) -> Option<(Joining, [u32; 4])> {
    FORMS
        .binary_search_by_key(&ch, |&(c, _, _)| c)
        .ok()
        .map(|i| (FORMS[i].1, FORMS[i].2))
}

/// Combining marks that do not break a join.
fn is_harakah(ch: char) -> bool {
    matches!(ch, '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

fn joins_forward(ch: char) -> bool {
    matches!(lookup(ch), Some((Joining::Dual | Joining::Causing, _)))
}

fn joins_backward(ch: char) -> bool {
    matches!(
        lookup(ch),
        Some((Joining::Dual | Joining::Right | Joining::Causing, _))
    )
}

fn form(code: u32) -> char {
    char::from_u32(code).unwrap_or('\u{FFFD}')
}

/// Replace Arabic letters with contextual presentation forms, in
/// logical order.
pub fn reshape(text: &str, strip_harakat: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() * 2);

    // Neighbour lookups skip harakat, which are transparent to joining.
    let prev_letter = |i: usize| chars[..i].iter().rev().find(|c| !is_harakah(**c)).copied();
    let next_letter = |i: usize| {
        chars[i + 1..]
            .iter()
            .position(|c| !is_harakah(*c))
            .map(|off| (i + 1 + off, chars[i + 1 + off]))
    };

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if is_harakah(ch) {
            if !strip_harakat {
                out.push(ch);
            }
            i += 1;
            continue;
        }
        let Some((joining, forms)) = lookup(ch) else {
            out.push(ch);
            i += 1;
            continue;
        };

        let connects_prev = joining != Joining::None && prev_letter(i).is_some_and(joins_forward);

        if ch == LAM {
            if let Some((alef_idx, alef)) = next_letter(i) {
                if let Some(&(_, isolated, fin)) = LAM_ALEF.iter().find(|(a, _, _)| *a == alef) {
                    out.push(form(if connects_prev { fin } else { isolated }));
                    if !strip_harakat {
                        chars[i + 1..alef_idx].iter().for_each(|c| out.push(*c));
                    }
                    i = alef_idx + 1;
                    continue;
                }
            }
        }

        let connects_next = matches!(joining, Joining::Dual | Joining::Causing)
            && next_letter(i).is_some_and(|(_, c)| joins_backward(c));

        let slot = match (connects_prev, connects_next) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        };
        out.push(form(forms[slot]));
        i += 1;
    }
    out
}

/// Mirror paired punctuation drawn inside a right-to-left run.
fn mirror(ch: char) -> char {
    match ch {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '\u{00AB}' => '\u{00BB}',
        '\u{00BB}' => '\u{00AB}',
        other => other,
    }
}

/// Reorder each paragraph of `text` from logical to visual order. The
/// paragraph direction comes from its first strong character.
pub fn visual_order(text: &str) -> String {
    let info = BidiInfo::new(text, None);
    if !info.has_rtl() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for para in &info.paragraphs {
        let line = para.range.clone();
        let (levels, runs) = info.visual_runs(para, line);
        for run in runs {
            let segment = &text[run.clone()];
            if levels[run.start].is_rtl() {
                out.extend(segment.chars().rev().map(mirror));
            } else {
                out.push_str(segment);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forms_table_is_sorted() {
        assert!(FORMS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn lone_letter_is_isolated() {
        assert_eq!(reshape("\u{0628}", true), "\u{FE8F}");
    }

    #[test]
    fn three_letter_word_uses_initial_medial_final() {
        // BEH TEH BEH
        assert_eq!(
            reshape("\u{0628}\u{062A}\u{0628}", true),
            "\u{FE91}\u{FE98}\u{FE90}"
        );
    }

    #[test]
    fn right_joining_letter_breaks_the_chain() {
        // DAL then BEH: DAL cannot connect forward, so BEH is isolated.
        assert_eq!(reshape("\u{062F}\u{0628}", true), "\u{FEA9}\u{FE8F}");
        // BEH then DAL: BEH initial, DAL final.
        assert_eq!(reshape("\u{0628}\u{062F}", true), "\u{FE91}\u{FEAA}");
    }

    #[test]
    fn lam_alef_ligature() {
        assert_eq!(reshape("\u{0644}\u{0627}", true), "\u{FEFB}");
        // After a connecting letter the final ligature is used.
        assert_eq!(reshape("\u{0633}\u{0644}\u{0627}", true), "\u{FEB3}\u{FEFC}");
    }

    #[test]
    fn harakat_are_transparent_and_stripped() {
        // BEH + FATHA + TEH keeps the join and drops the mark.
        assert_eq!(reshape("\u{0628}\u{064E}\u{062A}", true), "\u{FE91}\u{FE96}");
        assert_eq!(
            reshape("\u{0628}\u{064E}\u{062A}", false),
            "\u{FE91}\u{064E}\u{FE96}"
        );
    }

    #[test]
    fn latin_is_untouched() {
        assert_eq!(reshape("Pen 2.00", true), "Pen 2.00");
        assert_eq!(ArabicShaper::default().shape("Notebook x2"), "Notebook x2");
    }

    #[test]
    fn rtl_line_is_reversed_with_numbers_kept() {
        // ALEF BEH (logical) followed by " 15" => visual "15 " then reversed letters.
        let shaped = visual_order("\u{0627}\u{0628} 15");
        assert_eq!(shaped, "15 \u{0628}\u{0627}");
    }

    #[test]
    fn brackets_are_mirrored_in_rtl_runs() {
        let shaped = visual_order("\u{0628} (\u{062A})");
        assert_eq!(shaped, "(\u{062A}) \u{0628}");
    }
}
