//! Detector and fixer functions backing the rule table.
//!
//! Every pattern is compiled once on first use. `.` never matches a
//! newline, so every bounded co-occurrence window stays inside one line.
//! Acronyms that double as ordinary words (SEC, DOJ, DHS, GSA MAS) are
//! matched case-sensitively inside otherwise case-insensitive patterns.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this file; the unit tests compile every one.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule pattern {pattern:?}: {e}"))
}

/// Apply `step` until the text stops changing. `step` must only ever
/// shrink or rewrite matches away, so the loop is bounded by the number
/// of matches in the input.
fn until_stable(text: &str, step: impl Fn(&str) -> String) -> String {
    let mut current = text.to_string();
    loop {
        let next = step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

// ---------------------------------------------------------------------------
// Dashes
// ---------------------------------------------------------------------------

static DASH_CHARS: Lazy<Regex> = Lazy::new(|| compile("[\u{2012}\u{2013}\u{2014}]"));
static EM_DASH_SPACED: Lazy<Regex> = Lazy::new(|| compile("[ \t]*\u{2014}[ \t]*"));
static SHORT_DASHES: Lazy<Regex> = Lazy::new(|| compile("[\u{2012}\u{2013}]"));
static DOUBLE_HYPHEN: Lazy<Regex> = Lazy::new(|| compile(r"([A-Za-z\s])--([A-Za-z\s])"));

pub(crate) fn has_dash(text: &str) -> bool {
    DASH_CHARS.is_match(text) || DOUBLE_HYPHEN.is_match(text)
}

pub(crate) fn fix_dash(text: &str) -> String {
    let text = EM_DASH_SPACED.replace_all(text, ": ");
    let text = SHORT_DASHES.replace_all(&text, "-");
    // Adjacent pairs share a boundary character, so one replace_all pass
    // can leave a `--` behind; repeat until none qualifies.
    until_stable(&text, |t| {
        DOUBLE_HYPHEN
            .replace_all(t, |caps: &Captures| {
                let left = &caps[1];
                let right = &caps[2];
                if left.contains('\n') {
                    // Dashes opening a line: keep the break, drop the dashes.
                    return format!("{left}{}", right.trim_start_matches([' ', '\t']));
                }
                let left = if left.trim().is_empty() { "" } else { left };
                if right.contains('\n') {
                    return format!("{left}:{right}");
                }
                let right = if right.trim().is_empty() { "" } else { right };
                format!("{left}: {right}")
            })
            .into_owned()
    })
}

// ---------------------------------------------------------------------------
// Unverified figures
// ---------------------------------------------------------------------------

static BANNED_METRIC: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)60\s*%\s*(?:processing|process)\s*time\s*reduct\w*"));

static PERCENT_CLAIM: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\d+\s*%\s*(?:faster|cheaper|reduction|improvement|increase|saving|efficiency)")
});

pub(crate) fn has_banned_metric(text: &str) -> bool {
    BANNED_METRIC.is_match(text)
}

pub(crate) fn fix_banned_metric(text: &str) -> String {
    BANNED_METRIC.replace_all(text, "[METRIC REMOVED]").into_owned()
}

pub(crate) fn has_percent_claim(text: &str) -> bool {
    PERCENT_CLAIM.is_match(text)
}

static BUDGET_FIGURE: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)\$\s*\d+(?:\.\d+)?\s*(?:billion|million|trillion|[BMT])\b")
});

static ATTRIBUTION: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i:source:|according to|\bOMB\b|\bCBO\b|\bGAO\b|\bFY\s?\d{2}\b)|\bper\s+[A-Z]")
});

/// A dollar figure on a line that carries no attribution token.
pub(crate) fn has_unsourced_figure(text: &str) -> bool {
    text.lines()
        .any(|line| BUDGET_FIGURE.is_match(line) && !ATTRIBUTION.is_match(line))
}

// ---------------------------------------------------------------------------
// Relationship and status claims
// ---------------------------------------------------------------------------

static SEC_DIRECT: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)\b(?:(?-i:SEC)|securities and exchange commission)\b.{0,60}",
        r"\b(?:direct client|our client|client of BHT|work(?:ed|ing) with|serv(?:ed|ing)|engag(?:ed|ing)|contract)",
        r"|\b(?:client|contract|engagement|work)\b.{0,60}",
        r"\b(?:(?-i:SEC)|securities and exchange commission)\b",
    ))
});

static DOJ_DIRECT: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)\b(?:(?-i:DOJ)|department of justice)\b.{0,80}",
        r"\b(?:direct|direct client|our client|prime|directly)\b",
        r"|\b(?:direct(?:ly)?|prime)\b.{0,80}\b(?:(?-i:DOJ)|department of justice)\b",
        r"|\b(?:work(?:ed|ing)|serv(?:ed|ing))\b.{0,40}\b(?:(?-i:DOJ)|department of justice)\b",
    ))
});

static DHS_DIRECT: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)\b(?:(?-i:DHS)|department of homeland security)\b.{0,60}",
        r"\b(?:direct client|our client|client of BHT|work(?:ed|ing) with|serv(?:ed|ing)|engag(?:ed|ing)|contract)",
        r"|\b(?:client|contract|engagement|work)\b.{0,60}",
        r"\b(?:(?-i:DHS)|department of homeland security)\b",
    ))
});

static GSA_MAS_CURRENT: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)(?-i:GSA)\s*(?-i:MAS).{0,80}",
        r"\b(?:active|current|awarded|holds?|has|on\s+contract|vehicle)\b",
        r"|\b(?:active|current|awarded|holds?|has|on\s+contract|vehicle)\b.{0,80}",
        r"(?-i:GSA)\s*(?-i:MAS)",
    ))
});

static INSIGHT_CURRENT: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)\bBHT\s*Insight\b.{0,100}",
        r"\b(?:current|available|deployed|live|production|released|offering|product)",
        r"|\b(?:current|available|deployed|live|production|released|offering|product)\w*.{0,100}",
        r"\bBHT\s*Insight\b",
    ))
});

pub(crate) fn has_sec_direct(text: &str) -> bool {
    SEC_DIRECT.is_match(text)
}

pub(crate) fn has_doj_direct(text: &str) -> bool {
    DOJ_DIRECT.is_match(text)
}

pub(crate) fn has_dhs_direct(text: &str) -> bool {
    DHS_DIRECT.is_match(text)
}

pub(crate) fn has_gsa_mas_current(text: &str) -> bool {
    GSA_MAS_CURRENT.is_match(text)
}

pub(crate) fn has_insight_current(text: &str) -> bool {
    INSIGHT_CURRENT.is_match(text)
}

// ---------------------------------------------------------------------------
// Marketing language
// ---------------------------------------------------------------------------

static SOLUTION_NOUN: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)\b(our|a|the|innovative|enterprise|tailored|custom|proven|scalable|robust|comprehensive)",
        r"\s+solutions?\b",
    ))
});

/// Rewrite for an adjective + "solution" pair, keyed by the lowercase
/// adjective.
fn solution_rewrite(adjective: &str) -> Option<&'static str> {
    let rewrite = match adjective {
        "our" => "our work",
        "a" => "an approach",
        "the" => "the approach",
        "innovative" => "distinctive work",
        "enterprise" => "enterprise-grade work",
        "tailored" => "purpose-built work",
        "custom" => "custom-built work",
        "proven" => "field-tested work",
        "scalable" => "scalable work",
        "robust" => "reliable work",
        "comprehensive" => "end-to-end work",
        _ => return None,
    };
    Some(rewrite)
}

fn match_case(source: &str, replacement: &str) -> String {
    let starts_upper = source.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn has_solution_noun(text: &str) -> bool {
    SOLUTION_NOUN.is_match(text)
}

pub(crate) fn fix_solution_noun(text: &str) -> String {
    SOLUTION_NOUN
        .replace_all(text, |caps: &Captures| {
            let adjective = &caps[1];
            match solution_rewrite(&adjective.to_lowercase()) {
                Some(rewrite) => match_case(adjective, rewrite),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

static FORWARD_AS_CURRENT: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)(?:\bwill\s+)?\b(?:can|does|provides?|delivers?|enables?|supports?)\s+.{0,80}",
        r"(?:by\s+20[2-9]\d|in\s+(?:Q[1-4]\s+)?20[2-9]\d|next\s+(?:year|quarter))",
    ))
});

pub(crate) fn has_forward_claim(text: &str) -> bool {
    FORWARD_AS_CURRENT.is_match(text)
}

static TEMPLATE_OPENER: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?im)^[ \t]*(?:In today['’]s",
        r"|In the (?:rapidly |ever[-\s])?evolving",
        r"|As (?:the|a|an)\b",
        r"|With the (?:rise|advent|growth|increasing)",
        r"|It is (?:well[- ]known|widely|important|crucial|essential|vital)",
        r"|Leveraging|Harnessing",
        r"|We are (?:excited|pleased|thrilled|proud|delighted))",
    ))
});

pub(crate) fn has_template_opener(text: &str) -> bool {
    TEMPLATE_OPENER.is_match(text)
}

static EXCITED_FILLER: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?i)\b(?:we\s+are|we['’]re)\s+(?:excited|pleased|thrilled|proud|delighted)",
        r"\s+(?:to|about|by)\b[ \t]*",
    ))
});

pub(crate) fn has_excited_filler(text: &str) -> bool {
    EXCITED_FILLER.is_match(text)
}

pub(crate) fn fix_excited_filler(text: &str) -> String {
    // Deleting one phrase can splice two fragments into a new one.
    until_stable(text, |t| EXCITED_FILLER.replace_all(t, "").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        let all: [&Lazy<Regex>; 17] = [
            &DASH_CHARS,
            &EM_DASH_SPACED,
            &SHORT_DASHES,
            &DOUBLE_HYPHEN,
            &BANNED_METRIC,
            &PERCENT_CLAIM,
            &BUDGET_FIGURE,
            &ATTRIBUTION,
            &SEC_DIRECT,
            &DOJ_DIRECT,
            &DHS_DIRECT,
            &GSA_MAS_CURRENT,
            &INSIGHT_CURRENT,
            &SOLUTION_NOUN,
            &FORWARD_AS_CURRENT,
            &TEMPLATE_OPENER,
            &EXCITED_FILLER,
        ];
        for pattern in all {
            Lazy::force(pattern);
        }
    }

    #[test]
    fn em_dash_becomes_colon_without_doubled_spaces() {
        assert_eq!(fix_dash("Fast \u{2014} and right"), "Fast: and right");
        assert_eq!(fix_dash("Fast\u{2014}right"), "Fast: right");
    }

    #[test]
    fn en_and_figure_dashes_become_hyphens() {
        assert_eq!(fix_dash("2004\u{2013}2010"), "2004-2010");
        assert_eq!(fix_dash("555\u{2012}0100"), "555-0100");
    }

    #[test]
    fn double_hyphen_between_words() {
        assert_eq!(fix_dash("fast--right"), "fast: right");
        assert_eq!(fix_dash("fast -- right"), "fast: right");
        assert_eq!(fix_dash("a--b--c"), "a: b: c");
    }

    #[test]
    fn double_hyphen_keeps_line_breaks() {
        assert_eq!(fix_dash("line\n--next"), "line\nnext");
        assert_eq!(fix_dash("line\n-- next"), "line\nnext");
        assert_eq!(fix_dash("line--\nnext"), "line:\nnext");
        assert_eq!(fix_dash("Points:\n--one\n--two"), "Points:\none\ntwo");
    }

    #[test]
    fn double_hyphen_outside_words_is_ignored() {
        assert!(!has_dash("x = y--;"));
        assert!(!has_dash("<!-- comment"));
        assert!(!has_dash("a---b"));
    }

    #[test]
    fn en_dash_next_to_hyphen_is_fully_cleaned() {
        let fixed = fix_dash("a\u{2013}-b");
        assert!(!has_dash(&fixed), "left {fixed:?}");
    }

    #[test]
    fn sec_acronym_is_case_sensitive() {
        assert!(has_sec_direct("SEC was our client for years"));
        assert!(has_sec_direct("Our contract with the SEC ran two years"));
        assert!(!has_sec_direct("The page loads in one sec for every client"));
    }

    #[test]
    fn relationship_windows_stop_at_newlines() {
        assert!(!has_doj_direct("We worked on many things.\nDOJ is an agency."));
        assert!(has_doj_direct("We worked closely with DOJ."));
    }

    #[test]
    fn doj_prime_either_order() {
        assert!(has_doj_direct("DOJ selected us as prime"));
        assert!(has_doj_direct("As prime contractor to the Department of Justice"));
    }

    #[test]
    fn gsa_mas_status_either_order() {
        assert!(has_gsa_mas_current("We hold an active GSA MAS contract"));
        assert!(has_gsa_mas_current("GSA MAS is our vehicle"));
        assert!(!has_gsa_mas_current("GSA MAS (in pursuit)"));
        assert!(!has_gsa_mas_current("gsa mas is our vehicle"));
    }

    #[test]
    fn insight_status_either_order() {
        assert!(has_insight_current("BHT Insight is now available"));
        assert!(has_insight_current("Our production deployment of BHT Insight"));
        assert!(!has_insight_current("BHT Insight (in development)"));
    }

    #[test]
    fn solution_rewrites_preserve_capitalisation() {
        assert_eq!(fix_solution_noun("Our solution works"), "Our work works");
        assert_eq!(fix_solution_noun("a solution"), "an approach");
        assert_eq!(
            fix_solution_noun("Robust solutions for robust solutions"),
            "Reliable work for reliable work"
        );
    }

    #[test]
    fn unsourced_figure_checks_the_whole_line() {
        assert!(has_unsourced_figure("Agencies spend $5 billion on this."));
        assert!(!has_unsourced_figure("Agencies spend $5 billion (source: GAO)."));
        assert!(!has_unsourced_figure("According to OMB, agencies spend $5B."));
        assert!(!has_unsourced_figure("$2.4M per FY24 budget"));
        assert!(has_unsourced_figure("Per GAO.\nA $3 trillion market."));
    }

    #[test]
    fn template_opener_on_any_line() {
        assert!(has_template_opener("In today's landscape, data matters."));
        assert!(has_template_opener("Intro.\nLeveraging AI, we shipped."));
        assert!(has_template_opener("In the rapidly evolving world of IT"));
        assert!(!has_template_opener("Asking the right question first."));
    }

    #[test]
    fn forward_claim_needs_a_future_reference() {
        assert!(has_forward_claim("The platform supports FedRAMP High by 2027."));
        assert!(has_forward_claim("It will deliver automated reviews next quarter."));
        assert!(!has_forward_claim("The platform supports FedRAMP High today."));
    }

    #[test]
    fn excited_filler_removal_is_stable() {
        assert_eq!(fix_excited_filler("We're thrilled to announce X."), "announce X.");
        let spliced = "we are we're excited to thrilled to share";
        let fixed = fix_excited_filler(spliced);
        assert!(!has_excited_filler(&fixed), "left {fixed:?}");
    }
}
