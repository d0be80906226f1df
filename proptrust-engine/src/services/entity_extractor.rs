//! Hybrid rule+model entity extraction
//!
//! The rule layer is a set of named, ordered regex pattern tables keyed by
//! field; table order is match priority. The model layer supplies additional
//! candidate spans through the injected `NerModel` adapter. Resolution:
//! singleton fields take the highest-priority rule match, falling back to the
//! best model span above the confidence floor; list fields take the union of
//! rule and model spans, de-duplicated by normalized string and ordered by
//! first appearance in the source text.
//!
//! Extraction failures are soft: a field that does not match is absent.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::{EntityBundle, EntitySpan, LoanEntry, MutationEntry};

/// Minimum amount (whole rupees) for a numeric match to count as a loan.
/// Filters khata numbers, page counts and similar small figures.
const MIN_LOAN_AMOUNT: i64 = 10_000;

const LOAN_CONTEXT_PAD: usize = 100;
const MUTATION_CONTEXT_PAD: usize = 80;

static SURVEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)Survey\s*(?:No|Number)\.?\s*[:\-]?\s*(\d+[/\-]?\d*[A-Za-z]?)").unwrap(),
        Regex::new(r"(?i)(?:\bSy\.?\s*No\.?|\bS\.\s*No\.?)\s*(\d+[/\-]?\d*[A-Za-z]?)").unwrap(),
        Regex::new(r"\b(\d{1,4}[/\-]\d{1,3}[A-Za-z]?)\b").unwrap(),
    ]
});

static OWNER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?:Owner|Holder|Pattadar|Cultivator)(?:\s+Name)?\s*[:\-]?\s*([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z.]*){0,3})",
        )
        .unwrap(),
        Regex::new(r"\bName\s*[:\-]\s*([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z.]*){0,3})").unwrap(),
        // South-Indian patronymic form: "Rangdhamaiah KR Bin Ramappa"
        Regex::new(
            r"\b([A-Z][a-z]+(?:aiah|appa|gowda|reddy|naik|kumar|raj|swamy)(?:\s+[A-Z]{1,3})?\s+(?:Bin|bin|S/o|D/o|W/o)\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\b",
        )
        .unwrap(),
    ]
});

static HISSA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(r"(?i)Hissa\s*(?:No|Number)?\.?\s*[:\-]?\s*(\d+[A-Za-z]?)").unwrap()]
});

static VILLAGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:Village|Gramam)\s*[:\-]?\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)?)")
            .unwrap(),
    ]
});

static TALUK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(r"(?i)\bTaluka?\s*[:\-]?\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)?)").unwrap()]
});

static DISTRICT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(r"(?i)\bDistrict\s*[:\-]?\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)?)").unwrap()]
});

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b(\d{1,2}[/\-]\d{1,2}[/\-]\d{4})\b").unwrap(),
        Regex::new(r"\b(\d{4}[/\-]\d{1,2}[/\-]\d{1,2})\b").unwrap(),
    ]
});

static CASE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:Civil\s+Suit|C\.S\.|\bCS)\s*No\.?\s*(\d+[/\-]?\d*)").unwrap(),
        Regex::new(r"(?i)(?:Criminal\s+Case|Cr\.C\.|\bCC)\s*No\.?\s*(\d+[/\-]?\d*)").unwrap(),
        Regex::new(r"(?i)\bCase\s*(?:No)?\.?\s*[:\-]?\s*(\d+[/\-]?\d*)").unwrap(),
    ]
});

static BANK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?i)\b(State\s+Bank\s+of\s+Mysore|S\.B\.M\.?|SBM|State\s+Bank\s+of\s+India|SBI|HDFC(?:\s+Bank)?|ICICI(?:\s+Bank)?|Axis\s+Bank|Bank\s+of\s+Baroda|BOB|Punjab\s+National\s+Bank|PNB|Canara\s+Bank|Union\s+Bank)\b",
        )
        .unwrap(),
        Regex::new(r"\b([A-Z][a-z]+\s+Bank(?:\s+of\s+[A-Z][a-z]+)?)\b").unwrap(),
    ]
});

static AMOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:Loan|Mortgage|Rs\.?|₹)\s*[:\s]?\s*(\d+(?:[,.]\d{2,3})*)\s*(?:/-)?")
            .unwrap(),
        Regex::new(r"\b(\d{1,3}(?:[,.]\d{3})+)\s*/-").unwrap(),
        Regex::new(r"\b(\d{5,})\s*/-").unwrap(),
    ]
});

static VALIDITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Valid\s+from\s+(\d{1,2}/\d{1,2}/\d{4})\s+To\s+(\d{1,2}/\d{1,2}/\d{4})")
        .unwrap()
});

static SIGNED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DIGITALLY\s+SIGNED\s+ON\s+(\d{1,2}/\d{1,2}/\d{4})").unwrap());

static MUTATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bMR\s*(?:No\.?\s*)?(\d+/\d{4}-\d{4})").unwrap());

static EXTENT_COMBINED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*Acres?\s+(?:and\s+)?(\d+)\s*Guntas?").unwrap());
static EXTENT_DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})\.(\d{1,2})\.00\.00\b").unwrap());
static EXTENT_ACRES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)(?:\.\d+)?\s*Acres?\b").unwrap());
static EXTENT_GUNTAS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*Guntas?\b").unwrap());

/// Tokens that terminate a captured name or place; greedy name patterns
/// otherwise swallow the next field label.
const STOP_TOKENS: &[&str] = &[
    "Survey", "Village", "Gramam", "Taluk", "Taluka", "District", "Hobli", "Extent", "Khata",
    "Hissa", "Land", "Form", "Page", "Account", "Total", "Area", "No", "Valid", "Date", "Sy",
    "Bank", "Loan", "Case", "Owner", "Holder", "Name", "RTC",
];

/// A rule-layer candidate: captured value, source offset, pattern priority.
#[derive(Debug, Clone)]
struct Candidate {
    value: String,
    offset: usize,
    priority: usize,
}

/// Rule-first, model-second entity extractor over normalized text.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    /// Confidence floor below which model spans are ignored.
    model_floor: f64,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        EntityExtractor { model_floor: 0.5 }
    }
}

impl EntityExtractor {
    pub fn new(model_floor: f64) -> EntityExtractor {
        EntityExtractor { model_floor }
    }

    /// Extract the fixed entity schema from cleaned text plus model spans.
    pub fn extract(&self, text: &str, model_spans: &[EntitySpan]) -> EntityBundle {
        let date_candidates = rule_candidates(text, &DATE_PATTERNS);
        let survey_raw = rule_candidates(text, &SURVEY_PATTERNS);
        let survey_candidates = validate_surveys(survey_raw);

        let mut bundle = EntityBundle {
            owner: self.resolve_singleton(
                owner_candidates(text),
                model_spans,
                "owner",
            ),
            survey_number: self
                .resolve_singleton(survey_candidates, model_spans, "survey_number")
                .map(|s| s.replace(' ', "")),
            hissa_number: self.resolve_singleton(
                rule_candidates(text, &HISSA_PATTERNS),
                model_spans,
                "hissa_number",
            ),
            village: self.resolve_singleton(
                place_candidates(text, &VILLAGE_PATTERNS),
                model_spans,
                "village",
            ),
            taluk: self.resolve_singleton(
                place_candidates(text, &TALUK_PATTERNS),
                model_spans,
                "taluk",
            ),
            district: self.resolve_singleton(
                place_candidates(text, &DISTRICT_PATTERNS),
                model_spans,
                "district",
            ),
            ..EntityBundle::default()
        };

        let (acres, guntas) = extract_extent(text);
        bundle.extent_acres = acres;
        bundle.extent_guntas = guntas;

        if let Some(caps) = VALIDITY_PATTERN.captures(text) {
            bundle.valid_from = parse_record_date(&caps[1]);
            bundle.valid_to = parse_record_date(&caps[2]);
        }
        if let Some(caps) = SIGNED_PATTERN.captures(text) {
            bundle.digitally_signed_date = parse_record_date(&caps[1]);
        }

        bundle.dates = self.resolve_list(validate_dates(date_candidates), model_spans, "date");
        bundle.case_numbers =
            self.resolve_list(rule_candidates(text, &CASE_PATTERNS), model_spans, "case_number");
        bundle.loans = extract_loans(text);
        bundle.mutations = extract_mutations(text);

        bundle
    }

    /// Singleton resolution: best rule match by (priority, offset); else the
    /// highest-confidence model span above the floor; else empty.
    fn resolve_singleton(
        &self,
        mut rule: Vec<Candidate>,
        model_spans: &[EntitySpan],
        field: &str,
    ) -> Option<String> {
        rule.sort_by_key(|c| (c.priority, c.offset));
        if let Some(best) = rule.into_iter().find(|c| !c.value.is_empty()) {
            return Some(tidy(&best.value));
        }

        model_spans
            .iter()
            .filter(|s| s.field == field && s.confidence >= self.model_floor)
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|s| tidy(&s.value))
            .filter(|v| !v.is_empty())
    }

    /// List resolution: union of rule and model spans, de-duplicated by
    /// normalized string, ordered by first appearance in the source text.
    fn resolve_list(
        &self,
        rule: Vec<Candidate>,
        model_spans: &[EntitySpan],
        field: &str,
    ) -> Vec<String> {
        let mut merged: Vec<(usize, String)> = rule
            .into_iter()
            .map(|c| (c.offset, tidy(&c.value)))
            .collect();
        merged.extend(
            model_spans
                .iter()
                .filter(|s| s.field == field && s.confidence >= self.model_floor)
                .map(|s| (s.offset, tidy(&s.value))),
        );
        merged.sort_by_key(|(offset, _)| *offset);

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (_, value) in merged {
            if value.is_empty() {
                continue;
            }
            let key = value.to_uppercase();
            if seen.insert(key) {
                out.push(value);
            }
        }
        out
    }
}

/// Whitespace-trim and NFC-normalize an extracted value.
fn tidy(value: &str) -> String {
    value.nfc().collect::<String>().trim().to_string()
}

fn rule_candidates(text: &str, patterns: &[Regex]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (priority, pattern) in patterns.iter().enumerate() {
        for caps in pattern.captures_iter(text) {
            let m = caps.get(1).or_else(|| caps.get(0));
            if let Some(m) = m {
                out.push(Candidate {
                    value: m.as_str().to_string(),
                    offset: m.start(),
                    priority,
                });
            }
        }
    }
    out
}

fn owner_candidates(text: &str) -> Vec<Candidate> {
    rule_candidates(text, &OWNER_PATTERNS)
        .into_iter()
        .filter_map(|mut c| {
            c.value = trim_stop_tail(&c.value)?;
            Some(c)
        })
        .collect()
}

fn place_candidates(text: &str, patterns: &[Regex]) -> Vec<Candidate> {
    rule_candidates(text, patterns)
        .into_iter()
        .filter_map(|mut c| {
            c.value = trim_stop_tail(&c.value)?;
            Some(c)
        })
        .collect()
}

/// Cut a captured name/place at the first field-label token.
fn trim_stop_tail(value: &str) -> Option<String> {
    let mut kept: Vec<&str> = Vec::new();
    for token in value.split_whitespace() {
        if STOP_TOKENS
            .iter()
            .any(|stop| token.eq_ignore_ascii_case(stop))
        {
            break;
        }
        kept.push(token);
    }
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

/// Drop survey candidates that are really dates and enforce the land-record
/// survey shape (`178`, `178/1`, `45/2A`, `123-4B`).
fn validate_surveys(candidates: Vec<Candidate>) -> Vec<Candidate> {
    static DATE_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}$").unwrap());
    static SURVEY_SHAPE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\d{1,4}(?:[/\-]\d{1,3}[A-Za-z]?)?$").unwrap());

    candidates
        .into_iter()
        .filter(|c| {
            let v = c.value.trim();
            v.len() <= 20 && !DATE_LIKE.is_match(v) && SURVEY_SHAPE.is_match(v)
        })
        .collect()
}

/// Keep only fully-dated candidates (a 4-digit year is required).
fn validate_dates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    static FULL_DATE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(?:\d{1,2}[/\-]\d{1,2}[/\-]\d{4}|\d{4}[/\-]\d{1,2}[/\-]\d{1,2})$").unwrap()
    });
    candidates
        .into_iter()
        .filter(|c| FULL_DATE.is_match(c.value.trim()))
        .collect()
}

/// Parse a DD/MM/YYYY record date.
fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn extract_extent(text: &str) -> (Option<i64>, Option<i64>) {
    if let Some(caps) = EXTENT_COMBINED.captures(text) {
        return (caps[1].parse().ok(), caps[2].parse().ok());
    }
    if let Some(caps) = EXTENT_DOTTED.captures(text) {
        return (caps[1].parse().ok(), caps[2].parse().ok());
    }
    let acres = EXTENT_ACRES.captures(text).and_then(|c| c[1].parse().ok());
    let guntas = EXTENT_GUNTAS.captures(text).and_then(|c| c[1].parse().ok());
    (acres, guntas)
}

/// Normalize an amount string ("5,50,000", "550.000/-", "₹500000") to whole
/// rupees. Separator dots are thousands separators in these records; paise
/// are never recorded.
fn parse_amount(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > 12 {
        return None;
    }
    digits.parse().ok()
}

/// Bank-name canonicalization table; legacy and abbreviated names collapse
/// onto their current institution.
fn canonical_bank(raw: &str) -> Option<String> {
    let cleaned = raw.replace('.', "").to_uppercase();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let mapped = match cleaned.as_str() {
        "SBM" | "STATE BANK OF MYSORE" => "State Bank of Mysore (now SBI)",
        "SBI" | "STATE BANK OF INDIA" => "State Bank of India",
        "HDFC" | "HDFC BANK" => "HDFC Bank",
        "ICICI" | "ICICI BANK" => "ICICI Bank",
        "AXIS" | "AXIS BANK" => "Axis Bank",
        "BOB" | "BANK OF BARODA" => "Bank of Baroda",
        "PNB" | "PUNJAB NATIONAL BANK" => "Punjab National Bank",
        "CANARA" | "CANARA BANK" => "Canara Bank",
        "UNION" | "UNION BANK" => "Union Bank",
        _ => {
            if cleaned.contains("BANK") {
                return Some(tidy(raw));
            }
            return None;
        }
    };
    Some(mapped.to_string())
}

fn extract_loans(text: &str) -> Vec<LoanEntry> {
    let mut found: Vec<(usize, LoanEntry)> = Vec::new();
    let mut seen_amounts = std::collections::HashSet::new();

    for pattern in AMOUNT_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let m = match caps.get(1) {
                Some(m) => m,
                None => continue,
            };
            let amount = match parse_amount(m.as_str()) {
                Some(a) if a >= MIN_LOAN_AMOUNT => a,
                _ => continue,
            };
            if !seen_amounts.insert(amount) {
                continue;
            }
            let context = context_window(text, m.start(), m.end(), LOAN_CONTEXT_PAD);
            let bank = BANK_PATTERNS
                .iter()
                .find_map(|p| p.captures(context))
                .and_then(|c| canonical_bank(&c[1]));
            found.push((
                m.start(),
                LoanEntry {
                    amount,
                    bank,
                    context: collapse_spaces(context),
                },
            ));
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, loan)| loan).collect()
}

fn extract_mutations(text: &str) -> Vec<MutationEntry> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for caps in MUTATION_PATTERN.captures_iter(text) {
        let m = caps.get(1).expect("mutation pattern has one group");
        let record_number = format!("MR {}", m.as_str());
        if !seen.insert(record_number.clone()) {
            continue;
        }
        let context = context_window(text, m.start(), m.end(), MUTATION_CONTEXT_PAD);
        let lower = context.to_lowercase();
        let pending =
            lower.contains("pending") || lower.contains("not effected") || lower.contains("not yet");
        out.push(MutationEntry {
            record_number,
            description: collapse_spaces(context),
            pending,
        });
    }
    out
}

/// Take a padded slice around a match, clamped to char boundaries.
fn context_window(text: &str, start: usize, end: usize, pad: usize) -> &str {
    let mut s = start.saturating_sub(pad);
    while s > 0 && !text.is_char_boundary(s) {
        s -= 1;
    }
    let mut e = (end + pad).min(text.len());
    while e < text.len() && !text.is_char_boundary(e) {
        e += 1;
    }
    &text[s..e]
}

fn collapse_spaces(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> EntityBundle {
        EntityExtractor::default().extract(text, &[])
    }

    const RTC_SAMPLE: &str = "Village Account Form No. 2 Village: HEBBAL Taluk: Bangalore North \
        District: Bangalore Owner Name: RAVI KUMAR Survey No. 45/2A Hissa No. 2 \
        Extent 2 Acres 10 Guntas Valid from 01/04/2015 To 31/03/2016 \
        RTC DIGITALLY SIGNED ON 15/04/2015";

    #[test]
    fn extracts_core_rtc_fields() {
        let bundle = extract(RTC_SAMPLE);
        assert_eq!(bundle.owner.as_deref(), Some("RAVI KUMAR"));
        assert_eq!(bundle.survey_number.as_deref(), Some("45/2A"));
        assert_eq!(bundle.hissa_number.as_deref(), Some("2"));
        assert_eq!(bundle.village.as_deref(), Some("HEBBAL"));
        assert_eq!(bundle.district.as_deref(), Some("Bangalore"));
        assert_eq!(bundle.extent_acres, Some(2));
        assert_eq!(bundle.extent_guntas, Some(10));
        assert_eq!(
            bundle.valid_from,
            NaiveDate::from_ymd_opt(2015, 4, 1)
        );
        assert_eq!(bundle.valid_to, NaiveDate::from_ymd_opt(2016, 3, 31));
        assert_eq!(
            bundle.digitally_signed_date,
            NaiveDate::from_ymd_opt(2015, 4, 15)
        );
    }

    #[test]
    fn owner_capture_stops_at_next_field_label() {
        let bundle = extract("Owner: Ravi Kumar Survey No. 178/1");
        assert_eq!(bundle.owner.as_deref(), Some("Ravi Kumar"));
    }

    #[test]
    fn loan_with_bank_is_extracted_and_normalized() {
        let bundle = extract(
            "Mortgage in favour of Manager S.B.M. Puravara branch Rs. 550,000/- dated 02/06/1998",
        );
        assert_eq!(bundle.loans.len(), 1);
        assert_eq!(bundle.loans[0].amount, 550_000);
        assert_eq!(
            bundle.loans[0].bank.as_deref(),
            Some("State Bank of Mysore (now SBI)")
        );
    }

    #[test]
    fn rupee_symbol_amount_parses() {
        let bundle = extract("Loan of ₹500000 from SBI outstanding");
        assert_eq!(bundle.loans.len(), 1);
        assert_eq!(bundle.loans[0].amount, 500_000);
        assert_eq!(bundle.loans[0].bank.as_deref(), Some("State Bank of India"));
    }

    #[test]
    fn small_amounts_are_not_loans() {
        let bundle = extract("Khata No. 321 fee Rs. 150 paid");
        assert!(bundle.loans.is_empty());
    }

    #[test]
    fn duplicate_amounts_collapse() {
        let bundle = extract("Rs. 200,000/- ... again Rs. 200,000/- same charge");
        assert_eq!(bundle.loans.len(), 1);
    }

    #[test]
    fn case_numbers_found() {
        let bundle = extract("Subject to Civil Suit No. 124/2001 before the court");
        assert_eq!(bundle.case_numbers, vec!["124/2001"]);
    }

    #[test]
    fn survey_candidates_that_look_like_dates_are_rejected() {
        // 12/11 is a plausible day/month pair, not a survey number
        let bundle = extract("entry made on 12/11 in the register");
        assert_eq!(bundle.survey_number, None);
    }

    #[test]
    fn dates_require_a_year() {
        let bundle = extract("dated 02/06/1998 and also 12/11");
        assert_eq!(bundle.dates, vec!["02/06/1998"]);
    }

    #[test]
    fn mutation_references_extracted_with_pending_flag() {
        let bundle = extract("mutation MR 4/2003-2004 is pending disposal");
        assert_eq!(bundle.mutations.len(), 1);
        assert_eq!(bundle.mutations[0].record_number, "MR 4/2003-2004");
        assert!(bundle.mutations[0].pending);
        assert!(bundle.has_pending_mutation());
    }

    #[test]
    fn model_span_fills_missing_singleton() {
        let spans = vec![EntitySpan {
            field: "owner".into(),
            value: "Manjunath Gowda".into(),
            confidence: 0.8,
            offset: 10,
        }];
        let bundle = EntityExtractor::default().extract("text with no owner marker", &spans);
        assert_eq!(bundle.owner.as_deref(), Some("Manjunath Gowda"));
    }

    #[test]
    fn model_span_below_floor_is_ignored() {
        let spans = vec![EntitySpan {
            field: "owner".into(),
            value: "Wrong Name".into(),
            confidence: 0.3,
            offset: 10,
        }];
        let bundle = EntityExtractor::default().extract("no owner here", &spans);
        assert_eq!(bundle.owner, None);
    }

    #[test]
    fn rule_match_wins_over_model_span() {
        let spans = vec![EntitySpan {
            field: "owner".into(),
            value: "Model Name".into(),
            confidence: 0.99,
            offset: 0,
        }];
        let bundle = EntityExtractor::default().extract("Owner: Ravi Kumar", &spans);
        assert_eq!(bundle.owner.as_deref(), Some("Ravi Kumar"));
    }

    #[test]
    fn list_union_is_deduplicated_and_source_ordered() {
        let spans = vec![EntitySpan {
            field: "case_number".into(),
            value: "124/2001".into(),
            confidence: 0.9,
            offset: 500,
        }];
        let bundle = EntityExtractor::default()
            .extract("Case No: 99/2004 then Civil Suit No. 124/2001", &spans);
        assert_eq!(bundle.case_numbers, vec!["99/2004", "124/2001"]);
    }

    #[test]
    fn dotted_extent_format_splits() {
        let (acres, guntas) = extract_extent("extent recorded as 1.17.00.00 in column 9");
        assert_eq!(acres, Some(1));
        assert_eq!(guntas, Some(17));
    }

    #[test]
    fn extraction_of_empty_text_is_all_absent() {
        let bundle = extract("");
        assert_eq!(bundle, EntityBundle::default());
    }
}
