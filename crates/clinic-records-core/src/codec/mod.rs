//! Record codec: one [`Patient`] to and from one line of quoted CSV.
//!
//! Line layout (12 fields, comma separated):
//!
//! ```text
//! Id,LastName,FirstName,MiddleName,BirthDate,DoctorFullName,DoctorPosition,Diagnosis,Ambulatory,SickLeaveDays,OnDispensary,Note
//! 1,"Ivanov","Ivan","Ivanovich",2000-01-01T00:00:00Z,"Dr. Smirnov","Therapist","Flu",true,3,false,"note"
//! ```
//!
//! - Text fields are always quoted; embedded quotes are doubled.
//! - Birth dates are RFC 3339 in UTC.
//! - Booleans are the bare tokens `true` / `false`.
//!
//! Decoding is total. Missing fields keep their defaults and unparseable
//! tokens are defaulted and reported as [`FieldWarning`]s.

mod line;

pub use line::{quote, split_fields, SEPARATOR};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::models::Patient;

/// Column names, in wire order.
pub const FIELD_NAMES: [&str; 12] = [
    "Id",
    "LastName",
    "FirstName",
    "MiddleName",
    "BirthDate",
    "DoctorFullName",
    "DoctorPosition",
    "Diagnosis",
    "Ambulatory",
    "SickLeaveDays",
    "OnDispensary",
    "Note",
];

/// Header line written at the top of every saved file.
pub const HEADER: &str = "Id,LastName,FirstName,MiddleName,BirthDate,DoctorFullName,DoctorPosition,Diagnosis,Ambulatory,SickLeaveDays,OnDispensary,Note";

/// A token that could not be parsed into its field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWarning {
    /// Column name from [`FIELD_NAMES`]
    pub field: &'static str,
    /// The raw token
    pub value: String,
}

impl std::fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: unreadable value {:?}", self.field, self.value)
    }
}

/// Best-effort decoding result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub patient: Patient,
    pub warnings: Vec<FieldWarning>,
}

/// Check whether a line is the column header (`Id` followed by the separator).
pub fn is_header(line: &str) -> bool {
    let line = line.trim_start_matches('\u{feff}');
    line.get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("id,"))
}

/// Encode a patient as one line (without line terminator).
pub fn encode(patient: &Patient) -> String {
    let fields = [
        patient.id.to_string(),
        quote(&patient.last_name),
        quote(&patient.first_name),
        quote(&patient.middle_name),
        format_date(&patient.birth_date),
        quote(&patient.doctor_full_name),
        quote(&patient.doctor_position),
        quote(&patient.diagnosis),
        patient.ambulatory.to_string(),
        patient.sick_leave_days.to_string(),
        patient.on_dispensary.to_string(),
        quote(&patient.note),
    ];
    fields.join(",")
}

/// Decode a line, discarding field warnings.
pub fn decode(line: &str) -> Patient {
    decode_with_warnings(line).patient
}

/// Decode a line into a patient plus a warning for every unreadable token.
pub fn decode_with_warnings(line: &str) -> Decoded {
    if line.trim().is_empty() {
        return Decoded::default();
    }

    let mut reader = FieldReader::new(split_fields(line));
    let mut p = Patient::default();

    if let Some(id) = reader.parse(0, |s| s.parse::<i32>().ok()) {
        p.id = id;
    }
    if let Some(v) = reader.text(1) {
        p.last_name = v;
    }
    if let Some(v) = reader.text(2) {
        p.first_name = v;
    }
    if let Some(v) = reader.text(3) {
        p.middle_name = v;
    }
    if let Some(date) = reader.parse(4, parse_date) {
        p.birth_date = date;
    }
    if let Some(v) = reader.text(5) {
        p.doctor_full_name = v;
    }
    if let Some(v) = reader.text(6) {
        p.doctor_position = v;
    }
    if let Some(v) = reader.text(7) {
        p.diagnosis = v;
    }
    if let Some(flag) = reader.parse(8, parse_bool) {
        p.ambulatory = flag;
    }
    if let Some(days) = reader.parse(9, |s| s.parse::<u32>().ok()) {
        p.sick_leave_days = days;
    }
    if let Some(flag) = reader.parse(10, parse_bool) {
        p.on_dispensary = flag;
    }
    if let Some(v) = reader.text(11) {
        p.note = v;
    }

    Decoded {
        patient: p,
        warnings: reader.warnings,
    }
}

/// Render a timestamp the way the codec writes it.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a birth date token.
///
/// Accepts RFC 3339 (including the signed `+YYYYY`/`-YYYY` years that
/// [`format_date`] writes outside 0000-9999), a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` timestamp taken as UTC, and a bare `YYYY-MM-DD`
/// date.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if s.starts_with(['+', '-']) {
        return parse_signed_year_date(s);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// RFC 3339 with a signed, possibly longer than four digit, year.
fn parse_signed_year_date(s: &str) -> Option<DateTime<Utc>> {
    let (sign, body) = s.split_at(1);
    let dash = body.find('-')?;
    let (year, rest) = body.split_at(dash);
    if year.is_empty() || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let year = if sign == "-" { -year } else { year };

    // 2000 is a leap year, so any month/day pair parses before the real year is set.
    DateTime::parse_from_rfc3339(&format!("2000{rest}"))
        .ok()?
        .with_year(year)
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a boolean token: `true`/`false` in any case, or `1`/`0`.
pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") || s == "1" {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") || s == "0" {
        Some(false)
    } else {
        None
    }
}

/// Positional access to split fields, collecting parse warnings.
struct FieldReader {
    fields: Vec<String>,
    warnings: Vec<FieldWarning>,
}

impl FieldReader {
    fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            warnings: Vec::new(),
        }
    }

    fn text(&mut self, idx: usize) -> Option<String> {
        self.fields.get_mut(idx).map(std::mem::take)
    }

    /// Parse a typed token. Blank and missing tokens yield `None` silently.
    fn parse<T>(&mut self, idx: usize, f: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.fields.get(idx)?;
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }

        let parsed = f(token);
        if parsed.is_none() {
            self.warnings.push(FieldWarning {
                field: FIELD_NAMES[idx],
                value: raw.clone(),
            });
        }
        parsed
    }
}
