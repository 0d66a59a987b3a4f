/// Characters treated as line boundaries (the Unicode set honoured by
/// universal-newline splitting, `\r\n` included via its two halves).
const LINE_BOUNDARIES: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Collapse raw extracted text into clean prose.
///
/// Each line is trimmed and split on double spaces; the surviving fragments
/// are trimmed and joined with single spaces. Pure, total and idempotent.
///
/// ```
/// use gleaner_web::normalize;
///
/// let raw = "  Rupiah   weakens\n\n\tas dollar gains  \r\n";
/// assert_eq!(normalize(raw), "Rupiah weakens as dollar gains");
/// assert_eq!(normalize(&normalize(raw)), normalize(raw));
/// ```
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for line in raw.split(LINE_BOUNDARIES) {
        for fragment in line.trim().split("  ") {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(fragment);
        }
    }
    out
}
