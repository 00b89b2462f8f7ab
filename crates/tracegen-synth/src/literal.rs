//! Java source literals for captured text.
//!
//! A snapshot embedded in a test must read back byte-for-byte, so every
//! character the Java lexer treats specially is escaped. Line breaks in the
//! text become breaks between concatenated segments to keep generated
//! sources readable.

/// Separator between concatenated literal segments.
pub const SEGMENT_BREAK: &str = " +\n";

/// Encode `text` as a (possibly multi-segment) Java string literal.
///
/// ```
/// use tracegen_synth::java_string_literal;
///
/// assert_eq!(java_string_literal("<a>\n</a>"), "\"<a>\\n\" +\n\"</a>\"");
/// ```
pub fn java_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                out.push_str("\\n");
                if chars.peek().is_some() {
                    out.push('"');
                    out.push_str(SEGMENT_BREAK);
                    out.push('"');
                }
            }
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // octal rather than \u escapes: the Java lexer expands \u before
            // tokenizing, which would put raw control characters in the literal
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
