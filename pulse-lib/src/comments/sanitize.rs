//! Content sanitization.
//!
//! Neutralizes script-tag open sequences before persistence. This is
//! defense in depth; output encoding at render time remains the real
//! protection.

/// Replace `<script` and `</script` openings (any case) with an escaped
/// `<`, leaving all other markup untouched.
pub fn neutralize_scripts(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let tag = tail.strip_prefix('/').unwrap_or(tail);
        let opens_script =
            tag.len() >= 6 && tag.as_bytes()[..6].eq_ignore_ascii_case(b"script");
        if opens_script {
            out.push_str("&lt;");
        } else {
            out.push('<');
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}
