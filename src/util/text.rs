use std::borrow::Cow;

/// The five named character references recognized by [`clean_text`].
///
/// Anything else (`&nbsp;`, `&#x27;`, custom entities) is left as-is —
/// not decoded, not re-escaped.
const ENTITIES: [(&str, char); 5] = [
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Reduces a raw feed field to plain display text.
///
/// Three steps, in order:
///
/// 1. Strip every `<...>` span. Stripping is greedy bracket matching, not
///    HTML parsing: a `<` is dropped together with everything up to the
///    next `>`; a `<` with no later `>` is kept literally.
/// 2. Unescape the five named references in [`ENTITIES`] in a single
///    left-to-right pass. Replacement output is not rescanned, so
///    `&amp;lt;` becomes `&lt;`, not `<`.
/// 3. Trim leading and trailing whitespace.
///
/// Returns `Cow::Borrowed` when the input needs no work (common case for
/// short fields like titles).
///
/// # Examples
///
/// ```
/// use newsprint::util::clean_text;
///
/// assert_eq!(clean_text("<p>Hello</p>"), "Hello");
/// assert_eq!(clean_text("a &amp; b"), "a & b");
/// assert_eq!(clean_text("  plain  "), "plain");
/// ```
pub fn clean_text(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();

    // Fast path: nothing to strip or unescape
    if !trimmed.contains('<') && !trimmed.contains('&') {
        return Cow::Borrowed(trimmed);
    }

    let stripped = strip_tags(trimmed);
    let unescaped = unescape_entities(&stripped);
    Cow::Owned(unescaped.trim().to_string())
}

/// Removes `<...>` spans, keeping any trailing unmatched `<` literally.
fn strip_tags(s: &str) -> Cow<'_, str> {
    let Some(first) = s.find('<') else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut rest = &s[first..];

    // Invariant: `rest` starts at a '<'
    loop {
        match rest.find('>') {
            Some(end) => {
                rest = &rest[end + 1..];
                match rest.find('<') {
                    Some(next) => {
                        out.push_str(&rest[..next]);
                        rest = &rest[next..];
                    }
                    None => {
                        out.push_str(rest);
                        break;
                    }
                }
            }
            None => {
                // No closing '>' anywhere after this point
                out.push_str(rest);
                break;
            }
        }
    }

    Cow::Owned(out)
}

/// Single left-to-right pass over the five named references.
fn unescape_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match ENTITIES.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, ch)) => {
                out.push(*ch);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}
