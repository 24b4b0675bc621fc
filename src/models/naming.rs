//! Natural-key normalization applied at the service boundary.
//!
//! Repositories compare natural keys exactly; every title, name and label is
//! passed through [`title_case`] once before it reaches them.

/// Trim and title-case a string: a letter is upper-cased when it does not
/// follow another letter and lower-cased otherwise, so `"o'neil"` becomes
/// `"O'Neil"` and `"SCIENCE fiction"` becomes `"Science Fiction"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for c in s.trim().chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}
