//! URL slugs for public media kits.

const MAX_SLUG_LEN: usize = 64;
const FALLBACK_SLUG: &str = "media-kit";

/// Lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Whether a client-supplied slug is already in canonical form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= MAX_SLUG_LEN && slugify(slug) == slug
}

/// `base`, `base-2`, `base-3`, ... for collision handling.
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Dana  Reyes -- Founder!"), "dana-reyes-founder");
        assert_eq!(slugify("Q&A w/ Sam"), "q-a-w-sam");
    }

    #[test]
    fn slugify_drops_non_ascii_and_falls_back() {
        assert_eq!(slugify("Éric Dupont"), "ric-dupont");
        assert_eq!(slugify("!!!"), "media-kit");
    }

    #[test]
    fn slugify_caps_length() {
        let slug = slugify(&"ab ".repeat(60));
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn validates_and_numbers_candidates() {
        assert!(is_valid_slug("dana-reyes"));
        assert!(!is_valid_slug("Dana Reyes"));
        assert!(!is_valid_slug(""));
        assert_eq!(candidate("dana", 1), "dana");
        assert_eq!(candidate("dana", 3), "dana-3");
    }
}
