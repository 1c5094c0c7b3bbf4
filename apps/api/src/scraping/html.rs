use scraper::{ElementRef, Html, Selector};

/// Returns the cards matched by the first selector that matches anything.
/// Boards change markup often; older selectors stay in the list as fallbacks.
pub fn select_cards<'a>(document: &'a Html, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            let cards: Vec<ElementRef<'a>> = document.select(&selector).collect();
            if !cards.is_empty() {
                return cards;
            }
        }
    }
    Vec::new()
}

/// First non-empty text among `selectors`, searched inside `element`.
pub fn find_text(element: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(found) = element.select(&selector).next() {
                let text = clean_text(&found.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// First non-empty `attr` among `selectors`, searched inside `element`.
pub fn find_attr(element: ElementRef<'_>, selectors: &[&str], attr: &str) -> Option<String> {
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            let value = element
                .select(&selector)
                .find_map(|found| found.value().attr(attr))
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(value) = value {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Collapses all whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a possibly relative `href` against `base` (scheme + host, no trailing slash).
pub fn absolutize(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

/// Drops query string and fragment so tracking parameters don't defeat url dedup.
pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
