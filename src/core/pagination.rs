use serde::Deserialize;

/// `?page=` as sent by the client, left unparsed for
/// [`resolve_page_number`].
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// One page of a result set. Page numbers start at 1 and there is always
/// at least one page, even for an empty result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

pub fn num_pages(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size).max(1)
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Missing or non-numeric input selects page 1; any integer outside
/// `1..=num_pages`, however large, selects the last page.
pub fn resolve_page_number(raw: Option<&str>, num_pages: u64) -> u64 {
    let num_pages = num_pages.max(1);
    let Some(raw) = raw.map(str::trim) else {
        return 1;
    };

    match raw.parse::<i64>() {
        Ok(n) if n >= 1 && n as u64 <= num_pages => n as u64,
        Ok(_) => num_pages,
        Err(_) if is_integer(raw) => num_pages,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_pages() {
        assert_eq!(num_pages(0, 10), 1);
        assert_eq!(num_pages(10, 10), 1);
        assert_eq!(num_pages(11, 10), 2);
        assert_eq!(num_pages(25, 10), 3);
    }

    #[test]
    fn resolves_page_numbers() {
        assert_eq!(resolve_page_number(None, 3), 1);
        assert_eq!(resolve_page_number(Some("2"), 3), 2);
        assert_eq!(resolve_page_number(Some("abc"), 3), 1);
        assert_eq!(resolve_page_number(Some(""), 3), 1);
        assert_eq!(resolve_page_number(Some("99"), 3), 3);
        assert_eq!(resolve_page_number(Some("0"), 3), 3);
        assert_eq!(resolve_page_number(Some("-4"), 3), 3);
        assert_eq!(resolve_page_number(Some("1"), 0), 1);
        assert_eq!(resolve_page_number(Some("99999999999999999999"), 3), 3);
        assert_eq!(resolve_page_number(Some("-99999999999999999999"), 3), 3);
        assert_eq!(resolve_page_number(Some("+2"), 3), 2);
        assert_eq!(resolve_page_number(Some("2.5"), 3), 1);
        assert_eq!(resolve_page_number(Some("-"), 3), 1);
    }

    #[test]
    fn page_navigation() {
        let page = Page { items: vec![1, 2], number: 2, num_pages: 3, total: 22 };
        assert!(page.has_previous());
        assert!(page.has_next());

        let last = Page { items: vec![3], number: 3, num_pages: 3, total: 21 };
        assert!(last.has_previous());
        assert!(!last.has_next());
    }
}
