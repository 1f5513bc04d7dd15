//! Pagination helper.
//!
//! Computes the page count, the SQL `LIMIT` offset/count pair, and a short
//! windowed list of page links with ellipsis gaps — the usual
//! `1 … 4 5 6 … 12` strip, where the current page carries no link.

/// One entry in a pagination strip. `url` is `None` for the current page and
/// for ellipsis gaps.
#[derive(Debug, Eq, PartialEq)]
pub struct Link {
    pub text: String,
    pub url: Option<String>,
}

impl Link {
    fn gap() -> Self {
        Self { text: "...".to_owned(), url: None }
    }
}

/// Pagination over `rows` table rows, `perpage` rows per page.
pub struct Paging {
    perpage: i64,
    page: i64,
    pages: i64,
    link: String,
}

impl Paging {
    /// `page` is the raw value from the request (a URL capture or query
    /// parameter); anything unparsable falls back to the first page. `link`
    /// is the base URL that page numbers are appended to — page 1 links to
    /// the base itself.
    pub fn new(rows: i64, perpage: i64, page: Option<&str>, link: impl Into<String>) -> Self {
        let page = page.and_then(|p| p.parse().ok()).unwrap_or(1);
        let pages = rows / perpage + i64::from(rows % perpage > 0);
        Self { perpage, page, pages, link: link.into() }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// Total number of pages.
    pub fn pages(&self) -> i64 {
        self.pages
    }

    /// Whether the requested page actually exists.
    pub fn in_range(&self) -> bool {
        self.page >= 1 && self.page <= self.pages
    }

    /// The `LIMIT` offset/count pair selecting this page's rows.
    pub fn limit(&self) -> (i64, i64) {
        (self.perpage * (self.page - 1), self.perpage)
    }

    fn numbered(&self, n: i64) -> Link {
        if n == self.page {
            Link { text: n.to_string(), url: None }
        } else {
            let url = if n > 1 { format!("{}/{}", self.link, n) } else { self.link.clone() };
            Link { text: n.to_string(), url: Some(url) }
        }
    }

    /// The windowed link strip: first page, up to one neighbour either side
    /// of the current page, last page, with ellipsis gaps where pages are
    /// skipped. The window widens by one at the edges so a gap never hides
    /// a single page.
    pub fn links(&self) -> Vec<Link> {
        let mut strip = vec![self.numbered(1)];
        if self.page > 4 {
            strip.push(Link::gap());
        }
        if self.page == 4 {
            strip.push(self.numbered(self.page - 2));
        }
        if self.page - 1 > 1 {
            strip.push(self.numbered(self.page - 1));
        }
        if self.page > 1 && self.page < self.pages {
            strip.push(self.numbered(self.page));
        }
        if self.page + 1 < self.pages {
            strip.push(self.numbered(self.page + 1));
        }
        if self.page == self.pages - 3 {
            strip.push(self.numbered(self.page + 2));
        }
        if self.page < self.pages - 3 {
            strip.push(Link::gap());
        }
        strip.push(self.numbered(self.pages));
        strip
    }
}
