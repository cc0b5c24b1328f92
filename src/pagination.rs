//! Page-number pagination with a GeoJSON FeatureCollection envelope.
//!
//! ```text
//! {"type": "FeatureCollection", "count": 3, "next": null, "previous": null, "features": [...]}
//! ```

use serde::Serialize;
use url::{form_urlencoded, Url};

use crate::errors::AppError;

pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";
const LAST_PAGE: &str = "last";

/// Page size limits, taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct Pager {
    pub page_size: u32,
    pub max_page_size: u32,
}

/// A resolved page within a result set of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
    pub count: u64,
}

impl Pager {
    pub fn new(page_size: u32, max_page_size: u32) -> Self {
        Self {
            page_size,
            max_page_size,
        }
    }

    /// Effective page size: a positive `page_size` parameter capped at the
    /// maximum, otherwise the default.
    pub fn size_for(&self, page_size: Option<&str>) -> u64 {
        page_size
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(u64::from(self.max_page_size)))
            .unwrap_or_else(|| u64::from(self.page_size))
    }

    /// Picks the requested page out of `count` results.
    ///
    /// The first page always exists, even for an empty result set. Any other
    /// page beyond the end, or a page number that does not parse, is
    /// [`AppError::InvalidPage`].
    pub fn resolve(
        &self,
        count: u64,
        page: Option<&str>,
        page_size: Option<&str>,
    ) -> Result<Page, AppError> {
        let size = self.size_for(page_size);
        let num_pages = count.div_ceil(size).max(1);

        let number = match page.map(str::trim) {
            None | Some("") => 1,
            Some(LAST_PAGE) => num_pages,
            Some(raw) => raw.parse::<u64>().map_err(|_| AppError::InvalidPage)?,
        };
        if number == 0 || number > num_pages {
            return Err(AppError::InvalidPage);
        }

        Ok(Page {
            number,
            size,
            count,
        })
    }
}

impl Page {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.size).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Link to the next page, keeping every other query parameter.
    pub fn next_link(&self, list_url: &str, raw_query: Option<&str>) -> Option<String> {
        self.has_next()
            .then(|| page_url(list_url, raw_query, Some(self.number + 1)))
    }

    /// Link to the previous page; the first page is linked without `page`.
    pub fn previous_link(&self, list_url: &str, raw_query: Option<&str>) -> Option<String> {
        if !self.has_previous() {
            return None;
        }
        let previous = self.number - 1;
        Some(page_url(
            list_url,
            raw_query,
            (previous > 1).then_some(previous),
        ))
    }
}

/// Rebuilds `list_url` with the request's query, replacing (or dropping) the
/// page parameter.
pub fn page_url(list_url: &str, raw_query: Option<&str>, page: Option<u64>) -> String {
    let Ok(mut url) = Url::parse(list_url) else {
        return list_url.to_string();
    };

    let mut pairs: Vec<(String, String)> = raw_query
        .map(|query| {
            form_urlencoded::parse(query.as_bytes())
                .filter(|(key, _)| key != PAGE_PARAM)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    if let Some(page) = page {
        pairs.push((PAGE_PARAM.to_string(), page.to_string()));
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

/// Paginated FeatureCollection body.
#[derive(Debug, Serialize)]
pub struct FeatureCollectionPage<F> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub features: Vec<F>,
}

impl<F: Serialize> FeatureCollectionPage<F> {
    pub fn new(page: &Page, features: Vec<F>, list_url: &str, raw_query: Option<&str>) -> Self {
        Self {
            kind: "FeatureCollection",
            count: page.count,
            next: page.next_link(list_url, raw_query),
            previous: page.previous_link(list_url, raw_query),
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "http://testserver/service-areas/";

    #[test]
    fn page_size_parameter_is_capped() {
        let pager = Pager::new(100, 1000);
        assert_eq!(pager.size_for(None), 100);
        assert_eq!(pager.size_for(Some("25")), 25);
        assert_eq!(pager.size_for(Some("5000")), 1000);
        assert_eq!(pager.size_for(Some("0")), 100);
        assert_eq!(pager.size_for(Some("-3")), 100);
        assert_eq!(pager.size_for(Some("lots")), 100);
    }

    #[test]
    fn empty_result_has_a_first_page() {
        let page = Pager::new(10, 100).resolve(0, None, None).unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.offset(), 0);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn out_of_range_pages_are_invalid() {
        let pager = Pager::new(10, 100);
        assert!(matches!(pager.resolve(25, Some("4"), None), Err(AppError::InvalidPage)));
        assert!(matches!(pager.resolve(25, Some("0"), None), Err(AppError::InvalidPage)));
        assert!(matches!(pager.resolve(25, Some("two"), None), Err(AppError::InvalidPage)));
        assert_eq!(pager.resolve(25, Some("last"), None).unwrap().number, 3);
        assert_eq!(pager.resolve(25, Some("3"), None).unwrap().offset(), 20);
    }

    #[test]
    fn links_keep_filter_parameters() {
        let page = Pager::new(1, 10)
            .resolve(3, Some("2"), Some("1"))
            .unwrap();
        let query = Some("latitude=-107.2&longitude=44.7&page=2&page_size=1");

        assert_eq!(
            page.next_link(LIST, query).unwrap(),
            "http://testserver/service-areas/?latitude=-107.2&longitude=44.7&page_size=1&page=3"
        );
        assert_eq!(
            page.previous_link(LIST, query).unwrap(),
            "http://testserver/service-areas/?latitude=-107.2&longitude=44.7&page_size=1"
        );
    }

    #[test]
    fn previous_link_from_page_three_names_page_two() {
        let page = Pager::new(1, 10).resolve(3, Some("3"), None).unwrap();
        assert_eq!(
            page.previous_link(LIST, Some("page=3")).unwrap(),
            "http://testserver/service-areas/?page=2"
        );
        assert_eq!(page.next_link(LIST, Some("page=3")), None);
    }

    #[test]
    fn first_page_link_without_other_parameters_has_no_query() {
        assert_eq!(page_url(LIST, Some("page=2"), None), LIST);
        assert_eq!(page_url(LIST, None, None), LIST);
    }

    #[test]
    fn envelope_shape() {
        let page = Pager::new(10, 10).resolve(2, None, None).unwrap();
        let body = FeatureCollectionPage::new(&page, vec![1, 2], LIST, None);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "type": "FeatureCollection",
                "count": 2,
                "next": null,
                "previous": null,
                "features": [1, 2]
            })
        );
    }
}
