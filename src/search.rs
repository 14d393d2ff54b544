use std::sync::LazyLock;

use regex::Regex;

static PAGE_INDEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_IP\d+\.").unwrap());

/// Radius tiers (km) and the code Glassdoor expects for each.
const RADIUS_CODES: &[(u32, u32)] = &[(100, 62), (50, 31), (30, 19), (20, 12), (10, 6), (0, 0)];

/// Bucket a user radius into a supported tier and return its provider code.
/// Each tier is half-open: 10 belongs to the 10 tier, 9 to the 0 tier.
pub fn quantize_radius(radius: u32) -> u32 {
    RADIUS_CODES
        .iter()
        .find(|(tier, _)| radius >= *tier)
        .map(|(_, code)| *code)
        .unwrap_or(0)
}

/// Number of result pages needed to cover `total` results.
pub fn plan_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub city: String,
    pub domain: String,
    pub radius_code: u32,
    pub page_size: usize,
}

impl SearchQuery {
    pub fn base_url(&self) -> String {
        format!("https://www.glassdoor.{}", self.domain)
    }

    pub fn location_url(&self) -> String {
        format!("{}/findPopularLocationAjax.htm", self.base_url())
    }

    pub fn search_url(&self) -> String {
        format!("{}/Job/jobs.htm", self.base_url())
    }

    /// Keywords joined the way the search box submits them.
    pub fn keyword_query(&self) -> String {
        self.keywords.join("-")
    }

    pub fn location_form(&self) -> Vec<(String, String)> {
        vec![
            ("term".into(), self.city.clone()),
            ("maxLocationsToReturn".into(), "10".into()),
        ]
    }

    pub fn search_form(&self, location_id: &str) -> Vec<(String, String)> {
        vec![
            ("clickSource".into(), "searchBtn".into()),
            ("sc.keyword".into(), self.keyword_query()),
            ("locT".into(), "C".into()),
            ("locId".into(), location_id.to_string()),
            ("jobType".into(), String::new()),
            ("radius".into(), self.radius_code.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPlan {
    pub total_results: usize,
    pub page_size: usize,
    pub page_count: usize,
}

impl PaginationPlan {
    pub fn new(total_results: usize, page_size: usize) -> Self {
        PaginationPlan {
            total_results,
            page_size,
            page_count: plan_pages(total_results, page_size),
        }
    }

    /// Pages still to fetch once page 1 is in hand.
    pub fn remaining_pages(&self) -> std::ops::RangeInclusive<usize> {
        2..=self.page_count
    }
}

/// Page URL pattern derived from page 1's "next page" link.
#[derive(Debug, Clone)]
pub struct PageUrlTemplate {
    url: String,
}

impl PageUrlTemplate {
    /// `href` is the site-relative link found on page 1, e.g.
    /// `/Job/toronto-python-jobs-SRCH_IL.0,7_IC2281069_KO8,14_IP2.htm`.
    /// Returns `None` when it carries no page index to substitute.
    pub fn from_next_href(base_url: &str, href: &str) -> Option<Self> {
        if !PAGE_INDEX_RE.is_match(href) {
            return None;
        }
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", base_url, href)
        };
        Some(PageUrlTemplate { url })
    }

    pub fn url_for(&self, page: usize) -> String {
        PAGE_INDEX_RE
            .replace(&self.url, format!("_IP{}.", page).as_str())
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_tiers() {
        assert_eq!(quantize_radius(5), 0);
        assert_eq!(quantize_radius(15), 6);
        assert_eq!(quantize_radius(25), 12);
        assert_eq!(quantize_radius(45), 19);
        assert_eq!(quantize_radius(60), 31);
        assert_eq!(quantize_radius(150), 62);
    }

    #[test]
    fn radius_boundaries_open_their_tier() {
        assert_eq!(quantize_radius(0), 0);
        assert_eq!(quantize_radius(9), 0);
        assert_eq!(quantize_radius(10), 6);
        assert_eq!(quantize_radius(20), 12);
        assert_eq!(quantize_radius(30), 19);
        assert_eq!(quantize_radius(50), 31);
        assert_eq!(quantize_radius(100), 62);
    }

    #[test]
    fn page_counts() {
        assert_eq!(plan_pages(95, 30), 4);
        assert_eq!(plan_pages(90, 30), 3);
        assert_eq!(plan_pages(1, 30), 1);
        assert_eq!(plan_pages(0, 30), 0);
        assert_eq!(plan_pages(10, 0), 0);
    }

    #[test]
    fn remaining_pages_skip_first() {
        let plan = PaginationPlan::new(95, 30);
        assert_eq!(plan.remaining_pages().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(PaginationPlan::new(20, 30).remaining_pages().count(), 0);
    }

    #[test]
    fn page_url_substitution() {
        let t = PageUrlTemplate::from_next_href(
            "https://www.glassdoor.ca",
            "/Job/toronto-python-jobs-SRCH_IL.0,7_IC2281069_KO8,14_IP2.htm",
        )
        .unwrap();
        assert_eq!(
            t.url_for(5),
            "https://www.glassdoor.ca/Job/toronto-python-jobs-SRCH_IL.0,7_IC2281069_KO8,14_IP5.htm"
        );
        assert!(PageUrlTemplate::from_next_href("https://www.glassdoor.ca", "/Job/jobs.htm").is_none());
    }

    #[test]
    fn search_form_fields() {
        let q = SearchQuery {
            keywords: vec!["python".into(), "backend".into()],
            city: "Toronto".into(),
            domain: "ca".into(),
            radius_code: quantize_radius(25),
            page_size: 30,
        };
        let form = q.search_form("2281069");
        assert!(form.contains(&("sc.keyword".into(), "python-backend".into())));
        assert!(form.contains(&("radius".into(), "12".into())));
        assert!(form.contains(&("locId".into(), "2281069".into())));
        assert_eq!(q.search_url(), "https://www.glassdoor.ca/Job/jobs.htm");
    }
}
