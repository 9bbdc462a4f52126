//! Attribution extraction
//!
//! Parses campaign parameters out of a navigation context into a
//! normalized [`Attribution`] record:
//! - `utm_*` query parameters, preserved exactly as sent
//! - Click-id inference (gclid, fbclid) when no explicit source is given
//! - Referrer classification (organic search vs. referral) as a fallback
//!
//! Extraction is idempotent and free of global state: the same URL and
//! referrer always produce a field-for-field identical record. Malformed
//! URLs yield a record with all campaign fields absent rather than failing.

use crate::types::{Attribution, PageContext};
use url::Url;

/// Search-engine referrer hosts recognized for organic classification
const SEARCH_ENGINES: &[(&str, &str)] = &[
    ("google.", "google"),
    ("bing.com", "bing"),
    ("duckduckgo.com", "duckduckgo"),
    ("search.yahoo.", "yahoo"),
    ("ecosia.org", "ecosia"),
    ("baidu.com", "baidu"),
];

/// Extracts attribution records from navigation context
pub struct AttributionExtractor;

impl AttributionExtractor {
    /// Extract attribution from a URL and optional referrer.
    ///
    /// Absent query parameters stay `None`; a parameter that is present
    /// but empty becomes `Some("")` so downstream consumers can tell the
    /// two apart.
    pub fn extract(url: &str, referrer: Option<&str>) -> Attribution {
        let referrer = referrer
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => {
                return Attribution {
                    referrer,
                    ..Attribution::default()
                };
            }
        };

        let mut attribution = Attribution {
            referrer,
            landing_page: Some(url.to_string()),
            ..Attribution::default()
        };

        let mut gclid = false;
        let mut fbclid = false;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "utm_source" => attribution.source = Some(value.into_owned()),
                "utm_medium" => attribution.medium = Some(value.into_owned()),
                "utm_campaign" => attribution.campaign = Some(value.into_owned()),
                "utm_term" => attribution.term = Some(value.into_owned()),
                "utm_content" => attribution.content = Some(value.into_owned()),
                "gclid" => gclid = true,
                "fbclid" => fbclid = true,
                _ => {}
            }
        }

        // Click ids identify the ad network when no explicit source is sent
        if attribution.source.is_none() {
            if gclid {
                attribution.source = Some("google".to_string());
                attribution.medium.get_or_insert_with(|| "cpc".to_string());
            } else if fbclid {
                attribution.source = Some("facebook".to_string());
                attribution
                    .medium
                    .get_or_insert_with(|| "paid_social".to_string());
            }
        }

        // Fall back to classifying the referrer when the URL carried nothing
        if !attribution.has_campaign_signal() {
            if let Some(referrer) = attribution.referrer.clone() {
                classify_referrer(&mut attribution, &referrer, &parsed);
            }
        }

        attribution
    }

    /// Extract attribution from a full page context
    pub fn extract_from_context(context: &PageContext) -> Attribution {
        Self::extract(&context.url, context.referrer.as_deref())
    }
}

/// Classify an external referrer as organic search or a plain referral.
/// Same-host referrers (internal navigation) are left unclassified.
fn classify_referrer(attribution: &mut Attribution, referrer: &str, current: &Url) {
    let referrer_url = match Url::parse(referrer) {
        Ok(parsed) => parsed,
        Err(_) => return,
    };
    let host = match referrer_url.host_str() {
        Some(host) => host.to_ascii_lowercase(),
        None => return,
    };

    if current
        .host_str()
        .is_some_and(|own| own.eq_ignore_ascii_case(&host))
    {
        return;
    }

    for (pattern, engine) in SEARCH_ENGINES {
        if host.contains(pattern) {
            attribution.source = Some(engine.to_string());
            attribution.medium = Some("organic".to_string());
            return;
        }
    }

    attribution.source = Some(host);
    attribution.medium = Some("referral".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_all_utm_parameters() {
        let attribution = AttributionExtractor::extract(
            "https://example.com/pricing?utm_source=newsletter&utm_medium=email\
             &utm_campaign=spring&utm_term=cro&utm_content=cta_top",
            None,
        );

        assert_eq!(attribution.source.as_deref(), Some("newsletter"));
        assert_eq!(attribution.medium.as_deref(), Some("email"));
        assert_eq!(attribution.campaign.as_deref(), Some("spring"));
        assert_eq!(attribution.term.as_deref(), Some("cro"));
        assert_eq!(attribution.content.as_deref(), Some("cta_top"));
    }

    #[test]
    fn absent_parameters_stay_absent_and_empty_stay_empty() {
        let attribution =
            AttributionExtractor::extract("https://example.com/?utm_source=", None);

        // Provided-but-empty is distinguishable from not provided
        assert_eq!(attribution.source.as_deref(), Some(""));
        assert_eq!(attribution.medium, None);
        assert_eq!(attribution.campaign, None);
    }

    #[test]
    fn extraction_is_idempotent() {
        let url = "https://example.com/?utm_source=ads&utm_campaign=q3";
        let first = AttributionExtractor::extract(url, Some("https://google.com/"));
        let second = AttributionExtractor::extract(url, Some("https://google.com/"));

        assert_eq!(first, second);
    }

    #[test]
    fn malformed_url_yields_absent_fields() {
        let attribution = AttributionExtractor::extract("not a url at all", None);

        assert_eq!(attribution.source, None);
        assert_eq!(attribution.medium, None);
        assert_eq!(attribution.campaign, None);
        assert_eq!(attribution.landing_page, None);
    }

    #[test]
    fn gclid_infers_google_cpc() {
        let attribution =
            AttributionExtractor::extract("https://example.com/?gclid=abc123", None);

        assert_eq!(attribution.source.as_deref(), Some("google"));
        assert_eq!(attribution.medium.as_deref(), Some("cpc"));
    }

    #[test]
    fn explicit_source_wins_over_click_id() {
        let attribution = AttributionExtractor::extract(
            "https://example.com/?utm_source=partner&gclid=abc123",
            None,
        );

        assert_eq!(attribution.source.as_deref(), Some("partner"));
    }

    #[test]
    fn search_referrer_classified_as_organic() {
        let attribution = AttributionExtractor::extract(
            "https://example.com/",
            Some("https://www.google.com/search?q=cro"),
        );

        assert_eq!(attribution.source.as_deref(), Some("google"));
        assert_eq!(attribution.medium.as_deref(), Some("organic"));
    }

    #[test]
    fn external_referrer_classified_as_referral() {
        let attribution = AttributionExtractor::extract(
            "https://example.com/",
            Some("https://news.ycombinator.com/item?id=1"),
        );

        assert_eq!(attribution.source.as_deref(), Some("news.ycombinator.com"));
        assert_eq!(attribution.medium.as_deref(), Some("referral"));
    }

    #[test]
    fn internal_referrer_is_not_classified() {
        let attribution = AttributionExtractor::extract(
            "https://example.com/pricing",
            Some("https://example.com/"),
        );

        assert_eq!(attribution.source, None);
        assert_eq!(attribution.medium, None);
        assert_eq!(attribution.referrer.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn no_signal_means_no_fabricated_source() {
        let attribution = AttributionExtractor::extract("https://example.com/", None);

        assert!(!attribution.has_campaign_signal());
        assert_eq!(attribution.landing_page.as_deref(), Some("https://example.com/"));
    }
}
