//! Report page extraction.
//!
//! Turns the HTML of a `/report/<id>` page into a [`Report`]. Fields are read
//! in a fixed order from three required anchors inside `div#side-report`
//! plus the optional updates section. Extraction is a pure function of the
//! page bytes and the reference date used to resolve weekday-only stamps.

mod fields;
pub mod timestamp;

use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::models::{Report, ReportBuilder, ReportField};

static SIDE_REPORT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#side-report").unwrap());
static REPORT_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.report_meta_info").unwrap());
static COUNCIL_INFO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.council_sent_info").unwrap());
static UPDATES_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("section.full-width").unwrap());

/// Page could not be turned into a record.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    /// A required anchor element is missing; the page layout is not one we know.
    #[error("page structure not recognized: missing {0}")]
    Structural(&'static str),

    /// A required field could not be resolved.
    #[error("failed to extract {field}: {reason}")]
    Field { field: ReportField, reason: String },
}

impl ExtractError {
    pub(crate) fn field(field: ReportField, reason: impl Into<String>) -> Self {
        Self::Field {
            field,
            reason: reason.into(),
        }
    }
}

/// Whitespace-normalized text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract a report from page bytes.
///
/// `today` anchors partial (`at HH:MM, <weekday>`) timestamps.
pub fn extract_report(id: i64, page: &[u8], today: NaiveDate) -> Result<Report, ExtractError> {
    let html = String::from_utf8_lossy(page);
    let document = Html::parse_document(&html);

    let side_report = document
        .select(&SIDE_REPORT)
        .next()
        .ok_or(ExtractError::Structural("div#side-report"))?;
    let meta = side_report
        .select(&REPORT_META)
        .next()
        .ok_or(ExtractError::Structural("p.report_meta_info"))?;
    let council_block = side_report
        .select(&COUNCIL_INFO)
        .next()
        .ok_or(ExtractError::Structural("p.council_sent_info"))?;
    let updates_section = document.select(&UPDATES_SECTION).next();

    let meta_text = element_text(meta);
    debug!("Report {} meta text: {}", id, meta_text);

    // Fields resolve in a fixed order; the first fatal one ends extraction.
    let status = fields::status(side_report)?;
    let editable = fields::editable(side_report);
    let reported_at = fields::reported_at(&meta_text, today)?;
    let category = fields::category(&meta_text);
    let council = fields::council(council_block, &meta_text)?;
    let title = fields::title(side_report)?;
    let description = fields::description(side_report)?;
    let (latitude, longitude) = fields::coordinates(side_report)?;
    let method = fields::method(&meta_text);
    let (update_count, latest_update_at) = fields::updates(updates_section, today)?;

    Ok(ReportBuilder::new(id, title, council, latitude, longitude)
        .status(status)
        .editable(editable)
        .reported_at(reported_at)
        .category(category)
        .description(description)
        .method(method)
        .updates(update_count, latest_update_at)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportStatus, NOT_AVAILABLE};

    fn today() -> NaiveDate {
        // Wednesday
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    struct Page<'a> {
        banner: &'a str,
        meta: &'a str,
        council: &'a str,
        extra_side: &'a str,
        description: &'a str,
        href: &'a str,
        updates: &'a str,
    }

    impl Default for Page<'_> {
        fn default() -> Self {
            Self {
                banner: r#"<div class="banner banner--fixed"><p>Fixed</p></div>"#,
                meta: "Reported via mobile in the Potholes category anonymously at 14:05, Wed 03 January 2024",
                council: r#"Sent to <a href="/c">Camden Council</a> 2 minutes later"#,
                extra_side: "",
                description: "<p>Big hole.</p>\n<p>Near the bus stop.</p>",
                href: "/around?lat=51.5421;lon=-0.1419&zoom=4",
                updates: "",
            }
        }
    }

    impl Page<'_> {
        fn render(&self) -> String {
            format!(
                r#"<html><body>
                <div id="side-report">
                  {banner}
                  <a class="problem-back" href="{href}">Back to map</a>
                  <h1>  Pothole on
                     High Street </h1>
                  <p class="report_meta_info">{meta}</p>
                  <p class="council_sent_info">{council}</p>
                  <div class="moderate-display">{description}</div>
                  {extra}
                </div>
                {updates}
                </body></html>"#,
                banner = self.banner,
                href = self.href,
                meta = self.meta,
                council = self.council,
                description = self.description,
                extra = self.extra_side,
                updates = self.updates,
            )
        }
    }

    fn extract(page: &Page<'_>) -> Result<Report, ExtractError> {
        extract_report(99, page.render().as_bytes(), today())
    }

    /// Extract the default page after a textual edit of its markup.
    fn extract_edited(from: &str, to: &str) -> Result<Report, ExtractError> {
        let html = Page::default().render();
        assert!(html.contains(from), "markup has no {from:?}");
        extract_report(99, html.replace(from, to).as_bytes(), today())
    }

    fn field_error(err: &ExtractError) -> Option<ReportField> {
        match err {
            ExtractError::Field { field, .. } => Some(*field),
            ExtractError::Structural(_) => None,
        }
    }

    #[test]
    fn test_full_page() {
        let report = extract(&Page::default()).unwrap();
        assert_eq!(report.id, 99);
        assert_eq!(report.status, ReportStatus::Fixed);
        assert!(!report.editable);
        assert_eq!(
            report.reported_at,
            NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(14, 5, 0)
        );
        assert_eq!(report.category, "Potholes");
        assert_eq!(report.council, "Camden Council");
        assert_eq!(report.title, "Pothole on High Street");
        assert_eq!(
            report.description.as_deref(),
            Some("Big hole.\n\nNear the bus stop.")
        );
        assert_eq!(report.latitude, 51.5421);
        assert_eq!(report.longitude, -0.1419);
        assert_eq!(report.method, "mobile");
        assert_eq!(report.update_count, 0);
        assert!(report.latest_update_at.is_none());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = Page::default().render();
        let first = extract_report(5, html.as_bytes(), today()).unwrap();
        let second = extract_report(5, html.as_bytes(), today()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_side_report_is_structural() {
        let err = extract_report(1, b"<html><body><p>nothing</p></body></html>", today())
            .unwrap_err();
        assert_eq!(err, ExtractError::Structural("div#side-report"));
    }

    #[test]
    fn test_missing_banner_defaults_to_unknown() {
        let report = extract(&Page {
            banner: "",
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.status, ReportStatus::Unknown);
    }

    #[test]
    fn test_unrecognized_banner_is_fatal() {
        let err = extract(&Page {
            banner: r#"<div class="banner banner--mystery"></div>"#,
            ..Page::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Field {
                field: ReportField::Status,
                ..
            }
        ));
    }

    #[test]
    fn test_editable_when_update_form_present() {
        let report = extract(&Page {
            extra_side: r#"<div id="update_form"><form></form></div>"#,
            ..Page::default()
        })
        .unwrap();
        assert!(report.editable);
    }

    #[test]
    fn test_missing_timestamp_is_fatal() {
        let err = extract(&Page {
            meta: "Reported in the Potholes category anonymously",
            ..Page::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Field {
                field: ReportField::Timestamp,
                ..
            }
        ));
    }

    #[test]
    fn test_partial_timestamp_with_unknown_day_is_absent() {
        let report = extract(&Page {
            meta: "Reported in the Potholes category by Sam at 10:32, yesterday",
            ..Page::default()
        })
        .unwrap();
        assert!(report.reported_at.is_none());
    }

    #[test]
    fn test_category_and_method_fall_back() {
        let report = extract(&Page {
            meta: "Reported anonymously at 14:05, Wed 03 January 2024",
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.category, NOT_AVAILABLE);
        assert_eq!(report.method, NOT_AVAILABLE);
    }

    #[test]
    fn test_council_not_reported() {
        let report = extract(&Page {
            council: "Not reported to council",
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.council, "Not reported to council");
    }

    #[test]
    fn test_council_ref_without_sent_to() {
        let report = extract(&Page {
            council: "Council ref: 123",
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.council, "Council ref: 123");
    }

    #[test]
    fn test_council_sent_to_regex() {
        let report = extract(&Page {
            council: "Sent to Leeds City Council less than a minute later",
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.council, "Leeds City Council");
    }

    #[test]
    fn test_council_from_report_meta() {
        let report = extract(&Page {
            meta: "Reported in the Potholes category by Jo Bloggs at 14:05, Wed 03 January 2024",
            council: "",
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.council, "Jo Bloggs");
    }

    #[test]
    fn test_unresolvable_council_is_fatal() {
        let err = extract(&Page {
            meta: "Reported anonymously at 14:05, Wed 03 January 2024",
            council: "",
            ..Page::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Field {
                field: ReportField::Council,
                ..
            }
        ));
    }

    #[test]
    fn test_description_without_paragraphs_is_null() {
        let report = extract(&Page {
            description: "",
            ..Page::default()
        })
        .unwrap();
        assert!(report.description.is_none());
    }

    #[test]
    fn test_coordinates_in_either_order() {
        let report = extract(&Page {
            href: "/around?zoom=4&amp;lon=-1.5&amp;lat=53.8",
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.latitude, 53.8);
        assert_eq!(report.longitude, -1.5);
    }

    #[test]
    fn test_missing_longitude_is_fatal() {
        let err = extract(&Page {
            href: "/around?lat=53.8",
            ..Page::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Field {
                field: ReportField::Coordinates,
                ..
            }
        ));
    }

    #[test]
    fn test_updates_latest_timestamp() {
        let updates = r#"
            <section class="full-width">
              <ul>
                <li class="item-list__item item-list__item--updates">
                  <p class="meta-2">Posted by council at 09:00, Thu 04 January 2024</p>
                </li>
                <li class="item-list__item item-list__item--updates">
                  <p class="meta-2">Posted by Sam at 16:45, Monday</p>
                </li>
              </ul>
            </section>"#;
        let report = extract(&Page {
            updates,
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.update_count, 2);
        assert_eq!(
            report.latest_update_at,
            NaiveDate::from_ymd_opt(2024, 1, 8)
                .unwrap()
                .and_hms_opt(16, 45, 0)
        );
    }

    #[test]
    fn test_empty_updates_section_is_fatal() {
        let err = extract(&Page {
            updates: r#"<section class="full-width"><ul></ul></section>"#,
            ..Page::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Field {
                field: ReportField::Updates,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_meta_info_is_structural() {
        let err = extract_edited("report_meta_info", "report_other_info").unwrap_err();
        assert_eq!(err, ExtractError::Structural("p.report_meta_info"));
    }

    #[test]
    fn test_missing_council_block_is_structural() {
        let err = extract_edited("council_sent_info", "council_other_info").unwrap_err();
        assert_eq!(err, ExtractError::Structural("p.council_sent_info"));
    }

    #[test]
    fn test_missing_back_link_is_fatal() {
        let err = extract_edited("problem-back", "problem-forward").unwrap_err();
        assert_eq!(field_error(&err), Some(ReportField::Coordinates));
    }

    #[test]
    fn test_missing_title_is_fatal() {
        let html = Page::default()
            .render()
            .replace("<h1>", "<h2>")
            .replace("</h1>", "</h2>");
        let err = extract_report(99, html.as_bytes(), today()).unwrap_err();
        assert_eq!(field_error(&err), Some(ReportField::Title));
    }

    #[test]
    fn test_missing_description_block_is_structural() {
        let err = extract_edited("moderate-display", "moderate-hidden").unwrap_err();
        assert_eq!(err, ExtractError::Structural("div.moderate-display"));
    }

    #[test]
    fn test_impossible_report_date_is_fatal() {
        let err = extract(&Page {
            meta: "Reported in the Potholes category by Jo at 10:00, Wed 31 February 2024",
            ..Page::default()
        })
        .unwrap_err();
        assert_eq!(field_error(&err), Some(ReportField::Timestamp));
    }

    #[test]
    fn test_updates_fall_back_to_older_timestamp() {
        let updates = r#"
            <section class="full-width">
              <ul>
                <li class="item-list__item item-list__item--updates">
                  <p class="meta-2">Posted by council at 09:00, Thu 04 January 2024</p>
                </li>
                <li class="item-list__item item-list__item--updates">
                  <p class="meta-2">Posted anonymously</p>
                </li>
              </ul>
            </section>"#;
        let report = extract(&Page {
            updates,
            ..Page::default()
        })
        .unwrap();
        assert_eq!(report.update_count, 2);
        assert_eq!(
            report.latest_update_at,
            NaiveDate::from_ymd_opt(2024, 1, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
        );
    }

    #[test]
    fn test_updates_without_any_timestamp_are_fatal() {
        let updates = r#"
            <section class="full-width">
              <ul>
                <li class="item-list__item item-list__item--updates">
                  <p class="meta-2">Posted anonymously</p>
                </li>
                <li class="item-list__item item-list__item--updates">
                  <p>State changed to: Fixed</p>
                </li>
              </ul>
            </section>"#;
        let err = extract(&Page {
            updates,
            ..Page::default()
        })
        .unwrap_err();
        assert_eq!(field_error(&err), Some(ReportField::Updates));
    }
}
