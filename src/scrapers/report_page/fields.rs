//! Field extractors for report pages.
//!
//! Each function reads one field from the anchors located by the parent
//! module. Tolerated absences return a default; contract violations return
//! an [`ExtractError`].

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::{debug, info, warn};

use super::timestamp::{resolve_timestamp, Resolution};
use super::{element_text, ExtractError};
use crate::models::{ReportField, ReportStatus};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static BANNER: LazyLock<Selector> = LazyLock::new(|| selector(".banner"));
static UPDATE_FORM: LazyLock<Selector> = LazyLock::new(|| selector("div#update_form"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static DESCRIPTION_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| selector("div.moderate-display"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static BACK_TO_MAP: LazyLock<Selector> = LazyLock::new(|| selector("a.problem-back"));
static UPDATE_ITEM: LazyLock<Selector> =
    LazyLock::new(|| selector("li.item-list__item--updates"));
static UPDATE_META: LazyLock<Selector> = LazyLock::new(|| selector("p.meta-2"));

static CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Reported(?: via \w+)? in the (.*?) category").unwrap());
static METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Reported via (\w+)").unwrap());
static SENT_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Sent to\s*(.+?)\s+(?:\d+|less than a minute|\w+ minutes|\w+ hours|\w+ days|FixMyStreet)",
    )
    .unwrap()
});
static REPORTED_BY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"by (.+?) at").unwrap());
static LATITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&;])lat=([-\d.]+)").unwrap());
static LONGITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&;])lon=([-\d.]+)").unwrap());

const NOT_REPORTED: &str = "Not reported to council";
const COUNCIL_REF: &str = "Council ref:";
const SENT_TO_PHRASE: &str = "Sent to";

pub(super) fn status(side_report: ElementRef<'_>) -> Result<ReportStatus, ExtractError> {
    let Some(banner) = side_report.select(&BANNER).next() else {
        warn!("No status banner found on the page");
        return Ok(ReportStatus::Unknown);
    };

    let classes: Vec<&str> = banner.value().classes().collect();
    if let Some(status) = classes
        .iter()
        .find_map(|class| ReportStatus::from_banner_class(class))
    {
        info!("Report status is {}", status.as_str());
        return Ok(status);
    }

    Err(ExtractError::field(
        ReportField::Status,
        format!("unexpected banner classes: {}", classes.join(" ")),
    ))
}

pub(super) fn editable(side_report: ElementRef<'_>) -> bool {
    let editable = side_report.select(&UPDATE_FORM).next().is_some();
    debug!("Editable: {}", editable);
    editable
}

pub(super) fn reported_at(
    meta_text: &str,
    today: NaiveDate,
) -> Result<Option<NaiveDateTime>, ExtractError> {
    match resolve_timestamp(meta_text, today) {
        Some(Resolution::Exact(dt)) => {
            info!("Parsed timestamp: {}", dt);
            Ok(Some(dt))
        }
        Some(Resolution::FromWeekday(dt)) => {
            info!("Resolved partial timestamp to: {}", dt);
            Ok(Some(dt))
        }
        Some(Resolution::UnknownWeekday(word)) => {
            warn!("Partial timestamp has unknown weekday '{}', leaving it empty", word);
            Ok(None)
        }
        Some(Resolution::InvalidDate(stamp)) => Err(ExtractError::field(
            ReportField::Timestamp,
            format!("timestamp names an impossible date: {stamp}"),
        )),
        None => Err(ExtractError::field(
            ReportField::Timestamp,
            format!("no timestamp in meta text: {meta_text}"),
        )),
    }
}

pub(super) fn category(meta_text: &str) -> Option<String> {
    match CATEGORY.captures(meta_text) {
        Some(caps) => {
            let category = caps[1].trim().to_string();
            info!("Category: {}", category);
            Some(category)
        }
        None => {
            warn!("Category not found in meta info");
            debug!("Meta text: {}", meta_text);
            None
        }
    }
}

/// Resolve the destination council, trying each known page variant in turn.
pub(super) fn council(
    council_block: ElementRef<'_>,
    meta_text: &str,
) -> Result<String, ExtractError> {
    let text = element_text(council_block);

    if text.contains(NOT_REPORTED) {
        warn!("Detected '{}'", NOT_REPORTED);
        return Ok(NOT_REPORTED.to_string());
    }

    if text.contains(COUNCIL_REF) && !text.contains(SENT_TO_PHRASE) {
        let reference = text
            .split_once(COUNCIL_REF)
            .map(|(_, rest)| rest.trim())
            .unwrap_or_default();
        let council = format!("{COUNCIL_REF} {reference}");
        info!("Council ref detected: {}", council);
        return Ok(council);
    }

    if let Some(link) = council_block.select(&LINK).next() {
        let council = element_text(link);
        info!("Council (via link): {}", council);
        return Ok(council);
    }

    if let Some(caps) = SENT_TO.captures(&text) {
        let council = caps[1].trim().to_string();
        info!("Council (via regex): {}", council);
        return Ok(council);
    }

    if let Some(caps) = REPORTED_BY.captures(meta_text) {
        let council = caps[1].trim().to_string();
        info!("Council (via report meta): {}", council);
        return Ok(council);
    }

    Err(ExtractError::field(
        ReportField::Council,
        format!("could not extract council name from: {text}"),
    ))
}

pub(super) fn title(side_report: ElementRef<'_>) -> Result<String, ExtractError> {
    let heading = side_report
        .select(&HEADING)
        .next()
        .ok_or_else(|| ExtractError::field(ReportField::Title, "no <h1> in #side-report"))?;
    let title = element_text(heading);
    info!("Title: {}", title);
    Ok(title)
}

pub(super) fn description(side_report: ElementRef<'_>) -> Result<Option<String>, ExtractError> {
    let block = side_report
        .select(&DESCRIPTION_BLOCK)
        .next()
        .ok_or(ExtractError::Structural("div.moderate-display"))?;

    let paragraphs: Vec<String> = block.select(&PARAGRAPH).map(element_text).collect();
    if paragraphs.is_empty() {
        warn!("No <p> tags found inside the description block");
        return Ok(None);
    }

    let description = paragraphs.join("\n\n");
    debug!(
        "Extracted description: {}...",
        description.chars().take(20).collect::<String>()
    );
    Ok(Some(description))
}

pub(super) fn coordinates(side_report: ElementRef<'_>) -> Result<(f64, f64), ExtractError> {
    let link = side_report.select(&BACK_TO_MAP).next().ok_or_else(|| {
        ExtractError::field(ReportField::Coordinates, "no a.problem-back link")
    })?;
    let href = link.value().attr("href").unwrap_or_default();
    let query = href.split_once('?').map(|(_, q)| q).unwrap_or(href);

    let parse = |re: &Regex| -> Option<f64> {
        re.captures(query).and_then(|caps| caps[1].parse::<f64>().ok())
    };

    match (parse(&LATITUDE), parse(&LONGITUDE)) {
        (Some(lat), Some(lon)) => {
            info!("Extracted lat/lon: {}, {}", lat, lon);
            Ok((lat, lon))
        }
        _ => Err(ExtractError::field(
            ReportField::Coordinates,
            format!("could not extract lat/lon from href: {href}"),
        )),
    }
}

pub(super) fn method(meta_text: &str) -> Option<String> {
    match METHOD.captures(meta_text) {
        Some(caps) => {
            let method = caps[1].to_string();
            info!("Report method: {}", method);
            Some(method)
        }
        None => {
            warn!("No report method found in meta info");
            None
        }
    }
}

/// Count update items and find the newest parseable update timestamp.
pub(super) fn updates(
    section: Option<ElementRef<'_>>,
    today: NaiveDate,
) -> Result<(u32, Option<NaiveDateTime>), ExtractError> {
    let Some(section) = section else {
        warn!("No updates section found, defaulting to 0 updates");
        return Ok((0, None));
    };

    let items: Vec<ElementRef<'_>> = section.select(&UPDATE_ITEM).collect();
    if items.is_empty() {
        return Err(ExtractError::field(
            ReportField::Updates,
            "updates section has no update items",
        ));
    }
    let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
    info!("Found {} update(s)", count);

    for item in items.iter().rev() {
        let metas: Vec<ElementRef<'_>> = item.select(&UPDATE_META).collect();
        for meta in metas.into_iter().rev() {
            let text = element_text(meta);
            debug!("Checking update meta text: {}", text);
            match resolve_timestamp(&text, today) {
                Some(Resolution::InvalidDate(stamp)) => {
                    return Err(ExtractError::field(
                        ReportField::Updates,
                        format!("update timestamp names an impossible date: {stamp}"),
                    ));
                }
                Some(resolution) => {
                    if let Some(dt) = resolution.datetime() {
                        info!("Latest update timestamp: {}", dt);
                        return Ok((count, Some(dt)));
                    }
                }
                None => {}
            }
        }
    }

    Err(ExtractError::field(
        ReportField::Updates,
        "no valid update timestamp found in updates",
    ))
}
