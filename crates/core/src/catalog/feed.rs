//! Decoding of the line-delimited program-guide feed.
//!
//! Line 1 is a JSON array of column names, every following line a JSON array
//! of positional values. `Sender` and `Thema` are run-length compressed: an
//! empty value repeats the last non-empty value seen in that column.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::types::{CatalogEntry, FeedError, LinkQuality};

/// Links with this suffix are HLS manifests, not individually playable videos.
pub const MANIFEST_EXTENSION: &str = ".m3u8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FeedField {
    Channel,
    Series,
    Title,
    Date,
    Time,
    Duration,
    Size,
    Description,
    Url,
    Website,
    SubtitleUrl,
    RtmpUrl,
    SmallUrl,
    RtmpSmallUrl,
    HdUrl,
    RtmpHdUrl,
    UtcTimestamp,
    HistoryUrl,
    Geo,
    IsNew,
}

/// Feed column name to field. Columns not listed here are ignored.
const HEADER_TABLE: &[(&str, FeedField)] = &[
    ("Sender", FeedField::Channel),
    ("Thema", FeedField::Series),
    ("Titel", FeedField::Title),
    ("Datum", FeedField::Date),
    ("Zeit", FeedField::Time),
    ("Dauer", FeedField::Duration),
    ("Größe [MB]", FeedField::Size),
    ("Beschreibung", FeedField::Description),
    ("Url", FeedField::Url),
    ("Website", FeedField::Website),
    ("Url Untertitel", FeedField::SubtitleUrl),
    ("Url RTMP", FeedField::RtmpUrl),
    ("Url Klein", FeedField::SmallUrl),
    ("Url RTMP Klein", FeedField::RtmpSmallUrl),
    ("Url HD", FeedField::HdUrl),
    ("Url RTMP HD", FeedField::RtmpHdUrl),
    ("DatumL", FeedField::UtcTimestamp),
    ("Url History", FeedField::HistoryUrl),
    ("Geo", FeedField::Geo),
    ("neu", FeedField::IsNew),
];

fn lookup_header(name: &str) -> Option<FeedField> {
    HEADER_TABLE
        .iter()
        .find(|(header, _)| *header == name)
        .map(|(_, field)| *field)
}

/// Outcome of decoding one data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRow {
    Playable(Box<CatalogEntry>),
    /// The resolved link points to a streaming manifest; the row is dropped.
    Manifest { link: String },
}

/// The playable link computed for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub link: String,
    pub quality: LinkQuality,
}

/// Compute the best playable link from the medium `url` and the HD variant.
///
/// An HD variant of the form `offset|replacement` keeps the first `offset`
/// bytes of `url` and appends `replacement`; any other HD variant is appended
/// to `url` as is. HD links are downgraded from https to http.
///
/// Returns `None` when the splice offset is not a number or does not fall on
/// a character boundary.
pub fn resolve_link(url: &str, hd_variant: Option<&str>) -> Option<ResolvedLink> {
    let Some(hd) = hd_variant else {
        return Some(ResolvedLink {
            link: url.to_string(),
            quality: LinkQuality::Medium,
        });
    };

    let spliced = match hd.split_once('|') {
        Some((offset, replacement)) => {
            let offset: usize = offset.trim().parse().ok()?;
            let base = url.get(..offset.min(url.len()))?;
            format!("{}{}", base, replacement)
        }
        None => format!("{}{}", url, hd),
    };

    let link = match spliced.strip_prefix("https://") {
        Some(rest) => format!("http://{}", rest),
        None => spliced,
    };

    Some(ResolvedLink {
        link,
        quality: LinkQuality::High,
    })
}

/// Stateful line decoder. Lines must be fed strictly in file order.
#[derive(Debug)]
pub struct FeedDecoder {
    columns: HashMap<FeedField, usize>,
    current_channel: Option<String>,
    current_series: Option<String>,
}

impl FeedDecoder {
    /// Build a decoder from the header line (line 1).
    pub fn from_header(line: &str) -> Result<Self, FeedError> {
        let headers: Vec<String> =
            serde_json::from_str(line).map_err(|e| FeedError::MalformedLine {
                line: 1,
                reason: e.to_string(),
            })?;

        let mut columns = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            match lookup_header(header) {
                Some(field) => {
                    columns.insert(field, index);
                }
                None => debug!("Ignoring unknown feed column '{}'", header),
            }
        }

        if !columns.contains_key(&FeedField::Url) {
            return Err(FeedError::MissingColumn("Url"));
        }

        Ok(Self {
            columns,
            current_channel: None,
            current_series: None,
        })
    }

    /// Decode one data line. `line_no` is the 1-based position in the feed.
    pub fn decode_row(&mut self, line_no: usize, line: &str) -> Result<DecodedRow, FeedError> {
        let raw: Vec<Value> =
            serde_json::from_str(line).map_err(|e| FeedError::MalformedLine {
                line: line_no,
                reason: e.to_string(),
            })?;
        let values: Vec<Option<String>> = raw.into_iter().map(value_to_field).collect();

        let get = |field: FeedField| -> Option<String> {
            self.columns
                .get(&field)
                .and_then(|&index| values.get(index))
                .cloned()
                .flatten()
        };

        let channel = carry(&mut self.current_channel, get(FeedField::Channel));
        let series = carry(&mut self.current_series, get(FeedField::Series));

        let channel = channel.ok_or(FeedError::MissingField {
            line: line_no,
            field: "channel",
        })?;
        let series = series.ok_or(FeedError::MissingField {
            line: line_no,
            field: "series",
        })?;
        let url = get(FeedField::Url).ok_or(FeedError::MissingField {
            line: line_no,
            field: "url",
        })?;
        let is_new = get(FeedField::IsNew).ok_or(FeedError::MissingField {
            line: line_no,
            field: "new",
        })?;

        let hd_url = get(FeedField::HdUrl);
        let resolved =
            resolve_link(&url, hd_url.as_deref()).ok_or_else(|| FeedError::InvalidHdVariant {
                line: line_no,
                value: hd_url.clone().unwrap_or_default(),
            })?;

        if resolved.link.ends_with(MANIFEST_EXTENSION) {
            return Ok(DecodedRow::Manifest {
                link: resolved.link,
            });
        }

        Ok(DecodedRow::Playable(Box::new(CatalogEntry {
            channel,
            series,
            title: get(FeedField::Title),
            date: get(FeedField::Date),
            time: get(FeedField::Time),
            duration: get(FeedField::Duration),
            size_mb: get(FeedField::Size).and_then(|s| s.trim().parse().ok()),
            description: get(FeedField::Description),
            link: resolved.link,
            link_quality: resolved.quality,
            url,
            website: get(FeedField::Website),
            subtitle_url: get(FeedField::SubtitleUrl),
            rtmp_url: get(FeedField::RtmpUrl),
            small_url: get(FeedField::SmallUrl),
            rtmp_small_url: get(FeedField::RtmpSmallUrl),
            hd_url,
            rtmp_hd_url: get(FeedField::RtmpHdUrl),
            utc_timestamp: get(FeedField::UtcTimestamp).and_then(|s| s.trim().parse().ok()),
            history_url: get(FeedField::HistoryUrl),
            geo: get(FeedField::Geo),
            is_new: is_new.eq_ignore_ascii_case("true"),
        })))
    }
}

/// Empty strings and nulls both mean "no value".
fn value_to_field(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Run-length decoding for one compressed column.
fn carry(current: &mut Option<String>, value: Option<String>) -> Option<String> {
    if let Some(value) = value {
        *current = Some(value);
    }
    current.clone()
}
