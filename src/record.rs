//! The canonical post record produced by every source.

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::time_codec;

/// Provenance of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Sample,
    Live,
    Error,
}

impl RecordSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Live => "live",
            Self::Error => "error",
        }
    }
}

/// A comment attached to a post, kept exactly as the corpus wrote it.
pub type Comment = Map<String, Value>;

/// Keys every record must carry when read back from JSON.
const REQUIRED_KEYS: [&str; 3] = ["input", "scraped_at", "source"];

/// Canonical post record.
///
/// Constructed once per input URL and never mutated after it is handed to the
/// export sinks.
///
/// Corpus records are open-ended, so reading one never fails on a field's
/// type: a canonical key holding a value of another JSON type (a string
/// `create_time`, a `null` count, a float epoch) keeps that value verbatim in
/// `extra`, and it is written back out in place of the typed field.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub input: String,
    pub author: Option<String>,
    pub post_id: Option<String>,
    pub action_id: Option<String>,
    pub text: String,
    pub create_time: Option<i64>,
    pub create_time_iso: Option<String>,
    pub post_url: String,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub view_count: u64,
    pub play_count: u64,
    pub image_list: Vec<String>,
    pub video_list: Vec<String>,
    pub author_username: Option<String>,
    pub author_user_id: Option<String>,
    /// Absent unless the producer supplied a list.
    pub comments: Option<Vec<Comment>>,
    pub scraped_at: String,
    pub source: RecordSource,
    pub error: Option<String>,
    /// Corpus values passed through as-is: keys outside the canonical schema,
    /// and canonical keys whose value doesn't fit the typed field.
    pub extra: Map<String, Value>,
}

impl PostRecord {
    /// A record with every content field empty, stamped at `at`.
    #[must_use]
    pub fn blank(url: &str, at: DateTime<Utc>, source: RecordSource) -> Self {
        Self {
            input: url.to_string(),
            author: None,
            post_id: None,
            action_id: None,
            text: String::new(),
            create_time: Some(at.timestamp()),
            create_time_iso: Some(time_codec::to_iso_seconds(at)),
            post_url: url.to_string(),
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            view_count: 0,
            play_count: 0,
            image_list: Vec::new(),
            video_list: Vec::new(),
            author_username: None,
            author_user_id: None,
            comments: Some(Vec::new()),
            scraped_at: time_codec::now_iso(),
            source,
            error: None,
            extra: Map::new(),
        }
    }

    /// Build an in-band error record for a URL that could not be fetched.
    #[must_use]
    pub fn error(url: &str, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "unknown error".to_string();
        }

        Self {
            error: Some(message),
            ..Self::blank(url, Utc::now(), RecordSource::Error)
        }
    }

    /// Type a raw record without rejecting anything.
    ///
    /// Absent keys take the schema defaults (`post_url` mirrors `input`, a
    /// missing `source` means sample data). Values that don't fit their typed
    /// field are kept in `extra` under the same key.
    #[must_use]
    pub fn from_map(raw: Map<String, Value>) -> Self {
        let mut fields = RawFields {
            raw,
            parked: Map::new(),
        };

        let input: String = fields.take("input").unwrap_or_default();
        let post_url = fields.take("post_url").unwrap_or_else(|| input.clone());

        let mut record = Self {
            author: fields.take("author").flatten(),
            post_id: fields.take("post_id").flatten(),
            action_id: fields.take("action_id").flatten(),
            text: fields.take("text").unwrap_or_default(),
            create_time: fields.take("create_time").flatten(),
            create_time_iso: fields.take("create_time_iso").flatten(),
            like_count: fields.take("like_count").unwrap_or_default(),
            comment_count: fields.take("comment_count").unwrap_or_default(),
            share_count: fields.take("share_count").unwrap_or_default(),
            view_count: fields.take("view_count").unwrap_or_default(),
            play_count: fields.take("play_count").unwrap_or_default(),
            image_list: fields.take("image_list").unwrap_or_default(),
            video_list: fields.take("video_list").unwrap_or_default(),
            author_username: fields.take("author_username").flatten(),
            author_user_id: fields.take("author_user_id").flatten(),
            comments: fields.take("comments"),
            scraped_at: fields.take("scraped_at").unwrap_or_default(),
            source: fields.take("source").unwrap_or(RecordSource::Sample),
            error: fields.take("error").flatten(),
            input,
            post_url,
            extra: Map::new(),
        };

        let RawFields { raw, mut parked } = fields;
        parked.extend(raw);
        record.extra = parked;
        record
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.source == RecordSource::Error
    }
}

/// A raw record being split into typed fields.
struct RawFields {
    raw: Map<String, Value>,
    parked: Map<String, Value>,
}

impl RawFields {
    /// Remove `key` and type it, parking the value when it doesn't fit.
    fn take<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.raw.remove(key)?;
        match T::deserialize(&value) {
            Ok(typed) => Some(typed),
            Err(_) => {
                self.parked.insert(key.to_string(), value);
                None
            }
        }
    }
}

impl Serialize for PostRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let extra = &self.extra;

        write_field(&mut map, extra, "input", Some(&self.input))?;
        write_field(&mut map, extra, "author", Some(&self.author))?;
        write_field(&mut map, extra, "post_id", Some(&self.post_id))?;
        write_field(&mut map, extra, "action_id", Some(&self.action_id))?;
        write_field(&mut map, extra, "text", Some(&self.text))?;
        write_field(&mut map, extra, "create_time", Some(&self.create_time))?;
        write_field(&mut map, extra, "create_time_iso", Some(&self.create_time_iso))?;
        write_field(&mut map, extra, "post_url", Some(&self.post_url))?;
        write_field(&mut map, extra, "like_count", Some(&self.like_count))?;
        write_field(&mut map, extra, "comment_count", Some(&self.comment_count))?;
        write_field(&mut map, extra, "share_count", Some(&self.share_count))?;
        write_field(&mut map, extra, "view_count", Some(&self.view_count))?;
        write_field(&mut map, extra, "play_count", Some(&self.play_count))?;
        write_field(&mut map, extra, "image_list", Some(&self.image_list))?;
        write_field(&mut map, extra, "video_list", Some(&self.video_list))?;
        write_field(&mut map, extra, "author_username", Some(&self.author_username))?;
        write_field(&mut map, extra, "author_user_id", Some(&self.author_user_id))?;
        write_field(&mut map, extra, "comments", self.comments.as_ref())?;
        write_field(&mut map, extra, "scraped_at", Some(&self.scraped_at))?;
        write_field(&mut map, extra, "source", Some(&self.source))?;
        write_field(&mut map, extra, "error", self.error.as_ref())?;

        for (key, value) in extra {
            if !CANONICAL_KEYS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Write one canonical field. A parked corpus value takes the place of the
/// typed one; a `None` typed value with nothing parked is skipped.
fn write_field<M: SerializeMap, T: Serialize>(
    map: &mut M,
    extra: &Map<String, Value>,
    key: &'static str,
    typed: Option<&T>,
) -> Result<(), M::Error> {
    match (extra.get(key), typed) {
        (Some(raw), _) => map.serialize_entry(key, raw),
        (None, Some(value)) => map.serialize_entry(key, value),
        (None, None) => Ok(()),
    }
}

const CANONICAL_KEYS: [&str; 21] = [
    "input",
    "author",
    "post_id",
    "action_id",
    "text",
    "create_time",
    "create_time_iso",
    "post_url",
    "like_count",
    "comment_count",
    "share_count",
    "view_count",
    "play_count",
    "image_list",
    "video_list",
    "author_username",
    "author_user_id",
    "comments",
    "scraped_at",
    "source",
    "error",
];

impl<'de> Deserialize<'de> for PostRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        if let Some(key) = REQUIRED_KEYS.into_iter().find(|key| !raw.contains_key(*key)) {
            return Err(de::Error::missing_field(key));
        }
        Ok(Self::from_map(raw))
    }
}

/// Whole epoch seconds from a JSON number, flooring fractional values.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn epoch_from_number(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f.floor() as i64)
    })
}
