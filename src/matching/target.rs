//! The record being identified, with its stable identity key.

use std::time::Duration;

use super::comparable::TrackComparable;
use super::error::MatchTargetError;

/// The target of a matching call: the same field set as
/// [`TrackComparable`] plus a `metadata_id` identity (the opaque key of the
/// thing being matched, e.g. a local file's catalog id).
///
/// All fields are mandatory. Construct via [`MatchTarget::builder`]; the
/// builder rejects construction when any field was never supplied, so a
/// partially populated target cannot reach the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTarget {
    metadata_id: String,
    artist: String,
    album: String,
    album_id: String,
    title: String,
    duration: Duration,
    isrc: String,
    upc: String,
    date: String,
    track_number: u32,
    track_total: u32,
}

impl MatchTarget {
    /// Returns a builder with no fields set.
    #[must_use]
    pub fn builder() -> MatchTargetBuilder {
        MatchTargetBuilder::default()
    }

    /// Opaque identity key of the record being matched.
    #[must_use]
    pub fn metadata_id(&self) -> &str {
        &self.metadata_id
    }
}

impl TrackComparable for MatchTarget {
    fn artist(&self) -> &str {
        &self.artist
    }

    fn album(&self) -> &str {
        &self.album
    }

    fn album_id(&self) -> &str {
        &self.album_id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn isrc(&self) -> &str {
        &self.isrc
    }

    fn upc(&self) -> &str {
        &self.upc
    }

    fn date(&self) -> &str {
        &self.date
    }

    fn track_number(&self) -> u32 {
        self.track_number
    }

    fn track_total(&self) -> u32 {
        self.track_total
    }
}

/// Builder for [`MatchTarget`].
///
/// Every setter must be called before [`build`](Self::build); the first
/// absent field is reported in the error. An empty string is an acceptable
/// *value* (providers do emit them) - only a field that was never set at all
/// is a construction failure.
#[derive(Debug, Default, Clone)]
pub struct MatchTargetBuilder {
    metadata_id: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    album_id: Option<String>,
    title: Option<String>,
    duration: Option<Duration>,
    isrc: Option<String>,
    upc: Option<String>,
    date: Option<String>,
    track_number: Option<u32>,
    track_total: Option<u32>,
}

impl MatchTargetBuilder {
    /// Sets the identity key of the record being matched.
    #[must_use]
    pub fn metadata_id(mut self, metadata_id: impl Into<String>) -> Self {
        self.metadata_id = Some(metadata_id.into());
        self
    }

    /// Sets the artist display name.
    #[must_use]
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Sets the album display title.
    #[must_use]
    pub fn album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Sets the album identifier.
    #[must_use]
    pub fn album_id(mut self, album_id: impl Into<String>) -> Self {
        self.album_id = Some(album_id.into());
        self
    }

    /// Sets the track title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the track playback length.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the ISRC (empty string if unknown).
    #[must_use]
    pub fn isrc(mut self, isrc: impl Into<String>) -> Self {
        self.isrc = Some(isrc.into());
        self
    }

    /// Sets the UPC (empty string if unknown).
    #[must_use]
    pub fn upc(mut self, upc: impl Into<String>) -> Self {
        self.upc = Some(upc.into());
        self
    }

    /// Sets the release date (bare 4-digit year or full date string).
    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets the track position on its album.
    #[must_use]
    pub fn track_number(mut self, track_number: u32) -> Self {
        self.track_number = Some(track_number);
        self
    }

    /// Sets the album's total track count.
    #[must_use]
    pub fn track_total(mut self, track_total: u32) -> Self {
        self.track_total = Some(track_total);
        self
    }

    /// Builds the target, rejecting construction if any field is absent.
    ///
    /// # Errors
    ///
    /// Returns [`MatchTargetError::MissingField`] naming the first field
    /// that was never supplied.
    pub fn build(self) -> Result<MatchTarget, MatchTargetError> {
        Ok(MatchTarget {
            metadata_id: self
                .metadata_id
                .ok_or(MatchTargetError::missing_field("metadata_id"))?,
            artist: self.artist.ok_or(MatchTargetError::missing_field("artist"))?,
            album: self.album.ok_or(MatchTargetError::missing_field("album"))?,
            album_id: self
                .album_id
                .ok_or(MatchTargetError::missing_field("album_id"))?,
            title: self.title.ok_or(MatchTargetError::missing_field("title"))?,
            duration: self
                .duration
                .ok_or(MatchTargetError::missing_field("duration"))?,
            isrc: self.isrc.ok_or(MatchTargetError::missing_field("isrc"))?,
            upc: self.upc.ok_or(MatchTargetError::missing_field("upc"))?,
            date: self.date.ok_or(MatchTargetError::missing_field("date"))?,
            track_number: self
                .track_number
                .ok_or(MatchTargetError::missing_field("track_number"))?,
            track_total: self
                .track_total
                .ok_or(MatchTargetError::missing_field("track_total"))?,
        })
    }
}
