//! Capability contract over heterogeneous provider track records.

use std::time::Duration;

/// Uniform read-only view of a track, regardless of which catalog it came
/// from.
///
/// Each provider client defines its own deserialized track shape; a thin
/// adapter implements this trait by projecting the provider fields onto the
/// fixed set below. Adapters borrow the underlying record and carry no
/// ownership. Fields a provider does not supply are projected as empty
/// strings (or zero for the numeric fields) - the scorer treats those as
/// ordinary values, never as errors.
///
/// The trait is object-safe so callers can mix `&dyn TrackComparable`
/// candidates when that is more convenient than a homogeneous slice.
pub trait TrackComparable {
    /// Primary artist display name.
    fn artist(&self) -> &str;

    /// Album display title.
    fn album(&self) -> &str;

    /// Provider-scoped album identifier.
    fn album_id(&self) -> &str;

    /// Track display title.
    fn title(&self) -> &str;

    /// Track playback length.
    fn duration(&self) -> Duration;

    /// International Standard Recording Code, or empty if unknown.
    fn isrc(&self) -> &str;

    /// Universal Product Code of the release, or empty if unknown.
    fn upc(&self) -> &str;

    /// Release date: either a bare 4-digit year or a full date string.
    fn date(&self) -> &str;

    /// Position of the track on its album.
    fn track_number(&self) -> u32;

    /// Total number of tracks on the album.
    fn track_total(&self) -> u32;
}

impl<T: TrackComparable + ?Sized> TrackComparable for &T {
    fn artist(&self) -> &str {
        (**self).artist()
    }

    fn album(&self) -> &str {
        (**self).album()
    }

    fn album_id(&self) -> &str {
        (**self).album_id()
    }

    fn title(&self) -> &str {
        (**self).title()
    }

    fn duration(&self) -> Duration {
        (**self).duration()
    }

    fn isrc(&self) -> &str {
        (**self).isrc()
    }

    fn upc(&self) -> &str {
        (**self).upc()
    }

    fn date(&self) -> &str {
        (**self).date()
    }

    fn track_number(&self) -> u32 {
        (**self).track_number()
    }

    fn track_total(&self) -> u32 {
        (**self).track_total()
    }
}
