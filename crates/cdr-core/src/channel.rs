//! Channel name decomposition
//!
//! PBX channel names look like `SIP/alice-00000001`: a technology, a slash,
//! then the peer with a per-call suffix after a dash. The exporter stores the
//! technology and the peer as separate fields.

/// Separates the technology from the rest of the channel name
pub const TECHNOLOGY_DELIMITER: char = '/';

/// Separates the peer from its per-call suffix
pub const ENTITY_DELIMITER: char = '-';

/// Technology and peer of a channel name
///
/// Either part is `None` when it could not be found. Malformed input never
/// produces an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelAddress {
    /// Channel technology (`SIP`, `PJSIP`, `Local`, ...)
    pub kind: Option<String>,

    /// Peer name with the per-call suffix removed
    pub entity: Option<String>,
}

impl ChannelAddress {
    /// Decompose a channel name
    ///
    /// Only the first two `/` segments are looked at. Runs of delimiters
    /// collapse, so empty segments are never reported.
    ///
    /// ```
    /// use cdr_core::channel::ChannelAddress;
    ///
    /// let address = ChannelAddress::parse("SIP/abc-0001");
    /// assert_eq!(address.kind.as_deref(), Some("SIP"));
    /// assert_eq!(address.entity.as_deref(), Some("abc"));
    /// ```
    pub fn parse(channel: &str) -> Self {
        let mut segments = tokens(channel, TECHNOLOGY_DELIMITER);

        let kind = segments.next().map(str::to_string);
        let entity = segments
            .next()
            .and_then(|segment| tokens(segment, ENTITY_DELIMITER).next())
            .map(str::to_string);

        Self { kind, entity }
    }
}

/// Non-empty pieces of `input` between `delimiter`s
fn tokens(input: &str, delimiter: char) -> impl Iterator<Item = &str> {
    input.split(delimiter).filter(|piece| !piece.is_empty())
}
