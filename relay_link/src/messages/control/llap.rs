use strum_macros::{Display, EnumString};

/// Every frame starts with a lower case `a`.
pub const FRAME_START: u8 = b'a';
/// Frames are a fixed twelve bytes, there is no length field.
pub const FRAME_LEN: usize = 12;
/// Width of the device identifier following the start marker.
pub const DEVICE_ID_LEN: usize = 2;
/// Width of the channel tag at the front of a payload.
pub const CHANNEL_TAG_LEN: usize = 3;
/// Pad character filling unused payload bytes.
pub const PAD: char = '-';

/// A single LLAP message taken off the wire. Messages carry no
/// identity beyond their content and are consumed once by the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedMessage {
    /// Two character address of the device the frame is for.
    device_id: String,
    /// Payload with the trailing pad removed.
    payload: String,
}

impl DecodedMessage {
    /// Create a message directly, the payload is stored as given.
    ///
    /// * `device_id`: two character device address.
    /// * `payload`: command text, without padding.
    pub fn new(device_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            payload: payload.into(),
        }
    }

    /// Split a complete frame positionally. Byte 0 is the start marker,
    /// bytes 1-2 the device id and the rest is the payload with any
    /// trailing pad characters trimmed. Non ascii bytes are replaced
    /// rather than rejected, the dispatcher drops anything it does not
    /// recognise anyway.
    ///
    /// * `frame`: the twelve frame bytes including the start marker.
    pub fn from_frame(frame: &[u8; FRAME_LEN]) -> Self {
        let (device_id, payload) = frame[1..].split_at(DEVICE_ID_LEN);
        Self {
            device_id: String::from_utf8_lossy(device_id).into_owned(),
            payload: String::from_utf8_lossy(payload)
                .trim_end_matches(PAD)
                .to_owned(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Fixed width channel tag at the front of the payload, `None`
    /// when the payload is too short to carry one.
    pub fn channel_tag(&self) -> Option<&str> {
        self.payload.get(..CHANNEL_TAG_LEN)
    }

    /// Everything after the channel tag.
    pub fn keyword(&self) -> Option<&str> {
        self.payload.get(CHANNEL_TAG_LEN..)
    }
}

/// The two state keywords a relay command can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum StateKeyword {
    #[strum(serialize = "HIGH")]
    High,
    #[strum(serialize = "LOW")]
    Low,
}

#[cfg(test)]
mod tests {

    use super::*;
    use rstest::rstest;

    fn frame(raw: &str) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame.copy_from_slice(raw.as_bytes());
        frame
    }

    #[rstest]
    #[case("aABD02HIGH--", "AB", "D02HIGH")]
    #[case("aXYD03LOW---", "XY", "D03LOW")]
    #[case("a--HELLO----", "--", "HELLO")]
    #[case("aAB---------", "AB", "")]
    fn test_decode_frame_fields(
        #[case] raw: &str,
        #[case] device_id: &str,
        #[case] payload: &str,
    ) {
        let message = DecodedMessage::from_frame(&frame(raw));

        assert_eq!(message.device_id(), device_id);
        assert_eq!(message.payload(), payload);
    }

    #[test]
    fn test_only_trailing_pad_is_trimmed() {
        let message = DecodedMessage::from_frame(&frame("aABD-2-HIGH-"));

        assert_eq!(message.payload(), "D-2-HIGH");
    }

    #[rstest]
    #[case("D02HIGH", Some("D02"), Some("HIGH"))]
    #[case("D02", Some("D02"), Some(""))]
    #[case("D0", None, None)]
    fn test_split_channel_tag_and_keyword(
        #[case] payload: &str,
        #[case] tag: Option<&str>,
        #[case] keyword: Option<&str>,
    ) {
        let message = DecodedMessage::new("AB", payload);

        assert_eq!(message.channel_tag(), tag);
        assert_eq!(message.keyword(), keyword);
    }

    #[rstest]
    #[case("HIGH", Some(StateKeyword::High))]
    #[case("LOW", Some(StateKeyword::Low))]
    #[case("high", None)]
    #[case("ON", None)]
    #[case("", None)]
    fn test_parse_state_keyword(#[case] raw: &str, #[case] expected: Option<StateKeyword>) {
        assert_eq!(raw.parse::<StateKeyword>().ok(), expected);
    }
}
