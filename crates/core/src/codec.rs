use crate::error::PollError;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Standard alphabet; the service does not always pad.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes one result payload into the HTML fragment it carries.
///
/// Line breaks and other whitespace inside the encoded text are ignored, since
/// encoders commonly wrap long payloads.
pub fn decode_payload(field: &str, encoded: &str) -> Result<String, PollError> {
    let compact: String = encoded
        .chars()
        .filter(|character| !character.is_ascii_whitespace())
        .collect();

    if compact.is_empty() {
        return Ok(String::new());
    }

    let bytes = PAYLOAD_ENGINE
        .decode(compact.as_bytes())
        .map_err(|error| PollError::Decode {
            field: field.to_string(),
            details: error.to_string(),
        })?;

    String::from_utf8(bytes).map_err(|error| PollError::Decode {
        field: field.to_string(),
        details: error.to_string(),
    })
}

pub fn encode_payload(html: &str) -> String {
    STANDARD.encode(html.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{decode_payload, encode_payload};
    use crate::PollError;

    #[test]
    fn empty_payload_decodes_to_empty_string() {
        assert_eq!(decode_payload("res_completa", "").expect("empty is valid"), "");
        assert_eq!(decode_payload("res_completa", " \n").expect("blank is valid"), "");
    }

    #[test]
    fn decodes_padded_and_unpadded_input() {
        assert_eq!(decode_payload("res_completa", "PA==").expect("padded"), "<");
        assert_eq!(decode_payload("res_completa", "PA").expect("unpadded"), "<");
    }

    #[test]
    fn wrapped_payload_is_joined_before_decoding() {
        let html = "<li><a href=\"/wiki/Perro\">Perro</a> doméstico</li>".repeat(4);
        let encoded = encode_payload(&html);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n");

        assert_eq!(decode_payload("res_detallada", &wrapped).expect("wrapped"), html);
    }

    #[test]
    fn invalid_base64_reports_the_field() {
        let error = decode_payload("res_detallada", "no es base64!").expect_err("must fail");
        match error {
            PollError::Decode { field, .. } => assert_eq!(field, "res_detallada"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        // 0xff 0xfe
        let error = decode_payload("res_completa", "//4=").expect_err("not utf-8");
        assert!(matches!(error, PollError::Decode { .. }));
    }
}
