//! Timestamp response parser & validator service.

use der::Decode;

use crate::domain::pkcs7::timestamp::{TimeStampResp, TimestampToken};
use crate::infra::error::{SigningError, SigningResult};
use crate::services::timestamp_request_builder::TimestampRequest;

/// Parses raw `TimeStampResp` bodies and checks the token against the request
/// and the signature value it was requested for.
pub struct TimestampParserService;

impl TimestampParserService {
    /// Parse a `TimeStampResp` and validate status, imprint and nonce.
    pub fn parse_response(
        response_der: &[u8],
        request: &TimestampRequest,
        signature_value: &[u8],
    ) -> SigningResult<TimestampToken> {
        let response = TimeStampResp::from_der(response_der)
            .map_err(|e| SigningError::TimestampError(format!("Malformed TimeStampResp: {e}")))?;

        if !response.status.is_granted() {
            let detail = response
                .status
                .status_string
                .map(|s| s.join("; "))
                .unwrap_or_default();
            return Err(SigningError::TimestampError(format!(
                "Timestamp authority rejected request (status {}): {detail}",
                response.status.status
            )));
        }

        let content_info = response.time_stamp_token.ok_or_else(|| {
            SigningError::TimestampError("Granted response carries no timestamp token".into())
        })?;
        let token = TimestampToken::from_content_info(&content_info)?;
        Self::validate(&token, request, signature_value)?;
        Ok(token)
    }

    /// Validate an already parsed token against the request it answers.
    pub fn validate(
        token: &TimestampToken,
        request: &TimestampRequest,
        signature_value: &[u8],
    ) -> SigningResult<()> {
        token
            .validate_message_imprint(request.hash_algorithm, signature_value)
            .map_err(|e| SigningError::TimestampError(format!("imprint validation failed: {e}")))?;
        match token.nonce() {
            Some(nonce) if *nonce == request.nonce => Ok(()),
            Some(_) => Err(SigningError::TimestampError(
                "Timestamp nonce does not match request".into(),
            )),
            None => Err(SigningError::TimestampError(
                "Timestamp token is missing the requested nonce".into(),
            )),
        }
    }
}
