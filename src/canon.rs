use crate::types::ChallengePayload;

/// The exact text a wallet signs for a challenge.
///
/// Line order and wording are part of the protocol: any change here invalidates
/// every outstanding challenge and breaks clients that pin the format.
pub fn canonical_message(payload: &ChallengePayload, app_name: &str) -> String {
    [
        format!("{} wants you to sign in to {}.", payload.domain, app_name),
        String::new(),
        "Sign this message to authenticate your wallet session.".to_string(),
        String::new(),
        format!("URI: {}", payload.uri),
        "Version: 1".to_string(),
        format!("Chain ID: {}", payload.chain_id),
        format!("Nonce: {}", payload.nonce),
        format!("Issued At: {}", payload.issued_at),
    ]
    .join("\n")
}
