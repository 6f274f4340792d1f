//! # Spoofed Sender Attacks
//!
//! A hostile context tries to settle a pending request by posting a forged
//! `RESULT`. The client accepts a message only when the channel-stamped
//! origin equals the canonical trusted origin exactly *and* the sender is
//! the trusted parent context.
//!
//! ## Attack Vectors
//!
//! - Look-alike origins: trailing slash, explicit port, downgraded scheme,
//!   case changes, subdomains
//! - Right origin, wrong context: a sibling frame on the host's origin
//! - Right context, wrong origin: the parent navigated elsewhere
//! - No source at all: events from an untracked context

#[cfg(test)]
mod tests {
    use crate::support::*;
    use bridge_channel::{ContextId, Frame, MessageTarget};
    use serde_json::{json, Value};
    use tokio::time::timeout;

    fn forged(request_id: &Value) -> Value {
        result_for(request_id, json!({ "balance": 1_000_000 }))
    }

    /// Run `attack` against a pending request, then prove the request is
    /// still open and settles from the real host.
    async fn assert_attack_ignored(attack: impl FnOnce(&HostSim, &Value)) {
        let mut sim = HostSim::new();
        let response = sim.client.request("LIST_CATEGORIES", None, None).unwrap();
        let request_id = sim.next_request_id();

        attack(&sim, &request_id);
        sim.settle().await;

        assert_eq!(sim.client.pending_count(), 1, "forged message settled a request");
        assert!(sim.client.stats().discarded_untrusted >= 1);

        sim.reply(result_for(&request_id, json!("genuine")));
        let result = timeout(TEST_GUARD, response).await.unwrap().unwrap();
        assert_eq!(result, json!("genuine"));
    }

    // =========================================================================
    // LOOK-ALIKE ORIGINS (right context, wrong origin string)
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_trailing_slash_origin() {
        assert_attack_ignored(|sim, id| {
            sim.inject(forged(id), "https://host.example/", Some(sim.host.id()));
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_port_origin() {
        assert_attack_ignored(|sim, id| {
            sim.inject(forged(id), "https://host.example:8443", Some(sim.host.id()));
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_downgraded_scheme_origin() {
        assert_attack_ignored(|sim, id| {
            sim.inject(forged(id), "http://host.example", Some(sim.host.id()));
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_case_and_subdomain_origins() {
        assert_attack_ignored(|sim, id| {
            for origin in [
                "HTTPS://HOST.EXAMPLE",
                "https://evil.host.example",
                "https://host.example.evil.test",
                "null",
                "",
            ] {
                sim.inject(forged(id), origin, Some(sim.host.id()));
            }
        })
        .await;
    }

    // =========================================================================
    // WRONG CONTEXT
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_sibling_frame_on_host_origin() {
        assert_attack_ignored(|sim, id| {
            // Another frame the host page embeds, served from the same origin
            let sibling = Frame::embedded(HOST_ORIGIN, &sim.host);
            sim.app
                .post_message(forged(id), APP_ORIGIN, &sibling)
                .unwrap();
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_context_id() {
        assert_attack_ignored(|sim, id| {
            sim.inject(forged(id), HOST_ORIGIN, Some(ContextId::new()));
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_source() {
        assert_attack_ignored(|sim, id| {
            sim.inject(forged(id), HOST_ORIGIN, None);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_posted_message() {
        assert_attack_ignored(|sim, id| {
            sim.app.post_message(forged(id), "*", &sim.app).unwrap();
        })
        .await;
    }

    // =========================================================================
    // FORGED ERRORS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_forged_error_does_not_reject() {
        assert_attack_ignored(|sim, id| {
            sim.inject(
                error_for(id, "NOT_AUTHED", "session expired, log in again"),
                "https://host.example:443/",
                Some(sim.host.id()),
            );
        })
        .await;
    }
}
