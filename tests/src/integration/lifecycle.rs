//! # Lifecycle
//!
//! Deadlines, teardown and dispatch failure. Time is paused in every test,
//! so elapsed-time assertions are exact rather than flaky.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use bridge_channel::{ChannelError, Frame, MessageTarget};
    use bridge_client::{BridgeClient, BridgeConfig, BridgeError, MIN_TIMEOUT};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    // =========================================================================
    // TIMEOUTS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_tiny_override_still_waits_for_floor() {
        let sim = HostSim::with_config(
            BridgeConfig::new(HOST_ORIGIN).with_default_timeout(Duration::from_millis(10)),
        );

        let started = Instant::now();
        let err = sim
            .client
            .send_and_wait("LIST_CATEGORIES", None, Some(Duration::from_millis(10)))
            .await
            .unwrap_err();

        assert!(started.elapsed() >= MIN_TIMEOUT);
        assert_eq!(
            err,
            BridgeError::Timeout {
                tag: "LIST_CATEGORIES".into(),
                timeout: MIN_TIMEOUT,
            }
        );
        assert_eq!(sim.client.stats().pending.timed_out, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_applies() {
        let sim = HostSim::new();

        let started = Instant::now();
        let err = sim
            .client
            .send_and_wait("LIST_OVERDUE_PAYMENTS", None, None)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_after_timeout_is_ignored() {
        let mut sim = HostSim::new();

        let response = sim
            .client
            .request("LIST_CATEGORIES", None, Some(MIN_TIMEOUT))
            .unwrap();
        let request_id = sim.next_request_id();

        assert!(response.await.unwrap_err().is_timeout());

        sim.reply(result_for(&request_id, json!("too late")));
        sim.settle().await;

        let stats = sim.client.stats();
        assert_eq!(stats.pending.resolved, 0);
        assert_eq!(stats.pending.timed_out, 1);
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_destroy_fails_all_outstanding() {
        let mut sim = HostSim::new();

        let responses: Vec<_> = (0..8)
            .map(|_| sim.client.request("LIST_PAYMENT_PLANS", None, None).unwrap())
            .collect();
        while sim.next_outbound().is_some() {}

        sim.client.destroy();

        for response in responses {
            assert_eq!(response.await, Err(BridgeError::Destroyed));
        }

        // Nothing is dispatched after teardown
        assert_eq!(
            sim.client.request("LIST_PAYMENT_PLANS", None, None).err(),
            Some(BridgeError::Destroyed)
        );
        assert_eq!(sim.client.announce_ready(None), Err(BridgeError::Destroyed));
        assert!(sim.next_outbound().is_none());
        assert_eq!(sim.client.stats().pending.drained, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_is_idempotent() {
        let sim = HostSim::new();
        let response = sim.client.request("GET_CONTEXT", None, None).unwrap();

        sim.client.destroy();
        sim.client.destroy();
        sim.client.clone().destroy();

        assert_eq!(response.await, Err(BridgeError::Destroyed));
        assert_eq!(sim.client.stats().pending.drained, 1);
        assert!(sim.client.is_destroyed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_after_destroy_are_ignored() {
        let mut sim = HostSim::new();
        let mut contexts = sim.client.subscribe_context();

        let response = sim.client.request("GET_CONTEXT", None, None).unwrap();
        let request_id = sim.next_request_id();
        sim.client.destroy();

        sim.reply(result_for(&request_id, json!(1)));
        sim.reply(json!({ "type": "HOST_CONTEXT", "payload": context_payload(true, &[]) }));
        sim.settle().await;

        assert_eq!(response.await, Err(BridgeError::Destroyed));
        assert!(contexts.try_recv().is_err());
        assert_eq!(sim.client.stats().pending.resolved, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_released_on_destroy() {
        let sim = HostSim::new();
        assert_eq!(sim.app.listener_count(), 1);

        sim.client.destroy();
        sim.settle().await;

        assert_eq!(sim.app.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_last_handle_tears_down() {
        let sim = HostSim::new();
        let second = sim.client.clone();
        let response = sim.client.request("LIST_INCOME_PLANS", None, None).unwrap();

        let HostSim { client, .. } = sim;
        drop(client);
        assert!(!second.is_destroyed());

        drop(second);
        assert_eq!(response.await, Err(BridgeError::Destroyed));
    }

    // =========================================================================
    // DISPATCH FAILURE
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_detached_parent_fails_fast() {
        init_test_logging();
        let window = Frame::top_level(APP_ORIGIN);
        let parent: Arc<dyn MessageTarget> = DetachedParent::new();

        let client = BridgeClient::new(BridgeConfig::new(HOST_ORIGIN), window, Some(parent)).unwrap();

        let err = client.request("CREATE_INCOME", None, None).err();
        assert_eq!(err, Some(BridgeError::Channel(ChannelError::Closed)));

        let stats = client.stats();
        assert_eq!(stats.pending.pending, 0);
        assert_eq!(stats.pending.cancelled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_parent_origin_times_out() {
        let mut sim = HostSim::with_config(BridgeConfig::new("https://other.example"));

        let err = sim
            .client
            .send_and_wait("GET_CONTEXT", None, Some(MIN_TIMEOUT))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        // The channel refused delivery to a parent outside the trusted origin
        assert!(sim.next_outbound().is_none());
    }
}
