//! # Request/Response Flows
//!
//! End-to-end scenarios between a client in the embedded frame and a
//! simulated host page:
//!
//! 1. **Round trip**: request, trusted `RESULT`, value returned
//! 2. **Host errors**: `ERROR` surfaces the closed error code
//! 3. **Exactly once**: duplicate replies settle nothing further
//! 4. **Handshake**: `APP_READY` answered by a keyed `HOST_CONTEXT`
//! 5. **Context pushes**: unsolicited contexts reach subscribers only

#[cfg(test)]
mod tests {
    use crate::support::*;
    use bridge_client::{BridgeError, RequestTag};
    use bridge_types::HostErrorCode;
    use serde_json::json;
    use std::collections::HashSet;
    use tokio::time::timeout;

    // =========================================================================
    // ROUND TRIP
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_list_categories_scenario() {
        let mut sim = HostSim::new();

        let response = sim
            .client
            .request(RequestTag::ListCategories, Some(json!({})), None)
            .unwrap();

        let outbound = sim.next_outbound().unwrap();
        assert_eq!(outbound.data["type"], "LIST_CATEGORIES");
        assert_eq!(outbound.data["payload"], json!({}));
        assert_eq!(outbound.origin, APP_ORIGIN);

        sim.reply(result_for(&outbound.data["requestId"], json!([{ "id": "c1" }])));

        let result = timeout(TEST_GUARD, response).await.unwrap().unwrap();
        assert_eq!(result, json!([{ "id": "c1" }]));
        assert_eq!(sim.client.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_authed_scenario() {
        let mut sim = HostSim::new();

        let response = sim
            .client
            .request(RequestTag::CreateExpense, Some(json!({ "amount": 12.5 })), None)
            .unwrap();
        let request_id = sim.next_request_id();

        sim.reply(error_for(&request_id, "NOT_AUTHED", "login required"));

        let err = timeout(TEST_GUARD, response).await.unwrap().unwrap_err();
        assert_eq!(err.host_code(), Some(HostErrorCode::NotAuthed));
        assert_eq!(
            err,
            BridgeError::Host {
                code: HostErrorCode::NotAuthed,
                message: "login required".into(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_tag_round_trips() {
        let sim = HostSim::new();
        let responder = spawn_echo_host(&sim.host, &sim.app);

        for tag in RequestTag::ALL {
            let payload = json!({ "probe": tag.as_str() });
            let result = timeout(TEST_GUARD, sim.client.call(tag, Some(payload.clone())))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(result, json!({ "tag": tag.as_str(), "payload": payload }));
        }

        let context = sim.client.get_context().await.unwrap();
        assert_eq!(context["tag"], "GET_CONTEXT");
        responder.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_replies() {
        let mut sim = HostSim::new();

        let responses: Vec<_> = (0..5)
            .map(|i| {
                sim.client
                    .request(RequestTag::ListMonthTransactions, Some(json!({ "month": i })), None)
                    .unwrap()
            })
            .collect();
        let mut ids: Vec<_> = (0..5).map(|_| sim.next_request_id()).collect();

        let unique: HashSet<_> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(unique.len(), 5);

        // Answer newest first
        ids.reverse();
        for (n, id) in ids.iter().enumerate() {
            sim.reply(result_for(id, json!(4 - n)));
        }

        for (i, response) in responses.into_iter().enumerate() {
            assert_eq!(response.await.unwrap(), json!(i));
        }
    }

    // =========================================================================
    // EXACTLY ONCE
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_result_settles_once() {
        let mut sim = HostSim::new();

        let response = sim.client.request("GET_RANGE_SUMMARY", None, None).unwrap();
        let request_id = sim.next_request_id();

        sim.reply(result_for(&request_id, json!({ "total": 1 })));
        sim.reply(result_for(&request_id, json!({ "total": 2 })));
        sim.reply(error_for(&request_id, "UNKNOWN", "late"));

        assert_eq!(response.await.unwrap(), json!({ "total": 1 }));
        sim.settle().await;

        let stats = sim.client.stats();
        assert_eq!(stats.pending.resolved, 1);
        assert_eq!(stats.pending.rejected, 0);
        assert_eq!(stats.pending.pending, 0);
    }

    // =========================================================================
    // HANDSHAKE AND CONTEXT
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_handshake_with_host() {
        let sim = HostSim::new();
        let responder = spawn_echo_host(&sim.host, &sim.app);

        let context = timeout(TEST_GUARD, sim.client.handshake(None))
            .await
            .unwrap()
            .unwrap();

        assert!(context.is_authed);
        assert!(context.has_permission("transactions:read"));
        assert!(!context.has_permission("transactions:write"));
        responder.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsolicited_context_reaches_subscribers() {
        let sim = HostSim::new();
        let mut contexts = sim.client.subscribe_context();

        sim.reply(json!({ "type": "HOST_CONTEXT", "payload": context_payload(false, &[]) }));

        let context = timeout(TEST_GUARD, contexts.recv()).await.unwrap().unwrap();
        assert!(!context.is_authed);
        assert_eq!(sim.client.stats().context_pushes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_with_unknown_id_does_not_settle_requests() {
        let mut sim = HostSim::new();
        let mut contexts = sim.client.subscribe_context();

        let response = sim.client.request(RequestTag::GetContext, None, None).unwrap();
        let _ = sim.next_request_id();

        sim.reply(json!({
            "type": "HOST_CONTEXT",
            "requestId": uuid::Uuid::new_v4().to_string(),
            "payload": context_payload(true, &[])
        }));

        let context = timeout(TEST_GUARD, contexts.recv()).await.unwrap().unwrap();
        assert!(context.is_authed);
        assert_eq!(sim.client.pending_count(), 1);
        drop(response);
    }

    #[tokio::test(start_paused = true)]
    async fn test_announce_ready_is_fire_and_forget() {
        let mut sim = HostSim::new();

        sim.client.announce_ready(Some("boot")).unwrap();

        let event = sim.next_outbound().unwrap();
        assert_eq!(event.data, json!({ "type": "APP_READY", "requestId": "boot" }));
        assert_eq!(sim.client.pending_count(), 0);
    }
}
