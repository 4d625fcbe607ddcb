//! Unit tests for the node IPAM reconciler

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use crate::worker::NodeEvent;
    use paravirtual_client::{MockOperation, MockSupervisorClient};
    use paravirtual_cloud::WatchCache;

    fn stored_requests(supervisor: &MockSupervisorClient) -> Vec<String> {
        supervisor
            .stored_ip_pool(TEST_NAMESPACE, TEST_POOL_NAME)
            .map(|pool| pool.spec.subnets.into_iter().map(|s| s.name).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_upsert_creates_pool_and_request() {
        let supervisor = MockSupervisorClient::new();
        let nodes = MockNodeClient::default();
        let reconciler = create_test_reconciler(&supervisor, &nodes);

        reconciler
            .handle(&NodeEvent::Upsert(create_test_node("node-1", None)))
            .await
            .unwrap();

        let pool = supervisor
            .stored_ip_pool(TEST_NAMESPACE, TEST_POOL_NAME)
            .expect("pool created");
        assert_eq!(stored_requests(&supervisor), vec!["node-1"]);
        let owners = pool.metadata.owner_references.unwrap();
        assert_eq!(owners[0].name, TEST_CLUSTER_NAME);
        assert_eq!(owners[0].uid, "cluster-uid-1");
    }

    #[tokio::test]
    async fn test_repeated_upsert_writes_once() {
        let supervisor = MockSupervisorClient::new();
        let nodes = MockNodeClient::default();
        let reconciler = create_test_reconciler(&supervisor, &nodes);
        let node = create_test_node("node-1", None);

        for _ in 0..3 {
            reconciler.handle(&NodeEvent::Upsert(node.clone())).await.unwrap();
        }

        assert_eq!(stored_requests(&supervisor), vec!["node-1"]);
        assert_eq!(supervisor.call_count(MockOperation::UpdateIPPool), 1);
    }

    #[tokio::test]
    async fn test_stale_cached_request_is_rechecked_live() {
        // Request already removed in the supervisor, cache not caught up yet
        let supervisor = MockSupervisorClient::new();
        supervisor.add_ip_pool(create_test_ip_pool(&[], &[]));
        let cache = WatchCache::from_objects(vec![create_test_ip_pool(&["node-1"], &[])]);
        let reconciler = create_test_reconciler_with_cache(&supervisor, &MockNodeClient::default(), cache);

        reconciler
            .handle(&NodeEvent::Upsert(create_test_node("node-1", None)))
            .await
            .unwrap();

        assert_eq!(stored_requests(&supervisor), vec!["node-1"]);
        assert_eq!(supervisor.call_count(MockOperation::GetIPPool), 1);
        assert_eq!(supervisor.call_count(MockOperation::UpdateIPPool), 1);
    }

    #[tokio::test]
    async fn test_cached_pool_without_request_skips_read() {
        let supervisor = MockSupervisorClient::new();
        supervisor.add_ip_pool(create_test_ip_pool(&["node-2"], &[]));
        let cache = WatchCache::from_objects(vec![create_test_ip_pool(&["node-2"], &[])]);
        let reconciler = create_test_reconciler_with_cache(&supervisor, &MockNodeClient::default(), cache);

        reconciler
            .handle(&NodeEvent::Upsert(create_test_node("node-1", None)))
            .await
            .unwrap();

        assert_eq!(stored_requests(&supervisor), vec!["node-2", "node-1"]);
        assert_eq!(supervisor.call_count(MockOperation::GetIPPool), 0);
    }

    #[tokio::test]
    async fn test_remove_drops_request() {
        let supervisor = MockSupervisorClient::new();
        supervisor.add_ip_pool(create_test_ip_pool(&["node-1", "node-2"], &[]));
        let reconciler = create_test_reconciler(&supervisor, &MockNodeClient::default());

        reconciler.handle(&NodeEvent::Remove("node-1".to_string())).await.unwrap();

        assert_eq!(stored_requests(&supervisor), vec!["node-2"]);
    }

    #[tokio::test]
    async fn test_remove_without_pool_or_request_is_noop() {
        let supervisor = MockSupervisorClient::new();
        let reconciler = create_test_reconciler(&supervisor, &MockNodeClient::default());
        reconciler.handle(&NodeEvent::Remove("node-1".to_string())).await.unwrap();

        supervisor.add_ip_pool(create_test_ip_pool(&["node-2"], &[]));
        reconciler.handle(&NodeEvent::Remove("node-1".to_string())).await.unwrap();

        assert_eq!(supervisor.call_count(MockOperation::UpdateIPPool), 0);
        assert_eq!(supervisor.call_count(MockOperation::CreateIPPool), 0);
    }

    #[tokio::test]
    async fn test_pool_changed_assigns_pod_cidrs() {
        let supervisor = MockSupervisorClient::new();
        let nodes = MockNodeClient::default();
        nodes.add_node(create_test_node("node-1", None));
        nodes.add_node(create_test_node("node-2", Some("10.0.0.0/24")));
        let reconciler = create_test_reconciler(&supervisor, &nodes);

        let pool = create_test_ip_pool(
            &["node-1", "node-2", "node-3"],
            &[
                ("node-1", "172.26.0.0/24"),
                ("node-2", "172.26.1.0/24"),
                ("node-3", "172.26.2.0/24"),
            ],
        );
        reconciler.handle(&NodeEvent::PoolChanged(pool)).await.unwrap();

        assert_eq!(
            nodes.patches(),
            vec![("node-1".to_string(), "172.26.0.0/24".to_string())]
        );
    }

    #[tokio::test]
    async fn test_supervisor_failure_surfaces() {
        let supervisor = MockSupervisorClient::new();
        supervisor.fail_on(MockOperation::GetIPPool, "connection refused");
        let reconciler = create_test_reconciler(&supervisor, &MockNodeClient::default());

        let result = reconciler
            .handle(&NodeEvent::Upsert(create_test_node("node-1", None)))
            .await;
        assert!(result.is_err());
    }
}
