//! Unit tests for watcher event mapping

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use crate::watcher::{PoolSnapshots, node_event};
    use crate::worker::NodeEvent;
    use kube_runtime::watcher;

    #[test]
    fn test_node_event_mapping() {
        let node = create_test_node("node-1", None);

        assert!(matches!(
            node_event(watcher::Event::Apply(node.clone())),
            Some(NodeEvent::Upsert(_))
        ));
        assert!(matches!(
            node_event(watcher::Event::InitApply(node.clone())),
            Some(NodeEvent::Upsert(_))
        ));
        assert!(matches!(
            node_event(watcher::Event::Delete(node)),
            Some(NodeEvent::Remove(ref name)) if name == "node-1"
        ));
        assert!(node_event(watcher::Event::Init).is_none());
        assert!(node_event(watcher::Event::InitDone).is_none());
    }

    #[test]
    fn test_pool_snapshots_emit_on_realized_change_only() {
        let mut snapshots = PoolSnapshots::default();

        // First sighting with nothing realized
        assert!(snapshots.observe(create_test_ip_pool(&["node-1"], &[])).is_none());

        // Spec-only change
        assert!(snapshots.observe(create_test_ip_pool(&["node-1", "node-2"], &[])).is_none());

        // Allocator realized a subnet
        let realized = create_test_ip_pool(&["node-1", "node-2"], &[("node-1", "172.26.0.0/24")]);
        assert!(matches!(
            snapshots.observe(realized.clone()),
            Some(NodeEvent::PoolChanged(_))
        ));

        // Same status again
        assert!(snapshots.observe(realized).is_none());
    }

    #[test]
    fn test_pool_snapshots_first_sighting_with_realized_subnets() {
        let mut snapshots = PoolSnapshots::default();
        let pool = create_test_ip_pool(&["node-1"], &[("node-1", "172.26.0.0/24")]);

        assert!(snapshots.observe(pool.clone()).is_some());

        snapshots.forget(TEST_POOL_NAME);
        assert!(snapshots.observe(pool).is_some());
    }
}
