//! Unit tests for the watch cache

#[cfg(test)]
mod tests {
    use crate::cache::WatchCache;
    use crate::test_utils::*;
    use crds::VirtualMachine;
    use k8s_openapi::api::core::v1::Node;

    fn vm_cache() -> WatchCache<VirtualMachine> {
        WatchCache::from_objects(vec![
            create_test_vm("vm-a", "ns1", "uuid-a"),
            create_test_vm("vm-b", "ns1", "uuid-b"),
            create_test_vm("vm-a", "ns2", "uuid-c"),
        ])
    }

    #[test]
    fn test_from_objects_is_synced() {
        assert!(vm_cache().has_synced());
    }

    #[test]
    fn test_get_namespaced() {
        let cache = vm_cache();

        assert_eq!(cache.get_namespaced("ns1", "vm-a").unwrap().bios_uuid(), "uuid-a");
        assert_eq!(cache.get_namespaced("ns2", "vm-a").unwrap().bios_uuid(), "uuid-c");
        assert!(cache.get_namespaced("ns3", "vm-a").is_none());
    }

    #[test]
    fn test_list_namespaced() {
        let cache = vm_cache();

        let mut names: Vec<String> = cache
            .list_namespaced("ns1")
            .iter()
            .filter_map(|vm| vm.metadata.name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["vm-a", "vm-b"]);
        assert!(cache.list_namespaced("ns3").is_empty());
    }

    #[test]
    fn test_find() {
        let cache = vm_cache();

        let vm = cache.find(|vm| vm.bios_uuid() == "uuid-b").unwrap();
        assert_eq!(vm.metadata.name.as_deref(), Some("vm-b"));
        assert!(cache.find(|vm| vm.bios_uuid() == "missing").is_none());
    }

    #[test]
    fn test_cluster_scoped_get() {
        let node = Node {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some("node-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let cache = WatchCache::from_objects(vec![node]);

        assert!(cache.get("node-1").is_some());
        assert!(cache.get("node-2").is_none());
    }

    #[tokio::test]
    async fn test_wait_for_sync_returns_once_synced() {
        vm_cache().wait_for_sync().await.unwrap();
    }

    #[test]
    fn test_empty_cache() {
        let cache = WatchCache::<VirtualMachine>::from_objects(Vec::new());

        assert!(cache.has_synced());
        assert!(cache.list_namespaced("ns1").is_empty());
        assert!(cache.get_namespaced("ns1", "vm-a").is_none());
    }
}
