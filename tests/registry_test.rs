//! 命名服务封装测试
//!
//! 使用内存中的命名服务客户端；连接真实 Nacos 的测试默认忽略，需要使用
//! `cargo test --test registry_test -- --ignored` 运行，地址通过 `NACOS_ADDR` 指定。

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use svc_kit::registry::{
    DeregisterInstanceParam, EnvMode, GRAY_TAG, GetServiceParam, Nacos, NacosConfig,
    NamingClient, RegisterInstanceParam, ServiceInfo, ServiceInstance, TargetMachine,
    WeightedSelector, candidate_pool, sort_by_weight,
};
use svc_kit::Result;

/// 内存命名服务
#[derive(Default)]
struct InMemoryNaming {
    registered: Mutex<Vec<RegisterInstanceParam>>,
    queries: Mutex<Vec<GetServiceParam>>,
}

#[async_trait]
impl NamingClient for InMemoryNaming {
    async fn register_instance(&self, param: RegisterInstanceParam) -> Result<bool> {
        self.registered.lock().unwrap().push(param);
        Ok(true)
    }

    async fn deregister_instance(&self, param: DeregisterInstanceParam) -> Result<bool> {
        let mut registered = self.registered.lock().unwrap();
        let before = registered.len();
        registered.retain(|p| {
            !(p.service_name == param.service_name && p.ip == param.ip && p.port == param.port)
        });
        Ok(registered.len() < before)
    }

    async fn get_service(&self, param: GetServiceParam) -> Result<ServiceInfo> {
        self.queries.lock().unwrap().push(param.clone());
        let hosts = self
            .registered
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.service_name == param.service_name)
            .map(RegisterInstanceParam::to_instance)
            .collect();
        Ok(ServiceInfo::new(param.service_name, hosts))
    }
}

fn create_nacos(naming: Arc<InMemoryNaming>) -> Nacos {
    Nacos::with_client(NacosConfig::new("test-namespace"), naming)
        .with_selector(WeightedSelector::with_seed(11))
}

fn host(ip: &str, weight: f64) -> ServiceInstance {
    ServiceInstance::new(ip, 8080).with_weight(weight)
}

/// 测试：注册参数（灰度实例带标记，线上实例不带）
#[tokio::test]
async fn test_register_instance_metadata() {
    let naming = Arc::new(InMemoryNaming::default());
    let nacos = create_nacos(naming.clone());

    assert!(nacos.register_instance("order", EnvMode::Live, "10.0.0.1", 9000).await.unwrap());
    assert!(nacos.register_instance("order", EnvMode::Gray, "10.0.0.2", 9000).await.unwrap());

    let registered = naming.registered.lock().unwrap().clone();
    assert_eq!(registered.len(), 2);

    let live = &registered[0];
    assert!(live.metadata.is_empty());
    assert_eq!(live.cluster_name, "cluster-live");
    assert_eq!(live.group_name, "DEFAULT_GROUP");
    assert_eq!(live.weight, 10.0);
    assert!(live.enabled && live.healthy && live.ephemeral);

    let gray = &registered[1];
    assert_eq!(gray.metadata.get("env").map(String::as_str), Some(GRAY_TAG));
}

/// 测试：按环境过滤实例
#[tokio::test]
async fn test_get_service_filters_by_env() {
    let naming = Arc::new(InMemoryNaming::default());
    let nacos = create_nacos(naming.clone());

    nacos.register_instance("order", EnvMode::Live, "10.0.0.1", 9000).await.unwrap();
    nacos.register_instance("order", EnvMode::Gray, "10.0.0.2", 9000).await.unwrap();
    nacos.register_instance("order", EnvMode::All, "10.0.0.3", 9000).await.unwrap();

    let ips = |service: ServiceInfo| -> Vec<String> {
        service.hosts.into_iter().map(|h| h.ip).collect()
    };

    let live = nacos.get_service(EnvMode::Live, "order").await.unwrap();
    assert_eq!(ips(live), vec!["10.0.0.1", "10.0.0.3"]);

    let gray = nacos.get_service(EnvMode::Gray, "order").await.unwrap();
    assert_eq!(ips(gray), vec!["10.0.0.2"]);

    let all = nacos.get_service(EnvMode::All, "order").await.unwrap();
    assert_eq!(all.hosts.len(), 3);

    let query = naming.queries.lock().unwrap()[0].clone();
    assert_eq!(query.clusters, vec!["cluster-live".to_string()]);
    assert_eq!(query.group_name, "DEFAULT_GROUP");
}

/// 测试：带其它环境标记的实例既不属于线上也不属于灰度
#[test]
fn test_unknown_env_tag_is_excluded() {
    let tagged = host("10.0.0.9", 1.0).with_metadata("env", "staging");
    assert!(!EnvMode::Live.matches(&tagged));
    assert!(!EnvMode::Gray.matches(&tagged));
    assert!(EnvMode::All.matches(&tagged));

    let blank = host("10.0.0.8", 1.0).with_metadata("env", "");
    assert!(EnvMode::Live.matches(&blank));
}

/// 测试：环境模式解析
#[test]
fn test_env_mode_parse() {
    assert_eq!("0".parse::<EnvMode>().unwrap(), EnvMode::Live);
    assert_eq!("gray".parse::<EnvMode>().unwrap(), EnvMode::Gray);
    assert_eq!("2".parse::<EnvMode>().unwrap(), EnvMode::All);
    assert!("3".parse::<EnvMode>().is_err());
    assert_eq!(EnvMode::default(), EnvMode::Live);
}

/// 测试：没有可用实例时返回 ("", 0)
#[tokio::test]
async fn test_target_machine_sentinel() {
    let naming = Arc::new(InMemoryNaming::default());
    let nacos = create_nacos(naming);

    let empty = ServiceInfo::new("order", vec![]);
    assert_eq!(nacos.get_target_machine(&empty), TargetMachine::none());

    let unavailable = ServiceInfo::new(
        "order",
        vec![
            host("10.0.0.1", 1.0).with_enabled(false),
            host("10.0.0.2", 1.0).with_health(false),
            host("10.0.0.3", -1.0),
        ],
    );
    let target = nacos.get_target_machine(&unavailable);
    assert!(target.is_none());
    assert_eq!(target.ip, "");
    assert_eq!(target.port, 0);

    let target = nacos.select_target(EnvMode::Live, "missing").await.unwrap();
    assert!(target.is_none());
}

/// 测试：只从启用且健康的实例中选择
#[test]
fn test_target_machine_skips_unavailable() {
    let nacos = create_nacos(Arc::new(InMemoryNaming::default()));
    let service = ServiceInfo::new(
        "order",
        vec![
            host("10.0.0.1", 5.0).with_health(false),
            host("10.0.0.2", 1.0),
            host("10.0.0.3", 5.0).with_enabled(false),
        ],
    );

    for _ in 0..200 {
        let target = nacos.get_target_machine(&service);
        assert_eq!(target, TargetMachine::new("10.0.0.2", 8080));
    }
}

/// 测试：按权重升序稳定排序
#[test]
fn test_sort_by_weight_is_stable() {
    let hosts = vec![
        host("a", 2.0),
        host("b", 1.0),
        host("c", 2.0),
        host("d", 1.0),
    ];
    let order: Vec<&str> = sort_by_weight(&hosts).iter().map(|h| h.ip.as_str()).collect();
    assert_eq!(order, vec!["b", "d", "a", "c"]);

    let pool: Vec<&str> = candidate_pool(&hosts).iter().map(|h| h.ip.as_str()).collect();
    assert_eq!(pool, order);
}

/// 测试：实例顺序不影响整体分布
#[test]
fn test_distribution_independent_of_order() {
    const TRIALS: usize = 10_000;

    let share_of_heavy = |hosts: Vec<ServiceInstance>, seed: u64| -> f64 {
        let nacos = Nacos::with_client(
            NacosConfig::default(),
            Arc::new(InMemoryNaming::default()),
        )
        .with_selector(WeightedSelector::with_seed(seed));
        let service = ServiceInfo::new("order", hosts);
        let hits = (0..TRIALS)
            .filter(|_| nacos.get_target_machine(&service).ip == "heavy")
            .count();
        hits as f64 / TRIALS as f64
    };

    let forward = share_of_heavy(vec![host("heavy", 3.0), host("light", 1.0)], 21);
    let reverse = share_of_heavy(vec![host("light", 1.0), host("heavy", 3.0)], 22);

    assert!((forward - 0.75).abs() < 0.03, "forward share {}", forward);
    assert!((reverse - 0.75).abs() < 0.03, "reverse share {}", reverse);
}

/// 测试：注销实例
#[tokio::test]
async fn test_deregister_instance() {
    let naming = Arc::new(InMemoryNaming::default());
    let nacos = create_nacos(naming.clone());

    nacos.register_instance("order", EnvMode::Live, "10.0.0.1", 9000).await.unwrap();
    assert!(nacos.deregister_instance("order", "10.0.0.1", 9000).await.unwrap());
    assert!(!nacos.deregister_instance("order", "10.0.0.1", 9000).await.unwrap());

    let target = nacos.select_target(EnvMode::Live, "order").await.unwrap();
    assert!(target.is_none());
}

/// 测试：配置的根地址
#[test]
fn test_nacos_base_url() {
    let config = NacosConfig::new("dev").with_server("127.0.0.1", 8848);
    assert_eq!(config.base_url(), "http://127.0.0.1:8848/nacos");

    let mut config = NacosConfig::default();
    config.context_path = "nacos/".to_string();
    assert_eq!(config.base_url(), "http://nacos-live.aijidou.com:8848/nacos");
}

/// 测试：实例 JSON 与 Nacos 字段名一致
#[test]
fn test_instance_json_fields() {
    let json = r#"{
        "instanceId": "10.0.0.1#8080#cluster-live",
        "ip": "10.0.0.1",
        "port": 8080,
        "weight": 10.0,
        "healthy": true,
        "enabled": true,
        "ephemeral": true,
        "clusterName": "cluster-live",
        "serviceName": "DEFAULT_GROUP@@order",
        "metadata": {"env": "grayTag"}
    }"#;
    let instance: ServiceInstance = serde_json::from_str(json).unwrap();
    assert_eq!(instance.port, 8080);
    assert!(instance.is_gray());
    assert_eq!(svc_kit::registry::nacos_http::strip_group(&instance.service_name), "order");

    let minimal: ServiceInstance = serde_json::from_str(r#"{"ip":"h","port":1}"#).unwrap();
    assert!(minimal.is_available());
    assert_eq!(minimal.weight, 1.0);
    assert!(minimal.metadata.is_empty());
}

// ============================================================
// HTTP 客户端（wiremock 模拟 Nacos 开放接口）
// ============================================================

mod http_client {
    use std::collections::HashMap;
    use std::time::Duration;
    use svc_kit::error::ErrorCode;
    use svc_kit::registry::{
        DeregisterInstanceParam, EnvMode, Nacos, NacosConfig, NacosHttpClient, NamingClient,
        RegisterInstanceParam, TargetMachine,
    };
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const INSTANCE_PATH: &str = "/nacos/v1/ns/instance";
    const BEAT_PATH: &str = "/nacos/v1/ns/instance/beat";

    fn server_config(server: &MockServer) -> NacosConfig {
        let address = server.address();
        let mut config = NacosConfig::new("dev").with_server(address.ip().to_string(), address.port());
        config.beat_interval_ms = 50;
        config
    }

    fn register_param(ip: &str) -> RegisterInstanceParam {
        RegisterInstanceParam {
            service_name: "order".to_string(),
            group_name: "DEFAULT_GROUP".to_string(),
            cluster_name: "cluster-live".to_string(),
            ip: ip.to_string(),
            port: 9000,
            weight: 10.0,
            enabled: true,
            healthy: true,
            ephemeral: true,
            metadata: HashMap::new(),
        }
    }

    fn deregister_param(ip: &str) -> DeregisterInstanceParam {
        DeregisterInstanceParam {
            service_name: "order".to_string(),
            group_name: "DEFAULT_GROUP".to_string(),
            cluster_name: "cluster-live".to_string(),
            ip: ip.to_string(),
            port: 9000,
            ephemeral: true,
        }
    }

    async fn beats_received(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request: &&Request| request.url.path() == BEAT_PATH)
            .count()
    }

    async fn mount_ok(server: &MockServer, http_method: &str, route: &str) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(server)
            .await;
    }

    /// 测试：注册请求参数，灰度实例带元数据
    #[tokio::test]
    async fn test_register_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(INSTANCE_PATH))
            .and(query_param("namespaceId", "dev"))
            .and(query_param("serviceName", "order"))
            .and(query_param("groupName", "DEFAULT_GROUP"))
            .and(query_param("clusterName", "cluster-live"))
            .and(query_param("ip", "10.0.0.1"))
            .and(query_param("port", "9000"))
            .and(query_param("weight", "10"))
            .and(query_param("ephemeral", "true"))
            .and(query_param("metadata", r#"{"env":"grayTag"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;
        mount_ok(&server, "PUT", BEAT_PATH).await;

        let nacos = Nacos::new(server_config(&server)).unwrap();
        assert!(nacos.register_instance("order", EnvMode::Gray, "10.0.0.1", 9000).await.unwrap());
    }

    /// 测试：注册后持续发送心跳，注销后停止
    #[tokio::test]
    async fn test_heartbeat_until_deregister() {
        let server = MockServer::start().await;
        mount_ok(&server, "POST", INSTANCE_PATH).await;
        mount_ok(&server, "DELETE", INSTANCE_PATH).await;
        Mock::given(method("PUT"))
            .and(path(BEAT_PATH))
            .and(query_param("serviceName", "DEFAULT_GROUP@@order"))
            .and(query_param("namespaceId", "dev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "clientBeatInterval": 5000,
                "code": 10200
            })))
            .mount(&server)
            .await;

        let client = NacosHttpClient::new(&server_config(&server)).unwrap();
        assert!(client.register_instance(register_param("10.0.0.1")).await.unwrap());
        assert_eq!(client.active_beats(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(beats_received(&server).await >= 2);

        let requests = server.received_requests().await.unwrap();
        let beat_request = requests
            .iter()
            .find(|request| request.url.path() == BEAT_PATH)
            .unwrap();
        let beat: serde_json::Value = beat_request
            .url
            .query_pairs()
            .find(|(key, _)| key == "beat")
            .map(|(_, value)| serde_json::from_str(&value).unwrap())
            .expect("missing beat param");
        assert_eq!(beat["ip"], "10.0.0.1");
        assert_eq!(beat["port"], 9000);
        assert_eq!(beat["cluster"], "cluster-live");

        assert!(client.deregister_instance(deregister_param("10.0.0.1")).await.unwrap());
        assert_eq!(client.active_beats(), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let after_deregister = beats_received(&server).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(beats_received(&server).await, after_deregister);
    }

    /// 测试：重复注册同一实例只保留一个心跳任务，持久实例不发心跳
    #[tokio::test]
    async fn test_heartbeat_registration_rules() {
        let server = MockServer::start().await;
        mount_ok(&server, "POST", INSTANCE_PATH).await;
        mount_ok(&server, "PUT", BEAT_PATH).await;

        let client = NacosHttpClient::new(&server_config(&server)).unwrap();
        client.register_instance(register_param("10.0.0.1")).await.unwrap();
        client.register_instance(register_param("10.0.0.1")).await.unwrap();
        assert_eq!(client.active_beats(), 1);

        let persistent = RegisterInstanceParam {
            ephemeral: false,
            ..register_param("10.0.0.2")
        };
        client.register_instance(persistent).await.unwrap();
        assert_eq!(client.active_beats(), 1);

        let mut config = server_config(&server);
        config.beat_interval_ms = 0;
        let silent = NacosHttpClient::new(&config).unwrap();
        silent.register_instance(register_param("10.0.0.3")).await.unwrap();
        assert_eq!(silent.active_beats(), 0);
    }

    /// 测试：释放客户端时停止心跳
    #[tokio::test]
    async fn test_heartbeat_stops_on_drop() {
        let server = MockServer::start().await;
        mount_ok(&server, "POST", INSTANCE_PATH).await;
        mount_ok(&server, "PUT", BEAT_PATH).await;

        let client = NacosHttpClient::new(&server_config(&server)).unwrap();
        client.register_instance(register_param("10.0.0.1")).await.unwrap();
        drop(client);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let after_drop = beats_received(&server).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(beats_received(&server).await, after_drop);
    }

    /// 测试：返回体不是 ok 时为注册错误，5xx 为注册中心不可用
    #[tokio::test]
    async fn test_register_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(INSTANCE_PATH))
            .and(query_param("ip", "10.0.0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("failed"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(INSTANCE_PATH))
            .and(query_param("ip", "10.0.0.2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = NacosHttpClient::new(&server_config(&server)).unwrap();

        let err = client.register_instance(register_param("10.0.0.1")).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::RegistryError));
        assert_eq!(client.active_beats(), 0);

        let err = client.register_instance(register_param("10.0.0.2")).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::RegistryUnavailable));
        assert!(err.is_retryable());
    }

    /// 测试：查询服务去掉分组前缀并按环境过滤
    #[tokio::test]
    async fn test_get_service_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nacos/v1/ns/instance/list"))
            .and(query_param("namespaceId", "dev"))
            .and(query_param("serviceName", "order"))
            .and(query_param("groupName", "DEFAULT_GROUP"))
            .and(query_param("clusters", "cluster-live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "DEFAULT_GROUP@@order",
                "groupName": "DEFAULT_GROUP",
                "clusters": "cluster-live",
                "hosts": [
                    {
                        "instanceId": "10.0.0.1#9000#cluster-live#DEFAULT_GROUP@@order",
                        "ip": "10.0.0.1",
                        "port": 9000,
                        "weight": 10.0,
                        "healthy": true,
                        "enabled": true,
                        "ephemeral": true,
                        "clusterName": "cluster-live",
                        "serviceName": "DEFAULT_GROUP@@order",
                        "metadata": {}
                    },
                    {
                        "instanceId": "10.0.0.2#9000#cluster-live#DEFAULT_GROUP@@order",
                        "ip": "10.0.0.2",
                        "port": 9000,
                        "weight": 10.0,
                        "healthy": true,
                        "enabled": true,
                        "ephemeral": true,
                        "clusterName": "cluster-live",
                        "serviceName": "DEFAULT_GROUP@@order",
                        "metadata": {"env": "grayTag"}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let nacos = Nacos::new(server_config(&server)).unwrap();
        let live = nacos.get_service(EnvMode::Live, "order").await.unwrap();
        assert_eq!(live.name, "order");
        assert_eq!(live.hosts.len(), 1);
        assert_eq!(live.hosts[0].service_name, "order");

        let target = nacos.select_target(EnvMode::Gray, "order").await.unwrap();
        assert_eq!(target, TargetMachine::new("10.0.0.2", 9000));
    }

    /// 测试：查询时服务端异常
    #[tokio::test]
    async fn test_get_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nacos/v1/ns/instance/list"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let nacos = Nacos::new(server_config(&server)).unwrap();
        let err = nacos.select_target(EnvMode::Live, "order").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::RegistryUnavailable));
    }
}

/// 测试：真实 Nacos 注册与选择
#[tokio::test]
#[ignore]
async fn test_live_nacos_register_and_select() {
    let addr = std::env::var("NACOS_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let config = NacosConfig::new("public").with_server(addr, 8848);
    let nacos = Nacos::new(config).expect("Failed to create Nacos client");

    nacos
        .register_instance("svc-kit-test", EnvMode::Gray, "127.0.0.1", 18080)
        .await
        .expect("Failed to register instance");

    // 超过服务端判定临时实例下线的时间，依靠心跳保持在线
    tokio::time::sleep(std::time::Duration::from_secs(35)).await;

    let target = nacos
        .select_target(EnvMode::Gray, "svc-kit-test")
        .await
        .expect("Failed to select target");
    assert_eq!(target, TargetMachine::new("127.0.0.1", 18080));

    nacos
        .deregister_instance("svc-kit-test", "127.0.0.1", 18080)
        .await
        .expect("Failed to deregister instance");
}
