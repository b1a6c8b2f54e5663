//! Provisioning workflow tests against the recording provider double

use piagen_core::{ErrorKind, ProvisioningError, ProvisioningRequest, Provisioner};
use piagen_provider::stub::{AuthOutcome, StubProvider};
use std::sync::Arc;

fn provisioner(stub: StubProvider) -> (Provisioner<StubProvider>, Arc<StubProvider>) {
    let stub = Arc::new(stub);
    (Provisioner::new(stub.clone()), stub)
}

#[tokio::test]
async fn test_missing_fields_make_no_provider_calls() {
    let cases = [
        ProvisioningRequest::new("", "p", "US East"),
        ProvisioningRequest::new("u", "", "US East"),
        ProvisioningRequest::new("u", "p", ""),
        ProvisioningRequest::new("", "", ""),
    ];

    for request in cases {
        let (provisioner, stub) = provisioner(StubProvider::new());
        let err = provisioner.provision(&request).await.unwrap_err();

        assert!(matches!(err, ProvisioningError::MissingFields));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(stub.calls().total(), 0, "provider called for {:?}", request);
    }
}

#[tokio::test]
async fn test_unknown_region_stops_before_auth() {
    let (provisioner, stub) = provisioner(StubProvider::new());

    let err = provisioner
        .provision(&ProvisioningRequest::new("u", "p", "Atlantis"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisioningError::InvalidRegion(ref r) if r == "Atlantis"));
    assert_eq!(err.to_string(), "Invalid region selected: Atlantis");
    assert_eq!(stub.calls().list_regions(), 1);
    assert_eq!(stub.calls().generate_keypair(), 0);
    assert_eq!(stub.calls().authenticate(), 0);
    assert_eq!(stub.calls().register_key(), 0);
}

#[tokio::test]
async fn test_region_match_is_exact() {
    let (provisioner, _stub) = provisioner(StubProvider::new());

    let err = provisioner
        .provision(&ProvisioningRequest::new("u", "p", "us east"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisioningError::InvalidRegion(_)));
}

#[tokio::test]
async fn test_directory_failure() {
    let (provisioner, stub) =
        provisioner(StubProvider::new().with_directory_error("server list unreachable"));

    let err = provisioner
        .provision(&ProvisioningRequest::new("u", "p", "US East"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Directory);
    assert_eq!(stub.calls().authenticate(), 0);
}

#[tokio::test]
async fn test_rejected_credentials_skip_registration() {
    let (provisioner, stub) = provisioner(StubProvider::new().with_auth(AuthOutcome::Reject));

    let err = provisioner
        .provision(&ProvisioningRequest::new("u", "wrong", "US East"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisioningError::Authentication));
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(stub.calls().authenticate(), 1);
    assert_eq!(stub.calls().register_key(), 0);
}

#[tokio::test]
async fn test_unreachable_auth_server_is_internal() {
    let (provisioner, stub) =
        provisioner(StubProvider::new().with_auth(AuthOutcome::Unreachable));

    let err = provisioner
        .provision(&ProvisioningRequest::new("u", "p", "US East"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(stub.calls().register_key(), 0);
}

#[tokio::test]
async fn test_registration_failure_is_distinct_from_auth() {
    let (provisioner, stub) =
        provisioner(StubProvider::new().with_registration_error("Login failed!"));

    let err = provisioner
        .provision(&ProvisioningRequest::new("u", "p", "US East"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisioningError::Registration(_)));
    assert_eq!(err.kind(), ErrorKind::Registration);
    assert_eq!(err.to_string(), "Failed to register key with server");
    assert_eq!(stub.calls().authenticate(), 1);
    assert_eq!(stub.calls().register_key(), 1);
}

#[tokio::test]
async fn test_successful_provisioning() {
    let (provisioner, stub) = provisioner(
        StubProvider::new()
            .with_dns_servers(["10.0.0.1", "10.0.0.2"])
            .with_local_address("10.6.0.5/32"),
    );

    let result = provisioner
        .provision(&ProvisioningRequest::new("u", "p", "US East"))
        .await
        .unwrap();

    assert_eq!(result.tunnel_name, "PIA-us-east");
    assert_eq!(result.filename(), "PIA-us-east.conf");

    let config = result.render();
    assert_eq!(config.filename, "PIA-us-east.conf");
    assert!(config.content.contains("DNS = 10.0.0.1,10.0.0.2"));
    assert!(config.content.contains("Address = 10.6.0.5/32"));
    assert!(config.content.contains("# PIA-us-east\n"));
    assert!(config.content.contains("Endpoint = 203.0.113.10:1337"));

    let calls = stub.calls();
    assert_eq!(calls.list_regions(), 1);
    assert_eq!(calls.generate_keypair(), 1);
    assert_eq!(calls.select_region(), 1);
    assert_eq!(calls.authenticate(), 1);
    assert_eq!(calls.register_key(), 1);
}

#[tokio::test]
async fn test_each_run_uses_a_fresh_keypair() {
    let (provisioner, stub) = provisioner(StubProvider::new());
    let request = ProvisioningRequest::new("u", "p", "DE Berlin");

    let first = provisioner.provision(&request).await.unwrap();
    let second = provisioner.provision(&request).await.unwrap();

    assert_ne!(first.params.private_key, second.params.private_key);
    // No caching of the directory between runs
    assert_eq!(stub.calls().list_regions(), 2);
}

#[tokio::test]
async fn test_list_regions_sorted() {
    let (provisioner, _stub) =
        provisioner(StubProvider::new().with_regions(["US West", "AU Sydney", "CA Toronto"]));

    let regions = provisioner.list_regions().await.unwrap();
    assert_eq!(regions, vec!["AU Sydney", "CA Toronto", "US West"]);
}

#[tokio::test]
async fn test_works_with_trait_objects() {
    let provider: Arc<dyn piagen_provider::ProviderClient> = Arc::new(StubProvider::new());
    let provisioner = Provisioner::new(provider);

    let result = provisioner
        .provision(&ProvisioningRequest::new("u", "p", "US East"))
        .await
        .unwrap();
    assert_eq!(result.tunnel_name, "PIA-us-east");
}
