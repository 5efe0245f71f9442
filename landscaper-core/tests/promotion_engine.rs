mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mockall::Sequence;

use common::{artifact, landscape, package, with_configurations};
use landscaper_core::landscape::{scoped_id, Parameter};
use landscaper_core::model::{Configuration, DesigntimeArtifact};
use landscaper_core::promotion::{
    decide_transport, overlay_configurations, target_package, MoveRequest, PackageMover,
    TransportDecision,
};
use landscaper_core::{ClientError, EngineError, MockIntegrationClient, TransportStep};

fn move_request(artifacts: &[&str], deploy: bool) -> MoveRequest {
    MoveRequest {
        package_id: "Orders".to_string(),
        target_env: "qa".to_string(),
        artifacts: artifacts.iter().map(|a| a.to_string()).collect(),
        deploy,
    }
}

/// Source side answering with `artifacts` for package `Orders`.
fn source_with(artifacts: Vec<DesigntimeArtifact>) -> MockIntegrationClient {
    let mut dev = MockIntegrationClient::new();
    dev.expect_read_package()
        .withf(|id| id == "Orders")
        .returning(|_| Ok(Some(package("Orders"))));
    dev.expect_read_designtime_artifacts()
        .withf(|id, fetch_config| id == "Orders" && *fetch_config)
        .times(1)
        .returning(move |_, _| Ok(artifacts.clone()));
    dev
}

#[tokio::test]
async fn second_run_with_unchanged_source_performs_no_mutation() {
    let mut dev = source_with(vec![
        artifact("OrderFlow", "1.0.0", "Orders"),
        artifact("B", "2.0.0", "Orders"),
    ]);
    dev.expect_download_designtime_artifact().never();

    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package()
        .withf(|id| id == "Orders-qa")
        .times(1)
        .returning(|id| Ok(Some(package(id))));
    qa.expect_read_designtime_artifacts()
        .withf(|id, fetch_config| id == "Orders-qa" && !*fetch_config)
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                artifact("OrderFlow-qa", "1.0.0", "Orders-qa"),
                artifact("B-qa", "2.0.0", "Orders-qa"),
            ])
        });
    qa.expect_create_package().never();
    qa.expect_delete_designtime_artifact().never();
    qa.expect_upload_designtime_artifact().never();
    qa.expect_update_designtime_artifact_configuration().never();
    qa.expect_deploy_designtime_artifact().never();

    let landscape = landscape(dev, qa);
    let report = PackageMover::new(&landscape)
        .run(&move_request(&[], true))
        .await
        .expect("up-to-date move succeeds");

    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.changed(), 0);
    assert_eq!(report.deployed(), 0);
    assert_eq!(report.lines[0].artifact_id, "OrderFlow-qa");
    assert_eq!(report.lines[0].ordinal, 1);
    assert_eq!(report.lines[1].artifact_id, "B-qa");
    assert_eq!(report.lines[1].version, "2.0.0");
    assert_eq!(report.lines[1].package_id, "Orders-qa");
}

#[test]
fn scoped_ids_are_deterministic() {
    assert_eq!(scoped_id("Flow1", "-qa"), "Flow1-qa");
    assert_eq!(scoped_id("Flow1", "-qa"), scoped_id("Flow1", "-qa"));
    assert_eq!(scoped_id("Flow1", ""), "Flow1");

    let landscape = landscape(MockIntegrationClient::new(), MockIntegrationClient::new());
    let qa = landscape.environment("qa").expect("qa exists");
    assert_eq!(qa.scope("Flow1"), "Flow1-qa");
    assert_eq!(landscape.original_environment().scope("Flow1"), "Flow1");
}

#[test]
fn transport_decision_compares_versions() {
    let target = HashMap::from([("A-qa".to_string(), "1.0.0".to_string())]);

    assert_eq!(decide_transport(&target, "A-qa", "1.0.0"), TransportDecision::Skip);
    assert_eq!(
        decide_transport(&target, "A-qa", "1.1.0"),
        TransportDecision::Replace {
            current_version: "1.0.0".to_string()
        }
    );
    assert_eq!(
        decide_transport(&HashMap::new(), "A-qa", "1.0.0"),
        TransportDecision::Create
    );
}

#[test]
fn override_type_is_inherited_from_source_configuration() {
    let source = with_configurations(
        artifact("OrderFlow", "1.0.0", "Orders"),
        &[("endpoint", "https://old", "xsd:string")],
    );
    let overrides = vec![
        Parameter {
            key: "endpoint".to_string(),
            value: "https://x".to_string(),
            data_type: "xsd:integer".to_string(),
        },
        Parameter {
            key: "timeout".to_string(),
            value: "30".to_string(),
            data_type: "xsd:integer".to_string(),
        },
    ];

    let applied = overlay_configurations(&source, &overrides);

    assert_eq!(
        applied,
        vec![
            Configuration::new("endpoint", "https://x", "xsd:string"),
            Configuration::new("timeout", "30", "xsd:integer"),
        ]
    );
}

#[test]
fn created_target_package_is_annotated_with_environment() {
    let landscape = landscape(MockIntegrationClient::new(), MockIntegrationClient::new());
    let qa = landscape.environment("qa").expect("qa exists");

    let created = target_package(&package("Orders"), "Orders-qa", qa);

    assert_eq!(created.id, "Orders-qa");
    assert_eq!(created.name, "-qa Orders");
    assert_eq!(created.short_text, "Orders(environment - 'qa')");
    assert_eq!(created.description, "Order processing");
    assert_eq!(created.vendor, "ACME");
    assert_eq!(created.version, "1.0.0");
    assert!(created.keywords.is_empty());
}

#[tokio::test]
async fn draft_artifacts_abort_before_any_mutation() {
    let dev = source_with(vec![
        artifact("OrderFlow", "1.0.0", "Orders"),
        artifact("B", "Active", "Orders"),
        artifact("Standalone", "Active", "Orders"),
    ]);

    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package().never();
    qa.expect_create_package().never();
    qa.expect_upload_designtime_artifact().never();

    let landscape = landscape(dev, qa);
    let err = PackageMover::new(&landscape)
        .run(&move_request(&[], false))
        .await
        .expect_err("drafts must be rejected");

    match err {
        EngineError::DraftArtifacts { package, artifacts } => {
            assert_eq!(package, "Orders");
            assert_eq!(artifacts, vec!["B".to_string(), "Standalone".to_string()]);
        }
        other => panic!("expected DraftArtifacts, got {other:?}"),
    }
}

#[tokio::test]
async fn draft_outside_allow_list_does_not_block() {
    let mut dev = source_with(vec![
        artifact("OrderFlow", "1.0.0", "Orders"),
        artifact("B", "Active", "Orders"),
    ]);
    dev.expect_download_designtime_artifact().never();

    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package()
        .returning(|id| Ok(Some(package(id))));
    qa.expect_read_designtime_artifacts()
        .returning(|_, _| Ok(vec![artifact("OrderFlow-qa", "1.0.0", "Orders-qa")]));

    let landscape = landscape(dev, qa);
    let report = PackageMover::new(&landscape)
        .run(&move_request(&["OrderFlow"], false))
        .await
        .expect("allow-listed move succeeds");

    assert_eq!(report.lines.len(), 1);
    assert_eq!(report.lines[0].artifact_id, "OrderFlow-qa");
    assert!(!report.lines[0].changed);
}

#[tokio::test]
async fn changed_version_runs_steps_in_order() {
    let mut seq = Sequence::new();
    let mut dev = source_with(vec![with_configurations(
        artifact("OrderFlow", "1.1.0", "Orders"),
        &[("endpoint", "https://dev", "xsd:string")],
    )]);
    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package()
        .returning(|id| Ok(Some(package(id))));
    qa.expect_read_designtime_artifacts()
        .returning(|_, _| Ok(vec![artifact("OrderFlow-qa", "1.0.0", "Orders-qa")]));

    qa.expect_delete_designtime_artifact()
        .withf(|id, version| id == "OrderFlow-qa" && version == "1.0.0")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    dev.expect_download_designtime_artifact()
        .withf(|id, version| id == "OrderFlow" && version == "1.1.0")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id, version| {
            let mut downloaded = artifact(id, version, "Orders");
            downloaded.content = "UEsDBBQ=".to_string();
            Ok(downloaded)
        });
    qa.expect_upload_designtime_artifact()
        .withf(|a| {
            a.id == "OrderFlow-qa"
                && a.package_id == "Orders-qa"
                && a.version == "1.1.0"
                && a.name == "OrderFlow flow -qa"
                && a.description == "OrderFlow description"
                && a.content == "UEsDBBQ="
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let applied = Arc::new(Mutex::new(Vec::new()));
    let sink = applied.clone();
    qa.expect_update_designtime_artifact_configuration()
        .withf(|id, version, _| id == "OrderFlow-qa" && version == "1.1.0")
        .times(2)
        .in_sequence(&mut seq)
        .returning(move |_, _, configuration| {
            sink.lock().unwrap().push(configuration.clone());
            Ok(())
        });
    qa.expect_deploy_designtime_artifact()
        .withf(|id, version| id == "OrderFlow-qa" && version == "1.1.0")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));

    let landscape = landscape(dev, qa);
    let report = PackageMover::new(&landscape)
        .run(&move_request(&[], true))
        .await
        .expect("move succeeds");

    assert_eq!(report.lines.len(), 1);
    let line = &report.lines[0];
    assert_eq!(line.artifact_id, "OrderFlow-qa");
    assert_eq!(line.version, "1.1.0");
    assert!(line.changed);
    assert!(line.deployed);

    let applied = applied.lock().unwrap();
    assert_eq!(
        *applied,
        vec![
            Configuration::new("endpoint", "https://x", "xsd:string"),
            Configuration::new("retries", "5", "xsd:integer"),
        ]
    );
}

#[tokio::test]
async fn missing_target_package_is_created_and_everything_transported() {
    let mut dev = source_with(vec![
        artifact("B", "2.0.0", "Orders"),
        artifact("Standalone", "1.0.0", "Orders"),
    ]);
    dev.expect_download_designtime_artifact()
        .times(2)
        .returning(|id, version| Ok(artifact(id, version, "Orders")));

    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package()
        .withf(|id| id == "Orders-qa")
        .returning(|_| Ok(None));
    qa.expect_create_package()
        .withf(|p| p.id == "Orders-qa" && p.short_text == "Orders(environment - 'qa')")
        .times(1)
        .returning(|_| Ok(()));
    qa.expect_read_designtime_artifacts().never();
    qa.expect_delete_designtime_artifact().never();
    qa.expect_upload_designtime_artifact()
        .times(2)
        .returning(|_| Ok(()));
    qa.expect_deploy_designtime_artifact().never();

    let landscape = landscape(dev, qa);
    let report = PackageMover::new(&landscape)
        .run(&move_request(&[], false))
        .await
        .expect("move into a new package succeeds");

    assert_eq!(report.changed(), 2);
    assert_eq!(report.deployed(), 0);
    assert!(report.lines.iter().all(|l| l.package_id == "Orders-qa"));
}

#[tokio::test]
async fn delete_not_found_is_not_fatal() {
    let mut dev = source_with(vec![artifact("B", "2.0.0", "Orders")]);
    dev.expect_download_designtime_artifact()
        .returning(|id, version| Ok(artifact(id, version, "Orders")));

    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package()
        .returning(|id| Ok(Some(package(id))));
    qa.expect_read_designtime_artifacts()
        .returning(|_, _| Ok(vec![artifact("B-qa", "1.0.0", "Orders-qa")]));
    qa.expect_delete_designtime_artifact()
        .times(1)
        .returning(|id, _| {
            Err(ClientError::NotFound {
                resource: id.to_string(),
            })
        });
    qa.expect_upload_designtime_artifact()
        .times(1)
        .returning(|_| Ok(()));

    let landscape = landscape(dev, qa);
    let report = PackageMover::new(&landscape)
        .run(&move_request(&[], false))
        .await
        .expect("missing target artifact does not abort");

    assert_eq!(report.changed(), 1);
}

#[tokio::test]
async fn remote_error_on_third_of_five_stops_the_run() {
    let ids = ["A1", "A2", "A3", "A4", "A5"];
    let mut dev = source_with(
        ids.iter()
            .map(|id| artifact(id, "1.0.0", "Orders"))
            .collect(),
    );
    dev.expect_download_designtime_artifact()
        .withf(|id, _| matches!(id, "A1" | "A2" | "A3"))
        .times(3)
        .returning(|id, version| Ok(artifact(id, version, "Orders")));
    dev.expect_download_designtime_artifact()
        .withf(|id, _| matches!(id, "A4" | "A5"))
        .never();

    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package().returning(|_| Ok(None));
    qa.expect_create_package().times(1).returning(|_| Ok(()));
    qa.expect_upload_designtime_artifact()
        .times(3)
        .returning(|a| {
            if a.id == "A3-qa" {
                Err(ClientError::Remote {
                    status: 500,
                    body: "Internal Server Error".to_string(),
                })
            } else {
                Ok(())
            }
        });
    qa.expect_deploy_designtime_artifact().never();

    let landscape = landscape(dev, qa);
    let err = PackageMover::new(&landscape)
        .run(&move_request(&[], false))
        .await
        .expect_err("third artifact fails");

    assert_eq!(err.completed().len(), 2);
    match err {
        EngineError::Aborted {
            artifact_id,
            step,
            completed,
            source,
        } => {
            assert_eq!(artifact_id, "A3-qa");
            assert_eq!(step, TransportStep::Upload);
            assert_eq!(completed[0].artifact_id, "A1-qa");
            assert_eq!(completed[1].artifact_id, "A2-qa");
            assert!(completed.iter().all(|l| l.changed));
            assert!(matches!(source, ClientError::Remote { status: 500, .. }));
        }
        other => panic!("expected Aborted, got {other:?}"),
    }
}

#[tokio::test]
async fn moving_into_the_original_environment_is_rejected() {
    let landscape = landscape(MockIntegrationClient::new(), MockIntegrationClient::new());
    let request = MoveRequest {
        target_env: "dev".to_string(),
        ..move_request(&[], false)
    };

    let err = PackageMover::new(&landscape)
        .run(&request)
        .await
        .expect_err("original environment is not a target");

    assert!(matches!(err, EngineError::TargetIsOriginal(env) if env == "dev"));
}

#[tokio::test]
async fn unknown_target_environment_is_rejected() {
    let landscape = landscape(MockIntegrationClient::new(), MockIntegrationClient::new());
    let request = MoveRequest {
        target_env: "prod".to_string(),
        ..move_request(&[], false)
    };

    let err = PackageMover::new(&landscape)
        .run(&request)
        .await
        .expect_err("unknown environment");

    assert_eq!(err.to_string(), "environment prod is not found");
}

#[tokio::test]
async fn missing_source_package_is_reported() {
    let mut dev = MockIntegrationClient::new();
    dev.expect_read_package().returning(|_| Ok(None));
    let mut qa = MockIntegrationClient::new();
    qa.expect_read_package().never();

    let landscape = landscape(dev, qa);
    let err = PackageMover::new(&landscape)
        .run(&move_request(&[], false))
        .await
        .expect_err("source package missing");

    assert!(matches!(err, EngineError::PackageNotFound(id) if id == "Orders"));
}
