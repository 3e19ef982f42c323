use super::globus::GlobusCli;
use super::*;

const LISTING: &str = "\
Name      | Bookmark ID                          | Endpoint ID                          | Endpoint Name | Path
--------- | ------------------------------------ | ------------------------------------ | ------------- | ----------------------
stampede2 | 0b1c2d3e-0000-0000-0000-000000000001 | ceea5ca0-89a9-11e7-a97f-22000a92523b | TACC Stampede2 | /scratch/01234/user/
macbook   | 0b1c2d3e-0000-0000-0000-000000000002 | 9d6d994a-6d04-11e5-ba46-22000b92c6ec | My Laptop     | /~/

";

fn bookmarks() -> Vec<Bookmark> {
    parse_bookmarks(LISTING).unwrap()
}

#[test]
fn parse_listing_test() {
    let parsed = bookmarks();

    assert_eq!(2, parsed.len());
    assert_eq!(
        Bookmark {
            name: "stampede2".to_string(),
            endpoint_id: "ceea5ca0-89a9-11e7-a97f-22000a92523b".to_string(),
            path: "/scratch/01234/user/".to_string(),
        },
        parsed[0]
    );
    assert_eq!("/~/", parsed[1].path);

    assert!(parse_bookmarks("just | two").is_err());
    assert!(parse_bookmarks("").unwrap().is_empty());
}

#[test]
fn find_bookmark_test() {
    let mut parsed = bookmarks();
    parsed.push(Bookmark {
        name: "macbook".to_string(),
        endpoint_id: "other".to_string(),
        path: "/~/".to_string(),
    });

    assert_eq!("other", find_bookmark(&parsed, "macbook", "Destination").unwrap().endpoint_id);
    assert!(find_bookmark(&parsed, "frontera", "Source")
        .is_err_and(|e| e.root_cause().to_string().contains("Source bookmark not found")));
}

fn request(source: &str, destination: &str) -> TransferRequest {
    TransferRequest {
        source: source.to_string(),
        destination: destination.to_string(),
        source_path: "log/timestep_history.png".into(),
        destination_path: "Desktop/run1".into(),
        label: Some("dt".to_string()),
    }
}

#[test]
fn resolve_test() {
    let plan = TransferPlan::resolve(
        request("stampede2", "macbook"),
        &bookmarks(),
        Path::new("/scratch/01234/user/runtime_production_run1"),
        Path::new("/home/user"),
        "/~/",
    )
    .unwrap();

    assert_eq!(
        Path::new("/scratch/01234/user/runtime_production_run1/log/timestep_history.png"),
        plan.source_path
    );
    assert_eq!(Path::new("/~/Desktop/run1/timestep_history.png"), plan.destination_path);
    assert_eq!(
        "ceea5ca0-89a9-11e7-a97f-22000a92523b:/scratch/01234/user/runtime_production_run1/log/timestep_history.png",
        plan.source_argument()
    );
    assert_eq!(
        "9d6d994a-6d04-11e5-ba46-22000b92c6ec:/~/Desktop/run1/timestep_history.png",
        plan.destination_argument()
    );

    assert_eq!(
        vec![
            "transfer".to_string(),
            "--label".to_string(),
            "dt".to_string(),
            plan.source_argument(),
            plan.destination_argument(),
        ],
        GlobusCli::transfer_args(&plan)
    );
}

#[test]
fn resolve_home_alias_test() {
    let plan = TransferPlan::resolve(
        request("macbook", "stampede2"),
        &bookmarks(),
        Path::new("/home/user/runs"),
        Path::new("/home/user"),
        "/~/",
    )
    .unwrap();

    assert_eq!(Path::new("/home/user/runs/log/timestep_history.png"), plan.source_path);
}

#[test]
fn resolve_wrong_machine_test() {
    let wrong = TransferPlan::resolve(
        request("stampede2", "macbook"),
        &bookmarks(),
        Path::new("/scratch/01234/user_other"),
        Path::new("/home/user"),
        "/~/",
    );

    assert!(wrong.is_err_and(|e| e.root_cause().to_string().contains("source machine")));

    let missing = TransferPlan::resolve(
        request("stampede2", "desktop"),
        &bookmarks(),
        Path::new("/scratch/01234/user"),
        Path::new("/home/user"),
        "/~/",
    );

    assert!(missing.is_err_and(|e| e.root_cause().to_string().contains("Destination")));
}

#[test]
fn dt_history_request_test() {
    let request = dt_history_request(
        Path::new("runtime_production_tl_sfe010_123456/log"),
        "stampede2",
        "macbook",
    )
    .unwrap();

    assert_eq!(
        Path::new("runtime_production_tl_sfe010_123456/log/timestep_history.png"),
        request.source_path
    );
    assert_eq!(Path::new("Desktop/tl_sfe010_123456"), request.destination_path);
    assert_eq!(Some("dt_history_tl_sfe010_123456".to_string()), request.label);

    assert!(dt_history_request(Path::new("runtime_test/log"), "a", "b").is_err());
}
