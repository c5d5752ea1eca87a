use qsmf::{DataPathError, RoutingTable, Smf, UpfId, UserPlaneInformation};
use qsmf_tests::framework::*;
use std::net::IpAddr;

#[test]
fn unresolvable_address_is_not_registered() -> anyhow::Result<()> {
    let logger = init_logging();
    let supi = "imsi-001010000000011";
    let unresolved: IpAddr = "10.0.0.9".parse()?;

    // "dark" is known by name, but nothing maps its address to an identifier.
    let mut upfs = UserPlaneInformation::default();
    upfs.add_upf("A", "10.0.0.1".parse()?, None);
    upfs.insert_node("dark", unresolved);

    let mut routing = RoutingTable::default();
    routing.insert(supi, vec![routing_path(&["A", "dark"], 1)]);
    let smf = Smf::new(upfs, routing, logger);

    assert_eq!(
        smf.load_graph(supi).unwrap_err(),
        DataPathError::UnresolvedAddress(unresolved)
    );
    assert!(!smf.has_preconfigured_graph(supi));
    assert_eq!(smf.load_all_graphs(), 0);
    assert_eq!(smf.graph_count(), 0);
    Ok(())
}

#[test]
fn shared_address_is_one_node() -> anyhow::Result<()> {
    let logger = init_logging();
    let supi = "imsi-001010000000012";

    let mut upfs = UserPlaneInformation::default();
    upfs.add_upf("A", "10.0.0.1".parse()?, None);
    upfs.add_upf("U1", "10.0.0.5".parse()?, None);
    upfs.add_upf("U2", "10.0.0.5".parse()?, None);

    let mut routing = RoutingTable::default();
    routing.insert(
        supi,
        vec![routing_path(&["A", "U1"], 1), routing_path(&["A", "U2"], 2)],
    );
    let smf = Smf::new(upfs, routing, logger);
    let graph = smf.load_graph(supi)?;

    // Both names resolve to U1's identifier, so both paths walk the same edge and
    // the child's parent agrees with the edge.
    assert_eq!(graph.len(), 2);
    assert_eq!(children_of(&graph, "A")?, vec!["U1"]);
    assert_eq!(parent_of(&graph, "U1")?, Some("A"));
    assert!(graph.root().next().contains_key(&UpfId("U1".to_string())));
    assert!(branching_points(&graph).is_empty());

    check_forest(&graph)?;
    check_branching_flags(&graph)
}

#[test]
fn shared_address_within_one_path_is_rejected() -> anyhow::Result<()> {
    let logger = init_logging();
    let supi = "imsi-001010000000013";

    let mut upfs = UserPlaneInformation::default();
    upfs.add_upf("A", "10.0.0.1".parse()?, None);
    upfs.add_upf("U1", "10.0.0.5".parse()?, None);
    upfs.add_upf("U2", "10.0.0.5".parse()?, None);

    let mut routing = RoutingTable::default();
    routing.insert(supi, vec![routing_path(&["A", "U1", "U2"], 1)]);
    let smf = Smf::new(upfs, routing, logger);

    assert!(matches!(
        smf.load_graph(supi),
        Err(DataPathError::ParentCycle { .. })
    ));
    assert!(!smf.has_preconfigured_graph(supi));
    Ok(())
}
