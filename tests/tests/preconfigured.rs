use qsmf::{DataPathError, TrafficEndpoint, UpfId};
use qsmf_tests::framework::*;

#[test]
fn uplink_classifier() -> anyhow::Result<()> {
    let (smf, _logger) = init()?;

    // One branching UPF in front of two anchors.
    assert!(smf.has_preconfigured_graph(ULCL_SUPI));
    let graph = smf.graph(ULCL_SUPI).unwrap();
    assert_eq!(graph.supi(), ULCL_SUPI);
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.root().name(), "branching");
    assert_eq!(branching_points(&graph), vec!["branching"]);
    assert_eq!(children_of(&graph, "branching")?, vec!["anchor-1", "anchor-2"]);
    assert_eq!(parent_of(&graph, "anchor-1")?, Some("branching"));
    assert_eq!(parent_of(&graph, "anchor-2")?, Some("branching"));

    // Each branch carries its own traffic endpoint.  anchor-2 is configured with
    // an explicit identifier.
    let next = graph.root().next();
    assert_eq!(
        next[&UpfId("anchor-1".to_string())].destination,
        Some(TrafficEndpoint {
            ip: "10.60.0.101".parse()?,
            port: 12345
        })
    );
    assert_eq!(
        next[&UpfId("psa-2".to_string())].destination,
        Some(TrafficEndpoint {
            ip: "10.60.0.102".parse()?,
            port: 12345
        })
    );

    check_forest(&graph)?;
    check_branching_flags(&graph)
}

#[test]
fn chain_through_intermediate_upf() -> anyhow::Result<()> {
    let (smf, _logger) = init()?;
    let graph = smf.graph(CHAIN_SUPI).unwrap();
    assert_eq!(graph.root().name(), "i-upf");
    assert_eq!(parent_of(&graph, "i-upf")?, None);
    assert_eq!(parent_of(&graph, "branching")?, Some("i-upf"));
    assert_eq!(parent_of(&graph, "anchor-1")?, Some("branching"));

    // The middle of a chain has a parent and a child.
    assert_eq!(branching_points(&graph), vec!["branching"]);
    check_branching_flags(&graph)
}

#[test]
fn disjoint_paths() -> anyhow::Result<()> {
    let (smf, _logger) = init()?;
    let graph = smf.graph(DISJOINT_SUPI).unwrap();
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.traverse().components(), 2);
    assert!(branching_points(&graph).is_empty());
    check_forest(&graph)?;
    check_branching_flags(&graph)
}

#[test]
fn unknown_upf_is_not_registered() -> anyhow::Result<()> {
    let (smf, _logger) = init()?;
    assert!(!smf.has_preconfigured_graph(MISCONFIGURED_SUPI));
    assert!(smf.graph(MISCONFIGURED_SUPI).is_none());
    assert_eq!(
        smf.load_graph(MISCONFIGURED_SUPI).unwrap_err(),
        DataPathError::UnknownNode("anchor-9".to_string())
    );
    assert!(!smf.has_preconfigured_graph(MISCONFIGURED_SUPI));

    // Other subscribers are unaffected.
    assert_eq!(smf.graph_count(), 3);
    Ok(())
}

#[test]
fn unconfigured_subscriber() -> anyhow::Result<()> {
    let (smf, _logger) = init()?;
    assert!(!smf.has_preconfigured_graph("imsi-208930000000099"));
    assert!(matches!(
        smf.load_graph("imsi-208930000000099"),
        Err(DataPathError::NoRoutingPaths(_))
    ));
    Ok(())
}

#[test]
fn display_lists_every_upf() -> anyhow::Result<()> {
    let (smf, _logger) = init()?;
    let text = smf.graph(ULCL_SUPI).unwrap().to_string();
    assert!(text.contains(&format!("SUPI: {ULCL_SUPI}")));
    assert!(text.contains("UPF branching (10.200.200.101) branching point: true"));
    assert!(text.contains("child: 10.200.200.103 destination 10.60.0.102:12345"));
    assert!(text.contains("parent: 10.200.200.101"));
    Ok(())
}
