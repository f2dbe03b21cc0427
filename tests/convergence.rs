use std::collections::BTreeMap;
use std::sync::Arc;

use dvsim::network::{parse_links_str, NetworkRegistry};
use dvsim::protocol::{Node, Packet, RoutingTable};
use dvsim::{NodeId, Simulation, SimulationConfig, SimulationReport};
use tokio::sync::mpsc;

async fn converge(links: &str) -> SimulationReport {
    let links = parse_links_str(links).unwrap();
    Simulation::new(links, SimulationConfig::default())
        .run()
        .await
        .unwrap()
}

fn detached(table: RoutingTable) -> Node {
    let (_tx, rx) = mpsc::unbounded_channel();
    Node::new(table, rx, Arc::new(NetworkRegistry::new()))
}

/// All-pairs shortest paths over the undirected edge list.
fn floyd_warshall(nodes: &[&str], edges: &[(&str, &str, f64)]) -> BTreeMap<(String, String), f64> {
    let mut dist = BTreeMap::new();
    for a in nodes {
        for b in nodes {
            let d = if a == b { 0.0 } else { f64::INFINITY };
            dist.insert((a.to_string(), b.to_string()), d);
        }
    }
    for (a, b, c) in edges {
        dist.insert((a.to_string(), b.to_string()), *c);
        dist.insert((b.to_string(), a.to_string()), *c);
    }
    for k in nodes {
        for i in nodes {
            for j in nodes {
                let through = dist[&(i.to_string(), k.to_string())] + dist[&(k.to_string(), j.to_string())];
                let key = (i.to_string(), j.to_string());
                if through < dist[&key] {
                    dist.insert(key, through);
                }
            }
        }
    }
    dist
}

fn links_from_edges(nodes: &[&str], edges: &[(&str, &str, f64)]) -> String {
    let mut lines = String::new();
    for node in nodes {
        lines.push_str(node);
        for (a, b, c) in edges {
            if a == node {
                lines.push_str(&format!(" ({},{})", b, c));
            } else if b == node {
                lines.push_str(&format!(" ({},{})", a, c));
            }
        }
        lines.push('\n');
    }
    lines
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn triangle_takes_two_hop_shortcut() {
    let report = converge("A (B,1) (C,5)\nB (A,1) (C,1)\nC (A,5) (B,1)\n").await;

    let a = report.table("A").unwrap();
    assert_eq!(a.distance_to("C").unwrap(), 2.0);
    assert_eq!(a.next_hop_to("C").unwrap(), "B");

    let c = report.table("C").unwrap();
    assert_eq!(c.distance_to("A").unwrap(), 2.0);
    assert_eq!(c.next_hop_to("A").unwrap(), "B");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn triangle_without_direct_edge_discovers_destination() {
    let report = converge("A (B,1)\nB (A,1) (C,1)\nC (B,1)\n").await;

    let a = report.table("A").unwrap();
    assert_eq!(a.distance_to("C").unwrap(), 2.0);
    assert_eq!(a.next_hop_to("C").unwrap(), "B");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_table_is_total_with_zero_self_entry() {
    let report = converge("A (B,1)\nB (A,1)\nC (D,1)\nD (C,1)\n").await;

    for (id, table) in &report.tables {
        assert_eq!(table.len(), 4, "table of {id}");
        assert_eq!(table.distance_to(id).unwrap(), 0.0);
        assert_eq!(table.next_hop_to(id).unwrap(), id);
    }

    // separate components stay unreachable
    let a = report.table("A").unwrap();
    assert!(a.distance_to("C").unwrap().is_infinite());
    assert_eq!(a.next_hop_to("C").unwrap(), "C");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn matches_all_pairs_shortest_paths() {
    let nodes = ["A", "B", "C", "D", "E", "F", "G"];
    let edges = [
        ("A", "B", 4.0),
        ("A", "C", 1.0),
        ("C", "B", 2.0),
        ("B", "D", 5.0),
        ("C", "D", 8.0),
        ("C", "E", 10.0),
        ("D", "E", 2.0),
        ("D", "F", 6.0),
        ("E", "F", 2.0),
        ("F", "G", 0.5),
    ];
    let expected = floyd_warshall(&nodes, &edges);
    let report = converge(&links_from_edges(&nodes, &edges)).await;

    for ((from, to), dist) in &expected {
        let table = report.table(from).unwrap();
        assert_eq!(table.distance_to(to).unwrap(), *dist, "{from} -> {to}");
    }

    // following next hops from any node reaches the destination at the advertised cost
    for from in nodes {
        for to in nodes {
            let mut at: NodeId = from.to_string();
            let mut walked = 0.0;
            let mut steps = 0;
            while at != to {
                let next = report.table(&at).unwrap().next_hop_to(to).unwrap().clone();
                walked += expected[&(at.clone(), next.clone())];
                at = next;
                steps += 1;
                assert!(steps <= nodes.len(), "routing loop from {from} to {to}");
            }
            assert_eq!(walked, expected[&(from.to_string(), to.to_string())]);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn converged_state_is_a_fixed_point() {
    let report = converge("A (B,1) (C,5)\nB (A,1) (C,1) (D,7)\nC (A,5) (B,1) (D,2)\nD (B,7) (C,2)\n").await;

    for (id, table) in &report.tables {
        let mut node = detached(table.clone());
        for (peer, snapshot) in &report.tables {
            if peer == id {
                continue;
            }
            let edited = node.relax(&Packet::new(snapshot.clone(), 0)).unwrap();
            assert!(!edited, "{id} changed after relaxing against {peer}");
        }
        assert_eq!(node.table(), table);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn relaxing_through_the_destination_never_reroutes() {
    let report = converge("A (B,1) (C,5)\nB (A,1) (C,1)\nC (A,5) (B,1)\n").await;

    for (id, table) in &report.tables {
        for (via, snapshot) in &report.tables {
            if via == id {
                continue;
            }
            let mut node = detached(table.clone());
            node.relax(&Packet::new(snapshot.clone(), 0)).unwrap();
            assert_eq!(
                node.table().get(via).unwrap(),
                table.get(via).unwrap(),
                "{id} rerouted its path to {via} through {via}"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn zero_cost_link_is_used() {
    let report = converge("A (B,5) (C,10)\nB (A,5) (C,0)\nC (A,10) (B,0)\n").await;

    let a = report.table("A").unwrap();
    assert_eq!(a.distance_to("C").unwrap(), 5.0);
    assert_eq!(a.next_hop_to("C").unwrap(), "B");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn symmetric_full_mesh_gives_symmetric_distances() {
    let nodes = ["A", "B", "C", "D"];
    let edges = [
        ("A", "B", 3.0),
        ("A", "C", 1.0),
        ("A", "D", 9.0),
        ("B", "C", 1.0),
        ("B", "D", 2.0),
        ("C", "D", 6.0),
    ];
    let report = converge(&links_from_edges(&nodes, &edges)).await;

    for x in nodes {
        for y in nodes {
            let xy = report.table(x).unwrap().distance_to(y).unwrap();
            let yx = report.table(y).unwrap().distance_to(x).unwrap();
            assert_eq!(xy, yx, "{x} <-> {y}");
        }
    }
    assert_eq!(report.table("A").unwrap().distance_to("D").unwrap(), 4.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_runs_agree() {
    let links = "A (B,2) (C,3)\nB (A,2) (D,1)\nC (A,3) (D,1)\nD (B,1) (C,1) (E,4)\nE (D,4)\n";
    let first = converge(links).await;
    for _ in 0..10 {
        let again = converge(links).await;
        for (id, table) in &first.tables {
            for (dest, hop) in table.iter() {
                assert_eq!(
                    again.table(id).unwrap().distance_to(dest).unwrap(),
                    hop.cost()
                );
            }
        }
    }
}

#[test]
fn report_serializes_unreachable_as_null() {
    let links = parse_links_str("A (B,1)\nB (A,1)\nC (D,1)\nD (C,1)\n").unwrap();
    let report = Simulation::new(links, SimulationConfig::default())
        .run_on_pool()
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["tables"]["A"]["entries"]["B"]["cost"], 1.0);
    assert!(json["tables"]["A"]["entries"]["C"]["cost"].is_null());
    assert_eq!(json["nodes"].as_array().unwrap().len(), 4);
}
